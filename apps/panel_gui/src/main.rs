use std::path::PathBuf;

use clap::Parser;
use client_core::{config::DEFAULT_CONFIG_FILE, load_settings, PanelSettings, SessionSettings};
use crossbeam_channel::bounded;

mod backend_bridge;
mod controller;
mod ui;

use backend_bridge::{runtime::start_backend_bridge, sink::PanelSink};
use controller::events::{UiError, UiErrorContext, UiEvent};
use ui::PanelApp;

const APP_DIR: &str = "servo_panel";

#[derive(Parser, Debug)]
struct Args {
    /// Settings file. Defaults to `./panel.toml`, then the user config dir.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
}

fn default_config_path() -> PathBuf {
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return local;
    }
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(DEFAULT_CONFIG_FILE))
        .unwrap_or(local)
}

/// Falls back to defaults on a bad config so the panel still opens; the
/// error is shown in the status banner.
fn resolve_settings(args: &Args) -> (PanelSettings, Option<UiError>) {
    let path = args.config.clone().unwrap_or_else(default_config_path);
    let (mut settings, error) = match load_settings(&path) {
        Ok(settings) => (settings, None),
        Err(err) => {
            tracing::error!("failed to load panel config: {err:#}");
            (
                PanelSettings::default(),
                Some(UiError::from_message(
                    UiErrorContext::Config,
                    format!("{err:#}; using defaults"),
                )),
            )
        }
    };
    if let Some(host) = &args.host {
        settings.controller_host = host.clone();
    }
    if let Some(port) = args.port {
        settings.controller_port = port;
    }
    (settings, error)
}

fn start_transport(
    settings: &PanelSettings,
    ui_tx: crossbeam_channel::Sender<UiEvent>,
) -> (PanelSink, String, Option<UiError>) {
    let config = match settings.transport_config() {
        Ok(config) => config,
        Err(err) => {
            let endpoint = format!("{}:{}", settings.controller_host, settings.controller_port);
            return (
                PanelSink::Offline,
                endpoint,
                Some(UiError::from_message(UiErrorContext::Config, format!("{err:#}"))),
            );
        }
    };
    let endpoint = config.endpoint.to_string();
    match start_backend_bridge(config, ui_tx) {
        Ok(transport) => (PanelSink::Live(transport), endpoint, None),
        Err(err) => (PanelSink::Offline, endpoint, Some(err)),
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let (settings, config_error) = resolve_settings(&args);
    let session_settings: SessionSettings = settings.session_settings();
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    let (sink, endpoint, startup_error) = start_transport(&settings, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Servo & Stepper Control")
            .with_inner_size([680.0, 640.0])
            .with_min_inner_size([320.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Servo & Stepper Control",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(PanelApp::new(
                sink,
                session_settings,
                ui_rx,
                endpoint,
                startup_error.or(config_error),
            )))
        }),
    )
}
