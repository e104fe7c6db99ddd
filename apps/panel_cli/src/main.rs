use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    config::DEFAULT_CONFIG_FILE, load_settings, CommandSink, InputPipeline, PanelSettings,
    SendOutcome, TransportEvent, TransportHandle,
};
use shared::{domain::StepperDirection, protocol::Command};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(about = "Drive the servo/stepper controller from the command line")]
struct Args {
    /// Settings file; missing means defaults.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
    /// How long to wait for the connection before giving up.
    #[arg(long, default_value_t = 5_000)]
    open_timeout_ms: u64,
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Action {
    /// Move the servo, 0-180 degrees.
    Servo { angle: f64 },
    /// Set stepper speed, 0-100 percent.
    Speed { percent: f64 },
    /// Set stepper direction.
    Dir { direction: DirectionArg },
    /// Print inbound controller messages.
    Watch {
        /// Stop after this many seconds; runs until Ctrl-C when omitted.
        #[arg(long)]
        seconds: Option<u64>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
enum DirectionArg {
    Cw,
    Ccw,
    Stop,
}

impl From<DirectionArg> for StepperDirection {
    fn from(value: DirectionArg) -> Self {
        match value {
            DirectionArg::Cw => StepperDirection::Clockwise,
            DirectionArg::Ccw => StepperDirection::CounterClockwise,
            DirectionArg::Stop => StepperDirection::Stop,
        }
    }
}

fn resolve_settings(args: &Args) -> Result<PanelSettings> {
    let mut settings = load_settings(&args.config)?;
    if let Some(host) = &args.host {
        settings.controller_host = host.clone();
    }
    if let Some(port) = args.port {
        settings.controller_port = port;
    }
    Ok(settings)
}

/// Runs the raw value through the same pipeline the panel sliders use.
fn command_for(action: &Action) -> Result<Option<Command>> {
    let command = match *action {
        Action::Servo { angle } => InputPipeline::servo()
            .on_change(angle)
            .map(|update| update.command)
            .with_context(|| format!("servo angle must be a number, got {angle}"))?,
        Action::Speed { percent } => InputPipeline::speed()
            .on_change(percent)
            .map(|update| update.command)
            .with_context(|| format!("speed must be a number, got {percent}"))?,
        Action::Dir { direction } => Command::StepperDir(direction.into()),
        Action::Watch { .. } => return Ok(None),
    };
    Ok(Some(command))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let settings = resolve_settings(&args)?;
    let command = command_for(&args.action)?;
    let (transport, events) = TransportHandle::spawn(settings.transport_config()?);
    info!(endpoint = %transport.endpoint(), "connecting to controller");

    if !transport
        .wait_until_open(Duration::from_millis(args.open_timeout_ms))
        .await
    {
        let endpoint = transport.endpoint().to_string();
        transport.shutdown().await;
        bail!("controller at {endpoint} did not accept a connection");
    }

    let result = match (command, &args.action) {
        (Some(command), _) => send_one(&transport, command),
        (None, Action::Watch { seconds }) => watch(events, seconds.map(Duration::from_secs)).await,
        (None, _) => Ok(()),
    };
    transport.shutdown().await;
    result
}

fn send_one(transport: &TransportHandle, command: Command) -> Result<()> {
    match transport.send(&command)? {
        SendOutcome::Sent => {
            println!("{}", command.to_wire()?);
            Ok(())
        }
        SendOutcome::Dropped => bail!("connection closed before {} was sent", command.kind()),
    }
}

async fn watch(
    mut events: tokio::sync::broadcast::Receiver<TransportEvent>,
    limit: Option<Duration>,
) -> Result<()> {
    let deadline = async {
        match limit {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(TransportEvent::Inbound(event)) => println!("{event:?}"),
                Ok(TransportEvent::StateChanged(state)) => info!(state = state.label(), "connection"),
                Ok(TransportEvent::ReconnectScheduled(delay)) => info!(?delay, "reconnecting"),
                Ok(TransportEvent::RetriesExhausted) => bail!("controller unreachable; gave up reconnecting"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "watch fell behind"),
                Err(RecvError::Closed) => return Ok(()),
            },
            _ = &mut deadline => return Ok(()),
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}
