use std::time::{Duration, Instant};

use client_core::{
    ControlSession, DirectionButton, InputPipeline, SessionSettings, TransportEvent,
};
use crossbeam_channel::Receiver;
use shared::domain::ConnectionState;

use crate::{
    backend_bridge::sink::PanelSink,
    controller::events::{UiError, UiErrorContext, UiEvent},
    ui::gauge::{paint_gauge, surface_for_width, LABEL_SPACE},
};

const REPAINT_INTERVAL: Duration = Duration::from_millis(100);

pub struct PanelApp {
    session: ControlSession<PanelSink>,
    ui_rx: Receiver<UiEvent>,
    endpoint: String,
    status: String,
    status_banner: Option<UiError>,
}

impl PanelApp {
    pub fn new(
        sink: PanelSink,
        settings: SessionSettings,
        ui_rx: Receiver<UiEvent>,
        endpoint: String,
        startup_error: Option<UiError>,
    ) -> Self {
        Self {
            session: ControlSession::new(sink, settings),
            ui_rx,
            endpoint,
            status: "Starting".to_string(),
            status_banner: startup_error,
        }
    }

    pub fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Transport(event) => self.on_transport_event(event),
                UiEvent::Info(message) => self.status = message,
                UiEvent::Error(err) => {
                    tracing::warn!(
                        category = ?err.category(),
                        context = ?err.context(),
                        "{}",
                        err.message()
                    );
                    self.status_banner = Some(err);
                }
            }
        }
    }

    fn on_transport_event(&mut self, event: TransportEvent) {
        self.session.on_transport_event(&event);
        match event {
            TransportEvent::StateChanged(state) => {
                self.status = format!("Controller {}", state.label());
                if state.is_open()
                    && self
                        .status_banner
                        .as_ref()
                        .is_some_and(UiError::clears_on_reconnect)
                {
                    self.status_banner = None;
                }
            }
            TransportEvent::ReconnectScheduled(delay) => {
                self.status = format!("Reconnecting in {:.1}s", delay.as_secs_f32());
            }
            TransportEvent::RetriesExhausted => {
                self.status_banner = Some(UiError::from_message(
                    UiErrorContext::Connection,
                    format!(
                        "Controller at {} unreachable; reconnect attempts exhausted. Restart the panel to retry.",
                        self.endpoint
                    ),
                ));
            }
            TransportEvent::Inbound(_) => {}
        }
    }

    fn show_header(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Servo & Stepper Control");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let state = self.session.connection_state();
                let (fill, text) = match state {
                    ConnectionState::Open => (egui::Color32::from_rgb(46, 122, 46), "connected"),
                    ConnectionState::Connecting => {
                        (egui::Color32::from_rgb(176, 132, 32), "connecting")
                    }
                    ConnectionState::Closed => (egui::Color32::from_rgb(150, 60, 60), "offline"),
                };
                egui::Frame::new()
                    .fill(fill)
                    .corner_radius(8.0)
                    .inner_margin(egui::Margin::symmetric(8, 2))
                    .show(ui, |ui| {
                        ui.label(egui::RichText::new(text).color(egui::Color32::WHITE));
                    })
                    .response
                    .on_hover_text(&self.endpoint);
            });
        });
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        let Some(banner) = self.status_banner.clone() else {
            return;
        };
        egui::Frame::NONE
            .fill(egui::Color32::from_rgb(111, 53, 53))
            .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)))
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(10, 8))
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(egui::RichText::new(banner.message()).color(egui::Color32::WHITE));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Dismiss").clicked() {
                            self.status_banner = None;
                        }
                    });
                });
            });
        ui.add_space(8.0);
    }

    fn show_gauge(&mut self, ui: &mut egui::Ui) {
        let surface = surface_for_width(ui.available_width());
        let (rect, _) = ui.allocate_exact_size(
            egui::vec2(surface.width, surface.height + LABEL_SPACE),
            egui::Sense::hover(),
        );
        let scene = self.session.resize(surface);
        paint_gauge(&ui.painter_at(rect), rect.min, scene);
    }

    fn show_direction_buttons(&mut self, ui: &mut egui::Ui) {
        let buttons = self.session.buttons();
        let mut pressed = None;
        ui.horizontal(|ui| {
            for button in DirectionButton::ALL {
                let widget = egui::Button::new(button.label()).min_size(egui::vec2(96.0, 28.0));
                if ui.add_enabled(!buttons.is_disabled(button), widget).clicked() {
                    pressed = Some(button);
                }
            }
        });
        if let Some(button) = pressed {
            self.session.press(button);
        }
    }

    fn next_repaint(&self) -> Duration {
        self.session
            .next_wakeup()
            .map(|at| at.saturating_duration_since(Instant::now()))
            .unwrap_or(REPAINT_INTERVAL)
            .min(REPAINT_INTERVAL)
    }
}

/// Title, slider, value label and fill track. Returns the new raw value when
/// the user moved the slider.
fn range_row(ui: &mut egui::Ui, title: &str, pipeline: &InputPipeline) -> Option<f64> {
    let bounds = pipeline.bounds();
    let mut value = pipeline.value();
    let mut changed = false;

    ui.label(egui::RichText::new(title).strong());
    ui.horizontal(|ui| {
        let slider = egui::Slider::new(&mut value, bounds.min..=bounds.max)
            .step_by(bounds.step)
            .show_value(false);
        changed = ui.add(slider).changed();
        ui.label(pipeline.label());
    });
    ui.add(
        egui::ProgressBar::new((pipeline.fill_percent() / 100.0) as f32).desired_height(6.0),
    );
    ui.add_space(10.0);

    changed.then_some(value)
}

impl eframe::App for PanelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.session.poll(Instant::now());

        egui::TopBottomPanel::top("header").show(ctx, |ui| self.show_header(ui));
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.small(egui::RichText::new(&self.status).weak());
        });
        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_status_banner(ui);
            ui.vertical_centered(|ui| self.show_gauge(ui));

            if let Some(raw) = range_row(ui, "Servo angle", self.session.servo()) {
                self.session.on_servo_input(raw);
            }
            if let Some(raw) = range_row(ui, "Stepper speed", self.session.speed()) {
                self.session.on_speed_input(raw);
            }
            ui.label(egui::RichText::new("Stepper direction").strong());
            self.show_direction_buttons(ui);
        });

        ctx.request_repaint_after(self.next_repaint());
    }
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::{bounded, Sender};

    use super::*;
    use crate::controller::events::UiErrorCategory;

    fn offline_app() -> (Sender<UiEvent>, PanelApp) {
        let (ui_tx, ui_rx) = bounded(16);
        let app = PanelApp::new(
            PanelSink::Offline,
            SessionSettings::default(),
            ui_rx,
            "ws://127.0.0.1:81/".to_string(),
            None,
        );
        (ui_tx, app)
    }

    #[test]
    fn transport_events_drive_status_and_banner() {
        let (ui_tx, mut app) = offline_app();
        ui_tx
            .send(UiEvent::Transport(TransportEvent::ReconnectScheduled(
                Duration::from_secs(2),
            )))
            .expect("send");
        app.process_ui_events();
        assert_eq!(app.status.as_str(), "Reconnecting in 2.0s");

        ui_tx
            .send(UiEvent::Transport(TransportEvent::RetriesExhausted))
            .expect("send");
        app.process_ui_events();
        let banner = app.status_banner.as_ref().expect("banner");
        assert_eq!(banner.category(), UiErrorCategory::Transport);
        assert!(banner.message().contains("ws://127.0.0.1:81/"));

        ui_tx
            .send(UiEvent::Transport(TransportEvent::StateChanged(
                ConnectionState::Open,
            )))
            .expect("send");
        app.process_ui_events();
        assert!(app.status_banner.is_none());
    }

    #[test]
    fn offline_panel_still_tracks_buttons() {
        let (_ui_tx, app) = offline_app();
        assert_eq!(
            app.session.buttons().disabled_button(),
            Some(DirectionButton::Stop)
        );
    }
}
