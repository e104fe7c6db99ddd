//! The control session: every piece of panel state, owned by the single UI
//! event loop and driven through explicit handler calls.

use std::time::{Duration, Instant};

use shared::{
    domain::ConnectionState,
    protocol::{Command, ControllerEvent},
};
use tracing::{debug, info, trace, warn};

use crate::{
    bootstrap::{
        BootstrapDecision, BootstrapPolicy, BootstrapSync, DEFAULT_BOOTSTRAP_DIRECTION,
        DEFAULT_BOOTSTRAP_POLL,
    },
    direction::{ButtonStates, DirectionButton, DirectionStateMachine},
    gauge::{GaugeRenderer, GaugeScene, SurfaceSize},
    pipeline::{InputPipeline, RangeUpdate},
    transport::{CommandSink, SendOutcome, TransportEvent},
};

/// Default gauge surface before the first layout pass.
pub const DEFAULT_SURFACE: SurfaceSize = SurfaceSize::new(600.0, 300.0);

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub surface: SurfaceSize,
    pub bootstrap_policy: BootstrapPolicy,
    pub bootstrap_poll: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            surface: DEFAULT_SURFACE,
            bootstrap_policy: BootstrapPolicy::default(),
            bootstrap_poll: DEFAULT_BOOTSTRAP_POLL,
        }
    }
}

pub struct ControlSession<S> {
    sink: S,
    servo: InputPipeline,
    speed: InputPipeline,
    direction: DirectionStateMachine,
    gauge: GaugeRenderer,
    bootstrap: BootstrapSync,
}

impl<S: CommandSink> ControlSession<S> {
    pub fn new(sink: S, settings: SessionSettings) -> Self {
        Self {
            sink,
            servo: InputPipeline::servo(),
            speed: InputPipeline::speed(),
            direction: DirectionStateMachine::default(),
            gauge: GaugeRenderer::new(settings.surface),
            bootstrap: BootstrapSync::new(settings.bootstrap_policy, settings.bootstrap_poll),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.sink.connection_state()
    }

    pub fn servo(&self) -> &InputPipeline {
        &self.servo
    }

    pub fn speed(&self) -> &InputPipeline {
        &self.speed
    }

    pub fn buttons(&self) -> ButtonStates {
        self.direction.buttons()
    }

    pub fn direction(&self) -> &DirectionStateMachine {
        &self.direction
    }

    pub fn gauge(&self) -> &GaugeRenderer {
        &self.gauge
    }

    pub fn bootstrap(&self) -> &BootstrapSync {
        &self.bootstrap
    }

    /// Servo slider moved: label, fill and gauge update first, then the
    /// command goes out if the connection is open.
    pub fn on_servo_input(&mut self, raw: f64) -> Option<RangeUpdate> {
        let update = self.servo.on_change(raw)?;
        if let Command::ServoAngle(angle) = update.command {
            self.gauge.render(angle);
        }
        self.dispatch(update.command);
        Some(update)
    }

    pub fn on_speed_input(&mut self, raw: f64) -> Option<RangeUpdate> {
        let update = self.speed.on_change(raw)?;
        self.dispatch(update.command);
        Some(update)
    }

    /// Returns the new button states, or `None` when the button is disabled.
    pub fn press(&mut self, button: DirectionButton) -> Option<ButtonStates> {
        let command = self.direction.press(button)?;
        self.dispatch(command);
        Some(self.direction.buttons())
    }

    pub fn resize(&mut self, surface: SurfaceSize) -> &GaugeScene {
        self.gauge.resize(surface)
    }

    pub fn on_transport_event(&mut self, event: &TransportEvent) {
        match event {
            TransportEvent::StateChanged(ConnectionState::Closed) => {
                self.bootstrap.connection_lost();
            }
            TransportEvent::StateChanged(state) => {
                debug!(?state, "controller connection state changed");
            }
            TransportEvent::Inbound(event) => self.on_controller_event(event),
            TransportEvent::ReconnectScheduled(delay) => {
                debug!(?delay, "controller reconnect scheduled");
            }
            TransportEvent::RetriesExhausted => {
                warn!("controller reconnect attempts exhausted");
            }
        }
    }

    /// Inbound messages never touch panel state: the panel is authoritative,
    /// so servo echoes are discarded to avoid overriding a drag in progress.
    pub fn on_controller_event(&mut self, event: &ControllerEvent) {
        match event {
            ControllerEvent::ServoEcho { value } => {
                trace!(?value, "ignoring servo echo from controller");
            }
            ControllerEvent::Unhandled { kind } => {
                debug!(%kind, "unhandled controller message");
            }
        }
    }

    /// Drives the bootstrap poll timer. Returns the burst when one was sent.
    pub fn poll(&mut self, now: Instant) -> Option<[Command; 3]> {
        let BootstrapDecision::Fire { first } =
            self.bootstrap.poll(now, self.sink.connection_state())
        else {
            return None;
        };

        // The controller always resumes clockwise after a burst.
        self.direction.adopt(DEFAULT_BOOTSTRAP_DIRECTION);

        let burst = [
            self.speed.command(),
            self.direction.current_command(),
            self.servo.command(),
        ];
        for command in burst {
            self.dispatch(command);
        }
        info!(
            burst = self.bootstrap.bursts_sent(),
            first,
            "sent panel state to controller"
        );
        Some(burst)
    }

    /// Earliest instant `poll` has work to do, for scheduling a wake-up.
    pub fn next_wakeup(&self) -> Option<Instant> {
        self.bootstrap.next_check()
    }

    fn dispatch(&self, command: Command) -> SendOutcome {
        if !self.sink.connection_state().is_open() {
            debug!(kind = command.kind(), "controller not connected; command dropped");
            return SendOutcome::Dropped;
        }
        match self.sink.send(&command) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(kind = command.kind(), %err, "failed to hand command to transport");
                SendOutcome::Dropped
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
