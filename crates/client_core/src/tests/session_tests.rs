use std::cell::{Cell, RefCell};

use shared::domain::{ServoAngle, SpeedPercent, StepperDirection};

use super::*;
use crate::error::TransportError;
use crate::gauge::gauge_scene;

#[derive(Default)]
struct RecordingSink {
    state: Cell<ConnectionState>,
    sent: RefCell<Vec<Command>>,
}

impl RecordingSink {
    fn open() -> Self {
        let sink = Self::default();
        sink.state.set(ConnectionState::Open);
        sink
    }

    fn take(&self) -> Vec<Command> {
        self.sent.borrow_mut().drain(..).collect()
    }
}

impl CommandSink for RecordingSink {
    fn connection_state(&self) -> ConnectionState {
        self.state.get()
    }

    fn send(&self, command: &Command) -> Result<SendOutcome, TransportError> {
        if !self.state.get().is_open() {
            return Ok(SendOutcome::Dropped);
        }
        self.sent.borrow_mut().push(*command);
        Ok(SendOutcome::Sent)
    }
}

fn servo(value: f64) -> Command {
    Command::ServoAngle(ServoAngle::new(value).expect("finite"))
}

fn speed(value: f64) -> Command {
    Command::StepperSpeed(SpeedPercent::new(value).expect("finite"))
}

fn dir(direction: StepperDirection) -> Command {
    Command::StepperDir(direction)
}

/// Session whose first bootstrap burst has already gone out.
fn bootstrapped(sink: &RecordingSink) -> ControlSession<&RecordingSink> {
    let mut session = ControlSession::new(sink, SessionSettings::default());
    session.poll(Instant::now()).expect("first burst");
    sink.take();
    session
}

#[test]
fn servo_drag_to_ninety_updates_visuals_and_sends_when_open() {
    let sink = RecordingSink::open();
    let mut session = bootstrapped(&sink);

    let update = session.on_servo_input(90.0).expect("accepted");
    assert_eq!(update.label, "90°");
    assert_eq!(update.fill_percent, 50.0);
    assert_eq!(session.gauge().scene().label.text, "90°");
    assert_eq!(
        session.gauge().scene(),
        &gauge_scene(90.0, DEFAULT_SURFACE)
    );
    assert_eq!(sink.take(), vec![servo(90.0)]);
}

#[test]
fn visual_state_updates_while_disconnected_without_sending() {
    let sink = RecordingSink::default();
    let mut session = ControlSession::new(&sink, SessionSettings::default());

    session.on_servo_input(120.0).expect("accepted");
    session.on_speed_input(80.0).expect("accepted");
    let buttons = session.press(DirectionButton::Ccw).expect("enabled");

    assert_eq!(session.gauge().angle().value(), 120.0);
    assert_eq!(session.speed().label(), "80%");
    assert!(buttons.ccw_disabled);
    assert!(sink.take().is_empty());
}

#[test]
fn non_finite_servo_input_has_no_effect() {
    let sink = RecordingSink::open();
    let mut session = bootstrapped(&sink);
    let frames = session.gauge().frames();

    assert!(session.on_servo_input(f64::NAN).is_none());
    assert_eq!(session.gauge().frames(), frames);
    assert!(sink.take().is_empty());
}

#[test]
fn direction_presses_emit_one_command_each() {
    let sink = RecordingSink::open();
    let mut session = ControlSession::new(&sink, SessionSettings::default());

    session.press(DirectionButton::Cw).expect("enabled");
    session.press(DirectionButton::Ccw).expect("enabled");
    session.press(DirectionButton::Stop).expect("enabled");
    assert!(session.press(DirectionButton::Stop).is_none());

    assert_eq!(
        sink.take(),
        vec![
            dir(StepperDirection::Clockwise),
            dir(StepperDirection::CounterClockwise),
            dir(StepperDirection::Stop),
        ]
    );
}

#[test]
fn first_open_sends_speed_cw_and_servo() {
    let sink = RecordingSink::default();
    let mut session = ControlSession::new(&sink, SessionSettings::default());
    let start = Instant::now();

    assert!(session.poll(start).is_none());
    sink.state.set(ConnectionState::Open);
    session.on_transport_event(&TransportEvent::StateChanged(ConnectionState::Open));
    assert!(session.poll(start + Duration::from_millis(100)).is_none());

    let burst = session
        .poll(start + DEFAULT_BOOTSTRAP_POLL)
        .expect("burst once open");
    let expected = vec![speed(50.0), dir(StepperDirection::Clockwise), servo(0.0)];
    assert_eq!(burst.to_vec(), expected);
    assert_eq!(sink.take(), expected);
    assert_eq!(
        session.buttons().disabled_button(),
        Some(DirectionButton::Cw)
    );
}

#[test]
fn reopen_after_close_sends_exactly_one_burst() {
    let sink = RecordingSink::open();
    let mut session = bootstrapped(&sink);
    session.on_servo_input(33.0);
    session.on_speed_input(70.0);
    sink.take();

    sink.state.set(ConnectionState::Closed);
    session.on_transport_event(&TransportEvent::StateChanged(ConnectionState::Closed));
    let now = Instant::now();
    assert!(session.poll(now).is_none());

    sink.state.set(ConnectionState::Open);
    session.on_transport_event(&TransportEvent::StateChanged(ConnectionState::Open));
    let later = now + DEFAULT_BOOTSTRAP_POLL;
    assert!(session.poll(later).is_some());
    assert!(session.poll(later + DEFAULT_BOOTSTRAP_POLL).is_none());

    assert_eq!(
        sink.take(),
        vec![speed(70.0), dir(StepperDirection::Clockwise), servo(33.0)]
    );
}

#[test]
fn every_burst_resets_direction_to_cw() {
    let sink = RecordingSink::open();
    let mut session = bootstrapped(&sink);
    session.press(DirectionButton::Stop).expect("enabled");
    sink.take();

    sink.state.set(ConnectionState::Closed);
    session.on_transport_event(&TransportEvent::StateChanged(ConnectionState::Closed));
    sink.state.set(ConnectionState::Open);
    session.on_transport_event(&TransportEvent::StateChanged(ConnectionState::Open));
    let burst = session.poll(Instant::now()).expect("burst");
    assert_eq!(burst[1], dir(StepperDirection::Clockwise));
    assert_eq!(
        session.buttons().disabled_button(),
        Some(DirectionButton::Cw)
    );
    assert_eq!(
        sink.take(),
        vec![speed(50.0), dir(StepperDirection::Clockwise), servo(0.0)]
    );
}

#[test]
fn first_open_policy_does_not_rebootstrap() {
    let sink = RecordingSink::open();
    let settings = SessionSettings {
        bootstrap_policy: BootstrapPolicy::FirstOpen,
        ..SessionSettings::default()
    };
    let mut session = ControlSession::new(&sink, settings);
    assert!(session.poll(Instant::now()).is_some());

    session.on_transport_event(&TransportEvent::StateChanged(ConnectionState::Closed));
    session.on_transport_event(&TransportEvent::StateChanged(ConnectionState::Open));
    assert!(session.poll(Instant::now()).is_none());
}

#[test]
fn inbound_servo_echo_leaves_panel_untouched() {
    let sink = RecordingSink::open();
    let mut session = bootstrapped(&sink);
    session.on_servo_input(10.0).expect("accepted");
    sink.take();
    let frames = session.gauge().frames();

    session.on_transport_event(&TransportEvent::Inbound(ControllerEvent::ServoEcho {
        value: Some(45.0),
    }));
    session.on_transport_event(&TransportEvent::Inbound(ControllerEvent::Unhandled {
        kind: "status".to_string(),
    }));

    assert_eq!(session.servo().value(), 10.0);
    assert_eq!(session.gauge().angle().value(), 10.0);
    assert_eq!(session.gauge().frames(), frames);
    assert!(sink.take().is_empty());
}

#[test]
fn resize_recenters_gauge_at_current_angle() {
    let sink = RecordingSink::default();
    let mut session = ControlSession::new(&sink, SessionSettings::default());
    session.on_servo_input(150.0);

    let surface = SurfaceSize::for_width(320.0);
    let scene = session.resize(surface).clone();
    assert_eq!(scene, gauge_scene(150.0, surface));
}
