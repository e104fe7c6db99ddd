//! Simulated servo and stepper driven by panel commands.

use serde::Serialize;
use serde_json::json;
use shared::{
    domain::{ServoAngle, SpeedPercent, StepperDirection},
    protocol::Command,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActuatorState {
    pub servo_angle: ServoAngle,
    pub stepper_speed: SpeedPercent,
    pub direction: StepperDirection,
    pub commands_applied: u64,
}

impl Default for ActuatorState {
    /// A freshly booted controller: servo at rest, stepper idle.
    fn default() -> Self {
        Self {
            servo_angle: ServoAngle::default(),
            stepper_speed: SpeedPercent::default(),
            direction: StepperDirection::Stop,
            commands_applied: 0,
        }
    }
}

impl ActuatorState {
    /// Applies `command` and returns the frame to broadcast back, if any.
    /// Servo moves are echoed as `{"type":"servo","value":<angle>}`.
    pub fn apply(&mut self, command: &Command) -> Option<String> {
        self.commands_applied += 1;
        match *command {
            Command::ServoAngle(angle) => {
                self.servo_angle = angle;
                Some(json!({ "type": "servo", "value": angle }).to_string())
            }
            Command::StepperSpeed(speed) => {
                self.stepper_speed = speed;
                None
            }
            Command::StepperDir(direction) => {
                self.direction = direction;
                None
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.direction != StepperDirection::Stop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn servo_moves_are_echoed() {
        let mut state = ActuatorState::default();
        let angle = ServoAngle::new(135.0).expect("finite");
        let echo = state.apply(&Command::ServoAngle(angle));
        assert_eq!(echo.as_deref(), Some(r#"{"type":"servo","value":135}"#));
        assert_eq!(state.servo_angle, angle);
    }

    #[test]
    fn stepper_commands_update_state_silently() {
        let mut state = ActuatorState::default();
        assert!(!state.is_running());

        let speed = SpeedPercent::new(20.0).expect("finite");
        assert!(state.apply(&Command::StepperSpeed(speed)).is_none());
        assert!(state
            .apply(&Command::StepperDir(StepperDirection::CounterClockwise))
            .is_none());

        assert_eq!(state.stepper_speed, speed);
        assert!(state.is_running());
        assert_eq!(state.commands_applied, 2);
    }
}
