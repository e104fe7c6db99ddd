//! CW / CCW / Stop buttons.
//!
//! Exactly one button is disabled at a time: the one matching the last issued
//! direction. A disabled button represents the current mode and cannot fire.

use shared::{domain::StepperDirection, protocol::Command};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectionButton {
    Cw,
    Ccw,
    Stop,
}

impl DirectionButton {
    pub const ALL: [DirectionButton; 3] = [Self::Cw, Self::Ccw, Self::Stop];

    pub fn direction(self) -> StepperDirection {
        match self {
            Self::Cw => StepperDirection::Clockwise,
            Self::Ccw => StepperDirection::CounterClockwise,
            Self::Stop => StepperDirection::Stop,
        }
    }

    pub fn for_direction(direction: StepperDirection) -> Self {
        match direction {
            StepperDirection::Clockwise => Self::Cw,
            StepperDirection::CounterClockwise => Self::Ccw,
            StepperDirection::Stop => Self::Stop,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Cw => "CW",
            Self::Ccw => "CCW",
            Self::Stop => "Stop Stepper",
        }
    }
}

/// Disabled flags of the three buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonStates {
    pub cw_disabled: bool,
    pub ccw_disabled: bool,
    pub stop_disabled: bool,
}

impl ButtonStates {
    pub fn is_disabled(&self, button: DirectionButton) -> bool {
        match button {
            DirectionButton::Cw => self.cw_disabled,
            DirectionButton::Ccw => self.ccw_disabled,
            DirectionButton::Stop => self.stop_disabled,
        }
    }

    pub fn disabled_button(&self) -> Option<DirectionButton> {
        DirectionButton::ALL
            .into_iter()
            .find(|button| self.is_disabled(*button))
    }

    pub fn disabled_count(&self) -> usize {
        DirectionButton::ALL
            .into_iter()
            .filter(|button| self.is_disabled(*button))
            .count()
    }
}

/// Transition table: pressing a button disables it and enables the other two.
pub fn next_buttons(pressed: DirectionButton) -> ButtonStates {
    ButtonStates {
        cw_disabled: pressed == DirectionButton::Cw,
        ccw_disabled: pressed == DirectionButton::Ccw,
        stop_disabled: pressed == DirectionButton::Stop,
    }
}

#[derive(Debug, Clone)]
pub struct DirectionStateMachine {
    active: StepperDirection,
}

impl Default for DirectionStateMachine {
    fn default() -> Self {
        Self {
            active: StepperDirection::Stop,
        }
    }
}

impl DirectionStateMachine {
    pub fn active(&self) -> StepperDirection {
        self.active
    }

    pub fn buttons(&self) -> ButtonStates {
        next_buttons(DirectionButton::for_direction(self.active))
    }

    pub fn is_enabled(&self, button: DirectionButton) -> bool {
        !self.buttons().is_disabled(button)
    }

    /// Presses `button`. A disabled button never fires: the press is refused
    /// and no command is produced.
    pub fn press(&mut self, button: DirectionButton) -> Option<Command> {
        if !self.is_enabled(button) {
            return None;
        }
        self.active = button.direction();
        Some(Command::StepperDir(self.active))
    }

    /// Mirrors a direction that was issued outside a button press.
    pub fn adopt(&mut self, direction: StepperDirection) {
        self.active = direction;
    }

    pub fn current_command(&self) -> Command {
        Command::StepperDir(self.active)
    }
}
