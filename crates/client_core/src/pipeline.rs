//! Range-control input pipelines: raw slider value -> value, label, track fill
//! and outbound command.

use shared::{
    domain::{ControlBounds, ServoAngle, SpeedPercent},
    protocol::Command,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    ServoAngle,
    StepperSpeed,
}

impl PipelineKind {
    pub fn bounds(self) -> ControlBounds {
        match self {
            Self::ServoAngle => ServoAngle::BOUNDS,
            Self::StepperSpeed => SpeedPercent::BOUNDS,
        }
    }

    fn unit(self) -> &'static str {
        match self {
            Self::ServoAngle => "°",
            Self::StepperSpeed => "%",
        }
    }
}

/// Result of one accepted change event. Visual fields are computed before the
/// command is handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeUpdate {
    pub value: f64,
    pub label: String,
    pub fill_percent: f64,
    pub command: Command,
}

#[derive(Debug, Clone)]
pub struct InputPipeline {
    kind: PipelineKind,
    bounds: ControlBounds,
    value: f64,
}

impl InputPipeline {
    pub fn servo() -> Self {
        Self::new(PipelineKind::ServoAngle)
    }

    pub fn speed() -> Self {
        Self::new(PipelineKind::StepperSpeed)
    }

    pub fn new(kind: PipelineKind) -> Self {
        let bounds = kind.bounds();
        Self {
            kind,
            bounds,
            value: bounds.default,
        }
    }

    pub fn kind(&self) -> PipelineKind {
        self.kind
    }

    pub fn bounds(&self) -> ControlBounds {
        self.bounds
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn label(&self) -> String {
        format!("{}{}", self.value.round() as i64, self.kind.unit())
    }

    pub fn fill_percent(&self) -> f64 {
        self.bounds.fill_percent(self.value)
    }

    /// Current value as a command, without touching state.
    pub fn command(&self) -> Command {
        match self.kind {
            PipelineKind::ServoAngle => {
                Command::ServoAngle(ServoAngle::new(self.value).unwrap_or_default())
            }
            PipelineKind::StepperSpeed => {
                Command::StepperSpeed(SpeedPercent::new(self.value).unwrap_or_default())
            }
        }
    }

    /// Handles a raw change event. Non-finite input is ignored with no side
    /// effect; everything else is clamped to the control bounds.
    pub fn on_change(&mut self, raw: f64) -> Option<RangeUpdate> {
        if !raw.is_finite() {
            return None;
        }
        self.value = self.bounds.clamp(raw);
        Some(RangeUpdate {
            value: self.value,
            label: self.label(),
            fill_percent: self.fill_percent(),
            command: self.command(),
        })
    }
}

#[cfg(test)]
#[path = "tests/pipeline_tests.rs"]
mod tests;
