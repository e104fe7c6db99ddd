use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{ServoAngle, SpeedPercent, StepperDirection},
    error::ProtocolError,
};

/// Outbound instruction for the controller, one JSON object per websocket frame:
/// `{"type": "servoAngle", "value": 90}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Command {
    ServoAngle(ServoAngle),
    StepperSpeed(SpeedPercent),
    StepperDir(StepperDirection),
}

impl Command {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ServoAngle(_) => "servoAngle",
            Self::StepperSpeed(_) => "stepperSpeed",
            Self::StepperDir(_) => "stepperDir",
        }
    }

    pub fn to_wire(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Message kinds the controller may push. Servo echoes are recognised so they
/// can be discarded; everything else is reserved.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    ServoEcho { value: Option<f64> },
    Unhandled { kind: String },
}

#[derive(Debug, Deserialize)]
struct InboundEnvelope {
    #[serde(rename = "type")]
    kind: Option<Value>,
    #[serde(default)]
    value: Option<Value>,
}

pub fn decode_controller_message(text: &str) -> Result<ControllerEvent, ProtocolError> {
    let raw: Value = serde_json::from_str(text)?;
    if !raw.is_object() {
        return Err(ProtocolError::NotAnObject);
    }
    let envelope: InboundEnvelope = serde_json::from_value(raw)?;
    let Some(Value::String(kind)) = envelope.kind else {
        return Err(ProtocolError::MissingType);
    };

    match kind.as_str() {
        "servo" | "servoAngle" => Ok(ControllerEvent::ServoEcho {
            value: envelope.value.as_ref().and_then(Value::as_f64),
        }),
        _ => Ok(ControllerEvent::Unhandled { kind }),
    }
}
