use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Largest integer an f64 represents exactly; beyond it we keep the float form.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Writes integral values without a fractional part so `90.0` goes out as `90`.
fn serialize_wire_number<S: Serializer>(value: f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        serializer.serialize_i64(value as i64)
    } else {
        serializer.serialize_f64(value)
    }
}

macro_rules! bounded_value {
    ($name:ident, $bounds:expr) => {
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
        pub struct $name(f64);

        impl $name {
            pub const BOUNDS: ControlBounds = $bounds;

            /// Clamps into the control bounds. Non-finite input yields `None`.
            pub fn new(value: f64) -> Option<Self> {
                value
                    .is_finite()
                    .then(|| Self(Self::BOUNDS.clamp(value)))
            }

            pub fn value(self) -> f64 {
                self.0
            }

            pub fn rounded(self) -> i64 {
                self.0.round() as i64
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self(Self::BOUNDS.default)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serialize_wire_number(self.0, serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = f64::deserialize(deserializer)?;
                Self::new(raw).ok_or_else(|| {
                    serde::de::Error::custom(concat!(stringify!($name), " must be finite"))
                })
            }
        }
    };
}

/// Declared min/max/step/default of a range control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlBounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
}

impl ControlBounds {
    pub const fn new(min: f64, max: f64, step: f64, default: f64) -> Self {
        Self {
            min,
            max,
            step,
            default,
        }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Fill of the control track in percent, `(v - min) / (max - min) * 100`.
    /// A degenerate range reports an empty track.
    pub fn fill_percent(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        (value - self.min) / span * 100.0
    }
}

bounded_value!(ServoAngle, ControlBounds::new(0.0, 180.0, 1.0, 0.0));
bounded_value!(SpeedPercent, ControlBounds::new(0.0, 100.0, 1.0, 50.0));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepperDirection {
    #[serde(rename = "CW")]
    Clockwise,
    #[serde(rename = "CCW")]
    CounterClockwise,
    #[serde(rename = "STOP")]
    Stop,
}

impl StepperDirection {
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Clockwise => "CW",
            Self::CounterClockwise => "CCW",
            Self::Stop => "STOP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Open,
    Closed,
}

impl ConnectionState {
    pub fn is_open(self) -> bool {
        self == Self::Open
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Connecting => "Connecting",
            Self::Open => "Connected",
            Self::Closed => "Disconnected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn servo_angle_clamps_into_half_turn() {
        assert_eq!(ServoAngle::new(200.0).map(ServoAngle::value), Some(180.0));
        assert_eq!(ServoAngle::new(-5.0).map(ServoAngle::value), Some(0.0));
        assert_eq!(ServoAngle::new(42.5).map(ServoAngle::value), Some(42.5));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        assert!(ServoAngle::new(f64::NAN).is_none());
        assert!(SpeedPercent::new(f64::INFINITY).is_none());
    }

    #[test]
    fn defaults_match_control_surface() {
        assert_eq!(ServoAngle::default().value(), 0.0);
        assert_eq!(SpeedPercent::default().value(), 50.0);
    }

    #[test]
    fn fill_percent_tracks_declared_bounds() {
        let bounds = ControlBounds::new(20.0, 120.0, 1.0, 20.0);
        assert_eq!(bounds.fill_percent(70.0), 50.0);
        assert_eq!(ServoAngle::BOUNDS.fill_percent(90.0), 50.0);
        assert_eq!(ControlBounds::new(5.0, 5.0, 1.0, 5.0).fill_percent(5.0), 0.0);
    }

    #[test]
    fn integral_values_serialize_without_fraction() {
        let angle = ServoAngle::new(90.0).expect("finite");
        assert_eq!(serde_json::to_string(&angle).expect("json"), "90");
        let angle = ServoAngle::new(12.5).expect("finite");
        assert_eq!(serde_json::to_string(&angle).expect("json"), "12.5");
    }
}
