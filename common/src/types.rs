#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Off,
    Heat,
    Cool,
}

impl Mode {
    /// Successor in the fixed Off -> Heat -> Cool -> Off cycle.
    pub fn next(self) -> Self {
        match self {
            Self::Off => Self::Heat,
            Self::Heat => Self::Cool,
            Self::Cool => Self::Off,
        }
    }

    /// Lower-case name used on the telemetry line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Heat => "heat",
            Self::Cool => "cool",
        }
    }

    /// Upper-case name used on the display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Heat => "HEAT",
            Self::Cool => "COOL",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActuatorPattern {
    #[default]
    Off,
    Steady,
    Pulsing,
}

impl ActuatorPattern {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Steady => "STEADY",
            Self::Pulsing => "PULSING",
        }
    }
}

/// Requested pattern for both indicator outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActuatorOutputs {
    pub heat: ActuatorPattern,
    pub cool: ActuatorPattern,
}

impl ActuatorOutputs {
    pub const ALL_OFF: Self = Self {
        heat: ActuatorPattern::Off,
        cool: ActuatorPattern::Off,
    };
}

/// Consistent view of the shared state taken under a single lock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSnapshot {
    pub mode: Mode,
    pub set_point_f: i32,
    pub temperature_f: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_cycle_wraps_back_to_off() {
        assert_eq!(Mode::Off.next(), Mode::Heat);
        assert_eq!(Mode::Heat.next(), Mode::Cool);
        assert_eq!(Mode::Cool.next(), Mode::Off);
    }

    #[test]
    fn mode_names() {
        assert_eq!(Mode::Cool.as_str(), "cool");
        assert_eq!(Mode::Heat.label(), "HEAT");
        assert_eq!(Mode::Off.to_string(), "off");
    }
}
