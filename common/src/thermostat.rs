use crate::types::{ActuatorOutputs, ActuatorPattern, Mode};

pub const DEFAULT_SET_POINT_F: i32 = 72;

/// Mode and set-point state machine.
///
/// The engine never stores actuator patterns; callers ask for
/// [`ThermostatEngine::actuator_outputs`] after every mutation and apply the
/// result themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThermostatEngine {
    mode: Mode,
    set_point_f: i32,
}

impl Default for ThermostatEngine {
    fn default() -> Self {
        Self::new(DEFAULT_SET_POINT_F)
    }
}

impl ThermostatEngine {
    pub fn new(set_point_f: i32) -> Self {
        Self {
            mode: Mode::Off,
            set_point_f,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_point_f(&self) -> i32 {
        self.set_point_f
    }

    pub fn advance_mode(&mut self) -> Mode {
        self.mode = self.mode.next();
        self.mode
    }

    // Unbounded apart from i32 saturation.
    pub fn raise_set_point(&mut self) -> i32 {
        self.set_point_f = self.set_point_f.saturating_add(1);
        self.set_point_f
    }

    pub fn lower_set_point(&mut self) -> i32 {
        self.set_point_f = self.set_point_f.saturating_sub(1);
        self.set_point_f
    }

    /// Desired patterns for the current mode and set-point.
    ///
    /// The comparison uses the floored Fahrenheit reading. Without a sample
    /// both outputs stay off.
    pub fn actuator_outputs(&self, temperature_f: Option<f32>) -> ActuatorOutputs {
        let Some(temperature_f) = temperature_f else {
            return ActuatorOutputs::ALL_OFF;
        };
        let whole_degrees = floor_degrees(temperature_f);

        match self.mode {
            Mode::Off => ActuatorOutputs::ALL_OFF,
            Mode::Heat => ActuatorOutputs {
                heat: if whole_degrees < i64::from(self.set_point_f) {
                    ActuatorPattern::Pulsing
                } else {
                    ActuatorPattern::Steady
                },
                cool: ActuatorPattern::Off,
            },
            Mode::Cool => ActuatorOutputs {
                heat: ActuatorPattern::Off,
                cool: if whole_degrees > i64::from(self.set_point_f) {
                    ActuatorPattern::Pulsing
                } else {
                    ActuatorPattern::Steady
                },
            },
        }
    }
}

fn floor_degrees(temperature_f: f32) -> i64 {
    // `as` saturates, and NaN maps to 0.
    temperature_f.floor() as i64
}
