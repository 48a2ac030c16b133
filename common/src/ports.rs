//! Boundary traits between the controller core and its hardware.
//!
//! Adapters (simulated on a host, GPIO/I2C/UART on a Raspberry Pi) implement
//! these; the core only ever holds them as owned handles.

use thiserror::Error;

use crate::types::ActuatorPattern;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sensor error: {0}")]
    Sensor(String),
    #[error("port already shut down")]
    Closed,
    #[error("operation timed out")]
    Timeout,
}

pub trait SensorPort {
    fn read_temperature_f(&mut self) -> Result<f32, PortError>;
}

pub trait DisplayPort {
    /// Writes both lines. Implementations fit each line to the display width.
    fn render(&mut self, line1: &str, line2: &str) -> Result<(), PortError>;

    /// Releases the hardware. Later `render` calls must fail with
    /// [`PortError::Closed`].
    fn shutdown(&mut self) -> Result<(), PortError>;
}

pub trait TelemetryPort {
    fn send_line(&mut self, data: &[u8]) -> Result<(), PortError>;
}

pub trait ActuatorOutput {
    fn set_off(&mut self) -> Result<(), PortError>;
    fn set_steady(&mut self) -> Result<(), PortError>;
    fn set_pulsing(&mut self) -> Result<(), PortError>;

    fn apply(&mut self, pattern: ActuatorPattern) -> Result<(), PortError> {
        match pattern {
            ActuatorPattern::Off => self.set_off(),
            ActuatorPattern::Steady => self.set_steady(),
            ActuatorPattern::Pulsing => self.set_pulsing(),
        }
    }
}

pub fn celsius_to_fahrenheit(temp_c: f32) -> f32 {
    temp_c * 9.0 / 5.0 + 32.0
}
