pub mod config;
pub mod ports;
pub mod status;
pub mod thermostat;
pub mod types;

pub use config::{
    CadenceConfig, ControllerConfig, LcdPins, Parity, PinConfig, SensorConfig, SerialConfig,
};
pub use ports::{
    celsius_to_fahrenheit, ActuatorOutput, DisplayPort, PortError, SensorPort, TelemetryPort,
};
pub use status::{
    DisplayFrame, SecondLine, StatusCadence, TelemetryRecord, TickPlan, DISPLAY_WIDTH,
};
pub use thermostat::{ThermostatEngine, DEFAULT_SET_POINT_F};
pub use types::{ActuatorOutputs, ActuatorPattern, Mode, StatusSnapshot};
