use serde::{Deserialize, Serialize};

use crate::thermostat::DEFAULT_SET_POINT_F;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceConfig {
    pub tick_ms: u64,
    pub window_ticks: u32,
    pub temperature_ticks: u32,
    pub telemetry_every_ticks: u32,
    pub shutdown_grace_ms: u64,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1_000,
            window_ticks: 10,
            temperature_ticks: 5,
            telemetry_every_ticks: 30,
            shutdown_grace_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    None,
    Even,
    Odd,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub path: String,
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: u8,
    pub timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            path: "/dev/ttyS0".to_string(),
            baud_rate: 115_200,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
            timeout_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LcdPins {
    pub rs: u8,
    pub en: u8,
    pub d4: u8,
    pub d5: u8,
    pub d6: u8,
    pub d7: u8,
}

impl Default for LcdPins {
    fn default() -> Self {
        Self {
            rs: 17,
            en: 27,
            d4: 5,
            d5: 6,
            d6: 13,
            d7: 26,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    pub heat_led: u8,
    pub cool_led: u8,
    pub mode_button: u8,
    pub raise_button: u8,
    pub lower_button: u8,
    pub lcd: LcdPins,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            heat_led: 18,
            cool_led: 23,
            mode_button: 24,
            raise_button: 25,
            lower_button: 12,
            lcd: LcdPins::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub i2c_address: u16,
    pub simulated_base_f: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            i2c_address: 0x38,
            simulated_base_f: 68.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub initial_set_point_f: i32,
    /// IANA zone for the display clock; empty means system local time.
    pub timezone: String,
    pub cadence: CadenceConfig,
    pub serial: SerialConfig,
    pub pins: PinConfig,
    pub sensor: SensorConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            initial_set_point_f: DEFAULT_SET_POINT_F,
            timezone: String::new(),
            cadence: CadenceConfig::default(),
            serial: SerialConfig::default(),
            pins: PinConfig::default(),
            sensor: SensorConfig::default(),
        }
    }
}

impl ControllerConfig {
    pub fn from_json(raw: &[u8]) -> Result<Self, serde_json::Error> {
        let mut config: Self = serde_json::from_slice(raw)?;
        config.sanitize();
        Ok(config)
    }

    pub fn sanitize(&mut self) {
        self.timezone = self.timezone.trim().to_string();
        self.cadence.sanitize();
        self.serial.sanitize();

        if !self.sensor.simulated_base_f.is_finite() {
            self.sensor.simulated_base_f = SensorConfig::default().simulated_base_f;
        }
    }
}

impl CadenceConfig {
    pub fn sanitize(&mut self) {
        if self.tick_ms == 0 {
            self.tick_ms = 1_000;
        }
        self.window_ticks = self.window_ticks.max(1);
        self.temperature_ticks = self.temperature_ticks.min(self.window_ticks);
        self.telemetry_every_ticks = self.telemetry_every_ticks.max(1);
    }
}

impl SerialConfig {
    pub fn sanitize(&mut self) {
        if self.baud_rate == 0 {
            self.baud_rate = 115_200;
        }
        if !(5..=8).contains(&self.data_bits) {
            self.data_bits = 8;
        }
        if !(1..=2).contains(&self.stop_bits) {
            self.stop_bits = 1;
        }
        if self.timeout_ms == 0 {
            self.timeout_ms = 1_000;
        }
    }
}
