//! AHT20 temperature/humidity sensor on the Pi's I2C bus.

use std::{thread::sleep, time::Duration};

use rppal::i2c::I2c;
use thermostat_common::{celsius_to_fahrenheit, PortError, SensorPort};
use tracing::{debug, info};

const CMD_CALIBRATE: [u8; 3] = [0xbe, 0x08, 0x00];
const CMD_MEASURE: [u8; 3] = [0xac, 0x33, 0x00];

const STATUS_BUSY: u8 = 0x80;
const STATUS_CALIBRATED: u8 = 0x08;

const POWER_ON_DELAY: Duration = Duration::from_millis(40);
const MEASURE_DELAY: Duration = Duration::from_millis(80);
const BUSY_RETRY_DELAY: Duration = Duration::from_millis(10);
const BUSY_RETRIES: usize = 5;

pub struct Aht20 {
    i2c: I2c,
}

impl Aht20 {
    pub fn new(address: u16) -> Result<Self, PortError> {
        let mut i2c = I2c::new().map_err(sensor_err)?;
        i2c.set_slave_address(address).map_err(sensor_err)?;
        sleep(POWER_ON_DELAY);

        let mut sensor = Self { i2c };
        if sensor.status()? & STATUS_CALIBRATED == 0 {
            info!("calibrating AHT20 at {address:#04x}");
            sensor.i2c.write(&CMD_CALIBRATE).map_err(sensor_err)?;
            sleep(BUSY_RETRY_DELAY);
        }
        Ok(sensor)
    }

    fn status(&mut self) -> Result<u8, PortError> {
        let mut status = [0u8; 1];
        self.i2c.read(&mut status).map_err(sensor_err)?;
        Ok(status[0])
    }

    pub fn read_celsius(&mut self) -> Result<f32, PortError> {
        self.i2c.write(&CMD_MEASURE).map_err(sensor_err)?;
        sleep(MEASURE_DELAY);

        let mut frame = [0u8; 6];
        for _ in 0..BUSY_RETRIES {
            self.i2c.read(&mut frame).map_err(sensor_err)?;
            if frame[0] & STATUS_BUSY == 0 {
                let temp_c = decode_temperature_c(&frame);
                debug!("AHT20 raw frame {frame:02x?} -> {temp_c:.2}C");
                return Ok(temp_c);
            }
            sleep(BUSY_RETRY_DELAY);
        }
        Err(PortError::Timeout)
    }
}

impl SensorPort for Aht20 {
    fn read_temperature_f(&mut self) -> Result<f32, PortError> {
        self.read_celsius().map(celsius_to_fahrenheit)
    }
}

/// Temperature is the low nibble of byte 3 plus bytes 4 and 5, scaled
/// from 2^20 steps onto -50..150 C.
pub fn decode_temperature_c(frame: &[u8; 6]) -> f32 {
    let raw = ((u32::from(frame[3]) & 0x0f) << 16) | (u32::from(frame[4]) << 8) | u32::from(frame[5]);
    raw as f32 / 1_048_576.0 * 200.0 - 50.0
}

fn sensor_err(err: rppal::i2c::Error) -> PortError {
    PortError::Sensor(err.to_string())
}
