//! 16x2 HD44780 character LCD driven in 4-bit mode over six GPIO lines.

use std::{thread::sleep, time::Duration};

use rppal::gpio::{Gpio, Level, OutputPin};
use thermostat_common::{status::fit_line, DisplayPort, LcdPins, PortError};
use tracing::info;

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE: u8 = 0x06;
const CMD_DISPLAY_ON: u8 = 0x0c;
const CMD_FUNCTION_4BIT_2LINE: u8 = 0x28;
const LINE_ADDRESS: [u8; 2] = [0x80, 0xc0];

const ENABLE_PULSE: Duration = Duration::from_micros(1);
const COMMAND_SETTLE: Duration = Duration::from_micros(50);
const CLEAR_SETTLE: Duration = Duration::from_millis(2);

pub struct Hd44780 {
    rs: OutputPin,
    en: OutputPin,
    data: [OutputPin; 4],
}

impl Hd44780 {
    pub fn new(gpio: &Gpio, pins: &LcdPins) -> Result<Self, rppal::gpio::Error> {
        let output = |pin: u8| gpio.get(pin).map(|pin| pin.into_output_low());
        let mut lcd = Self {
            rs: output(pins.rs)?,
            en: output(pins.en)?,
            data: [
                output(pins.d4)?,
                output(pins.d5)?,
                output(pins.d6)?,
                output(pins.d7)?,
            ],
        };
        lcd.init();
        Ok(lcd)
    }

    fn init(&mut self) {
        // Force 8-bit mode three times, then drop to 4-bit.
        for delay in [Duration::from_millis(5), COMMAND_SETTLE, COMMAND_SETTLE] {
            self.write_nibble(0x03);
            sleep(delay);
        }
        self.write_nibble(0x02);
        sleep(COMMAND_SETTLE);

        self.command(CMD_FUNCTION_4BIT_2LINE);
        self.command(CMD_DISPLAY_ON);
        self.command(CMD_ENTRY_MODE);
        self.clear();
    }

    pub fn clear(&mut self) {
        self.command(CMD_CLEAR);
        sleep(CLEAR_SETTLE);
    }

    pub fn write_line(&mut self, row: usize, text: &str) {
        self.command(LINE_ADDRESS[row % LINE_ADDRESS.len()]);
        for ch in fit_line(text).chars() {
            let byte = if ch.is_ascii() { ch as u8 } else { b'?' };
            self.send(byte, Level::High);
        }
    }

    fn command(&mut self, byte: u8) {
        self.send(byte, Level::Low);
    }

    fn send(&mut self, byte: u8, register: Level) {
        self.rs.write(register);
        self.write_nibble(byte >> 4);
        self.write_nibble(byte & 0x0f);
    }

    fn write_nibble(&mut self, nibble: u8) {
        for (bit, pin) in self.data.iter_mut().enumerate() {
            if nibble & (1 << bit) != 0 {
                pin.set_high();
            } else {
                pin.set_low();
            }
        }
        self.en.set_high();
        sleep(ENABLE_PULSE);
        self.en.set_low();
        sleep(COMMAND_SETTLE);
    }

    fn release(mut self) {
        self.clear();
        self.rs.set_low();
        for pin in &mut self.data {
            pin.set_low();
        }
    }
}

/// Display port over the LCD. Shutdown clears the glass and hands the pins
/// back; later renders fail.
pub struct LcdDisplay {
    lcd: Option<Hd44780>,
}

impl LcdDisplay {
    pub fn new(gpio: &Gpio, pins: &LcdPins) -> Result<Self, rppal::gpio::Error> {
        Ok(Self {
            lcd: Some(Hd44780::new(gpio, pins)?),
        })
    }
}

impl DisplayPort for LcdDisplay {
    fn render(&mut self, line1: &str, line2: &str) -> Result<(), PortError> {
        let lcd = self.lcd.as_mut().ok_or(PortError::Closed)?;
        lcd.write_line(0, line1);
        lcd.write_line(1, line2);
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), PortError> {
        if let Some(lcd) = self.lcd.take() {
            lcd.release();
            info!("lcd cleared and pins released");
        }
        Ok(())
    }
}
