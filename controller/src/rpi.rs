use std::{
    io,
    thread,
    time::{Duration, Instant},
};

use anyhow::Context;
use rppal::{
    gpio::{Gpio, InputPin, OutputPin, Trigger},
    uart::{self, Uart},
};
use thermostat_common::{
    ActuatorOutput, ActuatorPattern, Parity, PinConfig, PortError, SerialConfig, TelemetryPort,
};
use tracing::{info, warn};

use crate::{
    aht20::Aht20,
    dispatch::{InputDispatcher, InputSource},
    hd44780::LcdDisplay,
    runtime::{self, Hardware},
    store::ConfigStore,
};

const BUTTON_DEBOUNCE: Duration = Duration::from_millis(50);
const PULSE_FREQUENCY_HZ: f64 = 1.0;
const PULSE_DUTY_CYCLE: f64 = 0.5;

pub async fn run() -> anyhow::Result<()> {
    runtime::init_tracing();

    let config = ConfigStore::from_env().load_or_default().await;
    let gpio = Gpio::new().context("failed to open gpio")?;

    let hardware = Hardware {
        sensor: Box::new(
            Aht20::new(config.sensor.i2c_address).context("failed to initialize AHT20 sensor")?,
        ),
        heat: Box::new(PwmLed::new(&gpio, config.pins.heat_led)?),
        cool: Box::new(PwmLed::new(&gpio, config.pins.cool_led)?),
        display: Box::new(
            LcdDisplay::new(&gpio, &config.pins.lcd).context("failed to initialize lcd")?,
        ),
        telemetry: Box::new(UartTelemetry::open(&config.serial)?),
    };

    let controller = runtime::start(&config, hardware)?;
    let buttons = match bind_buttons(&gpio, &config.pins, &controller.dispatcher()) {
        Ok(buttons) => buttons,
        Err(err) => {
            controller.stop(&config.cadence).await;
            return Err(err);
        }
    };

    let result = runtime::wait_for_termination().await;
    drop(buttons);
    controller.stop(&config.cadence).await;
    result
}

/// Button inputs with live interrupts. Dropping this clears them.
struct Buttons {
    _pins: Vec<InputPin>,
}

fn bind_buttons(
    gpio: &Gpio,
    pins: &PinConfig,
    dispatcher: &InputDispatcher,
) -> anyhow::Result<Buttons> {
    let bindings = [
        (InputSource::CycleMode, pins.mode_button),
        (InputSource::RaiseSetPoint, pins.raise_button),
        (InputSource::LowerSetPoint, pins.lower_button),
    ];

    let mut inputs = Vec::with_capacity(bindings.len());
    for (source, pin) in bindings {
        let mut input = gpio
            .get(pin)
            .with_context(|| format!("failed to get button gpio {pin}"))?
            .into_input_pullup();

        let mut callback = dispatcher.callback(source);
        let mut last_edge: Option<Instant> = None;
        input
            .set_async_interrupt(Trigger::FallingEdge, move |_level| {
                let now = Instant::now();
                if last_edge.is_some_and(|last| now.duration_since(last) < BUTTON_DEBOUNCE) {
                    return;
                }
                last_edge = Some(now);
                callback();
            })
            .with_context(|| format!("failed to watch button gpio {pin}"))?;

        info!("{} button on GPIO{pin}", source.as_str());
        inputs.push(input);
    }

    Ok(Buttons { _pins: inputs })
}

/// Indicator LED. Pulsing is a software-PWM blink; asking for the pattern
/// already showing leaves the pin alone so the blink is not restarted.
pub struct PwmLed {
    pin: OutputPin,
    pattern: Option<ActuatorPattern>,
}

impl PwmLed {
    pub fn new(gpio: &Gpio, pin: u8) -> anyhow::Result<Self> {
        let pin = gpio
            .get(pin)
            .with_context(|| format!("failed to get led gpio {pin}"))?
            .into_output_low();
        Ok(Self { pin, pattern: None })
    }

    fn drive(&mut self, pattern: ActuatorPattern) -> Result<(), PortError> {
        if self.pattern == Some(pattern) {
            return Ok(());
        }
        match pattern {
            ActuatorPattern::Off => {
                self.pin.clear_pwm().map_err(io_err)?;
                self.pin.set_low();
            }
            ActuatorPattern::Steady => {
                self.pin.clear_pwm().map_err(io_err)?;
                self.pin.set_high();
            }
            ActuatorPattern::Pulsing => {
                self.pin
                    .set_pwm_frequency(PULSE_FREQUENCY_HZ, PULSE_DUTY_CYCLE)
                    .map_err(io_err)?;
            }
        }
        self.pattern = Some(pattern);
        Ok(())
    }
}

impl ActuatorOutput for PwmLed {
    fn set_off(&mut self) -> Result<(), PortError> {
        self.drive(ActuatorPattern::Off)
    }

    fn set_steady(&mut self) -> Result<(), PortError> {
        self.drive(ActuatorPattern::Steady)
    }

    fn set_pulsing(&mut self) -> Result<(), PortError> {
        self.drive(ActuatorPattern::Pulsing)
    }
}

pub struct UartTelemetry {
    uart: Uart,
    timeout: Duration,
}

impl UartTelemetry {
    pub fn open(serial: &SerialConfig) -> anyhow::Result<Self> {
        let parity = match serial.parity {
            Parity::None => uart::Parity::None,
            Parity::Even => uart::Parity::Even,
            Parity::Odd => uart::Parity::Odd,
        };
        let timeout = Duration::from_millis(serial.timeout_ms);

        let mut uart = Uart::with_path(
            &serial.path,
            serial.baud_rate,
            parity,
            serial.data_bits,
            serial.stop_bits,
        )
        .with_context(|| format!("failed to open uart {}", serial.path))?;
        uart.set_write_mode(false)
            .context("failed to set uart write mode")?;
        uart.set_read_mode(0, timeout)
            .context("failed to set uart read timeout")?;

        info!(
            "telemetry on {} at {} baud, {}{}{}",
            serial.path,
            serial.baud_rate,
            serial.data_bits,
            parity_letter(serial.parity),
            serial.stop_bits
        );
        Ok(Self { uart, timeout })
    }
}

impl TelemetryPort for UartTelemetry {
    fn send_line(&mut self, data: &[u8]) -> Result<(), PortError> {
        let deadline = Instant::now() + self.timeout;
        let mut written = 0;
        while written < data.len() {
            written += self.uart.write(&data[written..]).map_err(io_err)?;
            if written < data.len() {
                if Instant::now() >= deadline {
                    warn!("uart wrote {written} of {} bytes before timeout", data.len());
                    return Err(PortError::Timeout);
                }
                thread::sleep(Duration::from_millis(1));
            }
        }
        Ok(())
    }
}

fn parity_letter(parity: Parity) -> char {
    match parity {
        Parity::None => 'N',
        Parity::Even => 'E',
        Parity::Odd => 'O',
    }
}

fn io_err(err: impl std::fmt::Display) -> PortError {
    PortError::Io(io::Error::other(err.to_string()))
}
