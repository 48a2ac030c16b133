use std::{
    f32::consts::TAU,
    fs::OpenOptions,
    io::{self, BufRead, Write},
    thread,
    time::Instant,
};

use anyhow::Context;
use thermostat_common::{
    status::fit_line, ActuatorOutput, ActuatorPattern, DisplayPort, PortError, SensorConfig,
    SensorPort, TelemetryPort,
};
use tracing::{info, warn};

use crate::{
    dispatch::{InputDispatcher, InputSource},
    runtime::{self, Hardware},
    store::ConfigStore,
};

const SERIAL_ENV: &str = "THERMOSTAT_SERIAL";
const DRIFT_AMPLITUDE_F: f32 = 4.0;
const DRIFT_PERIOD_SECS: f32 = 600.0;

pub async fn run() -> anyhow::Result<()> {
    runtime::init_tracing();

    let config = ConfigStore::from_env().load_or_default().await;
    let hardware = Hardware {
        sensor: Box::new(SimulatedSensor::new(&config.sensor)),
        heat: Box::new(LoggingActuator::new("heat")),
        cool: Box::new(LoggingActuator::new("cool")),
        display: Box::new(ConsoleDisplay::default()),
        telemetry: Box::new(LineTelemetry::open(
            std::env::var(SERIAL_ENV).ok().as_deref(),
        )),
    };

    let controller = runtime::start(&config, hardware)?;
    if let Err(err) = spawn_console_input(controller.dispatcher()) {
        controller.stop(&config.cadence).await;
        return Err(err);
    }
    info!("host controller running; enter m (mode), + (raise) or - (lower)");

    let result = runtime::wait_for_termination().await;
    controller.stop(&config.cadence).await;
    result
}

/// Reads console lines on a dedicated thread and dispatches them, the same
/// way a GPIO interrupt thread would.
fn spawn_console_input(dispatcher: InputDispatcher) -> anyhow::Result<()> {
    thread::Builder::new()
        .name("console-input".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        warn!("console input closed: {err}");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match InputSource::from_command(&line) {
                    Some(source) => dispatcher.dispatch(source),
                    None => warn!("unknown command {:?}", line.trim()),
                }
            }
        })
        .context("failed to spawn console input thread")?;
    Ok(())
}

/// Base temperature with a slow sinusoidal drift, so the periodic actuator
/// refresh has something to react to.
pub struct SimulatedSensor {
    base_f: f32,
    started: Instant,
}

impl SimulatedSensor {
    pub fn new(config: &SensorConfig) -> Self {
        Self {
            base_f: config.simulated_base_f,
            started: Instant::now(),
        }
    }

    fn at(&self, elapsed_secs: f32) -> f32 {
        let phase = (elapsed_secs / DRIFT_PERIOD_SECS) * TAU;
        self.base_f + DRIFT_AMPLITUDE_F * phase.sin()
    }
}

impl SensorPort for SimulatedSensor {
    fn read_temperature_f(&mut self) -> Result<f32, PortError> {
        Ok(self.at(self.started.elapsed().as_secs_f32()))
    }
}

#[derive(Debug, Default)]
pub struct ConsoleDisplay {
    last: Option<(String, String)>,
    closed: bool,
}

impl DisplayPort for ConsoleDisplay {
    fn render(&mut self, line1: &str, line2: &str) -> Result<(), PortError> {
        if self.closed {
            return Err(PortError::Closed);
        }
        let frame = (fit_line(line1), fit_line(line2));
        if self.last.as_ref() != Some(&frame) {
            info!("lcd |{}|{}|", frame.0, frame.1);
            self.last = Some(frame);
        }
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), PortError> {
        self.closed = true;
        self.last = None;
        info!("lcd cleared");
        Ok(())
    }
}

/// Path to append telemetry to, or `None` for stdout. Host runs only touch a
/// device node or file when `THERMOSTAT_SERIAL` names one; `-` means stdout.
fn telemetry_target(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|path| !path.is_empty() && *path != "-")
}

/// Writes telemetry lines to a serial device node or file, or to stdout.
pub struct LineTelemetry {
    writer: Box<dyn Write + Send>,
}

impl LineTelemetry {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self { writer }
    }

    pub fn open(target: Option<&str>) -> Self {
        let Some(path) = telemetry_target(target) else {
            return Self::new(Box::new(io::stdout()));
        };
        match OpenOptions::new().append(true).open(path) {
            Ok(file) => {
                info!("telemetry writing to {path}");
                Self::new(Box::new(file))
            }
            Err(err) => {
                warn!("cannot open telemetry target {path} ({err}), writing to stdout");
                Self::new(Box::new(io::stdout()))
            }
        }
    }
}

impl TelemetryPort for LineTelemetry {
    fn send_line(&mut self, data: &[u8]) -> Result<(), PortError> {
        self.writer.write_all(data)?;
        self.writer.flush()?;
        Ok(())
    }
}

pub struct LoggingActuator {
    name: &'static str,
    pattern: Option<ActuatorPattern>,
}

impl LoggingActuator {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            pattern: None,
        }
    }

    fn show(&mut self, pattern: ActuatorPattern) -> Result<(), PortError> {
        if self.pattern != Some(pattern) {
            info!("{} output -> {}", self.name, pattern.as_str());
            self.pattern = Some(pattern);
        }
        Ok(())
    }
}

impl ActuatorOutput for LoggingActuator {
    fn set_off(&mut self) -> Result<(), PortError> {
        self.show(ActuatorPattern::Off)
    }

    fn set_steady(&mut self) -> Result<(), PortError> {
        self.show(ActuatorPattern::Steady)
    }

    fn set_pulsing(&mut self) -> Result<(), PortError> {
        self.show(ActuatorPattern::Pulsing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn simulated_sensor_drifts_around_base() {
        let sensor = SimulatedSensor::new(&SensorConfig {
            simulated_base_f: 70.0,
            ..SensorConfig::default()
        });

        assert_eq!(sensor.at(0.0), 70.0);
        assert!((sensor.at(DRIFT_PERIOD_SECS / 4.0) - 74.0).abs() < 1e-3);
        assert!((sensor.at(DRIFT_PERIOD_SECS * 0.75) - 66.0).abs() < 1e-3);
    }

    #[test]
    fn console_display_refuses_writes_after_shutdown() {
        let mut display = ConsoleDisplay::default();
        display.render("03/07 09:05", "Temp: 70.0F").unwrap();
        display.shutdown().unwrap();

        assert!(matches!(
            display.render("03/07 09:06", "OFF 72F"),
            Err(PortError::Closed)
        ));
    }

    #[test]
    fn telemetry_writes_exact_bytes() {
        let buffer = SharedBuffer::default();
        let mut telemetry = LineTelemetry::new(Box::new(buffer.clone()));

        telemetry.send_line(b"heat,65.0,75\n").unwrap();
        telemetry.send_line(b"heat,65.2,75\n").unwrap();

        assert_eq!(
            buffer.0.lock().unwrap().as_slice(),
            b"heat,65.0,75\nheat,65.2,75\n"
        );
    }

    #[test]
    fn telemetry_defaults_to_stdout() {
        assert_eq!(telemetry_target(None), None);
        assert_eq!(telemetry_target(Some("-")), None);
        assert_eq!(telemetry_target(Some("  ")), None);
        assert_eq!(telemetry_target(Some(" /tmp/telemetry.log ")), Some("/tmp/telemetry.log"));
    }

    #[test]
    fn telemetry_appends_to_named_file() {
        let path = std::env::temp_dir().join(format!(
            "thermostat-telemetry-{}.log",
            std::process::id()
        ));
        std::fs::write(&path, b"cool,70.0,70\n").unwrap();

        let mut telemetry = LineTelemetry::open(path.to_str());
        telemetry.send_line(b"heat,65.0,75\n").unwrap();
        let written = std::fs::read(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(written, b"cool,70.0,70\nheat,65.0,75\n");
    }

    #[test]
    fn logging_actuator_tracks_pattern() {
        let mut actuator = LoggingActuator::new("heat");
        actuator.apply(ActuatorPattern::Pulsing).unwrap();
        actuator.apply(ActuatorPattern::Pulsing).unwrap();
        assert_eq!(actuator.pattern, Some(ActuatorPattern::Pulsing));

        actuator.set_off().unwrap();
        assert_eq!(actuator.pattern, Some(ActuatorPattern::Off));
    }
}
