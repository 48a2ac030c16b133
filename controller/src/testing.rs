//! Recording port doubles shared by the controller's unit tests.

use std::{
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use thermostat_common::{
    ActuatorOutput, ActuatorPattern, DisplayPort, PortError, SensorPort, TelemetryPort,
};

#[derive(Debug, Default)]
struct SensorState {
    temperature_f: f32,
    fail_next: bool,
    reads: usize,
    delay: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct MockSensor {
    state: Arc<Mutex<SensorState>>,
}

impl MockSensor {
    pub fn new(temperature_f: f32) -> Self {
        let sensor = Self::default();
        sensor.set(temperature_f);
        sensor
    }

    pub fn set(&self, temperature_f: f32) {
        self.state.lock().unwrap().temperature_f = temperature_f;
    }

    pub fn fail_next(&self) {
        self.state.lock().unwrap().fail_next = true;
    }

    /// Makes every later read block for `delay`, like a sensor that needs a
    /// conversion wait.
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    pub fn reads(&self) -> usize {
        self.state.lock().unwrap().reads
    }
}

impl SensorPort for MockSensor {
    fn read_temperature_f(&mut self) -> Result<f32, PortError> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.reads += 1;
            state.delay
        };
        if let Some(delay) = delay {
            thread::sleep(delay);
        }

        let mut state = self.state.lock().unwrap();
        if std::mem::take(&mut state.fail_next) {
            return Err(PortError::Sensor("simulated failure".to_string()));
        }
        Ok(state.temperature_f)
    }
}

#[derive(Debug, Default)]
struct ActuatorState {
    history: Vec<ActuatorPattern>,
    fail_writes: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MockActuator {
    state: Arc<Mutex<ActuatorState>>,
}

impl MockActuator {
    pub fn current(&self) -> ActuatorPattern {
        self.state
            .lock()
            .unwrap()
            .history
            .last()
            .copied()
            .unwrap_or_default()
    }

    pub fn history(&self) -> Vec<ActuatorPattern> {
        self.state.lock().unwrap().history.clone()
    }

    pub fn fail_writes(&self) {
        self.state.lock().unwrap().fail_writes = true;
    }

    fn record(&self, pattern: ActuatorPattern) -> Result<(), PortError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(PortError::Closed);
        }
        state.history.push(pattern);
        Ok(())
    }
}

impl ActuatorOutput for MockActuator {
    fn set_off(&mut self) -> Result<(), PortError> {
        self.record(ActuatorPattern::Off)
    }

    fn set_steady(&mut self) -> Result<(), PortError> {
        self.record(ActuatorPattern::Steady)
    }

    fn set_pulsing(&mut self) -> Result<(), PortError> {
        self.record(ActuatorPattern::Pulsing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayCall {
    Render(String, String),
    Shutdown,
}

#[derive(Debug, Default)]
struct DisplayState {
    calls: Vec<DisplayCall>,
    fail_renders: usize,
    closed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MockDisplay {
    state: Arc<Mutex<DisplayState>>,
}

impl MockDisplay {
    pub fn calls(&self) -> Vec<DisplayCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn renders(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DisplayCall::Render(line1, line2) => Some((line1, line2)),
                DisplayCall::Shutdown => None,
            })
            .collect()
    }

    pub fn shutdowns(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| **call == DisplayCall::Shutdown)
            .count()
    }

    pub fn fail_renders(&self, count: usize) {
        self.state.lock().unwrap().fail_renders = count;
    }
}

impl DisplayPort for MockDisplay {
    fn render(&mut self, line1: &str, line2: &str) -> Result<(), PortError> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(PortError::Closed);
        }
        if state.fail_renders > 0 {
            state.fail_renders -= 1;
            return Err(PortError::Timeout);
        }
        state
            .calls
            .push(DisplayCall::Render(line1.to_string(), line2.to_string()));
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        state.calls.push(DisplayCall::Shutdown);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct TelemetryState {
    lines: Vec<String>,
    fail_next: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MockTelemetry {
    state: Arc<Mutex<TelemetryState>>,
}

impl MockTelemetry {
    pub fn lines(&self) -> Vec<String> {
        self.state.lock().unwrap().lines.clone()
    }

    pub fn fail_next(&self) {
        self.state.lock().unwrap().fail_next = true;
    }
}

impl TelemetryPort for MockTelemetry {
    fn send_line(&mut self, data: &[u8]) -> Result<(), PortError> {
        let mut state = self.state.lock().unwrap();
        if std::mem::take(&mut state.fail_next) {
            return Err(PortError::Timeout);
        }
        state
            .lines
            .push(String::from_utf8_lossy(data).into_owned());
        Ok(())
    }
}
