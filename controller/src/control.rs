use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thermostat_common::{
    ActuatorOutput, ActuatorOutputs, Mode, PortError, StatusSnapshot, ThermostatEngine,
};
use tracing::{info, warn};

pub type BoxedActuator = Box<dyn ActuatorOutput + Send>;

pub struct Actuators {
    pub heat: BoxedActuator,
    pub cool: BoxedActuator,
}

/// Everything the input handlers and the status loop share: mode, set-point,
/// the cached sample and both indicator outputs.
///
/// The sensor itself lives outside, so no sensor I/O ever runs under the
/// shared lock.
pub struct ClimateControl {
    engine: ThermostatEngine,
    actuators: Actuators,
    last_temperature_f: Option<f32>,
}

impl ClimateControl {
    pub fn new(engine: ThermostatEngine, actuators: Actuators) -> Self {
        Self {
            engine,
            actuators,
            last_temperature_f: None,
        }
    }

    pub fn advance_mode(&mut self) -> Mode {
        let mode = self.engine.advance_mode();
        info!("entering {mode} mode");
        if mode == Mode::Off {
            self.apply(ActuatorOutputs::ALL_OFF);
        } else {
            self.refresh_actuators();
        }
        mode
    }

    pub fn raise_set_point(&mut self) -> i32 {
        let set_point = self.engine.raise_set_point();
        info!("raising set-point to {set_point}F");
        self.refresh_actuators();
        set_point
    }

    pub fn lower_set_point(&mut self) -> i32 {
        let set_point = self.engine.lower_set_point();
        info!("lowering set-point to {set_point}F");
        self.refresh_actuators();
        set_point
    }

    /// Stores a sensor reading taken outside the lock. A failed or
    /// non-finite reading keeps the previous sample.
    pub fn record_sample(&mut self, reading: Result<f32, PortError>) -> Option<f32> {
        match reading {
            Ok(temp) if temp.is_finite() => self.last_temperature_f = Some(temp),
            Ok(temp) => warn!("discarding non-finite temperature reading {temp}"),
            Err(err) => warn!("temperature read failed, using last sample: {err}"),
        }
        self.last_temperature_f
    }

    /// Recomputes both patterns from the cached sample and applies them.
    pub fn refresh_actuators(&mut self) -> ActuatorOutputs {
        let temperature_f = self.last_temperature_f;
        if temperature_f.is_none() && self.engine.mode() != Mode::Off {
            warn!("no temperature sample yet, holding both outputs off");
        }
        let outputs = self.engine.actuator_outputs(temperature_f);
        self.apply(outputs);
        outputs
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            mode: self.engine.mode(),
            set_point_f: self.engine.set_point_f(),
            temperature_f: self.last_temperature_f,
        }
    }

    pub fn shutdown_outputs(&mut self) {
        self.apply(ActuatorOutputs::ALL_OFF);
    }

    fn apply(&mut self, outputs: ActuatorOutputs) {
        if let Err(err) = self.actuators.heat.apply(outputs.heat) {
            warn!("failed to drive heat output {}: {err}", outputs.heat.as_str());
        }
        if let Err(err) = self.actuators.cool.apply(outputs.cool) {
            warn!("failed to drive cool output {}: {err}", outputs.cool.as_str());
        }
    }
}

/// Cloneable handle to the single lock guarding [`ClimateControl`].
///
/// Every mutation and its actuator refresh happen inside one `with` call, so
/// no caller can observe a mode change whose outputs were not yet applied.
#[derive(Clone)]
pub struct SharedControl {
    inner: Arc<Mutex<ClimateControl>>,
}

impl SharedControl {
    pub fn new(control: ClimateControl) -> Self {
        Self {
            inner: Arc::new(Mutex::new(control)),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut ClimateControl) -> R) -> R {
        let mut guard = self.lock();
        f(&mut guard)
    }

    fn lock(&self) -> MutexGuard<'_, ClimateControl> {
        // A panicking handler must not wedge the thermostat.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
