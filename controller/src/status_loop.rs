use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use thermostat_common::{
    CadenceConfig, DisplayPort, PortError, SensorPort, StatusCadence, TelemetryPort,
    TelemetryRecord,
};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::{clock::DisplayClock, control::SharedControl};

pub type BoxedSensor = Box<dyn SensorPort + Send>;
pub type BoxedDisplay = Box<dyn DisplayPort + Send>;
pub type BoxedTelemetry = Box<dyn TelemetryPort + Send>;

/// Cooperative stop signal, checked at the top of every status-loop tick.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Owns the display and shuts it down exactly once, on whichever exit path
/// drops it first.
struct DisplayGuard {
    display: Option<BoxedDisplay>,
}

impl DisplayGuard {
    fn new(display: BoxedDisplay) -> Self {
        Self {
            display: Some(display),
        }
    }

    fn render(&mut self, line1: &str, line2: &str) -> Result<(), PortError> {
        match self.display.as_mut() {
            Some(display) => display.render(line1, line2),
            None => Err(PortError::Closed),
        }
    }

    fn release(&mut self) {
        let Some(mut display) = self.display.take() else {
            return;
        };
        match display.shutdown() {
            Ok(()) => info!("display released"),
            Err(err) => warn!("display shutdown failed: {err}"),
        }
    }
}

impl Drop for DisplayGuard {
    fn drop(&mut self) {
        self.release();
    }
}

pub struct StatusLoop {
    control: SharedControl,
    sensor: BoxedSensor,
    display: DisplayGuard,
    telemetry: BoxedTelemetry,
    clock: DisplayClock,
    cadence: StatusCadence,
    period: Duration,
}

impl StatusLoop {
    pub fn new(
        control: SharedControl,
        sensor: BoxedSensor,
        display: BoxedDisplay,
        telemetry: BoxedTelemetry,
        clock: DisplayClock,
        config: &CadenceConfig,
    ) -> Self {
        Self {
            control,
            sensor,
            display: DisplayGuard::new(display),
            telemetry,
            clock,
            cadence: StatusCadence::new(config.clone()),
            period: Duration::from_millis(config.tick_ms),
        }
    }

    /// Starts the loop on its own named thread.
    pub fn spawn(self, shutdown: ShutdownFlag) -> std::io::Result<StatusTask> {
        let (finished_tx, finished) = oneshot::channel();
        let thread = thread::Builder::new()
            .name("status-loop".into())
            .spawn(move || {
                self.run(&shutdown);
                let _ = finished_tx.send(());
            })?;
        Ok(StatusTask { thread, finished })
    }

    pub fn run(mut self, shutdown: &ShutdownFlag) {
        info!("status loop started ({}ms tick)", self.period.as_millis());

        while !shutdown.is_set() {
            let started = Instant::now();
            self.tick();
            thread::sleep(self.period.saturating_sub(started.elapsed()));
        }

        self.display.release();
        info!("status loop stopped");
    }

    /// One pass: sample, render, and on their cadences refresh actuators and
    /// send telemetry. Every failure is logged and left for the next tick.
    ///
    /// The sensor is read before the shared lock is taken; input handlers
    /// never wait on sensor I/O.
    pub fn tick(&mut self) {
        let plan = self.cadence.next_tick();
        let reading = self.sensor.read_temperature_f();

        let snapshot = self.control.with(|control| {
            control.record_sample(reading);
            if plan.refresh_actuators {
                let outputs = control.refresh_actuators();
                debug!(
                    "periodic refresh: heat={} cool={}",
                    outputs.heat.as_str(),
                    outputs.cool.as_str()
                );
            }
            control.snapshot()
        });

        let frame = self.clock.frame(plan.second_line, &snapshot);
        debug!("lcd [{}] [{}]", frame.line1, frame.line2);
        if let Err(err) = self.display.render(&frame.line1, &frame.line2) {
            warn!("display render failed: {err}");
        }

        if !plan.send_telemetry {
            return;
        }

        let Some(record) = TelemetryRecord::from_snapshot(&snapshot) else {
            warn!("skipping telemetry, no temperature sample yet");
            return;
        };
        let line = record.to_line();
        debug!("telemetry {}", line.trim_end());
        if let Err(err) = self.telemetry.send_line(line.as_bytes()) {
            warn!("telemetry send failed: {err}");
        }
    }
}

pub struct StatusTask {
    thread: thread::JoinHandle<()>,
    finished: oneshot::Receiver<()>,
}

impl StatusTask {
    /// Waits up to `grace` for the loop thread to finish. Returns `false` if
    /// it is still running when the grace period runs out.
    pub async fn wait(self, grace: Duration) -> bool {
        // A panicking loop drops the sender, which also ends the wait.
        if tokio::time::timeout(grace, self.finished).await.is_err() {
            return false;
        }
        if self.thread.join().is_err() {
            warn!("status loop thread panicked");
        }
        true
    }

    #[cfg(test)]
    pub fn join(self) -> thread::Result<()> {
        self.thread.join()
    }
}
