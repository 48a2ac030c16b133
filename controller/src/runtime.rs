use std::time::Duration;

use anyhow::Context;
use thermostat_common::{CadenceConfig, ControllerConfig, ThermostatEngine};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    clock::DisplayClock,
    control::{Actuators, BoxedActuator, ClimateControl, SharedControl},
    dispatch::InputDispatcher,
    status_loop::{BoxedDisplay, BoxedSensor, BoxedTelemetry, ShutdownFlag, StatusLoop, StatusTask},
};

const DEFAULT_LOG_FILTER: &str = "info";

/// Owned hardware handles, built once by the platform entry point.
pub struct Hardware {
    pub sensor: BoxedSensor,
    pub heat: BoxedActuator,
    pub cool: BoxedActuator,
    pub display: BoxedDisplay,
    pub telemetry: BoxedTelemetry,
}

/// Handle to a started controller. Dropping it without [`stop`] still
/// signals the status loop and turns both outputs off.
///
/// [`stop`]: RunningController::stop
pub struct RunningController {
    control: SharedControl,
    dispatcher: InputDispatcher,
    shutdown: ShutdownFlag,
    status: Option<StatusTask>,
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok()))
        .init();
}

/// `RUST_LOG` when set and valid, otherwise `info`.
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

pub fn start(config: &ControllerConfig, hardware: Hardware) -> anyhow::Result<RunningController> {
    let Hardware {
        sensor,
        heat,
        cool,
        display,
        telemetry,
    } = hardware;

    let engine = ThermostatEngine::new(config.initial_set_point_f);
    let control = SharedControl::new(ClimateControl::new(engine, Actuators { heat, cool }));
    control.with(|control| control.shutdown_outputs());

    let dispatcher = InputDispatcher::new(control.clone());
    let shutdown = ShutdownFlag::new();
    let status = StatusLoop::new(
        control.clone(),
        sensor,
        display,
        telemetry,
        DisplayClock::from_timezone(&config.timezone),
        &config.cadence,
    )
    .spawn(shutdown.clone())
    .context("failed to spawn status loop thread")?;

    info!(
        "controller started in off mode, set-point {}F",
        config.initial_set_point_f
    );

    Ok(RunningController {
        control,
        dispatcher,
        shutdown,
        status: Some(status),
    })
}

impl RunningController {
    pub fn dispatcher(&self) -> InputDispatcher {
        self.dispatcher.clone()
    }

    /// Signals the status loop, gives it one grace period to release the
    /// display, then turns both outputs off.
    pub async fn stop(mut self, cadence: &CadenceConfig) {
        info!("shutting down");
        self.shutdown.signal();

        let grace = Duration::from_millis(cadence.shutdown_grace_ms + cadence.tick_ms);
        if let Some(status) = self.status.take() {
            if !status.wait(grace).await {
                warn!("status loop still running after {grace:?}, exiting anyway");
            }
        }

        self.control.with(|control| control.shutdown_outputs());
        info!("controller stopped");
    }
}

impl Drop for RunningController {
    fn drop(&mut self) {
        if self.status.is_none() {
            return;
        }
        warn!("controller dropped without stop, signalling status loop");
        self.shutdown.signal();
        self.control.with(|control| control.shutdown_outputs());
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn wait_for_termination() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate =
            signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.context("failed to wait for Ctrl-C")?,
            _ = terminate.recv() => info!("received SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("failed to wait for Ctrl-C")?;
    }

    Ok(())
}
