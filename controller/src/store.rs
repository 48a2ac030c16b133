use std::{io::ErrorKind, path::PathBuf};

use anyhow::Context;
use thermostat_common::ControllerConfig;
use tracing::{info, warn};

const SIM_TEMP_ENV: &str = "THERMOSTAT_SIM_TEMP_F";

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Self {
        let path = std::env::var("THERMOSTAT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./.thermostat/controller.json"));
        Self::new(path)
    }

    pub async fn load_config(&self) -> anyhow::Result<ControllerConfig> {
        match tokio::fs::read(&self.path).await {
            Ok(raw) => ControllerConfig::from_json(&raw)
                .with_context(|| format!("invalid config at {}", self.path.display())),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("no config at {}, using defaults", self.path.display());
                Ok(ControllerConfig::default())
            }
            Err(err) => Err(err)
                .with_context(|| format!("failed to read config at {}", self.path.display())),
        }
    }

    /// Loads the config, falling back to defaults on any error, then applies
    /// environment overrides.
    pub async fn load_or_default(&self) -> ControllerConfig {
        self.load_with_overrides(|key| std::env::var(key).ok()).await
    }

    async fn load_with_overrides(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ControllerConfig {
        let mut config = self.load_config().await.unwrap_or_else(|err| {
            warn!("failed to load controller config: {err:#}");
            ControllerConfig::default()
        });
        apply_overrides(&mut config, lookup);
        config
    }
}

fn apply_overrides(config: &mut ControllerConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(temp) = lookup(SIM_TEMP_ENV)
        .and_then(|value| value.trim().parse::<f32>().ok())
        .filter(|value| value.is_finite())
    {
        config.sensor.simulated_base_f = temp;
    }
}
