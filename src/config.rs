use config::{Config, ConfigError, Environment, File};
use oddspulse_models::PulseError;
use oddspulse_services::SchedulerConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub simulation: SimulationConfig,
    pub highlight: HighlightConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub interval_ms: u64,
    pub max_updates: u64,
    pub autostart: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightConfig {
    pub clear_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            // Start with default values
            .set_default("simulation.interval_ms", 3000)?
            .set_default("simulation.max_updates", 1000)?
            .set_default("simulation.autostart", true)?
            .set_default("highlight.clear_delay_ms", 2000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            // Add in settings from configuration file
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(File::with_name("config/local").required(false))
            // ODDSPULSE__SIMULATION__INTERVAL_MS=1500 and friends
            .add_source(
                Environment::with_prefix("ODDSPULSE")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Rejects settings the services cannot run with.
    pub fn validate(&self) -> Result<(), PulseError> {
        if self.simulation.interval_ms == 0 {
            return Err(PulseError::Config(
                "simulation.interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.simulation.max_updates == 0 {
            return Err(PulseError::Config(
                "simulation.max_updates must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            update_interval: Duration::from_millis(self.simulation.interval_ms),
            max_updates: self.simulation.max_updates,
        }
    }

    pub fn clear_delay(&self) -> Duration {
        Duration::from_millis(self.highlight.clear_delay_ms)
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
