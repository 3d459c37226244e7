//! Configuration - Type-safe, validated config

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,

    /// Aggregation engine tunables
    pub engine: EngineSection,

    /// Price sources for the demo binary
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log level
    pub log_level: String,

    /// Instrument to aggregate
    pub instrument: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSection {
    /// Seconds between combined price evaluations
    pub evaluation_period_secs: u64,

    /// Maximum observation age (seconds) still eligible for any weight
    pub staleness_horizon_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source name (tags every tick it produces)
    pub name: String,

    /// Enable this source
    pub enabled: bool,
}

/// Engine tunables in the form the engine consumes.
///
/// Defaults to a 2s evaluation period with a 10s staleness horizon; the
/// 5x ratio degrades smoothly but is not enforced.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Time between combined price emissions
    pub evaluation_period: Duration,

    /// Maximum observation age eligible for nonzero weight
    pub staleness_horizon: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            evaluation_period: Duration::from_secs(2),
            staleness_horizon: Duration::from_secs(10),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig {
                log_level: "info".to_string(),
                instrument: "BTC_USD".to_string(),
            },
            engine: EngineSection {
                evaluation_period_secs: 2,
                staleness_horizon_secs: 10,
            },
            sources: vec![],
        }
    }
}

impl Config {
    /// Load from TOML file
    pub fn load(path: &PathBuf) -> crate::core::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::core::Error::Config(format!("Failed to read config: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| crate::core::Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Engine tunables as durations
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            evaluation_period: Duration::from_secs(self.engine.evaluation_period_secs),
            staleness_horizon: Duration::from_secs(self.engine.staleness_horizon_secs),
        }
    }
}
