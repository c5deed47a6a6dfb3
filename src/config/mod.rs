//! Agent configuration loaded from a TOML file
//!
//! Every section and field is optional; anything left out takes the built-in
//! default. The loaded configuration is validated before use.

use crate::analysis::{AnomalyClassifier, ThresholdTable};
use crate::error::ConfigError;
use crate::signals::SignalType;
use crate::sources::noaa::{PLANETARY_INDEX_URL, RADIATION_URL, SOLAR_WIND_URL};
use crate::window::DEFAULT_WINDOW_CAPACITY;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Complete agent configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub agent: AgentConfig,
    pub collector: CollectorConfig,
    pub sources: SourcesConfig,
    pub thresholds: ThresholdsConfig,
}

/// Ingestion loop settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    /// Delay between ticks
    pub poll_interval_seconds: u64,
    /// Samples kept per signal
    pub window_capacity: usize,
    pub model_version: String,
    /// Producer tag attached to published readings
    pub source_tag: String,
    /// Signals to sample, in processing order
    pub signals: Vec<SignalType>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 30,
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            model_version: "1.2.0".to_string(),
            source_tag: "skywatch".to_string(),
            signals: SignalType::ALL.to_vec(),
        }
    }
}

/// Which sink implementation receives published records
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CollectorBackend {
    /// POST to the collector's REST API
    #[default]
    Http,
    /// Log records locally, publish nowhere
    Mock,
}

/// Downstream collector settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CollectorConfig {
    pub backend: CollectorBackend,
    /// Base URL, e.g. "http://localhost:5000"
    pub endpoint: String,
    /// Per-publish timeout
    pub timeout_seconds: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            backend: CollectorBackend::Http,
            endpoint: "http://localhost:5000".to_string(),
            timeout_seconds: 5,
        }
    }
}

/// Upstream feed settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourcesConfig {
    /// Per-fetch timeout
    pub timeout_seconds: u64,
    pub solar_wind_url: String,
    pub radiation_url: String,
    pub planetary_index_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            solar_wind_url: SOLAR_WIND_URL.to_string(),
            radiation_url: RADIATION_URL.to_string(),
            planetary_index_url: PLANETARY_INDEX_URL.to_string(),
        }
    }
}

impl SourcesConfig {
    pub fn url_for(&self, signal: SignalType) -> &str {
        match signal {
            SignalType::SolarWind => &self.solar_wind_url,
            SignalType::Radiation => &self.radiation_url,
            SignalType::PlanetaryIndex => &self.planetary_index_url,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Anomaly threshold table per signal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThresholdsConfig {
    pub solar_wind: ThresholdTable,
    pub radiation: ThresholdTable,
    #[serde(rename = "weather", alias = "planetary_index")]
    pub planetary_index: ThresholdTable,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            solar_wind: ThresholdTable::solar_wind(),
            radiation: ThresholdTable::radiation(),
            planetary_index: ThresholdTable::planetary_index(),
        }
    }
}

impl ThresholdsConfig {
    pub fn table_for(&self, signal: SignalType) -> &ThresholdTable {
        match signal {
            SignalType::SolarWind => &self.solar_wind,
            SignalType::Radiation => &self.radiation,
            SignalType::PlanetaryIndex => &self.planetary_index,
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file
    ///
    /// # Errors
    ///
    /// `ConfigError::ReadError` if the file cannot be read, `TomlError` if it
    /// does not parse, `ValidationError` if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        let agent = &self.agent;
        if agent.poll_interval_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "agent.poll_interval_seconds must be greater than 0".to_string(),
            ));
        }
        if agent.window_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "agent.window_capacity must be greater than 0".to_string(),
            ));
        }
        if agent.model_version.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "agent.model_version must not be empty".to_string(),
            ));
        }
        if agent.signals.is_empty() {
            return Err(ConfigError::ValidationError(
                "agent.signals must name at least one signal".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for signal in &agent.signals {
            if !seen.insert(signal) {
                return Err(ConfigError::ValidationError(format!(
                    "agent.signals lists {} more than once",
                    signal
                )));
            }
        }

        if self.collector.endpoint.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "collector.endpoint must not be empty".to_string(),
            ));
        }
        if self.collector.timeout_seconds == 0 || self.sources.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be greater than 0".to_string(),
            ));
        }

        for signal in SignalType::ALL {
            if self.sources.url_for(signal).trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "sources: URL for {} must not be empty",
                    signal
                )));
            }
            self.thresholds.table_for(signal).validate().map_err(|e| {
                ConfigError::ValidationError(format!("thresholds.{}: {}", signal, e))
            })?;
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.agent.poll_interval_seconds)
    }

    pub fn collector_timeout(&self) -> Duration {
        Duration::from_secs(self.collector.timeout_seconds)
    }

    /// Classifier loaded with the configured threshold tables
    pub fn classifier(&self) -> AnomalyClassifier {
        AnomalyClassifier::from_tables(
            SignalType::ALL
                .iter()
                .map(|&signal| (signal, *self.thresholds.table_for(signal))),
        )
    }
}
