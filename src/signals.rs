//! Core signal types for the space-weather agent
//!
//! This module defines the data structures that flow through one ingestion
//! tick: the signal identifiers, raw readings, stability results and anomaly
//! events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type for consistent time handling across the application
pub type Timestamp = DateTime<Utc>;

/// A monitored space-weather signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignalType {
    /// Solar wind bulk speed (km/s)
    #[serde(rename = "solar_wind")]
    SolarWind,
    /// Integral proton flux above 10 MeV (pfu)
    #[serde(rename = "radiation")]
    Radiation,
    /// Planetary geomagnetic K-index, reported to the collector as "weather"
    #[serde(rename = "weather", alias = "planetary_index")]
    PlanetaryIndex,
}

impl SignalType {
    /// All known signals in their default processing order
    pub const ALL: [SignalType; 3] = [
        SignalType::SolarWind,
        SignalType::Radiation,
        SignalType::PlanetaryIndex,
    ];

    /// Name used on the wire and in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::SolarWind => "solar_wind",
            SignalType::Radiation => "radiation",
            SignalType::PlanetaryIndex => "weather",
        }
    }

    /// Unit the upstream feeds report this signal in
    pub fn unit(&self) -> &'static str {
        match self {
            SignalType::SolarWind => "km/s",
            SignalType::Radiation => "pfu",
            SignalType::PlanetaryIndex => "Kp",
        }
    }

    /// Human-readable title, e.g. "Solar Wind"
    pub fn title(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sampled value of a signal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reading {
    pub signal: SignalType,
    pub value: f64,
    pub unit: String,
    pub observed_at: Timestamp,
}

impl Reading {
    /// Create a reading observed now
    pub fn new(signal: SignalType, value: f64, unit: impl Into<String>) -> Self {
        Self {
            signal,
            value,
            unit: unit.into(),
            observed_at: Utc::now(),
        }
    }
}

/// Result of asking a source for its latest value
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// A fresh reading
    Data(Reading),
    /// Upstream was unreachable, malformed or empty
    NoData,
}

impl FetchOutcome {
    pub fn into_reading(self) -> Option<Reading> {
        match self {
            FetchOutcome::Data(reading) => Some(reading),
            FetchOutcome::NoData => None,
        }
    }
}

/// Stability verdict for the current window of one signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StabilityResult {
    /// 1.0 = perfectly steady, 0.0 = highly erratic
    pub score: f64,
    pub drift_detected: bool,
    /// OLS slope per sample, present only when drift was detected
    pub drift_magnitude: Option<f64>,
}

impl StabilityResult {
    /// Result reported while the window is too short to judge
    pub fn insufficient_history() -> Self {
        Self {
            score: 1.0,
            drift_detected: false,
            drift_magnitude: None,
        }
    }
}

/// Anomaly severity, ordered from least to most urgent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque identifier the collector assigns to a published reading
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ReadingId(pub String);

impl fmt::Display for ReadingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A classified threshold breach for one reading
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnomalyEvent {
    pub signal: SignalType,
    pub value: f64,
    pub severity: Severity,
    pub related_reading_id: Option<ReadingId>,
}

impl AnomalyEvent {
    /// Human-readable description sent along with the anomaly
    pub fn description(&self) -> String {
        format!("{} exceeded {} threshold", self.signal.title(), self.severity)
    }
}
