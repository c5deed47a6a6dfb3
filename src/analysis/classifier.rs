//! Threshold-based anomaly classification
//!
//! Each signal has a table of four strictly increasing boundaries. A value is
//! classified with the highest severity whose boundary it meets or exceeds.

use crate::error::ConfigError;
use crate::signals::{Severity, SignalType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Severity boundaries for one signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ThresholdTable {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl ThresholdTable {
    /// Create a table, rejecting boundaries that are not finite and strictly increasing
    pub fn new(low: f64, medium: f64, high: f64, critical: f64) -> Result<Self, ConfigError> {
        let table = Self {
            low,
            medium,
            high,
            critical,
        };
        table.validate()?;
        Ok(table)
    }

    /// Check that all boundaries are finite and strictly increasing
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bounds = [self.low, self.medium, self.high, self.critical];

        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(ConfigError::ValidationError(format!(
                "threshold boundaries must be finite: {:?}",
                bounds
            )));
        }

        if bounds.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ConfigError::ValidationError(format!(
                "threshold boundaries must be strictly increasing (low < medium < high < critical): {:?}",
                bounds
            )));
        }

        Ok(())
    }

    /// Highest severity whose boundary `value` meets or exceeds
    ///
    /// Boundaries are tested from critical down to low; testing upwards would
    /// stop at "low" for every breaching value.
    pub fn classify(&self, value: f64) -> Option<Severity> {
        [
            (self.critical, Severity::Critical),
            (self.high, Severity::High),
            (self.medium, Severity::Medium),
            (self.low, Severity::Low),
        ]
        .into_iter()
        .find(|(boundary, _)| value >= *boundary)
        .map(|(_, severity)| severity)
    }

    /// Boundary for a given severity
    pub fn boundary(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Low => self.low,
            Severity::Medium => self.medium,
            Severity::High => self.high,
            Severity::Critical => self.critical,
        }
    }

    /// Solar wind speed in km/s
    pub fn solar_wind() -> Self {
        Self {
            low: 400.0,
            medium: 500.0,
            high: 600.0,
            critical: 750.0,
        }
    }

    /// Proton flux in pfu
    pub fn radiation() -> Self {
        Self {
            low: 1.0,
            medium: 5.0,
            high: 50.0,
            critical: 200.0,
        }
    }

    pub fn planetary_index() -> Self {
        Self {
            low: 200.0,
            medium: 500.0,
            high: 1000.0,
            critical: 2000.0,
        }
    }

    /// Built-in table for a signal
    pub fn default_for(signal: SignalType) -> Self {
        match signal {
            SignalType::SolarWind => Self::solar_wind(),
            SignalType::Radiation => Self::radiation(),
            SignalType::PlanetaryIndex => Self::planetary_index(),
        }
    }
}

/// Maps a signal's current value to an anomaly severity
#[derive(Debug, Clone, Default)]
pub struct AnomalyClassifier {
    tables: HashMap<SignalType, ThresholdTable>,
}

impl AnomalyClassifier {
    /// Create a classifier with no tables; every value classifies as no anomaly
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    /// Create a classifier with the built-in table for every known signal
    pub fn with_defaults() -> Self {
        Self::from_tables(
            SignalType::ALL
                .iter()
                .map(|&signal| (signal, ThresholdTable::default_for(signal))),
        )
    }

    pub fn from_tables(tables: impl IntoIterator<Item = (SignalType, ThresholdTable)>) -> Self {
        Self {
            tables: tables.into_iter().collect(),
        }
    }

    /// Install or replace the table for a signal
    pub fn set_table(&mut self, signal: SignalType, table: ThresholdTable) {
        self.tables.insert(signal, table);
    }

    pub fn table(&self, signal: SignalType) -> Option<&ThresholdTable> {
        self.tables.get(&signal)
    }

    /// Severity for `value`, or `None` when no boundary is reached
    ///
    /// A signal without a table never produces an anomaly.
    pub fn classify(&self, signal: SignalType, value: f64) -> Option<Severity> {
        self.tables.get(&signal).and_then(|table| table.classify(value))
    }
}
