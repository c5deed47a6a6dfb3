//! Self-monitoring counters for the ingestion agent
//!
//! This module tracks what the agent has done since start-up: how many cycles
//! ran, how many records reached the collector, and how often sources came up
//! empty or the collector refused a publish.

use crate::pipeline::{SignalStatus, TickReport};
use crate::signals::{Severity, Timestamp};
use chrono::Utc;
use log::debug;
use std::collections::BTreeMap;

/// Cumulative agent statistics, updated once per tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentStats {
    /// Number of completed ticks
    pub cycles: u64,
    pub readings_published: u64,
    pub stability_published: u64,
    pub anomalies_published: u64,
    /// Published anomalies per severity
    pub anomalies_by_severity: BTreeMap<Severity, u64>,
    /// Signals whose every applicable publish succeeded
    pub signals_completed: u64,
    /// Signals skipped because their source had no data
    pub no_data: u64,
    /// Signals whose tick ended on a failed publish
    pub sink_failures: u64,
    /// When the last tick finished
    pub last_cycle_at: Option<Timestamp>,
}

impl AgentStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one tick's outcome into the totals
    pub fn record(&mut self, report: &TickReport) {
        self.cycles += 1;

        for signal in &report.signals {
            match signal.status {
                SignalStatus::NoData => self.no_data += 1,
                SignalStatus::SinkFailed { .. } => self.sink_failures += 1,
                SignalStatus::Completed => self.signals_completed += 1,
                SignalStatus::Unregistered | SignalStatus::Mismatched { .. } => {}
            }

            if signal.reading_published {
                self.readings_published += 1;
            }
            if signal.stability_published {
                self.stability_published += 1;
            }
            if signal.anomaly_published {
                if let Some(anomaly) = &signal.anomaly {
                    self.anomalies_published += 1;
                    *self.anomalies_by_severity.entry(anomaly.severity).or_insert(0) += 1;
                }
            }
        }

        self.last_cycle_at = Some(Utc::now());
        debug!("Agent stats updated after cycle {}", report.cycle);
    }

    /// Share of signal ticks with data whose publishes all succeeded, as a percentage
    pub fn delivery_rate(&self) -> f64 {
        let attempted = self.signals_completed + self.sink_failures;
        if attempted == 0 {
            return 100.0;
        }
        self.signals_completed as f64 / attempted as f64 * 100.0
    }

    /// One-line summary for the log
    pub fn summary(&self) -> String {
        format!(
            "cycles={} readings={} stability={} anomalies={} no_data={} sink_failures={}",
            self.cycles,
            self.readings_published,
            self.stability_published,
            self.anomalies_published,
            self.no_data,
            self.sink_failures
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use crate::pipeline::{PublishStage, SignalReport};
    use crate::signals::{AnomalyEvent, SignalType};

    fn signal_report(signal: SignalType, status: SignalStatus) -> SignalReport {
        SignalReport {
            signal,
            status,
            reading: None,
            window_len: 0,
            stability: None,
            reading_id: None,
            reading_published: false,
            stability_published: false,
            anomaly: None,
            anomaly_published: false,
        }
    }

    #[test]
    fn test_record_counts_each_outcome() {
        let mut completed = signal_report(SignalType::SolarWind, SignalStatus::Completed);
        completed.reading_published = true;
        completed.stability_published = true;
        completed.anomaly = Some(AnomalyEvent {
            signal: SignalType::SolarWind,
            value: 800.0,
            severity: Severity::Critical,
            related_reading_id: None,
        });
        completed.anomaly_published = true;

        let failed = signal_report(
            SignalType::Radiation,
            SignalStatus::SinkFailed {
                stage: PublishStage::Reading,
                error: SinkError::Timeout,
            },
        );
        let empty = signal_report(SignalType::PlanetaryIndex, SignalStatus::NoData);

        let mut stats = AgentStats::new();
        stats.record(&TickReport {
            cycle: 1,
            signals: vec![completed, failed, empty],
        });

        assert_eq!(stats.cycles, 1);
        assert_eq!(stats.readings_published, 1);
        assert_eq!(stats.stability_published, 1);
        assert_eq!(stats.anomalies_published, 1);
        assert_eq!(stats.anomalies_by_severity.get(&Severity::Critical), Some(&1));
        assert_eq!(stats.sink_failures, 1);
        assert_eq!(stats.no_data, 1);
        assert!(stats.last_cycle_at.is_some());
        assert!((stats.delivery_rate() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_unattempted_anomaly_is_not_counted() {
        let mut report = signal_report(
            SignalType::SolarWind,
            SignalStatus::SinkFailed {
                stage: PublishStage::Anomaly,
                error: SinkError::Timeout,
            },
        );
        report.reading_published = true;
        report.anomaly = Some(AnomalyEvent {
            signal: SignalType::SolarWind,
            value: 800.0,
            severity: Severity::Critical,
            related_reading_id: None,
        });

        let mut stats = AgentStats::new();
        stats.record(&TickReport {
            cycle: 1,
            signals: vec![report],
        });
        assert_eq!(stats.anomalies_published, 0);
        assert!(stats.anomalies_by_severity.is_empty());
    }

    #[test]
    fn test_empty_stats() {
        let stats = AgentStats::new();
        assert_eq!(stats.delivery_rate(), 100.0);
        assert_eq!(
            stats.summary(),
            "cycles=0 readings=0 stability=0 anomalies=0 no_data=0 sink_failures=0"
        );
    }
}
