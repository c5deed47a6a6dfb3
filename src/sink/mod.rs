//! Downstream collector sinks
//!
//! The ingestion cycle publishes three kinds of records: raw readings,
//! stability reports and anomalies. A [`TelemetrySink`] delivers them; the
//! HTTP sink talks to the collector's REST API, the logging sink only writes
//! them to the log and the mock sink records them in memory for tests.

/// REST collector sink
pub mod http;

/// Log-only sink behind the `mock` collector setting
pub mod logging;

/// In-memory recording sink
pub mod mock;

use crate::error::SinkError;
use crate::signals::{AnomalyEvent, ReadingId, Severity, SignalType, StabilityResult};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

pub use http::HttpSink;
pub use logging::LoggingSink;
pub use mock::MockSink;

/// Boxed future returned by sink operations
pub type SinkFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SinkError>> + Send + 'a>>;

/// A raw reading as published to the collector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadingPayload {
    pub signal: SignalType,
    pub value: f64,
    pub unit: String,
    /// Tag identifying this agent as the producer
    pub source_tag: String,
    pub model_version: String,
}

/// A stability report for one signal's current window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StabilityPayload {
    pub signal: SignalType,
    pub score: f64,
    /// Time span the window covers, at least one minute
    pub window_minutes: u64,
    pub drift_detected: bool,
    pub drift_magnitude: Option<f64>,
    pub model_version: String,
}

impl StabilityPayload {
    pub fn new(
        signal: SignalType,
        result: &StabilityResult,
        window_minutes: u64,
        model_version: impl Into<String>,
    ) -> Self {
        Self {
            signal,
            score: result.score,
            window_minutes,
            drift_detected: result.drift_detected,
            drift_magnitude: result.drift_magnitude,
            model_version: model_version.into(),
        }
    }
}

/// Minutes covered by `samples` readings taken every `interval_seconds`
///
/// Never less than one minute; saturates instead of overflowing.
pub fn window_minutes(samples: usize, interval_seconds: u64) -> u64 {
    let seconds = (samples as u64).saturating_mul(interval_seconds);
    (seconds / 60).max(1)
}

/// An anomaly as published to the collector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnomalyPayload {
    pub signal: SignalType,
    pub value: f64,
    pub severity: Severity,
    pub model_version: String,
    pub related_reading_id: Option<ReadingId>,
    pub description: String,
}

impl AnomalyPayload {
    pub fn from_event(event: &AnomalyEvent, model_version: impl Into<String>) -> Self {
        Self {
            signal: event.signal,
            value: event.value,
            severity: event.severity,
            model_version: model_version.into(),
            related_reading_id: event.related_reading_id.clone(),
            description: event.description(),
        }
    }
}

/// Capability to deliver records to the downstream collector
pub trait TelemetrySink: Send + Sync {
    /// Publish a reading; the collector may assign it an identifier
    fn publish_reading<'a>(
        &'a self,
        payload: &'a ReadingPayload,
    ) -> SinkFuture<'a, Option<ReadingId>>;

    fn publish_stability<'a>(&'a self, payload: &'a StabilityPayload) -> SinkFuture<'a, ()>;

    fn publish_anomaly<'a>(&'a self, payload: &'a AnomalyPayload) -> SinkFuture<'a, ()>;
}
