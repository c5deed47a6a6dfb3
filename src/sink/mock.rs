use crate::error::SinkError;
use crate::signals::{ReadingId, SignalType};
use crate::sink::{AnomalyPayload, ReadingPayload, SinkFuture, StabilityPayload, TelemetrySink};
use log::info;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Which publish operation a failure is injected into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Operation {
    Reading,
    Stability,
    Anomaly,
}

/// Recording sink for tests
///
/// Accepts every record, keeps a copy in memory and hands out sequential
/// reading ids. Failures can be injected per signal and operation to exercise
/// partial-failure handling. Nothing is ever dropped, so it is unsuitable for a
/// long-running agent; the `mock` collector setting uses [`LoggingSink`]
/// instead.
///
/// [`LoggingSink`]: crate::sink::LoggingSink
#[derive(Default)]
pub struct MockSink {
    readings: Arc<Mutex<Vec<ReadingPayload>>>,
    stability_reports: Arc<Mutex<Vec<StabilityPayload>>>,
    anomalies: Arc<Mutex<Vec<AnomalyPayload>>>,
    failures: Arc<Mutex<HashSet<(SignalType, Operation)>>>,
    next_id: Arc<Mutex<u64>>,
}

impl MockSink {
    /// Create a sink that accepts everything
    pub fn success() -> Self {
        Self::default()
    }

    /// Make every reading publish for `signal` fail
    pub fn failing_readings(self, signal: SignalType) -> Self {
        self.fail(signal, Operation::Reading)
    }

    /// Make every stability publish for `signal` fail
    pub fn failing_stability(self, signal: SignalType) -> Self {
        self.fail(signal, Operation::Stability)
    }

    /// Make every anomaly publish for `signal` fail
    pub fn failing_anomalies(self, signal: SignalType) -> Self {
        self.fail(signal, Operation::Anomaly)
    }

    fn fail(self, signal: SignalType, operation: Operation) -> Self {
        self.failures.lock().unwrap().insert((signal, operation));
        self
    }

    /// Remove all injected failures
    pub fn heal(&self) {
        self.failures.lock().unwrap().clear();
    }

    pub fn readings(&self) -> Vec<ReadingPayload> {
        self.readings.lock().unwrap().clone()
    }

    pub fn stability_reports(&self) -> Vec<StabilityPayload> {
        self.stability_reports.lock().unwrap().clone()
    }

    pub fn anomalies(&self) -> Vec<AnomalyPayload> {
        self.anomalies.lock().unwrap().clone()
    }

    /// Records published for one signal, as (readings, stability, anomalies) counts
    pub fn counts_for(&self, signal: SignalType) -> (usize, usize, usize) {
        (
            self.readings().iter().filter(|r| r.signal == signal).count(),
            self.stability_reports()
                .iter()
                .filter(|r| r.signal == signal)
                .count(),
            self.anomalies().iter().filter(|r| r.signal == signal).count(),
        )
    }

    fn check(&self, signal: SignalType, operation: Operation) -> Result<(), SinkError> {
        if self.failures.lock().unwrap().contains(&(signal, operation)) {
            Err(SinkError::RequestFailed(format!(
                "injected {:?} failure for {}",
                operation, signal
            )))
        } else {
            Ok(())
        }
    }
}

impl TelemetrySink for MockSink {
    fn publish_reading<'a>(
        &'a self,
        payload: &'a ReadingPayload,
    ) -> SinkFuture<'a, Option<ReadingId>> {
        Box::pin(async move {
            self.check(payload.signal, Operation::Reading)?;

            let id = {
                let mut next_id = self.next_id.lock().unwrap();
                *next_id += 1;
                ReadingId(format!("reading-{}", *next_id))
            };

            info!(
                "[mock] reading {} {}={} {}",
                id, payload.signal, payload.value, payload.unit
            );
            self.readings.lock().unwrap().push(payload.clone());
            Ok(Some(id))
        })
    }

    fn publish_stability<'a>(&'a self, payload: &'a StabilityPayload) -> SinkFuture<'a, ()> {
        Box::pin(async move {
            self.check(payload.signal, Operation::Stability)?;

            info!(
                "[mock] stability {} score={:.3} drift={}",
                payload.signal, payload.score, payload.drift_detected
            );
            self.stability_reports.lock().unwrap().push(payload.clone());
            Ok(())
        })
    }

    fn publish_anomaly<'a>(&'a self, payload: &'a AnomalyPayload) -> SinkFuture<'a, ()> {
        Box::pin(async move {
            self.check(payload.signal, Operation::Anomaly)?;

            info!("[mock] anomaly {}: {}", payload.severity, payload.description);
            self.anomalies.lock().unwrap().push(payload.clone());
            Ok(())
        })
    }
}
