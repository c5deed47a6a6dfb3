use crate::signals::ReadingId;
use crate::sink::{AnomalyPayload, ReadingPayload, SinkFuture, StabilityPayload, TelemetrySink};
use log::{info, warn};
use std::sync::atomic::{AtomicU64, Ordering};

/// Sink that writes every record to the log and keeps nothing
///
/// Backs `backend = "mock"` for dry runs against live feeds. Reading ids are
/// sequential so anomalies still carry a related id in the log.
#[derive(Debug, Default)]
pub struct LoggingSink {
    next_id: AtomicU64,
}

impl LoggingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of readings accepted so far
    pub fn readings_logged(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed)
    }
}

impl TelemetrySink for LoggingSink {
    fn publish_reading<'a>(
        &'a self,
        payload: &'a ReadingPayload,
    ) -> SinkFuture<'a, Option<ReadingId>> {
        Box::pin(async move {
            let id = ReadingId(format!(
                "local-{}",
                self.next_id.fetch_add(1, Ordering::Relaxed) + 1
            ));
            info!(
                "[dry-run] reading {} {}={} {} (source={}, model={})",
                id,
                payload.signal,
                payload.value,
                payload.unit,
                payload.source_tag,
                payload.model_version
            );
            Ok(Some(id))
        })
    }

    fn publish_stability<'a>(&'a self, payload: &'a StabilityPayload) -> SinkFuture<'a, ()> {
        Box::pin(async move {
            info!(
                "[dry-run] stability {} score={:.3} window={}min drift={} magnitude={:?}",
                payload.signal,
                payload.score,
                payload.window_minutes,
                payload.drift_detected,
                payload.drift_magnitude
            );
            Ok(())
        })
    }

    fn publish_anomaly<'a>(&'a self, payload: &'a AnomalyPayload) -> SinkFuture<'a, ()> {
        Box::pin(async move {
            warn!(
                "[dry-run] anomaly {} {}: {} (reading {})",
                payload.severity,
                payload.signal,
                payload.description,
                payload
                    .related_reading_id
                    .as_ref()
                    .map_or("unknown", |id| id.0.as_str())
            );
            Ok(())
        })
    }
}
