//! Fetch → ingest → score → publish → classify loop
//!
//! One tick fetches every source concurrently, then walks the outcomes in
//! source order. For each signal with data the reading is appended to its
//! window before anything is published, so a collector outage never loses
//! history. A publish failure ends that signal's tick and is recorded in the
//! report; the other signals carry on.

use crate::analysis::{
    AnomalyClassifier, StabilityScorer, WindowStatistics, MIN_SAMPLES_FOR_SCORING,
};
use crate::error::SinkError;
use crate::monitoring::AgentStats;
use crate::registry::SignalRegistry;
use crate::signals::{AnomalyEvent, FetchOutcome, Reading, ReadingId, SignalType, StabilityResult};
use crate::sink::{window_minutes, AnomalyPayload, ReadingPayload, StabilityPayload, TelemetrySink};
use crate::sources::SignalSource;
use log::{debug, error, info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;

/// Static parameters of the ingestion loop
#[derive(Debug, Clone, PartialEq)]
pub struct CycleSettings {
    /// Delay between the end of one tick and the start of the next
    pub poll_interval: Duration,
    /// Version tag attached to every published record
    pub model_version: String,
    /// Producer tag attached to published readings
    pub source_tag: String,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            model_version: "1.2.0".to_string(),
            source_tag: "skywatch".to_string(),
        }
    }
}

/// Publish step at which a signal's tick stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublishStage {
    Reading,
    Stability,
    Anomaly,
}

impl fmt::Display for PublishStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PublishStage::Reading => "reading",
            PublishStage::Stability => "stability",
            PublishStage::Anomaly => "anomaly",
        })
    }
}

/// How far one signal got in a tick
#[derive(Debug, Clone, PartialEq)]
pub enum SignalStatus {
    /// Source had nothing; window untouched
    NoData,
    /// Reading for a signal the registry does not track; window untouched
    Unregistered,
    /// Source returned a reading labelled with another signal; window untouched
    Mismatched { reported: SignalType },
    /// Every applicable publish succeeded
    Completed,
    /// Window updated, but a publish failed and the rest were skipped
    SinkFailed { stage: PublishStage, error: SinkError },
}

/// Outcome of one signal within a tick
#[derive(Debug, Clone, PartialEq)]
pub struct SignalReport {
    pub signal: SignalType,
    pub status: SignalStatus,
    pub reading: Option<Reading>,
    /// Window length after ingesting this tick's reading
    pub window_len: usize,
    pub stability: Option<StabilityResult>,
    pub reading_id: Option<ReadingId>,
    pub reading_published: bool,
    pub stability_published: bool,
    pub anomaly: Option<AnomalyEvent>,
    pub anomaly_published: bool,
}

impl SignalReport {
    fn new(signal: SignalType, status: SignalStatus) -> Self {
        Self {
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

    pub fn is_failure(&self) -> bool {
        matches!(self.status, SignalStatus::SinkFailed { .. })
    }
}

/// Outcome of one full tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// 1-based cycle number
    pub cycle: u64,
    /// One entry per source, in source order
    pub signals: Vec<SignalReport>,
}

impl TickReport {
    pub fn report_for(&self, signal: SignalType) -> Option<&SignalReport> {
        self.signals.iter().find(|report| report.signal == signal)
    }

    /// Anomalies that reached the collector this tick
    pub fn published_anomalies(&self) -> Vec<&AnomalyEvent> {
        self.signals
            .iter()
            .filter(|report| report.anomaly_published)
            .filter_map(|report| report.anomaly.as_ref())
            .collect()
    }

    pub fn failures(&self) -> Vec<&SignalReport> {
        self.signals.iter().filter(|report| report.is_failure()).collect()
    }
}

/// Drives the periodic ingestion of every configured signal
pub struct IngestionCycle {
    sources: Vec<Arc<dyn SignalSource>>,
    sink: Arc<dyn TelemetrySink>,
    registry: SignalRegistry,
    scorer: StabilityScorer,
    classifier: AnomalyClassifier,
    settings: CycleSettings,
    stats: AgentStats,
    cycle: u64,
}

impl IngestionCycle {
    /// Create a cycle over `sources`, publishing to `sink`
    ///
    /// The registry is moved in; from here on the cycle is its only writer.
    pub fn new(
        sources: Vec<Arc<dyn SignalSource>>,
        sink: Arc<dyn TelemetrySink>,
        registry: SignalRegistry,
        classifier: AnomalyClassifier,
        settings: CycleSettings,
    ) -> Self {
        Self {
            sources,
            sink,
            registry,
            scorer: StabilityScorer::new(),
            classifier,
            settings,
            stats: AgentStats::new(),
            cycle: 0,
        }
    }

    pub fn registry(&self) -> &SignalRegistry {
        &self.registry
    }

    pub fn stats(&self) -> &AgentStats {
        &self.stats
    }

    pub fn settings(&self) -> &CycleSettings {
        &self.settings
    }

    /// Number of ticks run so far
    pub fn cycles_run(&self) -> u64 {
        self.cycle
    }

    /// Run ticks until `shutdown` turns true or its sender is dropped
    ///
    /// The shutdown signal is honoured between ticks; an in-flight tick always
    /// runs to completion.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Ingestion loop starting: {} signals, every {}s, window {} readings",
            self.sources.len(),
            self.settings.poll_interval.as_secs(),
            self.registry.capacity()
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.run_tick().await;

            debug!("Sleeping {:?}", self.settings.poll_interval);
            tokio::select! {
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Ingestion loop stopped after {} cycles", self.cycle);
    }

    /// Run one full tick over every source
    pub async fn run_tick(&mut self) -> TickReport {
        self.cycle += 1;
        info!("── Cycle {} ─────────────────────────────", self.cycle);

        let outcomes = self.fetch_all().await;

        let mut signals = Vec::with_capacity(outcomes.len());
        for (signal, outcome) in outcomes {
            signals.push(self.process(signal, outcome).await);
        }

        let report = TickReport {
            cycle: self.cycle,
            signals,
        };

        self.stats.record(&report);
        info!("{}", self.stats.summary());

        report
    }

    /// Fetch every source concurrently, returning outcomes in source order
    async fn fetch_all(&self) -> Vec<(SignalType, FetchOutcome)> {
        let mut tasks = JoinSet::new();
        for (index, source) in self.sources.iter().enumerate() {
            let source = Arc::clone(source);
            tasks.spawn(async move { (index, source.fetch().await) });
        }

        let mut outcomes: Vec<Option<FetchOutcome>> = vec![None; self.sources.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => error!("Fetch task failed: {}", e),
            }
        }

        self.sources
            .iter()
            .zip(outcomes)
            .map(|(source, outcome)| (source.signal(), outcome.unwrap_or(FetchOutcome::NoData)))
            .collect()
    }

    /// Ingest, score, publish and classify one fetch outcome
    async fn process(&mut self, signal: SignalType, outcome: FetchOutcome) -> SignalReport {
        let reading = match outcome {
            FetchOutcome::Data(reading) => reading,
            FetchOutcome::NoData => {
                warn!("  {}: no data from source", signal);
                return SignalReport::new(signal, SignalStatus::NoData);
            }
        };
        // A source only ever writes to its own signal's window
        if reading.signal != signal {
            warn!(
                "  {}: source returned a {} reading, skipping",
                signal, reading.signal
            );
            return SignalReport::new(
                signal,
                SignalStatus::Mismatched {
                    reported: reading.signal,
                },
            );
        }
        info!("  {}: {} {}", signal, reading.value, reading.unit);

        // The window update is unconditional and never rolled back
        let snapshot = match self.registry.append(signal, reading.value) {
            Some(snapshot) => snapshot,
            None => {
                warn!("  {}: not a configured signal, skipping", signal);
                return SignalReport::new(signal, SignalStatus::Unregistered);
            }
        };

        if let Some(stats) = WindowStatistics::compute(&snapshot) {
            debug!(
                "    {} window n={} mean={:.4} std={:.4} cv={:.4} slope={:.4}",
                signal,
                snapshot.len(),
                stats.mean,
                stats.std_dev,
                stats.coefficient_of_variation,
                stats.slope
            );
        }
        let stability = self.scorer.score(&snapshot);

        let mut report = SignalReport::new(signal, SignalStatus::Completed);
        report.window_len = snapshot.len();
        report.stability = Some(stability);

        if let Err((stage, error)) = self.publish(&reading, &stability, &mut report).await {
            error!("  Collector publish ({}) failed for {}: {}", stage, signal, error);
            report.status = SignalStatus::SinkFailed { stage, error };
        }

        report.reading = Some(reading);
        report
    }

    async fn publish(
        &self,
        reading: &Reading,
        stability: &StabilityResult,
        report: &mut SignalReport,
    ) -> Result<(), (PublishStage, SinkError)> {
        let signal = reading.signal;

        let reading_payload = ReadingPayload {
            signal,
            value: reading.value,
            unit: reading.unit.clone(),
            source_tag: self.settings.source_tag.clone(),
            model_version: self.settings.model_version.clone(),
        };
        report.reading_id = self
            .sink
            .publish_reading(&reading_payload)
            .await
            .map_err(|e| (PublishStage::Reading, e))?;
        report.reading_published = true;

        if report.window_len >= MIN_SAMPLES_FOR_SCORING {
            let minutes = window_minutes(report.window_len, self.settings.poll_interval.as_secs());
            let payload =
                StabilityPayload::new(signal, stability, minutes, &self.settings.model_version);
            self.sink
                .publish_stability(&payload)
                .await
                .map_err(|e| (PublishStage::Stability, e))?;
            report.stability_published = true;
        }
        info!(
            "    stability={:.3} drift={}",
            stability.score, stability.drift_detected
        );

        // Classification needs no history
        if let Some(severity) = self.classifier.classify(signal, reading.value) {
            let event = AnomalyEvent {
                signal,
                value: reading.value,
                severity,
                related_reading_id: report.reading_id.clone(),
            };
            report.anomaly = Some(event.clone());

            let payload = AnomalyPayload::from_event(&event, &self.settings.model_version);
            self.sink
                .publish_anomaly(&payload)
                .await
                .map_err(|e| (PublishStage::Anomaly, e))?;
            report.anomaly_published = true;
            warn!(
                "    ANOMALY [{}] detected: {}",
                severity.as_str().to_uppercase(),
                payload.description
            );
        }

        Ok(())
    }
}
