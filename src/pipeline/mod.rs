/// Periodic fetch-score-classify-publish loop
pub mod ingestion_cycle;

pub use ingestion_cycle::{
    CycleSettings, IngestionCycle, PublishStage, SignalReport, SignalStatus, TickReport,
};
