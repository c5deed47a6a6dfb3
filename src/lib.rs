/// Error types for the ingestion agent
pub mod error;

/// Signal, reading and anomaly types
pub mod signals;

/// Fixed-capacity rolling window
pub mod window;

/// Stability scoring and anomaly classification
pub mod analysis;

/// Per-signal rolling state
pub mod registry;

/// Upstream signal sources
pub mod sources;

/// Downstream collector sinks
pub mod sink;

/// Periodic ingestion loop
pub mod pipeline;

/// Self-monitoring counters
pub mod monitoring;

/// Configuration management
pub mod config;

// Re-export commonly used types
pub use error::{ConfigError, SinkError, SourceError};
pub use pipeline::{IngestionCycle, TickReport};
pub use registry::SignalRegistry;
pub use signals::{Reading, Severity, SignalType, StabilityResult};
