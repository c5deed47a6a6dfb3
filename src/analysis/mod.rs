/// Threshold tables and severity classification
pub mod classifier;

/// Window statistics, stability score and drift detection
pub mod stability;

pub use classifier::{AnomalyClassifier, ThresholdTable};
pub use stability::{StabilityScorer, WindowStatistics, MIN_SAMPLES_FOR_SCORING};
