use thiserror::Error;

/// Failures of a learned-policy training update
///
/// These never abort an evaluation run; the harness records the window as
/// degraded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrainingError {
    #[error("Non-finite value in {0}")]
    NonFinite(String),

    #[error("Training batch is empty")]
    EmptyBatch,

    #[error("Feature width mismatch: expected {expected}, got {actual}")]
    FeatureMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, TrainingError>;
