use meridian_engine::LoopError;
use meridian_ledger::LedgerError;
use meridian_policy::TrainingError;
use meridian_risk::RiskError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WalkForwardError {
    #[error("Invalid evaluation windows: {0}")]
    InvalidWindows(String),

    #[error("Invalid timeline: {0}")]
    InvalidTimeline(String),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Risk configuration error: {0}")]
    Risk(#[from] RiskError),

    #[error("Validation run aborted: {0}")]
    Loop(#[from] LoopError),
}

pub type Result<T> = std::result::Result<T, WalkForwardError>;

/// Why a window's policy could not be fitted
///
/// Recorded on the window result; never aborts the harness.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("Training update failed: {0}")]
    Training(#[from] TrainingError),

    #[error("Training episode failed: {0}")]
    Episode(String),
}
