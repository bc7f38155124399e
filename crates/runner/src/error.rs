use meridian_engine::LoopError;
use meridian_ledger::{JournalError, LedgerError};
use meridian_walkforward::WalkForwardError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid run configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Decision loop error: {0}")]
    Loop(#[from] LoopError),

    #[error("Walk-forward error: {0}")]
    WalkForward(#[from] WalkForwardError),
}

pub type Result<T> = std::result::Result<T, RunnerError>;
