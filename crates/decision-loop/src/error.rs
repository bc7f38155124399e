use crate::outcome::RunStatus;
use meridian_core::Step;
use meridian_ledger::LedgerError;
use meridian_risk::RiskError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Missing or unusable input for a step
///
/// Always recovered locally: the step holds and the gap is recorded on its
/// outcome.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataGapError {
    #[error("No price at step {step}")]
    MissingPrice { step: Step },

    #[error("No market context at step {step}")]
    MissingContext { step: Step },

    #[error("No signal at step {step}")]
    MissingSignal { step: Step },

    #[error("Stale market context at step {step} (context is for step {context_step})")]
    StaleContext { step: Step, context_step: Step },

    #[error("Stale signal at step {step} (signal is for step {signal_step})")]
    StaleSignal { step: Step, signal_step: Step },

    #[error("{what} fetch exceeded its latency budget at step {step}")]
    Timeout { step: Step, what: String },
}

/// The drawdown breaker stayed latched through its whole cooldown
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error(
    "Circuit breaker halt at step {step}: drawdown {drawdown} latched for {latched_steps} steps"
)]
pub struct CircuitBreakerHalt {
    pub step: Step,
    pub drawdown: Decimal,
    pub latched_steps: u64,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoopError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Risk configuration error: {0}")]
    Risk(#[from] RiskError),

    #[error(transparent)]
    Halted(#[from] CircuitBreakerHalt),

    #[error("Loop is not running (status {status:?})")]
    NotRunning { status: RunStatus },

    #[error("Loop is not halted (status {status:?})")]
    NotHalted { status: RunStatus },
}

pub type Result<T> = std::result::Result<T, LoopError>;
