//! Ledger errors
//!
//! Every variant is a contract violation: the risk governor is supposed to
//! make them impossible, so the decision loop treats them as fatal.

use meridian_core::{Action, PositionSide, Step};
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Insufficient capital at step {step}: required margin {required}, available {available}")]
    InsufficientCapital {
        step: Step,
        required: Decimal,
        available: Decimal,
    },

    #[error("Invalid transition at step {step}: {action:?} while {side:?}")]
    InvalidTransition {
        step: Step,
        action: Action,
        side: PositionSide,
    },

    #[error("Invalid price at step {step}: {price}")]
    InvalidPrice { step: Step, price: Decimal },

    #[error("Invalid ledger config: {0}")]
    InvalidConfig(String),

    #[error("Replay diverged from journal at step {step}")]
    ReplayMismatch { step: Step },
}

pub type Result<T> = std::result::Result<T, LedgerError>;
