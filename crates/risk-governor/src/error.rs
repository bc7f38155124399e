//! Risk errors
//!
//! Rejections and clamps are ordinary `Verdict` values, not errors. The only
//! error is a constraint set that cannot be enforced.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RiskError {
    #[error("Invalid risk constraints: {0}")]
    InvalidConstraints(String),
}

pub type Result<T> = std::result::Result<T, RiskError>;
