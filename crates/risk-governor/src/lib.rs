//! Meridian Risk Governor
//!
//! Layer 4 risk control between the policy and the ledger:
//!
//! - **Drawdown Circuit Breaker**: forced close + entry lockout, with hysteresis
//! - **Daily Loss Limit**: entry lockout for the rest of the trading day
//! - **Position Sizing**: clamp to position and capital limits
//! - **Stop-Loss / Take-Profit**: unilateral close of the open position
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Risk Governor                          │
//! │                                                             │
//! │  Ledger snapshot ──► RiskMonitor ──► RiskStatus            │
//! │                       (latch, day)        │                 │
//! │                                           ▼                 │
//! │  Decision ───────────────────────► RiskGovernor::evaluate   │
//! │  RiskConstraintSet ──────────────►        │                 │
//! └───────────────────────────────────────────┼─────────────────┘
//!                                             ▼
//!                                          Verdict
//!                                             │
//!                                             ▼
//!                                       Decision Loop
//! ```
//!
//! The monitor is the only stateful part and is owned by the decision loop;
//! the governor itself is a pure function of its inputs.

pub mod constraints;
pub mod error;
pub mod governor;
pub mod monitor;

// Re-export main types
pub use constraints::RiskConstraintSet;
pub use error::{Result, RiskError};
pub use governor::{RiskGovernor, RiskReason, SIZE_SCALE, Verdict};
pub use monitor::{RiskMonitor, RiskStatus};
