//! Meridian Decision Loop
//!
//! Closes the loop between the policy (Layer 3), the risk governor and the
//! ledger (Layer 4):
//!
//! ```text
//!  ┌───────────────┐   Observation    ┌──────────────────────────────────────┐
//!  │ MarketFeed /  │ ───────────────► │            DecisionLoop              │
//!  │ LiveFeed      │                  │                                      │
//!  └───────────────┘                  │  mark ─► RiskMonitor ─► RiskStatus   │
//!                                     │   │                         │        │
//!                                     │   ▼                         ▼        │
//!                                     │ PolicyEngine ─► Decision ─► Governor │
//!                                     │   ▲                         │        │
//!                                     │   │ snapshot + History      ▼        │
//!                                     │   └─────────────────────  Ledger     │
//!                                     └──────────────────────────────────────┘
//! ```
//!
//! Missing or stale inputs never produce a trade: the step holds and the
//! gap is recorded on its [`StepOutcome`]. Rejections and clamps are
//! ordinary [`Verdict`](meridian_risk::Verdict) values. The only errors that
//! stop a run are ledger contract violations (status `Aborted`); a latched
//! drawdown breaker stops it as `Halted` until [`DecisionLoop::resume_after_halt`].

pub mod config;
pub mod decision_loop;
pub mod deferred;
pub mod error;
pub mod live;
pub mod outcome;
pub mod replay;

// Re-export main types
pub use config::LoopConfig;
pub use decision_loop::DecisionLoop;
pub use deferred::DeferredQueue;
pub use error::{CircuitBreakerHalt, DataGapError, LoopError, Result};
pub use outcome::{RunStatus, RunSummary, StepOutcome, StepPhase};
pub use replay::ReplayFeed;
