//! Meridian Policy Engine
//!
//! Layer 3 of the decision engine: turns a market context, a signal and
//! the current ledger snapshot into a raw [`Decision`](meridian_core::Decision).
//!
//! ## Variants
//!
//! - **Rule-constrained**: fixed decision table, confidence- and
//!   volatility-scaled sizing ([`RulePolicy`])
//! - **Learned**: linear softmax over a fixed feature map, trained with a
//!   drawdown-penalized return objective ([`LearnedPolicy`])
//!
//! Both sit behind the tagged [`PolicyEngine`] enum and share the same
//! input contract:
//!
//! ```text
//! ┌──────────────┐  ┌──────────────┐  ┌──────────────────────┐  ┌─────────┐
//! │ MarketContext│  │SignalEstimate│  │ Position / Capital   │  │ History │
//! │  (Layer 1)   │  │  (Layer 2)   │  │ (ledger snapshot)    │  │(bounded)│
//! └──────┬───────┘  └──────┬───────┘  └──────────┬───────────┘  └────┬────┘
//!        └─────────────────┴──────────┬──────────┴───────────────────┘
//!                                     ▼
//!                               PolicyInput
//!                                     │
//!                                     ▼
//!                         PolicyEngine::propose
//!                                     │
//!                                     ▼
//!                     Proposal { decision, trace }
//! ```
//!
//! Policies hold no state across calls except what the caller passes in
//! through [`History`].

pub mod error;
pub mod history;
pub mod learned;
pub mod objective;
pub mod policy;
pub mod rule;

// Re-export main types
pub use error::{Result, TrainingError};
pub use history::{History, StepRecord};
pub use learned::{
    CLASS_FLAT, CLASS_LONG, CLASS_SHORT, FEATURE_COUNT, LearnedConfig, LearnedPolicy,
    NUM_CLASSES, UpdateReport,
};
pub use objective::{Objective, Trajectory, TrajectoryBatch, TrajectoryStep};
pub use policy::{PolicyConfig, PolicyEngine, PolicyInput, PolicyTrace, Proposal};
pub use rule::{RuleConfig, RulePolicy};
