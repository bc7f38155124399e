//! Meridian Walk-Forward Harness
//!
//! Evaluates a policy configuration over a historical [`Timeline`] using
//! chronologically ordered, disjoint train/validate windows:
//!
//! ```text
//!  timeline ─► windows ─┬─► window 0: fit(train) ─► DecisionLoop(validate) ─► WindowMetrics
//!                       ├─► window 1: ...
//!                       └─► window n: ...
//!                                      │
//!                                      ▼
//!                      WalkForwardReport { windows, aggregate }
//! ```
//!
//! Fitting only ever sees a window's training observations, and each
//! validation run starts from its own ledger unless
//! [`LedgerMode::CarryForward`] is chosen. A window whose policy cannot be
//! fitted is reported as degraded; it never stops the other windows.

pub mod error;
pub mod harness;
pub mod metrics;
pub mod report;
pub mod timeline;
pub mod training;
pub mod windows;

// Re-export main types
pub use error::{FitError, Result, WalkForwardError};
pub use harness::{LedgerMode, WalkForwardConfig, WalkForwardHarness};
pub use metrics::WindowMetrics;
pub use report::{AggregateMetrics, Distribution, WalkForwardReport, WindowResult, WindowStatus};
pub use timeline::Timeline;
pub use training::{FitReport, Trainer, TrainingConfig};
pub use windows::{WindowConfig, plan_windows, validate_windows};
