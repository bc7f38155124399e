//! Meridian Runner
//!
//! Wires the decision engine to its inputs and runs it:
//!
//! - **Synthetic market**: seeded regime-switching prices with feed outages
//! - **Pipeline**: reference Layer 1 featurizer and Layer 2 momentum signal
//! - **Simulation**: walk-forward evaluation or a single run, journals
//! - **Config**: one JSON run configuration
//!
//! ## Architecture
//!
//! ```text
//!  ┌──────────────────┐  ticks   ┌──────────────────────────────┐
//!  │ SyntheticMarket  │ ───────► │ Pipeline                     │
//!  │ (or recorded     │          │  Featurizer ─► MarketContext │
//!  │  observations)   │          │  MomentumSignal ─► Signal    │
//!  └──────────────────┘          └──────────────┬───────────────┘
//!                                               │ observations
//!                                               ▼
//!                                ┌──────────────────────────────┐
//!                                │ WalkForwardHarness           │
//!                                │  fit ─► DecisionLoop ─► score│
//!                                └──────────────┬───────────────┘
//!                                               │
//!                                               ▼
//!                                  report (JSON) + journals
//! ```

pub mod config;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod signal;
pub mod simulation;
pub mod synthetic;

// Re-export main types
pub use config::RunConfig;
pub use error::{Result, RunnerError};
pub use features::{FeatureConfig, Featurizer};
pub use pipeline::Pipeline;
pub use signal::{MomentumSignal, SignalConfig};
pub use simulation::{SingleRun, Simulation, load_observations, write_window_journals};
pub use synthetic::{MarketConfig, RegimeParams, SyntheticMarket};
