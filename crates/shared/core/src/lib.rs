//! Meridian Core Domain
//!
//! Pure domain types for the Meridian decision engine.
//! This crate contains no async, no I/O, and is 100% unit testable.
//!
//! Everything that crosses a component boundary lives here: the Layer 1/2
//! inputs (`MarketContext`, `SignalEstimate`), the ledger state
//! (`PositionState`, `CapitalState`), policy output (`Decision`), the
//! executed `Trade` record and the walk-forward `EvaluationWindow`.

pub mod entities;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    // Policy output
    Action,
    // Ledger state
    CapitalState,
    Decision,
    // Layer 1/2 inputs
    Direction,
    // Walk-forward windows
    EvaluationWindow,
    MarketContext,
    Observation,
    PositionSide,
    PositionState,
    Regime,
    SignalEstimate,
    StepRange,
    Timing,
    // Executed decisions
    Trade,
    TradeId,
};
pub use values::{Price, Quantity, Step, Timestamp};
