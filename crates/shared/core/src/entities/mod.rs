mod capital;
mod decision;
mod market;
mod position;
mod trade;
mod window;

pub use capital::CapitalState;
pub use decision::{Action, Decision, Timing};
pub use market::{Direction, MarketContext, Observation, Regime, SignalEstimate};
pub use position::{PositionSide, PositionState};
pub use trade::{Trade, TradeId};
pub use window::{EvaluationWindow, StepRange};
