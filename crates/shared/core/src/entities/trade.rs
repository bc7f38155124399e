use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Action, CapitalState, PositionState};
use crate::values::{Price, Quantity, Step, Timestamp};

/// Unique identifier for a trade
pub type TradeId = Uuid;

/// An accepted and executed decision
///
/// Append-only: the ledger's trade history is the ordered sequence of these,
/// each carrying the state it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub step: Step,
    pub timestamp: Timestamp,
    pub action: Action,
    /// Quantity actually traded (absolute change in position size)
    pub size: Quantity,
    pub price: Price,
    /// PnL realized by this trade
    pub realized_pnl: Decimal,
    /// Position after the trade
    pub position: PositionState,
    /// Capital after the trade
    pub capital: CapitalState,
}

impl Trade {
    /// Returns the notional value of the trade (price * size)
    pub fn notional(&self) -> Decimal {
        self.price * self.size
    }
}
