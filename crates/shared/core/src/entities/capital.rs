use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Capital state, owned and mutated only by the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalState {
    /// Capital not committed as margin (never negative)
    pub available_capital: Decimal,
    /// Cash plus unrealized PnL at the last mark
    pub equity: Decimal,
    /// Cumulative realized PnL
    pub realized_pnl: Decimal,
    /// Highest equity seen since start or last reset
    pub peak_equity: Decimal,
}

impl CapitalState {
    /// Fresh state with everything in cash
    pub fn initial(capital: Decimal) -> Self {
        Self {
            available_capital: capital,
            equity: capital,
            realized_pnl: Decimal::ZERO,
            peak_equity: capital,
        }
    }

    /// Fractional decline from peak equity (0 when at or above peak)
    pub fn drawdown(&self) -> Decimal {
        if self.peak_equity <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        ((self.peak_equity - self.equity) / self.peak_equity).max(Decimal::ZERO)
    }
}
