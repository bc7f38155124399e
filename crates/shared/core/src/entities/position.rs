use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::values::{Price, Quantity, Timestamp};

/// Position side - flat, long (bought) or short (sold)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PositionSide {
    /// No exposure
    #[default]
    Flat,
    /// Long position - profit when price rises
    Long,
    /// Short position - profit when price falls
    Short,
}

impl PositionSide {
    /// +1 long, -1 short, 0 flat
    pub fn sign(&self) -> Decimal {
        match self {
            PositionSide::Flat => Decimal::ZERO,
            PositionSide::Long => Decimal::ONE,
            PositionSide::Short => Decimal::NEGATIVE_ONE,
        }
    }

    /// Returns the opposite side (flat stays flat)
    pub fn opposite(&self) -> Self {
        match self {
            PositionSide::Flat => PositionSide::Flat,
            PositionSide::Long => PositionSide::Short,
            PositionSide::Short => PositionSide::Long,
        }
    }
}

/// Current exposure, owned and mutated only by the ledger
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PositionState {
    pub side: PositionSide,
    /// Always non-negative
    pub size: Quantity,
    /// Size-weighted average entry price (zero when flat)
    pub entry_price: Price,
    /// When the position was first opened
    pub entry_time: Option<Timestamp>,
}

impl PositionState {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn is_flat(&self) -> bool {
        self.side == PositionSide::Flat || self.size.is_zero()
    }

    /// Size with sign (positive = long, negative = short)
    pub fn signed_size(&self) -> Decimal {
        self.side.sign() * self.size
    }

    /// Notional at the entry price
    pub fn entry_notional(&self) -> Decimal {
        self.size * self.entry_price
    }

    /// Notional at a given mark price
    pub fn notional(&self, price: Price) -> Decimal {
        self.size * price
    }

    /// Unrealized PnL at a given mark price
    pub fn unrealized_pnl(&self, price: Price) -> Decimal {
        match self.side {
            PositionSide::Flat => Decimal::ZERO,
            PositionSide::Long => self.size * (price - self.entry_price),
            PositionSide::Short => self.size * (self.entry_price - price),
        }
    }

    /// Unrealized PnL as a fraction of entry notional
    pub fn unrealized_return(&self, price: Price) -> Decimal {
        let basis = self.entry_notional();
        if basis.is_zero() {
            return Decimal::ZERO;
        }
        self.unrealized_pnl(price) / basis
    }
}
