//! Risk Constraint Set
//!
//! The limits the governor enforces. Loaded once per evaluation run and
//! passed explicitly to every evaluation; never mutated during a run.

use crate::error::{Result, RiskError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Run-wide risk limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConstraintSet {
    /// Maximum resulting position size (units)
    pub max_position_size: Decimal,
    /// Maximum notional per unit of available capital
    pub max_leverage: Decimal,
    /// Close when unrealized return falls to -stop_loss_pct
    pub stop_loss_pct: Decimal,
    /// Close when unrealized return reaches take_profit_pct
    pub take_profit_pct: Decimal,
    /// Breaker trips when drawdown from peak reaches this fraction
    pub max_drawdown_pct: Decimal,
    /// Realized loss per trading day that locks out new entries
    pub max_daily_loss: Decimal,
    /// Consecutive latched steps before the run is halted
    pub halt_cooldown_steps: u64,
    /// Breaker releases once drawdown < max_drawdown_pct × recovery_ratio
    pub recovery_ratio: Decimal,
}

impl Default for RiskConstraintSet {
    fn default() -> Self {
        Self {
            max_position_size: dec!(100),
            max_leverage: Decimal::ONE,
            stop_loss_pct: dec!(0.05),
            take_profit_pct: dec!(0.10),
            max_drawdown_pct: dec!(0.10),
            max_daily_loss: dec!(500),
            halt_cooldown_steps: 20,
            recovery_ratio: dec!(0.8),
        }
    }
}

impl RiskConstraintSet {
    /// Drawdown below which a latched breaker releases
    pub fn recovery_threshold(&self) -> Decimal {
        self.max_drawdown_pct * self.recovery_ratio
    }

    /// Reject constraint sets that cannot be enforced consistently
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("max_position_size", self.max_position_size),
            ("max_leverage", self.max_leverage),
            ("stop_loss_pct", self.stop_loss_pct),
            ("take_profit_pct", self.take_profit_pct),
            ("max_drawdown_pct", self.max_drawdown_pct),
            ("max_daily_loss", self.max_daily_loss),
        ];
        for (name, value) in positive {
            if value <= Decimal::ZERO {
                return Err(RiskError::InvalidConstraints(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        if self.max_drawdown_pct >= Decimal::ONE {
            return Err(RiskError::InvalidConstraints(format!(
                "max_drawdown_pct must be below 1, got {}",
                self.max_drawdown_pct
            )));
        }

        if self.recovery_ratio <= Decimal::ZERO || self.recovery_ratio > Decimal::ONE {
            return Err(RiskError::InvalidConstraints(format!(
                "recovery_ratio must be in (0, 1], got {}",
                self.recovery_ratio
            )));
        }

        Ok(())
    }
}
