//! Risk Monitor
//!
//! Active monitoring that:
//! - Tracks the trading day and realized loss since day start
//! - Latches the drawdown circuit breaker, with hysteresis on release
//! - Counts how long the breaker has been latched (for the halt decision)
//!
//! The monitor publishes a [`RiskStatus`] that the pure governor consumes.

use crate::constraints::RiskConstraintSet;
use chrono::NaiveDate;
use log::{error, info, warn};
use meridian_core::{CapitalState, Timestamp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Risk state published to the governor each step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskStatus {
    /// UTC trading day being tracked
    pub trading_day: Option<NaiveDate>,
    /// Realized PnL when the day started
    pub day_start_realized: Decimal,
    /// Realized loss since day start (never negative)
    pub daily_realized_loss: Decimal,
    /// Daily limit hit; stays set until the day rolls
    pub daily_limit_hit: bool,
    /// Current drawdown from peak equity
    pub drawdown: Decimal,
    /// Drawdown circuit breaker latched
    pub breaker_latched: bool,
    /// Consecutive observed steps with the breaker latched
    pub latched_steps: u64,
}

impl RiskStatus {
    /// Breaker has stayed latched for the whole cooldown
    pub fn should_halt(&self, constraints: &RiskConstraintSet) -> bool {
        self.breaker_latched && self.latched_steps >= constraints.halt_cooldown_steps.max(1)
    }
}

/// Stateful side of the risk layer, owned by the decision loop
#[derive(Debug, Clone)]
pub struct RiskMonitor {
    constraints: RiskConstraintSet,
    status: RiskStatus,
}

impl RiskMonitor {
    pub fn new(constraints: RiskConstraintSet) -> Self {
        Self {
            constraints,
            status: RiskStatus::default(),
        }
    }

    pub fn status(&self) -> &RiskStatus {
        &self.status
    }

    pub fn constraints(&self) -> &RiskConstraintSet {
        &self.constraints
    }

    /// Update from the ledger's capital at the start of a step
    pub fn observe(&mut self, capital: &CapitalState, timestamp: Timestamp) -> &RiskStatus {
        self.roll_day(capital, timestamp);
        self.check_daily_loss(capital);
        self.check_drawdown(capital);
        &self.status
    }

    /// Operator reset: release the breaker and clear the halt counter
    ///
    /// Daily tracking is untouched; a daily lockout still ends with the day.
    pub fn reset(&mut self) {
        info!(
            "[RISK] Breaker reset by operator (was latched={}, steps={})",
            self.status.breaker_latched, self.status.latched_steps
        );
        self.status.breaker_latched = false;
        self.status.latched_steps = 0;
    }

    fn roll_day(&mut self, capital: &CapitalState, timestamp: Timestamp) {
        let day = timestamp.date_naive();
        if self.status.trading_day == Some(day) {
            return;
        }

        if self.status.trading_day.is_some() {
            info!(
                "[RISK] Daily reset: realized loss was {}",
                self.status.daily_realized_loss
            );
        }
        self.status.trading_day = Some(day);
        self.status.day_start_realized = capital.realized_pnl;
        self.status.daily_realized_loss = Decimal::ZERO;
        self.status.daily_limit_hit = false;
    }

    fn check_daily_loss(&mut self, capital: &CapitalState) {
        let loss = (self.status.day_start_realized - capital.realized_pnl).max(Decimal::ZERO);
        self.status.daily_realized_loss = loss;

        if !self.status.daily_limit_hit && loss >= self.constraints.max_daily_loss {
            warn!(
                "[RISK] Daily loss limit breached: {} >= {}",
                loss, self.constraints.max_daily_loss
            );
            self.status.daily_limit_hit = true;
        }
    }

    fn check_drawdown(&mut self, capital: &CapitalState) {
        let drawdown = capital.drawdown();
        self.status.drawdown = drawdown;

        if !self.status.breaker_latched && drawdown >= self.constraints.max_drawdown_pct {
            error!(
                "[RISK] Drawdown breaker tripped: {:.2}% >= {:.2}%",
                drawdown * dec!(100),
                self.constraints.max_drawdown_pct * dec!(100)
            );
            self.status.breaker_latched = true;
            self.status.latched_steps = 0;
        } else if self.status.breaker_latched && drawdown < self.constraints.recovery_threshold()
        {
            info!(
                "[RISK] Drawdown recovered to {:.2}%, breaker released",
                drawdown * dec!(100)
            );
            self.status.breaker_latched = false;
            self.status.latched_steps = 0;
        }

        if self.status.breaker_latched {
            self.status.latched_steps += 1;
        }
    }
}
