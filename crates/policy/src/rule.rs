//! Rule-Constrained Policy
//!
//! A fixed decision table over the signal and the held position:
//!
//! | signal            | flat            | same side           | opposite side |
//! |-------------------|-----------------|---------------------|---------------|
//! | confident         | open            | resize if off-band  | close         |
//! | below threshold   | hold            | hold                | close         |
//! | neutral           | hold            | close               | close         |
//!
//! Size is a fraction of sizing capital that grows with confidence and
//! shrinks as recent realized volatility rises above its reference level.

use crate::policy::{PolicyInput, toward, units};
use log::debug;
use meridian_core::values::math;
use meridian_core::{Decision, Direction, MarketContext, PositionSide, Quantity, Regime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Configuration for the rule-constrained policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Minimum confidence to open or grow a position
    pub entry_threshold: Decimal,
    /// Fraction of sizing capital at confidence 1 and calm markets
    pub base_fraction: Decimal,
    /// Volatility at which size is halved
    pub reference_vol: Decimal,
    /// History records used for realized volatility
    pub vol_lookback: usize,
    /// Relative size gap tolerated before a resize is issued
    pub resize_band: Decimal,
    /// Defer new entries by this many steps in the volatile regime
    pub defer_in_volatile_regime: Option<u32>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            entry_threshold: dec!(0.55),
            base_fraction: dec!(0.5),
            reference_vol: dec!(0.01),
            vol_lookback: 20,
            resize_band: dec!(0.25),
            defer_in_volatile_regime: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulePolicy {
    config: RuleConfig,
}

impl RulePolicy {
    pub fn new(config: RuleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// Set the reference volatility to the median training volatility
    pub fn calibrate(&mut self, contexts: &[MarketContext]) {
        let vols: Vec<Decimal> = contexts
            .iter()
            .map(|c| c.volatility)
            .filter(|v| *v > Decimal::ZERO)
            .collect();
        if vols.is_empty() {
            return;
        }

        let reference = math::median(&vols);
        debug!(
            "[POLICY] Calibrated reference_vol {} -> {} from {} contexts",
            self.config.reference_vol,
            reference,
            vols.len()
        );
        self.config.reference_vol = reference;
    }

    /// Volatility seen by the sizing rule
    ///
    /// Realized volatility from history once there is enough of it, the
    /// context's own estimate before that.
    pub fn realized_volatility(&self, input: &PolicyInput<'_>) -> Decimal {
        input
            .history
            .realized_volatility(self.config.vol_lookback)
            .unwrap_or(input.context.volatility)
    }

    /// Target size in units for a confident signal
    pub fn target_size(&self, input: &PolicyInput<'_>) -> Quantity {
        if input.price <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let vol = self.realized_volatility(input);
        let vol_scale = if self.config.reference_vol > Decimal::ZERO {
            Decimal::ONE / (Decimal::ONE + vol / self.config.reference_vol)
        } else {
            Decimal::ONE
        };

        let fraction = self.config.base_fraction * input.signal.confidence * vol_scale;
        units(fraction * input.sizing_capital() / input.price)
    }

    pub fn decide(&self, input: &PolicyInput<'_>) -> Decision {
        let signal = input.signal;
        let held = if input.position.is_flat() {
            PositionSide::Flat
        } else {
            input.position.side
        };

        let wanted = match signal.direction {
            Direction::Bullish => PositionSide::Long,
            Direction::Bearish => PositionSide::Short,
            Direction::Neutral => PositionSide::Flat,
        };

        // Against the signal or no view: get out
        if wanted == PositionSide::Flat || (held != PositionSide::Flat && held != wanted) {
            return toward(PositionSide::Flat, Decimal::ZERO, input.position, Decimal::ZERO);
        }

        if signal.confidence < self.config.entry_threshold {
            return Decision::hold();
        }

        let decision = toward(
            wanted,
            self.target_size(input),
            input.position,
            self.config.resize_band,
        );

        match self.config.defer_in_volatile_regime {
            Some(steps)
                if input.context.regime == Regime::Volatile && decision.action.is_open() =>
            {
                decision.deferred(steps)
            }
            _ => decision,
        }
    }
}
