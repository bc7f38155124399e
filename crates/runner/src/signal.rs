//! Reference Layer 2 signal: momentum continuation
//!
//! Blends short and long momentum, scales the blend by volatility over the
//! signal horizon and reads direction and confidence off the result.

use meridian_core::values::math;
use meridian_core::{Direction, MarketContext, Regime, SignalEstimate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Weight of short momentum in the blend (long gets the rest)
    pub short_weight: Decimal,
    /// Steps the estimate looks ahead
    pub horizon: u32,
    /// Scaled strength below which the view is neutral
    pub dead_zone: Decimal,
    /// Confidence multiplier in the volatile regime
    pub volatile_discount: Decimal,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            short_weight: dec!(0.5),
            horizon: 10,
            dead_zone: dec!(0.25),
            volatile_discount: dec!(0.5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MomentumSignal {
    config: SignalConfig,
}

impl MomentumSignal {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    pub fn estimate(&self, context: &MarketContext) -> SignalEstimate {
        let w = self.config.short_weight.clamp(Decimal::ZERO, Decimal::ONE);
        let blend = w * context.momentum_short + (Decimal::ONE - w) * context.momentum_long;

        let horizon = Decimal::from(self.config.horizon.max(1));
        let noise = context.volatility * math::sqrt_decimal(horizon);
        let strength = if noise.is_zero() {
            if blend.is_zero() { Decimal::ZERO } else { dec!(10) }
        } else {
            blend.abs() / noise
        };

        if strength < self.config.dead_zone {
            return SignalEstimate::neutral(context.step, context.timestamp);
        }

        let direction = if blend > Decimal::ZERO {
            Direction::Bullish
        } else {
            Direction::Bearish
        };
        let mut confidence = strength / (Decimal::ONE + strength);
        if context.regime == Regime::Volatile {
            confidence *= self.config.volatile_discount;
        }

        SignalEstimate::new(
            context.step,
            context.timestamp,
            direction,
            confidence,
            blend.abs() * confidence,
        )
    }
}
