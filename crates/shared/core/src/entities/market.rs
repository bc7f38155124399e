//! Layer 1 and Layer 2 outputs as seen by the decision layer.
//!
//! Both are produced upstream and are immutable once emitted. An
//! [`Observation`] bundles them for one step; a `None` in any slot is the
//! explicit "missing" marker for that step.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::values::{Price, Step, Timestamp};

/// Qualitative market behavior label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Regime {
    /// Persistent directional drift
    Trending,
    /// Mean-reverting, low drift
    Ranging,
    /// Elevated volatility regardless of drift
    Volatile,
    /// Not enough history to label
    Unknown,
}

/// Market-state feature vector for one step (Layer 1 output)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    pub step: Step,
    pub timestamp: Timestamp,
    /// Signed slope of the smoothed price, relative to price
    pub trend_strength: Decimal,
    /// Volatility estimate (std of log returns)
    pub volatility: Decimal,
    pub regime: Regime,
    /// Short-horizon return
    pub momentum_short: Decimal,
    /// Long-horizon return
    pub momentum_long: Decimal,
    /// Distance of price from its rolling mean in std units
    pub zscore: Decimal,
    /// One-step simple return
    #[serde(default)]
    pub simple_return: Decimal,
    /// Rolling mean of (high − low) / price; zero without bar data
    #[serde(default)]
    pub range: Decimal,
    /// Volume in rolling std units from its rolling mean; zero without bar data
    #[serde(default)]
    pub volume_zscore: Decimal,
}

impl MarketContext {
    /// Context with all features at zero and an unknown regime
    pub fn neutral(step: Step, timestamp: Timestamp) -> Self {
        Self {
            step,
            timestamp,
            trend_strength: Decimal::ZERO,
            volatility: Decimal::ZERO,
            regime: Regime::Unknown,
            momentum_short: Decimal::ZERO,
            momentum_long: Decimal::ZERO,
            zscore: Decimal::ZERO,
            simple_return: Decimal::ZERO,
            range: Decimal::ZERO,
            volume_zscore: Decimal::ZERO,
        }
    }

    pub fn with_volatility(mut self, volatility: Decimal) -> Self {
        self.volatility = volatility.max(Decimal::ZERO);
        self
    }

    pub fn with_regime(mut self, regime: Regime) -> Self {
        self.regime = regime;
        self
    }

    pub fn with_trend(mut self, trend_strength: Decimal) -> Self {
        self.trend_strength = trend_strength;
        self
    }

    pub fn with_momentum(mut self, short: Decimal, long: Decimal) -> Self {
        self.momentum_short = short;
        self.momentum_long = long;
        self
    }
}

/// Directional view of the signal estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl Direction {
    /// +1 bullish, -1 bearish, 0 neutral
    pub fn sign(&self) -> Decimal {
        match self {
            Direction::Bullish => Decimal::ONE,
            Direction::Bearish => Decimal::NEGATIVE_ONE,
            Direction::Neutral => Decimal::ZERO,
        }
    }
}

/// Edge estimate for one step (Layer 2 output)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEstimate {
    pub step: Step,
    pub timestamp: Timestamp,
    pub direction: Direction,
    /// Confidence in [0, 1]
    pub confidence: Decimal,
    /// Expected payoff per unit notional over the signal horizon
    pub expected_payoff: Decimal,
}

impl SignalEstimate {
    /// Create a signal; confidence is clamped into [0, 1]
    pub fn new(
        step: Step,
        timestamp: Timestamp,
        direction: Direction,
        confidence: Decimal,
        expected_payoff: Decimal,
    ) -> Self {
        Self {
            step,
            timestamp,
            direction,
            confidence: confidence.clamp(Decimal::ZERO, Decimal::ONE),
            expected_payoff,
        }
    }

    pub fn bullish(step: Step, timestamp: Timestamp, confidence: Decimal) -> Self {
        Self::new(step, timestamp, Direction::Bullish, confidence, Decimal::ZERO)
    }

    pub fn bearish(step: Step, timestamp: Timestamp, confidence: Decimal) -> Self {
        Self::new(step, timestamp, Direction::Bearish, confidence, Decimal::ZERO)
    }

    pub fn neutral(step: Step, timestamp: Timestamp) -> Self {
        Self::new(step, timestamp, Direction::Neutral, Decimal::ZERO, Decimal::ZERO)
    }

    pub fn with_expected_payoff(mut self, expected_payoff: Decimal) -> Self {
        self.expected_payoff = expected_payoff;
        self
    }
}

/// Everything known about one step of the timeline
///
/// `price` is the realized mark/fill price reported by the execution side;
/// `context` and `signal` come from Layers 1 and 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub step: Step,
    pub timestamp: Timestamp,
    pub price: Option<Price>,
    pub context: Option<MarketContext>,
    pub signal: Option<SignalEstimate>,
}

impl Observation {
    /// Observation with a price and nothing else yet
    pub fn new(step: Step, timestamp: Timestamp, price: Price) -> Self {
        Self {
            step,
            timestamp,
            price: Some(price),
            context: None,
            signal: None,
        }
    }

    /// A step where nothing arrived
    pub fn missing(step: Step, timestamp: Timestamp) -> Self {
        Self {
            step,
            timestamp,
            price: None,
            context: None,
            signal: None,
        }
    }

    pub fn with_context(mut self, context: MarketContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_signal(mut self, signal: SignalEstimate) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Price, context and signal all present
    pub fn is_complete(&self) -> bool {
        self.price.is_some() && self.context.is_some() && self.signal.is_some()
    }
}
