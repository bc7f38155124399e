//! Synthetic Market - seeded regime-switching price path
//!
//! Stands in for the execution side in demos and tests:
//! - Prices follow a random walk whose drift and volatility depend on the
//!   current regime
//! - Regimes switch at random with a fixed per-step probability
//! - Feed outages drop the price of a step (an explicit gap)
//! - Each priced step carries a bar (high, low, volume) drawn from a
//!   separate stream, so bars never change the price path
//!
//! The same seed always produces the same path.

use chrono::{DateTime, Duration, TimeZone, Utc};
use meridian_core::{Price, Quantity, Regime, Timestamp};
use meridian_ports::{Bar, Tick};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Drift and volatility of one regime (per step, as fractions)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeParams {
    pub regime: Regime,
    pub drift: Decimal,
    pub volatility: Decimal,
}

/// Configuration for the synthetic market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub seed: u64,
    pub steps: u64,
    pub initial_price: Price,
    pub start: Timestamp,
    pub step_seconds: i64,
    pub regimes: Vec<RegimeParams>,
    /// Probability of leaving the current regime at each step (0.0 to 1.0)
    pub switch_probability: f64,
    /// Probability that a step's price never arrives (0.0 to 1.0)
    pub gap_probability: f64,
    /// Typical volume per step in calm markets
    pub base_volume: Quantity,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            steps: 2_000,
            initial_price: dec!(100),
            start: default_start(),
            step_seconds: 3_600,
            regimes: vec![
                RegimeParams {
                    regime: Regime::Trending,
                    drift: dec!(0.0008),
                    volatility: dec!(0.004),
                },
                RegimeParams {
                    regime: Regime::Trending,
                    drift: dec!(-0.0008),
                    volatility: dec!(0.004),
                },
                RegimeParams {
                    regime: Regime::Ranging,
                    drift: Decimal::ZERO,
                    volatility: dec!(0.003),
                },
                RegimeParams {
                    regime: Regime::Volatile,
                    drift: Decimal::ZERO,
                    volatility: dec!(0.015),
                },
            ],
            switch_probability: 0.02,
            gap_probability: 0.01,
            base_volume: dec!(1000),
        }
    }
}

fn default_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Generates a synthetic price path
pub struct SyntheticMarket {
    config: MarketConfig,
    rng: StdRng,
    bar_rng: StdRng,
    price: Price,
    regime: usize,
    step: u64,
}

impl SyntheticMarket {
    pub fn new(config: MarketConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        let bar_rng = StdRng::seed_from_u64(config.seed ^ 0x5DEE_CE66_D1CE_4E5B);
        Self {
            price: config.initial_price,
            config,
            rng,
            bar_rng,
            regime: 0,
            step: 0,
        }
    }

    /// Current (true) price, also during outages
    pub fn price(&self) -> Price {
        self.price
    }

    /// Regime that generated the last tick
    pub fn regime(&self) -> Option<&RegimeParams> {
        self.config.regimes.get(self.regime)
    }

    /// Generate the next tick
    pub fn next_tick(&mut self) -> Tick {
        let step = self.step;
        self.step += 1;

        let regimes = self.config.regimes.len();
        if regimes > 1 && self.rng.r#gen::<f64>() < self.config.switch_probability {
            // Always move to a different regime
            let shift = self.rng.gen_range(1..regimes);
            self.regime = (self.regime + shift) % regimes;
        }

        let open = self.price;
        if step > 0 {
            let (drift, vol) = self
                .regime()
                .map(|r| (to_f64(r.drift), to_f64(r.volatility)))
                .unwrap_or((0.0, 0.0));
            let shock = drift + vol * self.standard_normal();
            // A single step never takes more than half the price
            let multiplier =
                Decimal::from_f64_retain(1.0 + shock.max(-0.5)).unwrap_or(Decimal::ONE);
            self.price = (self.price * multiplier).round_dp(4).max(dec!(0.0001));
        }

        let timestamp =
            self.config.start + Duration::seconds(self.config.step_seconds * step as i64);
        let outage = self.rng.r#gen::<f64>() < self.config.gap_probability;
        let bar = self.bar(open);
        Tick {
            step,
            timestamp,
            price: if outage { None } else { Some(self.price) },
            bar: if outage { None } else { Some(bar) },
        }
    }

    /// Bar around the move from `open` to the current price
    ///
    /// Wicks and volume both grow with the regime's volatility.
    fn bar(&mut self, open: Price) -> Bar {
        let close = self.price;
        let vol = self.regime().map(|r| to_f64(r.volatility)).unwrap_or(0.0);
        let wick = |rng: &mut StdRng| {
            let u: f64 = rng.r#gen();
            Decimal::from_f64_retain(1.0 + u * vol).unwrap_or(Decimal::ONE)
        };
        let up = wick(&mut self.bar_rng);
        let down = wick(&mut self.bar_rng);
        let activity: f64 = 0.5 + self.bar_rng.r#gen::<f64>() + vol * 100.0;
        let volume = self.config.base_volume
            * Decimal::from_f64_retain(activity).unwrap_or(Decimal::ONE);

        Bar {
            high: (open.max(close) * up).round_dp(4),
            low: (open.min(close) / down).round_dp(4),
            volume: volume.round_dp(2),
        }
    }

    /// The whole configured path
    pub fn generate(&mut self) -> Vec<Tick> {
        (0..self.config.steps).map(|_| self.next_tick()).collect()
    }

    /// Approximately standard normal (Irwin-Hall with 12 uniforms)
    fn standard_normal(&mut self) -> f64 {
        (0..12).map(|_| self.rng.r#gen::<f64>()).sum::<f64>() - 6.0
    }
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
