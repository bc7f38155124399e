//! Reference Layer 1 featurizer
//!
//! Streams prices in step order and emits a [`MarketContext`] per priced
//! step once enough history has accumulated. Only the current and past
//! prices are ever used.
//!
//! | feature          | definition                                          |
//! |------------------|-----------------------------------------------------|
//! | `zscore`         | (price − rolling mean) / rolling std of prices      |
//! | `volatility`     | rolling std of log returns                          |
//! | `trend_strength` | first difference of the rolling mean, over the mean |
//! | `momentum_*`     | simple return over the short / long lookback        |
//! | `simple_return`  | one-step simple return                              |
//! | `range`          | rolling mean of (high − low) / price                |
//! | `volume_zscore`  | (volume − rolling mean) / rolling std of volume     |
//! | `regime`         | volatile, trending or ranging (see [`Featurizer`])  |
//!
//! `range` and `volume_zscore` need bar data and stay zero without it.

use meridian_core::values::math;
use meridian_core::{MarketContext, Price, Regime, Step, Timestamp};
use meridian_ports::Bar;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Rolling window for mean, std and volatility
    pub window: usize,
    pub short_lookback: usize,
    pub long_lookback: usize,
    /// Volatility at or above which the regime is volatile
    pub volatile_threshold: Decimal,
    /// Long momentum, in units of volatility × sqrt(long_lookback), needed
    /// to call a trend
    pub trend_threshold: Decimal,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            window: 20,
            short_lookback: 5,
            long_lookback: 20,
            volatile_threshold: dec!(0.01),
            trend_threshold: dec!(1.0),
        }
    }
}

/// Causal rolling-window featurizer
#[derive(Debug, Clone)]
pub struct Featurizer {
    config: FeatureConfig,
    prices: VecDeque<Price>,
    log_returns: VecDeque<Decimal>,
    previous_mean: Option<Decimal>,
    /// Relative high-low ranges of recent bars
    ranges: VecDeque<Decimal>,
    volumes: VecDeque<Decimal>,
}

impl Featurizer {
    pub fn new(config: FeatureConfig) -> Self {
        let config = FeatureConfig {
            window: config.window.max(2),
            short_lookback: config.short_lookback.max(1),
            long_lookback: config.long_lookback.max(1),
            ..config
        };
        Self {
            config,
            prices: VecDeque::new(),
            log_returns: VecDeque::new(),
            previous_mean: None,
            ranges: VecDeque::new(),
            volumes: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Prices retained: enough for the window and both lookbacks
    fn capacity(&self) -> usize {
        self.config
            .window
            .max(self.config.long_lookback + 1)
            .max(self.config.short_lookback + 1)
    }

    /// Feed the next priced step; `None` while warming up
    pub fn update(
        &mut self,
        step: Step,
        timestamp: Timestamp,
        price: Price,
    ) -> Option<MarketContext> {
        self.update_bar(step, timestamp, price, None)
    }

    /// Feed the next priced step together with its bar, if reported
    pub fn update_bar(
        &mut self,
        step: Step,
        timestamp: Timestamp,
        price: Price,
        bar: Option<&Bar>,
    ) -> Option<MarketContext> {
        if price <= Decimal::ZERO {
            return None;
        }

        let window = self.config.window;
        if let Some(bar) = bar {
            let range = (bar.high - bar.low).max(Decimal::ZERO) / price;
            push_bounded(&mut self.ranges, range, window);
            push_bounded(&mut self.volumes, bar.volume.max(Decimal::ZERO), window);
        }

        let simple_return = match self.prices.back() {
            Some(previous) if *previous > Decimal::ZERO => price / *previous - Decimal::ONE,
            _ => Decimal::ZERO,
        };
        if let Some(previous) = self.prices.back() {
            self.log_returns.push_back((price / *previous).ln());
            if self.log_returns.len() > self.config.window {
                self.log_returns.pop_front();
            }
        }
        self.prices.push_back(price);
        if self.prices.len() > self.capacity() {
            self.prices.pop_front();
        }

        if self.prices.len() < window {
            return None;
        }

        let recent: Vec<Decimal> = self.prices.iter().rev().take(window).copied().collect();
        let mean = math::mean(&recent);
        let std = math::std_dev(&recent);
        let trend_strength = match self.previous_mean.replace(mean) {
            Some(previous) if previous > Decimal::ZERO => (mean - previous) / previous,
            _ => Decimal::ZERO,
        };

        if self.log_returns.len() < window || self.prices.len() < self.capacity() {
            return None;
        }

        let returns: Vec<Decimal> = self.log_returns.iter().copied().collect();
        let volatility = math::std_dev(&returns);
        let zscore = if std.is_zero() {
            Decimal::ZERO
        } else {
            (price - mean) / std
        };
        let momentum_short = self.momentum(self.config.short_lookback);
        let momentum_long = self.momentum(self.config.long_lookback);
        let range = if self.ranges.is_empty() {
            Decimal::ZERO
        } else {
            math::mean(self.ranges.make_contiguous())
        };
        let volume_zscore = match bar {
            Some(bar) => standard_score(bar.volume, self.volumes.make_contiguous()),
            None => Decimal::ZERO,
        };

        Some(MarketContext {
            step,
            timestamp,
            trend_strength,
            volatility,
            regime: self.regime(volatility, momentum_long),
            momentum_short,
            momentum_long,
            zscore,
            simple_return,
            range,
            volume_zscore,
        })
    }

    /// Return over the last `lookback` priced steps
    fn momentum(&self, lookback: usize) -> Decimal {
        let len = self.prices.len();
        match (self.prices.back(), len.checked_sub(lookback + 1).map(|i| self.prices[i])) {
            (Some(last), Some(base)) if base > Decimal::ZERO => *last / base - Decimal::ONE,
            _ => Decimal::ZERO,
        }
    }

    /// Volatile beats trending; trending needs long momentum well beyond
    /// what volatility alone would produce
    fn regime(&self, volatility: Decimal, momentum_long: Decimal) -> Regime {
        if volatility >= self.config.volatile_threshold {
            return Regime::Volatile;
        }
        let noise = volatility * math::sqrt_decimal(Decimal::from(self.config.long_lookback));
        if noise.is_zero() {
            return if momentum_long.is_zero() {
                Regime::Ranging
            } else {
                Regime::Trending
            };
        }
        if momentum_long.abs() / noise >= self.config.trend_threshold {
            Regime::Trending
        } else {
            Regime::Ranging
        }
    }
}

fn push_bounded(values: &mut VecDeque<Decimal>, value: Decimal, capacity: usize) {
    values.push_back(value);
    if values.len() > capacity {
        values.pop_front();
    }
}

fn standard_score(value: Decimal, sample: &[Decimal]) -> Decimal {
    if sample.len() < 2 {
        return Decimal::ZERO;
    }
    let std = math::std_dev(sample);
    if std.is_zero() {
        Decimal::ZERO
    } else {
        (value - math::mean(sample)) / std
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn run(prices: &[Decimal], config: FeatureConfig) -> Vec<Option<MarketContext>> {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let mut featurizer = Featurizer::new(config);
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| featurizer.update(i as u64, start + Duration::hours(i as i64), *p))
            .collect()
    }

    fn small() -> FeatureConfig {
        FeatureConfig {
            window: 5,
            short_lookback: 2,
            long_lookback: 4,
            ..Default::default()
        }
    }

    #[test]
    fn test_warm_up_then_contexts() {
        let prices: Vec<Decimal> = (0..10).map(|i| dec!(100) + Decimal::from(i)).collect();
        let contexts = run(&prices, small());

        // Five log returns need six prices
        assert!(contexts[..5].iter().all(Option::is_none));
        assert!(contexts[5..].iter().all(Option::is_some));
    }

    #[test]
    fn test_steady_uptrend() {
        let prices: Vec<Decimal> = (0..30)
            .map(|i| dec!(100) * (Decimal::ONE + dec!(0.002) * Decimal::from(i)))
            .collect();
        let context = run(&prices, small()).pop().flatten().unwrap();

        assert!(context.trend_strength > Decimal::ZERO);
        assert!(context.momentum_short > Decimal::ZERO);
        assert!(context.momentum_long > context.momentum_short);
        assert!(context.zscore > Decimal::ZERO);
        assert_eq!(context.regime, Regime::Trending);
    }

    #[test]
    fn test_choppy_market_is_volatile() {
        let prices: Vec<Decimal> = (0..30)
            .map(|i| if i % 2 == 0 { dec!(100) } else { dec!(104) })
            .collect();
        let context = run(&prices, small()).pop().flatten().unwrap();
        assert_eq!(context.regime, Regime::Volatile);
        assert!(context.volatility > dec!(0.01));
    }

    #[test]
    fn test_flat_prices() {
        let prices = vec![dec!(50); 12];
        let context = run(&prices, small()).pop().flatten().unwrap();
        assert_eq!(context.volatility, Decimal::ZERO);
        assert_eq!(context.zscore, Decimal::ZERO);
        assert_eq!(context.regime, Regime::Ranging);
    }

    #[test]
    fn test_bar_features() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let mut featurizer = Featurizer::new(small());
        let mut last = None;
        for i in 0..12u64 {
            let price = dec!(100) + Decimal::from(i % 3);
            let bar = Bar {
                high: price + dec!(1),
                low: price - dec!(1),
                volume: if i == 11 { dec!(5000) } else { dec!(1000) + Decimal::from(i % 2) },
            };
            let ts = start + Duration::hours(i as i64);
            last = featurizer.update_bar(i, ts, price, Some(&bar));
        }
        let context = last.unwrap();

        // Step 11 at 102 after 101
        assert_eq!(context.simple_return, dec!(102) / dec!(101) - Decimal::ONE);
        assert!(context.range > dec!(0.019) && context.range < dec!(0.021));
        assert!(context.volume_zscore > Decimal::ONE);

        let plain = run(&[dec!(100), dec!(101), dec!(102)].repeat(4), small());
        let context = plain.last().cloned().flatten().unwrap();
        assert_eq!(context.range, Decimal::ZERO);
        assert_eq!(context.volume_zscore, Decimal::ZERO);
        assert!(context.simple_return > Decimal::ZERO);
    }

    #[test]
    fn test_contexts_ignore_future_prices() {
        let original: Vec<Decimal> = (0..40).map(|i| dec!(100) + Decimal::from(i % 7)).collect();
        let mut altered = original[..25].to_vec();
        altered.extend((0..15).map(|i| dec!(300) - Decimal::from(i)));

        let first = run(&original, small());
        let second = run(&altered, small());
        assert_eq!(first[..25], second[..25]);
        assert_ne!(first[30], second[30]);
    }
}
