//! Layer 1 + Layer 2 over a tick stream
//!
//! Turns ticks into observations: every tick becomes exactly one
//! observation, with `None` wherever a layer had nothing to say.

use crate::features::{FeatureConfig, Featurizer};
use crate::signal::{MomentumSignal, SignalConfig};
use meridian_core::Observation;
use meridian_ports::Tick;

pub struct Pipeline {
    featurizer: Featurizer,
    signal: MomentumSignal,
}

impl Pipeline {
    pub fn new(features: FeatureConfig, signal: SignalConfig) -> Self {
        Self {
            featurizer: Featurizer::new(features),
            signal: MomentumSignal::new(signal),
        }
    }

    pub fn observe(&mut self, tick: &Tick) -> Observation {
        let Some(price) = tick.price else {
            return Observation::missing(tick.step, tick.timestamp);
        };

        let mut observation = Observation::new(tick.step, tick.timestamp, price);
        let context = self
            .featurizer
            .update_bar(tick.step, tick.timestamp, price, tick.bar.as_ref());
        if let Some(context) = context {
            observation = observation.with_signal(self.signal.estimate(&context));
            observation = observation.with_context(context);
        }
        observation
    }

    pub fn build(&mut self, ticks: &[Tick]) -> Vec<Observation> {
        ticks.iter().map(|tick| self.observe(tick)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use meridian_ports::Bar;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_one_observation_per_tick() {
        let now = Utc::now();
        let ticks: Vec<Tick> = (0..40u64)
            .map(|step| Tick {
                step,
                timestamp: now,
                price: (step != 30).then(|| dec!(100) + Decimal::from(step)),
                bar: None,
            })
            .collect();

        let observations =
            Pipeline::new(FeatureConfig::default(), SignalConfig::default()).build(&ticks);

        assert_eq!(observations.len(), 40);
        assert!(!observations[5].is_complete());
        assert!(observations[30].price.is_none());
        assert!(observations[30].context.is_none());
        assert!(observations[39].is_complete());
        let signal = observations[39].signal.as_ref().unwrap();
        assert_eq!(signal.step, 39);
        assert_eq!(observations[39].context.as_ref().unwrap().range, Decimal::ZERO);
    }

    #[test]
    fn test_bars_reach_the_context() {
        let now = Utc::now();
        let ticks: Vec<Tick> = (0..30u64)
            .map(|step| {
                let price = dec!(100) + Decimal::from(step % 4);
                Tick {
                    step,
                    timestamp: now,
                    price: Some(price),
                    bar: Some(Bar {
                        high: price + dec!(0.5),
                        low: price - dec!(0.5),
                        volume: dec!(800) + Decimal::from(step),
                    }),
                }
            })
            .collect();

        let observations =
            Pipeline::new(FeatureConfig::default(), SignalConfig::default()).build(&ticks);
        let context = observations[29].context.as_ref().unwrap();
        assert!(context.range > Decimal::ZERO);
        // Volume has risen every step
        assert!(context.volume_zscore > Decimal::ZERO);
    }
}
