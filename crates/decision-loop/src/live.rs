//! Live operation
//!
//! Same step function as a backtest, fed from an async [`LiveFeed`]. Each
//! context/signal fetch gets the configured latency budget; a fetch that
//! overruns is treated as missing and the step holds.

use crate::decision_loop::DecisionLoop;
use crate::error::{DataGapError, Result};
use crate::outcome::{RunStatus, RunSummary};
use log::{info, warn};
use meridian_core::Observation;
use meridian_ports::LiveFeed;
use std::time::Duration;
use tokio::time::timeout;

impl DecisionLoop {
    /// Drive the loop from a live feed until the session ends or the run stops
    pub async fn run_live<F: LiveFeed + ?Sized>(&mut self, feed: &mut F) -> Result<RunSummary> {
        let budget = Duration::from_millis(self.config().fetch_timeout_ms);
        info!("[LOOP] Live run started, fetch budget {:?}", budget);

        while self.status() == RunStatus::Running {
            let Some(tick) = feed.next_tick().await else {
                self.finish();
                break;
            };

            let mut gap = None;

            let context = match timeout(budget, feed.fetch_context(&tick)).await {
                Ok(context) => context,
                Err(_) => {
                    warn!("[LOOP] Context fetch timed out at step {}", tick.step);
                    gap = Some(DataGapError::Timeout {
                        step: tick.step,
                        what: "context".to_string(),
                    });
                    None
                }
            };

            let signal = match timeout(budget, feed.fetch_signal(&tick)).await {
                Ok(signal) => signal,
                Err(_) => {
                    warn!("[LOOP] Signal fetch timed out at step {}", tick.step);
                    gap.get_or_insert(DataGapError::Timeout {
                        step: tick.step,
                        what: "signal".to_string(),
                    });
                    None
                }
            };

            let observation = Observation {
                step: tick.step,
                timestamp: tick.timestamp,
                price: tick.price,
                context,
                signal,
            };
            self.run_step(&observation, gap)?;
        }

        Ok(self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoopConfig;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use meridian_core::{MarketContext, SignalEstimate, Step};
    use meridian_ledger::{Ledger, LedgerConfig};
    use meridian_policy::{PolicyConfig, PolicyEngine, RuleConfig};
    use meridian_ports::Tick;
    use meridian_risk::RiskConstraintSet;
    use rust_decimal_macros::dec;

    /// Feed whose signal service stalls on chosen steps
    struct SlowSignalFeed {
        next: Step,
        end: Step,
        slow_steps: Vec<Step>,
    }

    #[async_trait]
    impl LiveFeed for SlowSignalFeed {
        async fn next_tick(&mut self) -> Option<Tick> {
            if self.next >= self.end {
                return None;
            }
            let step = self.next;
            self.next += 1;
            Some(Tick {
                step,
                timestamp: Utc.with_ymd_and_hms(2024, 9, 2, 12, 0, 0).unwrap()
                    + ChronoDuration::seconds(step as i64),
                price: Some(dec!(100)),
                bar: None,
            })
        }

        async fn fetch_context(&mut self, tick: &Tick) -> Option<MarketContext> {
            Some(MarketContext::neutral(tick.step, tick.timestamp).with_volatility(dec!(0.01)))
        }

        async fn fetch_signal(&mut self, tick: &Tick) -> Option<SignalEstimate> {
            if self.slow_steps.contains(&tick.step) {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            Some(SignalEstimate::bullish(tick.step, tick.timestamp, dec!(0.8)))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetch_is_a_gap() {
        let mut engine = DecisionLoop::new(
            Ledger::new(LedgerConfig::default()).unwrap(),
            PolicyEngine::new(&PolicyConfig::RuleConstrained(RuleConfig::default())),
            RiskConstraintSet::default(),
            LoopConfig {
                fetch_timeout_ms: 100,
                ..Default::default()
            },
        )
        .unwrap();

        let mut feed = SlowSignalFeed {
            next: 0,
            end: 3,
            slow_steps: vec![0],
        };
        let summary = engine.run_live(&mut feed).await.unwrap();

        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.steps, 3);
        assert_eq!(summary.data_gaps, 1);

        let first = &engine.outcomes()[0];
        assert!(matches!(first.data_gap, Some(DataGapError::Timeout { .. })));
        assert!(first.trade.is_none());
        // The next step trades normally
        assert!(engine.outcomes()[1].trade.is_some());
    }
}
