use async_trait::async_trait;
use meridian_core::{MarketContext, Observation, Price, Quantity, SignalEstimate, Step, Timestamp};

/// Port for time-ordered market observations (backtest / replay)
///
/// Implementations must yield observations in strictly increasing step
/// order. A step with no data is still yielded, with `None` in the missing
/// slots, so that gaps are explicit.
pub trait MarketFeed {
    /// Next observation, `None` once the stream is exhausted
    fn next_observation(&mut self) -> Option<Observation>;

    /// Get the feed's name/identifier for debugging
    fn name(&self) -> &str {
        "MarketFeed"
    }
}

/// Intra-step range and traded volume, when the source reports them
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub high: Price,
    pub low: Price,
    pub volume: Quantity,
}

/// The clock edge of a live step: when it happened and the realized price
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub step: Step,
    pub timestamp: Timestamp,
    pub price: Option<Price>,
    pub bar: Option<Bar>,
}

/// Port for live operation
///
/// Context and signal are fetched separately per tick so the decision loop
/// can bound each fetch by its latency budget.
#[async_trait]
pub trait LiveFeed: Send {
    /// Wait for the next tick, `None` when the session ends
    async fn next_tick(&mut self) -> Option<Tick>;

    /// Layer 1 output for this tick
    async fn fetch_context(&mut self, tick: &Tick) -> Option<MarketContext>;

    /// Layer 2 output for this tick
    async fn fetch_signal(&mut self, tick: &Tick) -> Option<SignalEstimate>;
}
