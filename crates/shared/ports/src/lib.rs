//! Meridian Ports
//!
//! Port definitions (traits) for the Meridian decision engine.
//! These define the boundary between the decision layer and the upstream
//! producers of market context (Layer 1) and signal estimates (Layer 2).

mod feed;

pub use feed::{Bar, LiveFeed, MarketFeed, Tick};
