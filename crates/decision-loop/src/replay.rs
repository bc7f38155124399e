//! Replay feed over a recorded timeline

use meridian_core::{Observation, StepRange};
use meridian_ports::MarketFeed;
use std::collections::VecDeque;

/// Yields recorded observations in step order
#[derive(Debug, Clone)]
pub struct ReplayFeed {
    name: String,
    observations: VecDeque<Observation>,
}

impl ReplayFeed {
    pub fn new(name: impl Into<String>, mut observations: Vec<Observation>) -> Self {
        observations.sort_by_key(|o| o.step);
        Self {
            name: name.into(),
            observations: observations.into(),
        }
    }

    /// Observations of `timeline` whose step falls inside `range`
    pub fn window(name: impl Into<String>, timeline: &[Observation], range: StepRange) -> Self {
        let observations = timeline
            .iter()
            .filter(|o| range.contains(o.step))
            .cloned()
            .collect();
        Self::new(name, observations)
    }

    pub fn remaining(&self) -> usize {
        self.observations.len()
    }
}

impl MarketFeed for ReplayFeed {
    fn next_observation(&mut self) -> Option<Observation> {
        self.observations.pop_front()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
