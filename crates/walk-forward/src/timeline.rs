//! Historical timeline of observations

use crate::error::{Result, WalkForwardError};
use meridian_core::{MarketContext, Observation, StepRange};

/// Observations in strictly increasing step order
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    observations: Vec<Observation>,
}

impl Timeline {
    pub fn new(observations: Vec<Observation>) -> Result<Self> {
        if observations.is_empty() {
            return Err(WalkForwardError::InvalidTimeline("no observations".to_string()));
        }
        if let Some(pair) = observations.windows(2).find(|w| w[1].step <= w[0].step) {
            return Err(WalkForwardError::InvalidTimeline(format!(
                "step {} follows step {}",
                pair[1].step, pair[0].step
            )));
        }
        Ok(Self { observations })
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Steps covered, half-open
    pub fn span(&self) -> StepRange {
        match (self.observations.first(), self.observations.last()) {
            (Some(first), Some(last)) => StepRange::new(first.step, last.step + 1),
            _ => StepRange::new(0, 0),
        }
    }

    /// Observations whose step falls in `range`
    pub fn slice(&self, range: StepRange) -> &[Observation] {
        let start = self.observations.partition_point(|o| o.step < range.start);
        let end = self.observations.partition_point(|o| o.step < range.end);
        &self.observations[start..end.max(start)]
    }

    /// Contexts present in `range`
    pub fn contexts(&self, range: StepRange) -> Vec<MarketContext> {
        self.slice(range)
            .iter()
            .filter_map(|o| o.context.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn obs(step: u64) -> Observation {
        Observation::new(step, Utc::now(), dec!(10))
    }

    #[test]
    fn test_rejects_unordered_steps() {
        assert!(Timeline::new(vec![obs(0), obs(2), obs(2)]).is_err());
        assert!(Timeline::new(vec![]).is_err());
    }

    #[test]
    fn test_slice_by_range() {
        let timeline = Timeline::new((5..20).map(obs).collect()).unwrap();
        assert_eq!(timeline.span(), StepRange::new(5, 20));

        let slice = timeline.slice(StepRange::new(8, 12));
        assert_eq!(slice.len(), 4);
        assert_eq!(slice[0].step, 8);
        assert!(timeline.slice(StepRange::new(30, 40)).is_empty());
        assert_eq!(timeline.slice(StepRange::new(0, 6)).len(), 1);
    }
}
