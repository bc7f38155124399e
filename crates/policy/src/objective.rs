//! Training objective and trajectories
//!
//! The learned policy is scored on what the ledger says happened, never on
//! prediction error: return over the episode minus a penalty on the worst
//! drawdown suffered along the way.

use serde::{Deserialize, Serialize};

/// Drawdown-penalized return
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Objective {
    /// Weight on max drawdown (2.0 = a 5% drawdown costs 10% of return)
    pub drawdown_penalty: f64,
}

impl Default for Objective {
    fn default() -> Self {
        Self {
            drawdown_penalty: 2.0,
        }
    }
}

impl Objective {
    pub fn score(&self, total_return: f64, max_drawdown: f64) -> f64 {
        total_return - self.drawdown_penalty * max_drawdown
    }
}

/// One policy choice made during an exploration episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryStep {
    pub features: Vec<f64>,
    /// Index of the sampled exposure class
    pub class: usize,
}

/// One exploration episode and its ledger outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub steps: Vec<TrajectoryStep>,
    pub total_return: f64,
    pub max_drawdown: f64,
}

impl Trajectory {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Episodes collected for one update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryBatch {
    pub trajectories: Vec<Trajectory>,
}

impl TrajectoryBatch {
    pub fn new(trajectories: Vec<Trajectory>) -> Self {
        Self { trajectories }
    }

    pub fn push(&mut self, trajectory: Trajectory) {
        self.trajectories.push(trajectory);
    }

    pub fn step_count(&self) -> usize {
        self.trajectories.iter().map(|t| t.steps.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drawdown_is_penalized() {
        let objective = Objective::default();
        let steady = objective.score(0.04, 0.01);
        let bumpy = objective.score(0.05, 0.04);
        assert!(steady > bumpy);
    }
}
