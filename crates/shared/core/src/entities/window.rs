use serde::{Deserialize, Serialize};

use crate::values::Step;

/// Half-open range of steps `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepRange {
    pub start: Step,
    pub end: Step,
}

impl StepRange {
    pub fn new(start: Step, end: Step) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, step: Step) -> bool {
        step >= self.start && step < self.end
    }

    pub fn overlaps(&self, other: &StepRange) -> bool {
        !self.is_empty() && !other.is_empty() && self.start < other.end && other.start < self.end
    }

    /// Every step of `self` comes strictly before every step of `other`
    pub fn precedes(&self, other: &StepRange) -> bool {
        self.end <= other.start
    }
}

/// One train/validate pair of a walk-forward run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationWindow {
    pub index: usize,
    pub train: StepRange,
    pub validate: StepRange,
}

impl EvaluationWindow {
    pub fn new(index: usize, train: StepRange, validate: StepRange) -> Self {
        Self {
            index,
            train,
            validate,
        }
    }

    /// First and last step touched by this window
    pub fn span(&self) -> StepRange {
        StepRange::new(
            self.train.start.min(self.validate.start),
            self.train.end.max(self.validate.end),
        )
    }
}
