//! Bounded step history
//!
//! The only memory a policy has across calls. The decision loop appends one
//! record per step after the ledger commit; the oldest record drops out once
//! the window is full.

use meridian_core::values::math;
use meridian_core::{Action, Decision, Price, Regime, Step, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// What happened at one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: Step,
    pub timestamp: Timestamp,
    /// Mark price, if one arrived
    pub price: Option<Price>,
    /// Regime label of the step's context, if one arrived
    pub regime: Option<Regime>,
    /// Decision that was actually executed (post-governor)
    pub decision: Decision,
    /// Equity after the step's commit
    pub equity: Decimal,
}

impl StepRecord {
    pub fn traded(&self) -> bool {
        self.decision.action != Action::Hold
    }
}

/// Fixed-capacity ring of recent step records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    capacity: usize,
    records: VecDeque<StepRecord>,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, record: StepRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn last(&self) -> Option<&StepRecord> {
        self.records.back()
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &StepRecord> {
        self.records.iter()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Simple returns between consecutive priced records in the last
    /// `lookback` records
    pub fn returns(&self, lookback: usize) -> Vec<Decimal> {
        let skip = self.records.len().saturating_sub(lookback);
        let prices: Vec<Price> = self
            .records
            .iter()
            .skip(skip)
            .filter_map(|r| r.price)
            .filter(|p| *p > Decimal::ZERO)
            .collect();

        prices.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect()
    }

    /// Std of recent simple returns; `None` until two returns exist
    pub fn realized_volatility(&self, lookback: usize) -> Option<Decimal> {
        let returns = self.returns(lookback);
        if returns.len() < 2 {
            return None;
        }
        Some(math::std_dev(&returns))
    }

    /// Equity drawdown from the best equity inside the window
    pub fn window_drawdown(&self) -> Decimal {
        let mut peak = Decimal::ZERO;
        let mut worst = Decimal::ZERO;
        for record in &self.records {
            peak = peak.max(record.equity);
            if peak > Decimal::ZERO {
                worst = worst.max((peak - record.equity) / peak);
            }
        }
        worst
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(64)
    }
}
