//! Per-window results and their aggregation

use crate::metrics::WindowMetrics;
use crate::training::FitReport;
use meridian_core::EvaluationWindow;
use meridian_core::values::math;
use meridian_engine::RunSummary;
use meridian_ledger::LedgerEntry;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Summary statistics of one metric across windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub count: usize,
    pub min: Decimal,
    pub max: Decimal,
    pub mean: Decimal,
    pub median: Decimal,
    pub std: Decimal,
    pub p25: Decimal,
    pub p75: Decimal,
}

impl Distribution {
    /// `None` for an empty sample
    pub fn from_values(values: &[Decimal]) -> Option<Self> {
        let min = values.iter().min().copied()?;
        let max = values.iter().max().copied()?;
        Some(Self {
            count: values.len(),
            min,
            max,
            mean: math::mean(values),
            median: math::median(values),
            std: math::std_dev(values),
            p25: math::percentile(values, dec!(0.25)),
            p75: math::percentile(values, dec!(0.75)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowStatus {
    /// Validation ran to the end of its range
    Completed,
    /// Validation stopped on the drawdown breaker
    Halted,
    /// The policy could not be fitted; validation was skipped
    Degraded,
}

/// Outcome of one evaluation window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowResult {
    pub window: EvaluationWindow,
    pub status: WindowStatus,
    /// `None` for degraded windows
    pub metrics: Option<WindowMetrics>,
    pub fit: Option<FitReport>,
    pub training_error: Option<String>,
    pub summary: Option<RunSummary>,
    /// Ledger entries written during this window's validation run;
    /// persisted separately as JSON lines
    #[serde(skip)]
    pub journal: Vec<LedgerEntry>,
}

impl WindowResult {
    pub fn degraded(window: EvaluationWindow, error: String) -> Self {
        Self {
            window,
            status: WindowStatus::Degraded,
            metrics: None,
            fit: None,
            training_error: Some(error),
            summary: None,
            journal: Vec::new(),
        }
    }
}

/// Distributions across windows that produced metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub total_return: Option<Distribution>,
    pub max_drawdown: Option<Distribution>,
    pub sharpe: Option<Distribution>,
    /// Over windows that closed at least one trade
    pub win_rate: Option<Distribution>,
    pub trades: Option<Distribution>,
    pub completed: usize,
    pub halted: usize,
    pub degraded: usize,
}

impl AggregateMetrics {
    pub fn from_windows(windows: &[WindowResult]) -> Self {
        let metrics: Vec<&WindowMetrics> =
            windows.iter().filter_map(|w| w.metrics.as_ref()).collect();
        let collect = |f: fn(&WindowMetrics) -> Option<Decimal>| -> Option<Distribution> {
            let values: Vec<Decimal> = metrics.iter().filter_map(|m| f(m)).collect();
            Distribution::from_values(&values)
        };
        let count = |status: WindowStatus| windows.iter().filter(|w| w.status == status).count();

        Self {
            total_return: collect(|m| Some(m.total_return)),
            max_drawdown: collect(|m| Some(m.max_drawdown)),
            sharpe: collect(|m| Some(m.sharpe)),
            win_rate: collect(|m| m.win_rate),
            trades: collect(|m| Some(Decimal::from(m.trades))),
            completed: count(WindowStatus::Completed),
            halted: count(WindowStatus::Halted),
            degraded: count(WindowStatus::Degraded),
        }
    }
}

/// Full walk-forward result, windows in chronological order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardReport {
    pub policy: String,
    pub windows: Vec<WindowResult>,
    pub aggregate: AggregateMetrics,
}

impl WalkForwardReport {
    pub fn new(policy: String, windows: Vec<WindowResult>) -> Self {
        let aggregate = AggregateMetrics::from_windows(&windows);
        Self {
            policy,
            windows,
            aggregate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::StepRange;

    fn metrics(total_return: Decimal, win_rate: Option<Decimal>) -> WindowMetrics {
        WindowMetrics {
            total_return,
            max_drawdown: dec!(0.02),
            sharpe: Decimal::ONE,
            win_rate,
            trades: 4,
            steps: 10,
        }
    }

    fn completed(index: usize, m: WindowMetrics) -> WindowResult {
        WindowResult {
            window: EvaluationWindow::new(
                index,
                StepRange::new(0, 10),
                StepRange::new(10, 20),
            ),
            status: WindowStatus::Completed,
            metrics: Some(m),
            fit: None,
            training_error: None,
            summary: None,
            journal: Vec::new(),
        }
    }

    #[test]
    fn test_distribution() {
        let d = Distribution::from_values(&[dec!(4), dec!(1), dec!(3), dec!(2)]).unwrap();
        assert_eq!(d.count, 4);
        assert_eq!(d.min, dec!(1));
        assert_eq!(d.max, dec!(4));
        assert_eq!(d.mean, dec!(2.5));
        assert_eq!(d.median, dec!(2.5));
        assert_eq!(d.p25, dec!(1.75));
        assert_eq!(d.p75, dec!(3.25));
        assert!(Distribution::from_values(&[]).is_none());
    }

    #[test]
    fn test_aggregate_skips_degraded_windows() {
        let windows = vec![
            completed(0, metrics(dec!(0.1), Some(dec!(0.5)))),
            WindowResult::degraded(
                EvaluationWindow::new(1, StepRange::new(20, 30), StepRange::new(30, 40)),
                "non-finite objective".to_string(),
            ),
            completed(2, metrics(dec!(-0.1), None)),
        ];
        let aggregate = AggregateMetrics::from_windows(&windows);

        assert_eq!(aggregate.completed, 2);
        assert_eq!(aggregate.degraded, 1);
        assert_eq!(aggregate.halted, 0);
        assert_eq!(aggregate.total_return.as_ref().unwrap().count, 2);
        assert_eq!(aggregate.total_return.as_ref().unwrap().mean, Decimal::ZERO);
        assert_eq!(aggregate.win_rate.as_ref().unwrap().count, 1);
    }
}
