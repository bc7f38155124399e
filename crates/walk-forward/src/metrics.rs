//! PnL-aware window metrics
//!
//! Everything is computed from the validation run's step outcomes: the
//! equity path after each step and the trades it executed.

use meridian_core::values::math;
use meridian_core::{Action, Trade};
use meridian_engine::StepOutcome;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Metrics of one validation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowMetrics {
    /// Final equity over starting equity, minus one
    pub total_return: Decimal,
    /// Worst peak-to-trough equity decline (fraction)
    pub max_drawdown: Decimal,
    /// Annualized mean/std of per-step equity returns
    pub sharpe: Decimal,
    /// Share of position-reducing trades that realized a profit
    pub win_rate: Option<Decimal>,
    pub trades: usize,
    pub steps: usize,
}

impl WindowMetrics {
    pub fn compute(
        initial_equity: Decimal,
        outcomes: &[StepOutcome],
        periods_per_year: u32,
    ) -> Self {
        let mut curve = Vec::with_capacity(outcomes.len() + 1);
        curve.push(initial_equity);
        curve.extend(outcomes.iter().map(|o| o.capital.equity));

        let trades: Vec<&Trade> = outcomes.iter().filter_map(|o| o.trade.as_ref()).collect();

        Self {
            total_return: total_return(&curve),
            max_drawdown: max_drawdown(&curve),
            sharpe: sharpe(&step_returns(&curve), periods_per_year),
            win_rate: win_rate(&trades),
            trades: trades.len(),
            steps: outcomes.len(),
        }
    }
}

pub fn total_return(curve: &[Decimal]) -> Decimal {
    match (curve.first(), curve.last()) {
        (Some(first), Some(last)) if *first > Decimal::ZERO => *last / *first - Decimal::ONE,
        _ => Decimal::ZERO,
    }
}

pub fn max_drawdown(curve: &[Decimal]) -> Decimal {
    let mut peak = Decimal::ZERO;
    let mut worst = Decimal::ZERO;
    for equity in curve {
        peak = peak.max(*equity);
        if peak > Decimal::ZERO {
            worst = worst.max((peak - *equity) / peak);
        }
    }
    worst
}

pub fn step_returns(curve: &[Decimal]) -> Vec<Decimal> {
    curve
        .windows(2)
        .filter(|w| w[0] > Decimal::ZERO)
        .map(|w| w[1] / w[0] - Decimal::ONE)
        .collect()
}

/// Zero when returns are flat
pub fn sharpe(returns: &[Decimal], periods_per_year: u32) -> Decimal {
    let std = math::std_dev(returns);
    if std.is_zero() {
        return Decimal::ZERO;
    }
    math::mean(returns) / std * math::sqrt_decimal(Decimal::from(periods_per_year))
}

/// `None` when nothing was closed or reduced
pub fn win_rate(trades: &[&Trade]) -> Option<Decimal> {
    let closing: Vec<&&Trade> = trades
        .iter()
        .filter(|t| t.action == Action::Close || !t.realized_pnl.is_zero())
        .collect();
    if closing.is_empty() {
        return None;
    }
    let wins = closing
        .iter()
        .filter(|t| t.realized_pnl > Decimal::ZERO)
        .count();
    Some(Decimal::from(wins) / Decimal::from(closing.len()))
}
