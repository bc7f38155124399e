//! Walk-forward harness
//!
//! For each window: fit on the training range, then run a decision loop
//! over the validation range and score it. Independent windows (fresh
//! ledger, no warm start) run on the rayon pool; otherwise windows run in
//! order, handing the ledger and/or the fitted policy to the next one. A
//! carried ledger travels with its risk monitor, so a daily lockout or a
//! latched breaker does not end at a window boundary.

use crate::error::Result;
use crate::metrics::WindowMetrics;
use crate::report::{WalkForwardReport, WindowResult, WindowStatus};
use crate::timeline::Timeline;
use crate::training::{Trainer, TrainingConfig};
use crate::windows::{WindowConfig, plan_windows, validate_windows};
use log::{info, warn};
use meridian_core::EvaluationWindow;
use meridian_engine::{DecisionLoop, LoopConfig, ReplayFeed, RunStatus};
use meridian_ledger::{Ledger, LedgerConfig};
use meridian_policy::{PolicyConfig, PolicyEngine};
use meridian_risk::{RiskConstraintSet, RiskMonitor};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Ledger handling between windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerMode {
    /// Every window validates on a new ledger at the initial state
    #[default]
    Fresh,
    /// Each window validates on the ledger the previous window left
    CarryForward,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkForwardConfig {
    pub windows: WindowConfig,
    /// Use these windows instead of planning them
    pub explicit_windows: Option<Vec<EvaluationWindow>>,
    pub ledger_mode: LedgerMode,
    /// Start each window's fit from the previous window's fitted policy
    pub warm_start: bool,
    /// Run independent windows on the rayon pool
    pub parallel: bool,
    pub training: TrainingConfig,
    /// Annualization factor for the Sharpe-like ratio
    pub periods_per_year: u32,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self {
            windows: WindowConfig::default(),
            explicit_windows: None,
            ledger_mode: LedgerMode::Fresh,
            warm_start: false,
            parallel: true,
            training: TrainingConfig::default(),
            periods_per_year: 252,
        }
    }
}

pub struct WalkForwardHarness {
    config: WalkForwardConfig,
    ledger_config: LedgerConfig,
    constraints: RiskConstraintSet,
    loop_config: LoopConfig,
    policy: PolicyConfig,
}

impl WalkForwardHarness {
    pub fn new(
        config: WalkForwardConfig,
        ledger_config: LedgerConfig,
        constraints: RiskConstraintSet,
        loop_config: LoopConfig,
        policy: PolicyConfig,
    ) -> Result<Self> {
        ledger_config.validate()?;
        constraints.validate()?;
        Ok(Self {
            config,
            ledger_config,
            constraints,
            loop_config: LoopConfig {
                record_outcomes: true,
                ..loop_config
            },
            policy,
        })
    }

    pub fn config(&self) -> &WalkForwardConfig {
        &self.config
    }

    /// Windows not sharing ledger or policy state with each other
    pub fn windows_independent(&self) -> bool {
        self.config.ledger_mode == LedgerMode::Fresh && !self.config.warm_start
    }

    /// The windows a run over `timeline` would evaluate
    pub fn windows(&self, timeline: &Timeline) -> Result<Vec<EvaluationWindow>> {
        let span = timeline.span();
        match &self.config.explicit_windows {
            Some(windows) => {
                validate_windows(windows, span)?;
                Ok(windows.clone())
            }
            None => plan_windows(span, &self.config.windows),
        }
    }

    pub fn run(&self, timeline: &Timeline) -> Result<WalkForwardReport> {
        let windows = self.windows(timeline)?;
        let policy_name = PolicyEngine::new(&self.policy).name().to_string();
        info!(
            "[WALKFWD] {} windows over {} observations, policy={} ledger={:?} warm_start={}",
            windows.len(),
            timeline.len(),
            policy_name,
            self.config.ledger_mode,
            self.config.warm_start
        );

        let results = if self.windows_independent() && self.config.parallel {
            windows
                .par_iter()
                .map(|window| {
                    let ledger = Ledger::new(self.ledger_config.clone())?;
                    let policy = PolicyEngine::new(&self.policy);
                    self.run_window(timeline, *window, policy, ledger, None)
                        .map(|(result, ..)| result)
                })
                .collect::<Result<Vec<_>>>()?
        } else {
            self.run_sequential(timeline, &windows)?
        };

        let report = WalkForwardReport::new(policy_name, results);
        info!(
            "[WALKFWD] Done: {} completed, {} halted, {} degraded",
            report.aggregate.completed, report.aggregate.halted, report.aggregate.degraded
        );
        Ok(report)
    }

    fn run_sequential(
        &self,
        timeline: &Timeline,
        windows: &[EvaluationWindow],
    ) -> Result<Vec<WindowResult>> {
        let mut results = Vec::with_capacity(windows.len());
        let mut ledger = Ledger::new(self.ledger_config.clone())?;
        let mut policy = PolicyEngine::new(&self.policy);
        let mut monitor = None;

        for window in windows {
            if self.config.ledger_mode == LedgerMode::Fresh {
                ledger = Ledger::new(self.ledger_config.clone())?;
                monitor = None;
            }
            if !self.config.warm_start {
                policy = PolicyEngine::new(&self.policy);
            }

            let (mut result, next_ledger, next_policy, next_monitor) =
                self.run_window(timeline, *window, policy, ledger, monitor)?;
            ledger = next_ledger;
            policy = next_policy;
            monitor = next_monitor;

            // A carried ledger that tripped the breaker gets the operator reset
            if self.config.ledger_mode == LedgerMode::CarryForward
                && result.status == WindowStatus::Halted
                && let Some(last) = timeline.slice(window.validate).last()
            {
                let before = ledger.journal().len();
                ledger.reset_peak(last.step, last.timestamp);
                if let Some(monitor) = monitor.as_mut() {
                    monitor.reset();
                }
                result.journal.extend_from_slice(&ledger.journal()[before..]);
                warn!(
                    "[WALKFWD] Window {} halted; peak equity reset before the next window",
                    window.index
                );
            }
            results.push(result);
        }
        Ok(results)
    }

    /// Fit and validate one window
    ///
    /// Returns the ledger and risk monitor as validation left them and the
    /// fitted policy (the unfitted one when fitting failed). `monitor` is the
    /// risk state that came with a carried ledger.
    fn run_window(
        &self,
        timeline: &Timeline,
        window: EvaluationWindow,
        mut policy: PolicyEngine,
        ledger: Ledger,
        monitor: Option<RiskMonitor>,
    ) -> Result<(WindowResult, Ledger, PolicyEngine, Option<RiskMonitor>)> {
        let trainer = Trainer {
            config: &self.config.training,
            ledger: &self.ledger_config,
            constraints: &self.constraints,
            loop_config: &self.loop_config,
        };

        let unfitted = policy.clone();
        let fit = match trainer.fit(&mut policy, timeline.slice(window.train)) {
            Ok(fit) => fit,
            Err(e) => {
                warn!("[WALKFWD] Window {} degraded: {}", window.index, e);
                let result = WindowResult::degraded(window, e.to_string());
                return Ok((result, ledger, unfitted, monitor));
            }
        };

        let initial_equity = ledger.capital().equity;
        let journal_start = ledger.journal().len();

        let mut run = match monitor {
            Some(monitor) => DecisionLoop::with_monitor(
                ledger,
                policy,
                self.constraints.clone(),
                self.loop_config.clone(),
                monitor,
            )?,
            None => DecisionLoop::new(
                ledger,
                policy,
                self.constraints.clone(),
                self.loop_config.clone(),
            )?,
        };
        let mut feed = ReplayFeed::new(
            format!("window-{}", window.index),
            timeline.slice(window.validate).to_vec(),
        );
        let summary = run.run(&mut feed)?;
        let (ledger, policy, monitor, outcomes) = run.into_parts();

        let metrics =
            WindowMetrics::compute(initial_equity, &outcomes, self.config.periods_per_year);
        let status = match summary.status {
            RunStatus::Halted => WindowStatus::Halted,
            _ => WindowStatus::Completed,
        };
        info!(
            "[WALKFWD] Window {} ({:?}): return={} max_dd={} sharpe={} trades={}",
            window.index,
            status,
            metrics.total_return.round_dp(4),
            metrics.max_drawdown.round_dp(4),
            metrics.sharpe.round_dp(3),
            metrics.trades
        );

        let result = WindowResult {
            window,
            status,
            metrics: Some(metrics),
            fit: Some(fit),
            training_error: None,
            summary: Some(summary),
            journal: ledger.journal()[journal_start..].to_vec(),
        };
        Ok((result, ledger, policy, Some(monitor)))
    }
}
