//! Policy fitting on a window's training range
//!
//! The rule variant is calibrated from the training contexts. The learned
//! variant is additionally trained: each epoch splits the training range
//! into episodes, runs every episode through a fresh decision loop with
//! exploration on, and feeds the resulting trajectories to one update.
//! Nothing outside the training range is ever touched.

use crate::error::FitError;
use crate::metrics;
use log::{info, warn};
use meridian_core::Observation;
use meridian_engine::{DecisionLoop, LoopConfig, ReplayFeed};
use meridian_ledger::{Ledger, LedgerConfig};
use meridian_policy::{PolicyEngine, Trajectory, TrajectoryBatch, TrajectoryStep};
use meridian_risk::RiskConstraintSet;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Training schedule for trainable policies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub epochs: usize,
    /// Steps per exploration episode
    pub episode_len: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 5,
            episode_len: 50,
        }
    }
}

/// What fitting did
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub contexts: usize,
    pub episodes: usize,
    pub updates: usize,
    /// Mean objective of the last update
    pub final_objective: Option<f64>,
}

/// Fits policies for one evaluation run's ledger and risk settings
#[derive(Debug, Clone)]
pub struct Trainer<'a> {
    pub config: &'a TrainingConfig,
    pub ledger: &'a LedgerConfig,
    pub constraints: &'a RiskConstraintSet,
    pub loop_config: &'a LoopConfig,
}

impl Trainer<'_> {
    /// Fit `policy` on `train` (observations of the training range only)
    ///
    /// On failure the policy is left as it was before the failing update.
    pub fn fit(
        &self,
        policy: &mut PolicyEngine,
        train: &[Observation],
    ) -> Result<FitReport, FitError> {
        let contexts: Vec<_> = train.iter().filter_map(|o| o.context.clone()).collect();
        policy.calibrate(&contexts);

        let mut report = FitReport {
            contexts: contexts.len(),
            ..Default::default()
        };
        if !policy.is_trainable() {
            return Ok(report);
        }

        let episode_len = self.config.episode_len.max(2);
        for epoch in 0..self.config.epochs {
            let explorer = policy.explorer(epoch as u64 + 1);

            let mut batch = TrajectoryBatch::default();
            for (i, episode) in train.chunks(episode_len).enumerate() {
                let trajectory = self.run_episode(&explorer, episode).map_err(|e| {
                    FitError::Episode(format!("epoch {} episode {}: {}", epoch, i, e))
                })?;
                if !trajectory.is_empty() {
                    batch.push(trajectory);
                }
            }
            report.episodes += batch.trajectories.len();

            let Some(learned) = policy.as_learned_mut() else {
                break;
            };
            match learned.update(&batch) {
                Ok(update) => {
                    report.updates += 1;
                    report.final_objective = Some(update.mean_objective);
                }
                Err(e) => {
                    warn!("[TRAIN] Epoch {} failed: {}", epoch, e);
                    return Err(e.into());
                }
            }
        }

        info!(
            "[TRAIN] Fitted {} over {} contexts: {} episodes, {} updates",
            policy.name(),
            report.contexts,
            report.episodes,
            report.updates
        );
        Ok(report)
    }

    /// One exploration episode on a fresh ledger
    fn run_episode(
        &self,
        explorer: &PolicyEngine,
        observations: &[Observation],
    ) -> Result<Trajectory, String> {
        let ledger = Ledger::new(self.ledger.clone()).map_err(|e| e.to_string())?;
        let initial = ledger.capital().equity;
        let loop_config = LoopConfig {
            record_outcomes: true,
            ..self.loop_config.clone()
        };
        let mut episode = DecisionLoop::new(
            ledger,
            explorer.clone(),
            self.constraints.clone(),
            loop_config,
        )
        .map_err(|e| e.to_string())?;

        let mut feed = ReplayFeed::new("training", observations.to_vec());
        episode.run(&mut feed).map_err(|e| e.to_string())?;

        let mut curve = vec![initial];
        curve.extend(episode.outcomes().iter().map(|o| o.capital.equity));
        let steps = episode
            .outcomes()
            .iter()
            .filter_map(|o| o.trace.clone())
            .map(|trace| TrajectoryStep {
                features: trace.features,
                class: trace.class,
            })
            .collect();

        Ok(Trajectory {
            steps,
            total_return: to_f64(metrics::total_return(&curve)),
            max_drawdown: to_f64(metrics::max_drawdown(&curve)),
        })
    }
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}
