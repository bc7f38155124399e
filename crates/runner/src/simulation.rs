//! Simulation - full run orchestration
//!
//! Ties together all components:
//! - Synthetic market (or a recorded observation file)
//! - Layer 1/2 pipeline
//! - Walk-forward harness, or a single decision-loop run
//! - Journal persistence

use crate::config::RunConfig;
use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::synthetic::SyntheticMarket;
use log::{info, warn};
use meridian_core::Observation;
use meridian_engine::{DecisionLoop, ReplayFeed, RunStatus, RunSummary};
use meridian_ledger::{Ledger, LedgerEntry, journal};
use meridian_policy::PolicyEngine;
use meridian_walkforward::{Timeline, WalkForwardHarness, WalkForwardReport};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Result of a single decision-loop run over the whole timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleRun {
    pub policy: String,
    pub summary: RunSummary,
    #[serde(skip)]
    pub journal: Vec<LedgerEntry>,
}

pub struct Simulation {
    config: RunConfig,
    observations: Option<Vec<Observation>>,
}

impl Simulation {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            observations: None,
        }
    }

    /// Use recorded observations instead of the synthetic market
    pub fn with_observations(mut self, observations: Vec<Observation>) -> Self {
        self.observations = Some(observations);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// The observations a run uses, in step order
    pub fn observations(&self) -> Vec<Observation> {
        if let Some(observations) = &self.observations {
            return observations.clone();
        }

        let ticks = SyntheticMarket::new(self.config.market.clone()).generate();
        let observations =
            Pipeline::new(self.config.features.clone(), self.config.signal.clone()).build(&ticks);
        let complete = observations.iter().filter(|o| o.is_complete()).count();
        info!(
            "[SIM] Generated {} observations ({} complete) with seed {}",
            observations.len(),
            complete,
            self.config.market.seed
        );
        observations
    }

    pub fn timeline(&self) -> Result<Timeline> {
        Ok(Timeline::new(self.observations())?)
    }

    pub fn walk_forward(&self) -> Result<WalkForwardReport> {
        let harness = WalkForwardHarness::new(
            self.config.walk_forward.clone(),
            self.config.ledger.clone(),
            self.config.constraints.clone(),
            self.config.loop_config.clone(),
            self.config.policy.clone(),
        )?;
        Ok(harness.run(&self.timeline()?)?)
    }

    /// Run the policy once over every observation
    ///
    /// The policy is used as configured: no calibration or training, since
    /// there is no earlier data to fit on.
    pub fn single_run(&self) -> Result<SingleRun> {
        let policy = PolicyEngine::new(&self.config.policy);
        let name = policy.name().to_string();
        let mut run = DecisionLoop::new(
            Ledger::new(self.config.ledger.clone())?,
            policy,
            self.config.constraints.clone(),
            self.config.loop_config.clone(),
        )?;

        let summary = run.run(&mut ReplayFeed::new("timeline", self.observations()))?;
        if summary.status == RunStatus::Halted {
            warn!(
                "[SIM] Run halted after {} steps: {:?}",
                summary.steps,
                summary.halt
            );
        }

        let (ledger, _, _, _) = run.into_parts();
        Ok(SingleRun {
            policy: name,
            summary,
            journal: ledger.journal().to_vec(),
        })
    }
}

/// Load observations stored as JSON lines
pub fn load_observations(path: impl AsRef<Path>) -> Result<Vec<Observation>> {
    let reader = BufReader::new(File::open(path)?);
    let mut observations = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        observations.push(serde_json::from_str(&line)?);
    }
    Ok(observations)
}

/// Write each window's journal as `window-NNN.jsonl` under `dir`
///
/// Degraded windows have no journal and get no file.
pub fn write_window_journals(
    report: &WalkForwardReport,
    dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for window in report.windows.iter().filter(|w| w.summary.is_some()) {
        let path = dir.join(format!("window-{:03}.jsonl", window.window.index));
        journal::save(&path, &window.journal)?;
        written.push(path);
    }
    info!("[SIM] Wrote {} journals to {}", written.len(), dir.display());
    Ok(written)
}
