//! Step outcomes and run summaries

use crate::error::{CircuitBreakerHalt, DataGapError};
use meridian_core::{CapitalState, Decision, PositionState, Price, Step, Timestamp, Trade};
use meridian_policy::PolicyTrace;
use meridian_risk::Verdict;
use serde::{Deserialize, Serialize};

/// Phases of one step, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepPhase {
    FetchContext,
    FetchSignal,
    Propose,
    Govern,
    Commit,
    Log,
}

impl StepPhase {
    pub const ORDER: [StepPhase; 6] = [
        StepPhase::FetchContext,
        StepPhase::FetchSignal,
        StepPhase::Propose,
        StepPhase::Govern,
        StepPhase::Commit,
        StepPhase::Log,
    ];
}

/// Lifecycle of a loop run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RunStatus {
    #[default]
    Running,
    /// Input exhausted
    Completed,
    /// Drawdown breaker latched through its cooldown; resumable
    Halted,
    /// Fatal ledger contract violation; not resumable
    Aborted,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

/// Everything that happened in one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step: Step,
    pub timestamp: Timestamp,
    pub price: Option<Price>,
    /// Raw policy output (hold on a data gap)
    pub proposal: Decision,
    pub trace: Option<PolicyTrace>,
    /// Decision handed to the governor after deferral handling
    pub candidate: Decision,
    pub verdict: Verdict,
    pub trade: Option<Trade>,
    pub data_gap: Option<DataGapError>,
    /// A deferred decision came due and was executed this step
    pub from_queue: bool,
    pub capital: CapitalState,
    pub position: PositionState,
    pub status: RunStatus,
}

impl StepOutcome {
    /// The decision actually executed
    pub fn executed(&self) -> Decision {
        self.verdict.decision()
    }
}

/// Totals for a finished (or stopped) run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub status: RunStatus,
    pub steps: usize,
    pub trades: usize,
    pub data_gaps: usize,
    pub clamped: usize,
    pub overridden: usize,
    pub rejected: usize,
    pub capital: CapitalState,
    pub position: PositionState,
    pub halt: Option<CircuitBreakerHalt>,
}
