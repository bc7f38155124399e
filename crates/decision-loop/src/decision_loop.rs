//! Decision Loop
//!
//! Owns the ledger, the policy and the risk monitor for one run and drives
//! them one step at a time:
//!
//! ```text
//! FETCH_CONTEXT → FETCH_SIGNAL → PROPOSE → GOVERN → COMMIT → LOG → advance
//! ```
//!
//! Step *t+1* always sees the ledger exactly as step *t* left it.

use crate::config::LoopConfig;
use crate::deferred::DeferredQueue;
use crate::error::{CircuitBreakerHalt, DataGapError, LoopError, Result};
use crate::outcome::{RunStatus, RunSummary, StepOutcome};
use log::{debug, error, info, warn};
use meridian_core::{Decision, Observation, Price, Step, Timestamp, Timing, Trade};
use meridian_ledger::{ExecutionRequest, Ledger, LedgerError};
use meridian_policy::{History, PolicyEngine, PolicyInput, StepRecord};
use meridian_ports::MarketFeed;
use meridian_risk::{RiskConstraintSet, RiskGovernor, RiskMonitor, Verdict};
use rust_decimal::Decimal;

pub struct DecisionLoop {
    config: LoopConfig,
    ledger: Ledger,
    policy: PolicyEngine,
    constraints: RiskConstraintSet,
    monitor: RiskMonitor,
    history: History,
    deferred: DeferredQueue,
    status: RunStatus,
    halt: Option<CircuitBreakerHalt>,
    outcomes: Vec<StepOutcome>,
    last_step: Option<Step>,
}

impl DecisionLoop {
    /// Create a loop over an existing ledger
    ///
    /// The governor never sizes past the ledger's own leverage, so
    /// `max_leverage` is capped at it.
    pub fn new(
        ledger: Ledger,
        policy: PolicyEngine,
        constraints: RiskConstraintSet,
        config: LoopConfig,
    ) -> Result<Self> {
        let monitor = RiskMonitor::new(constraints.clone());
        Self::with_monitor(ledger, policy, constraints, config, monitor)
    }

    /// Create a loop that continues an earlier run's risk state
    ///
    /// Used when a ledger is carried into a new run: the trading day,
    /// daily lockout and breaker latch carry with it.
    pub fn with_monitor(
        ledger: Ledger,
        policy: PolicyEngine,
        constraints: RiskConstraintSet,
        config: LoopConfig,
        monitor: RiskMonitor,
    ) -> Result<Self> {
        constraints.validate()?;

        let mut constraints = constraints;
        let ledger_leverage = ledger.config().leverage;
        if constraints.max_leverage > ledger_leverage {
            warn!(
                "[LOOP] max_leverage {} exceeds ledger leverage {}, capping",
                constraints.max_leverage, ledger_leverage
            );
            constraints.max_leverage = ledger_leverage;
        }

        info!(
            "[LOOP] New run: policy={} equity={} max_position={} max_dd={}",
            policy.name(),
            ledger.capital().equity,
            constraints.max_position_size,
            constraints.max_drawdown_pct
        );

        Ok(Self {
            history: History::new(config.history_capacity),
            monitor,
            config,
            ledger,
            policy,
            constraints,
            deferred: DeferredQueue::new(),
            status: RunStatus::Running,
            halt: None,
            outcomes: Vec::new(),
            last_step: None,
        })
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn policy(&self) -> &PolicyEngine {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut PolicyEngine {
        &mut self.policy
    }

    /// Effective constraints (leverage capped at the ledger's)
    pub fn constraints(&self) -> &RiskConstraintSet {
        &self.constraints
    }

    pub fn monitor(&self) -> &RiskMonitor {
        &self.monitor
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn halt(&self) -> Option<&CircuitBreakerHalt> {
        self.halt.as_ref()
    }

    pub fn outcomes(&self) -> &[StepOutcome] {
        &self.outcomes
    }

    pub fn pending_deferred(&self) -> usize {
        self.deferred.len()
    }

    /// Tear down, handing back the ledger, the policy and the risk monitor
    pub fn into_parts(self) -> (Ledger, PolicyEngine, RiskMonitor, Vec<StepOutcome>) {
        (self.ledger, self.policy, self.monitor, self.outcomes)
    }

    /// Run one step
    pub fn step(&mut self, observation: &Observation) -> Result<StepOutcome> {
        self.run_step(observation, None)
    }

    /// Drive the loop until the feed is exhausted or the run stops
    ///
    /// A halt is reported through the summary's status, not as an error;
    /// only fatal ledger violations are returned as `Err`.
    pub fn run<F: MarketFeed + ?Sized>(&mut self, feed: &mut F) -> Result<RunSummary> {
        info!("[LOOP] Running over feed '{}'", feed.name());
        while self.status == RunStatus::Running {
            match feed.next_observation() {
                Some(observation) => {
                    self.step(&observation)?;
                }
                None => self.finish(),
            }
        }
        Ok(self.summary())
    }

    /// Mark the run complete (input exhausted)
    pub fn finish(&mut self) {
        if self.status == RunStatus::Running {
            self.status = RunStatus::Completed;
            info!(
                "[LOOP] Completed after {} steps, equity={}",
                self.outcomes.len(),
                self.ledger.capital().equity
            );
        }
    }

    /// Operator reset after a halt
    ///
    /// Restarts peak equity from current equity and releases the breaker.
    pub fn resume_after_halt(&mut self, step: Step, timestamp: Timestamp) -> Result<()> {
        if self.status != RunStatus::Halted {
            return Err(LoopError::NotHalted {
                status: self.status,
            });
        }

        self.ledger.reset_peak(step, timestamp);
        self.monitor.reset();
        self.deferred.clear();
        self.halt = None;
        self.status = RunStatus::Running;
        info!("[LOOP] Resumed after halt at step {}", step);
        Ok(())
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            status: self.status,
            steps: self.outcomes.len(),
            trades: self.ledger.trades().count(),
            data_gaps: 0,
            clamped: 0,
            overridden: 0,
            rejected: 0,
            capital: self.ledger.capital().clone(),
            position: self.ledger.position().clone(),
            halt: self.halt.clone(),
        };
        for outcome in &self.outcomes {
            if outcome.data_gap.is_some() {
                summary.data_gaps += 1;
            }
            match outcome.verdict {
                Verdict::Accepted(_) => {}
                Verdict::Clamped { .. } => summary.clamped += 1,
                Verdict::Overridden { .. } => summary.overridden += 1,
                Verdict::Rejected { .. } => summary.rejected += 1,
            }
        }
        summary
    }

    /// One full step; `fetch_gap` carries a gap detected while fetching (live)
    pub(crate) fn run_step(
        &mut self,
        observation: &Observation,
        fetch_gap: Option<DataGapError>,
    ) -> Result<StepOutcome> {
        match self.status {
            RunStatus::Running => {}
            RunStatus::Halted => {
                if let Some(halt) = &self.halt {
                    return Err(LoopError::Halted(halt.clone()));
                }
                return Err(LoopError::NotRunning {
                    status: self.status,
                });
            }
            status => return Err(LoopError::NotRunning { status }),
        }

        let step = observation.step;
        let timestamp = observation.timestamp;
        if let Some(last) = self.last_step
            && step <= last
        {
            warn!("[LOOP] Step {} does not advance past {}", step, last);
        }
        self.last_step = Some(step);

        // Mark to market before anything looks at the ledger
        let price = observation.price.filter(|p| *p > Decimal::ZERO);
        if let Some(price) = price {
            self.ledger.mark(step, timestamp, price)?;
        }
        let risk_status = self.monitor.observe(self.ledger.capital(), timestamp).clone();

        // FETCH_CONTEXT / FETCH_SIGNAL
        let gap = fetch_gap.or_else(|| Self::check_inputs(observation, price));

        // PROPOSE
        let (proposal, trace) = match (&gap, price, &observation.context, &observation.signal) {
            (None, Some(price), Some(context), Some(signal)) => {
                let position = self.ledger.position().clone();
                let capital = self.ledger.capital().clone();
                let input = PolicyInput {
                    context,
                    signal,
                    position: &position,
                    capital: &capital,
                    price,
                    history: &self.history,
                };
                let proposal = self.policy.propose(&input);
                (proposal.decision, proposal.trace)
            }
            _ => {
                if let Some(gap) = &gap {
                    debug!("[LOOP] {}", gap);
                }
                if !self.deferred.is_empty() {
                    info!(
                        "[LOOP] Data gap at step {}, dropping {} deferred decisions",
                        step,
                        self.deferred.len()
                    );
                    self.deferred.clear();
                }
                (Decision::hold(), None)
            }
        };

        let (candidate, from_queue) = self.resolve_deferral(step, &proposal, gap.is_some());

        // GOVERN
        let verdict = RiskGovernor::evaluate(
            &candidate,
            &self.ledger.snapshot(),
            &risk_status,
            &self.constraints,
        );
        if let Some(reason) = verdict.reason() {
            match &verdict {
                Verdict::Overridden { .. } => warn!(
                    "[RISK] step={} {:?} overridden to close: {}",
                    step, candidate.action, reason
                ),
                Verdict::Clamped { decision, requested, .. } => info!(
                    "[RISK] step={} {:?} clamped {} -> {}: {}",
                    step, candidate.action, requested, decision.size, reason
                ),
                _ => info!("[RISK] step={} {:?} rejected: {}", step, candidate.action, reason),
            }
        }

        // COMMIT
        let decision = verdict.decision();
        let trade = match price {
            Some(price) if !decision.is_hold() => {
                Some(self.commit(step, timestamp, &decision, price)?)
            }
            _ => None,
        };

        // LOG
        self.history.push(StepRecord {
            step,
            timestamp,
            price,
            regime: observation.context.as_ref().map(|c| c.regime),
            decision: decision.clone(),
            equity: self.ledger.capital().equity,
        });

        let status_now = self.monitor.status();
        if status_now.should_halt(&self.constraints) {
            let halt = CircuitBreakerHalt {
                step,
                drawdown: status_now.drawdown,
                latched_steps: status_now.latched_steps,
            };
            error!("[LOOP] {}", halt);
            self.halt = Some(halt);
            self.status = RunStatus::Halted;
        }

        let outcome = StepOutcome {
            step,
            timestamp,
            price,
            proposal,
            trace,
            candidate,
            verdict,
            trade,
            data_gap: gap,
            from_queue,
            capital: self.ledger.capital().clone(),
            position: self.ledger.position().clone(),
            status: self.status,
        };
        if self.config.record_outcomes {
            self.outcomes.push(outcome.clone());
        }
        Ok(outcome)
    }

    /// First input problem of an observation, if any
    fn check_inputs(observation: &Observation, price: Option<Price>) -> Option<DataGapError> {
        let step = observation.step;
        let Some(context) = &observation.context else {
            return Some(DataGapError::MissingContext { step });
        };
        if context.step != step {
            return Some(DataGapError::StaleContext {
                step,
                context_step: context.step,
            });
        }
        let Some(signal) = &observation.signal else {
            return Some(DataGapError::MissingSignal { step });
        };
        if signal.step != step {
            return Some(DataGapError::StaleSignal {
                step,
                signal_step: signal.step,
            });
        }
        if price.is_none() {
            return Some(DataGapError::MissingPrice { step });
        }
        None
    }

    /// Queue deferred proposals and release due ones
    ///
    /// Returns the decision to govern and whether it came from the queue.
    fn resolve_deferral(&mut self, step: Step, proposal: &Decision, gap: bool) -> (Decision, bool) {
        if gap {
            return (Decision::hold(), false);
        }

        let mut candidate = proposal.clone();
        if let Timing::Deferred(n) = candidate.timing {
            let n = n.min(self.config.max_deferral_steps.max(1));
            let due = step + u64::from(n);
            debug!(
                "[LOOP] step={} deferring {:?} size={} to step {}",
                step, candidate.action, candidate.size, due
            );
            self.deferred.push(due, candidate.deferred(0));
            candidate = Decision::hold();
        }

        match self.deferred.pop_due(step) {
            Some(due) if candidate.is_hold() => {
                debug!("[LOOP] step={} releasing deferred {:?}", step, due.action);
                (due, true)
            }
            Some(due) => {
                debug!(
                    "[LOOP] step={} deferred {:?} superseded by {:?}",
                    step, due.action, candidate.action
                );
                (candidate, false)
            }
            None => (candidate, false),
        }
    }

    /// Execute a governed decision; any ledger error aborts the run
    fn commit(
        &mut self,
        step: Step,
        timestamp: Timestamp,
        decision: &Decision,
        price: Price,
    ) -> Result<Trade> {
        let request = ExecutionRequest {
            step,
            timestamp,
            action: decision.action,
            size: decision.size,
            price,
        };
        self.ledger.apply(&request).map_err(|e: LedgerError| {
            error!("[LOOP] Aborting run at step {}: {}", step, e);
            self.status = RunStatus::Aborted;
            LoopError::from(e)
        })
    }
}
