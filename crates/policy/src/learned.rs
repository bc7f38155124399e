//! Learned Policy
//!
//! Linear softmax over a fixed feature map, choosing a target exposure
//! class (flat, long, short). The chosen class's probability scales the
//! size, so an uncertain policy trades small.
//!
//! ```text
//!   PolicyInput ──► features x (FEATURE_COUNT) ──► logits W·x ──► softmax
//!                                                                   │
//!                       greedy argmax (evaluation) ◄────────────────┤
//!                       seeded sample  (training)  ◄────────────────┘
//! ```
//!
//! Training is REINFORCE with a batch-mean baseline on the
//! drawdown-penalized return of whole episodes.
//!
//! Outside this crate the policy is driven through [`LearnedPolicy::act`]
//! and [`LearnedPolicy::update`] only; traces and exploring copies go
//! through [`PolicyEngine`](crate::PolicyEngine).

use crate::error::{Result, TrainingError};
use crate::objective::{Objective, TrajectoryBatch};
use crate::policy::{PolicyInput, PolicyTrace, Proposal, toward, units};
use log::{info, warn};
use meridian_core::{Decision, PositionSide, Regime, Step};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, Signed, ToPrimitive};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Exposure classes
pub const CLASS_FLAT: usize = 0;
pub const CLASS_LONG: usize = 1;
pub const CLASS_SHORT: usize = 2;
pub const NUM_CLASSES: usize = 3;

/// Width of the feature map
pub const FEATURE_COUNT: usize = 14;

const SIGNAL_FEATURE: usize = 6;

/// Configuration for the learned policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnedConfig {
    /// Step size of each update
    pub learning_rate: f64,
    /// Gradient norm cap per update
    pub max_grad_norm: f64,
    /// Fraction of sizing capital at probability 1
    pub position_fraction: Decimal,
    /// Relative size gap tolerated before a resize is issued
    pub resize_band: Decimal,
    /// History records averaged into the recent-return feature
    pub return_lookback: usize,
    /// Initial weight tying long/short logits to the signal
    pub signal_prior: f64,
    /// Exploration seed
    pub seed: u64,
    pub objective: Objective,
}

impl Default for LearnedConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            max_grad_norm: 5.0,
            position_fraction: dec!(0.5),
            resize_band: dec!(0.25),
            return_lookback: 10,
            signal_prior: 2.0,
            seed: 7,
            objective: Objective::default(),
        }
    }
}

/// Summary of one training update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateReport {
    pub trajectories: usize,
    pub steps: usize,
    pub mean_objective: f64,
    pub grad_norm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedPolicy {
    config: LearnedConfig,
    weights: [[f64; FEATURE_COUNT]; NUM_CLASSES],
    /// Exploration salt; `None` means greedy
    exploration: Option<u64>,
    updates: u64,
}

impl LearnedPolicy {
    pub fn new(config: LearnedConfig) -> Self {
        let mut weights = [[0.0; FEATURE_COUNT]; NUM_CLASSES];
        weights[CLASS_LONG][SIGNAL_FEATURE] = config.signal_prior;
        weights[CLASS_SHORT][SIGNAL_FEATURE] = -config.signal_prior;
        Self {
            config,
            weights,
            exploration: None,
            updates: 0,
        }
    }

    /// Number of successful updates
    pub(crate) fn updates(&self) -> u64 {
        self.updates
    }

    /// Copy that samples actions with `salt` instead of acting greedily
    pub(crate) fn exploring(&self, salt: u64) -> Self {
        Self {
            exploration: Some(salt),
            ..self.clone()
        }
    }

    pub(crate) fn is_exploring(&self) -> bool {
        self.exploration.is_some()
    }

    /// Fixed feature map of a policy input
    pub(crate) fn features(&self, input: &PolicyInput<'_>) -> Vec<f64> {
        let pct = |d: Decimal| to_f64(d * dec!(100));
        let context = input.context;
        let signal = input.signal;

        let recent = input.history.returns(self.config.return_lookback);
        let recent_mean = if recent.is_empty() {
            Decimal::ZERO
        } else {
            recent.iter().copied().sum::<Decimal>() / Decimal::from(recent.len())
        };

        let mut x = vec![0.0; FEATURE_COUNT];
        x[0] = 1.0;
        x[1] = pct(context.trend_strength);
        x[2] = pct(context.volatility);
        x[3] = pct(context.momentum_short);
        x[4] = pct(context.momentum_long);
        x[5] = to_f64(context.zscore);
        x[SIGNAL_FEATURE] = to_f64(signal.direction.sign() * signal.confidence);
        x[7] = pct(signal.expected_payoff);
        x[8] = to_f64(input.position.signed_size().signum());
        x[9] = pct(input.position.unrealized_return(input.price));
        x[10] = pct(input.capital.drawdown());
        x[11] = pct(recent_mean);
        x[12] = if context.regime == Regime::Trending { 1.0 } else { 0.0 };
        x[13] = if context.regime == Regime::Volatile { 1.0 } else { 0.0 };
        x
    }

    /// Class probabilities for a feature vector
    pub(crate) fn probabilities(&self, features: &[f64]) -> [f64; NUM_CLASSES] {
        let mut logits = [0.0; NUM_CLASSES];
        for (k, row) in self.weights.iter().enumerate() {
            logits[k] = row.iter().zip(features).map(|(w, x)| w * x).sum();
        }
        softmax(&logits)
    }

    /// Decision only
    pub fn act(&self, input: &PolicyInput<'_>) -> Decision {
        self.propose(input).decision
    }

    pub(crate) fn propose(&self, input: &PolicyInput<'_>) -> Proposal {
        let features = self.features(input);
        let probs = self.probabilities(&features);

        let class = match self.exploration {
            Some(salt) => self.sample(&probs, salt, input.context.step),
            None => argmax(&probs),
        };

        let target = match class {
            CLASS_LONG => PositionSide::Long,
            CLASS_SHORT => PositionSide::Short,
            _ => PositionSide::Flat,
        };

        let size = if input.price > Decimal::ZERO {
            let conviction = Decimal::from_f64(probs[class]).unwrap_or(Decimal::ZERO);
            units(self.config.position_fraction * conviction * input.sizing_capital() / input.price)
        } else {
            Decimal::ZERO
        };

        Proposal {
            decision: toward(target, size, input.position, self.config.resize_band),
            trace: Some(PolicyTrace { features, class }),
        }
    }

    fn sample(&self, probs: &[f64; NUM_CLASSES], salt: u64, step: Step) -> usize {
        let seed = self
            .config
            .seed
            .wrapping_mul(0x9E37_79B9_7F4A_7C15)
            .wrapping_add(salt.wrapping_mul(0xBF58_476D_1CE4_E5B9))
            ^ step;
        let mut rng = StdRng::seed_from_u64(seed);
        let draw: f64 = rng.r#gen();

        let mut cumulative = 0.0;
        for (k, p) in probs.iter().enumerate() {
            cumulative += p;
            if draw < cumulative {
                return k;
            }
        }
        NUM_CLASSES - 1
    }

    /// One REINFORCE step on a batch of episodes
    ///
    /// Weights are only replaced when the whole update is finite.
    pub fn update(&mut self, batch: &TrajectoryBatch) -> Result<UpdateReport> {
        let steps = batch.step_count();
        if batch.trajectories.is_empty() || steps == 0 {
            return Err(TrainingError::EmptyBatch);
        }

        let objective = self.config.objective;
        let scores: Vec<f64> = batch
            .trajectories
            .iter()
            .map(|t| objective.score(t.total_return, t.max_drawdown))
            .collect();
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(TrainingError::NonFinite("objective".to_string()));
        }
        let baseline = scores.iter().sum::<f64>() / scores.len() as f64;

        let mut grad = [[0.0; FEATURE_COUNT]; NUM_CLASSES];
        for (trajectory, score) in batch.trajectories.iter().zip(&scores) {
            let advantage = score - baseline;
            for step in &trajectory.steps {
                if step.features.len() != FEATURE_COUNT {
                    return Err(TrainingError::FeatureMismatch {
                        expected: FEATURE_COUNT,
                        actual: step.features.len(),
                    });
                }
                if step.features.iter().any(|x| !x.is_finite()) {
                    return Err(TrainingError::NonFinite("features".to_string()));
                }

                let probs = self.probabilities(&step.features);
                for (k, row) in grad.iter_mut().enumerate() {
                    let indicator = if k == step.class { 1.0 } else { 0.0 };
                    let coeff = advantage * (indicator - probs[k]);
                    for (g, x) in row.iter_mut().zip(&step.features) {
                        *g += coeff * x;
                    }
                }
            }
        }

        let scale = 1.0 / steps as f64;
        let mut norm_sq = 0.0;
        for row in grad.iter_mut() {
            for g in row.iter_mut() {
                *g *= scale;
                norm_sq += *g * *g;
            }
        }
        let grad_norm = norm_sq.sqrt();
        let clip = if grad_norm > self.config.max_grad_norm && grad_norm > 0.0 {
            self.config.max_grad_norm / grad_norm
        } else {
            1.0
        };

        let mut next = self.weights;
        for (w_row, g_row) in next.iter_mut().zip(&grad) {
            for (w, g) in w_row.iter_mut().zip(g_row) {
                *w += self.config.learning_rate * clip * g;
            }
        }
        if next.iter().flatten().any(|w| !w.is_finite()) {
            warn!("[TRAIN] Update produced non-finite weights, keeping previous");
            return Err(TrainingError::NonFinite("weights".to_string()));
        }

        self.weights = next;
        self.updates += 1;

        let report = UpdateReport {
            trajectories: batch.trajectories.len(),
            steps,
            mean_objective: baseline,
            grad_norm,
        };
        info!(
            "[TRAIN] Update #{}: {} episodes, {} steps, mean objective {:.5}, grad norm {:.5}",
            self.updates, report.trajectories, report.steps, report.mean_objective, report.grad_norm
        );
        Ok(report)
    }
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

fn softmax(logits: &[f64; NUM_CLASSES]) -> [f64; NUM_CLASSES] {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut out = [0.0; NUM_CLASSES];
    let mut total = 0.0;
    for (o, l) in out.iter_mut().zip(logits) {
        *o = (l - max).exp();
        total += *o;
    }
    for o in out.iter_mut() {
        *o /= total;
    }
    out
}

fn argmax(probs: &[f64; NUM_CLASSES]) -> usize {
    let mut best = 0;
    for k in 1..NUM_CLASSES {
        if probs[k] > probs[best] {
            best = k;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::History;
    use crate::objective::{Trajectory, TrajectoryStep};
    use chrono::{TimeZone, Utc};
    use meridian_core::{
        Action, CapitalState, MarketContext, PositionSide, PositionState, SignalEstimate,
    };

    struct Fixture {
        context: MarketContext,
        signal: SignalEstimate,
        position: PositionState,
        capital: CapitalState,
        history: History,
    }

    impl Fixture {
        fn new(step: u64, signal_conf: Decimal) -> Self {
            let now = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
            Self {
                context: MarketContext::neutral(step, now).with_volatility(dec!(0.01)),
                signal: SignalEstimate::bullish(step, now, signal_conf),
                position: PositionState::flat(),
                capital: CapitalState::initial(dec!(10000)),
                history: History::new(16),
            }
        }

        fn input(&self) -> PolicyInput<'_> {
            PolicyInput {
                context: &self.context,
                signal: &self.signal,
                position: &self.position,
                capital: &self.capital,
                price: dec!(50),
                history: &self.history,
            }
        }
    }

    #[test]
    fn test_untrained_policy_follows_signal_prior() {
        let policy = LearnedPolicy::new(LearnedConfig::default());
        let fixture = Fixture::new(3, dec!(0.9));
        let proposal = policy.propose(&fixture.input());

        assert_eq!(proposal.decision.action, Action::OpenLong);
        assert!(proposal.decision.size > Decimal::ZERO);
        let trace = proposal.trace.unwrap();
        assert_eq!(trace.class, CLASS_LONG);
        assert_eq!(trace.features.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_greedy_is_deterministic() {
        let policy = LearnedPolicy::new(LearnedConfig::default());
        let fixture = Fixture::new(3, dec!(0.6));
        assert_eq!(policy.act(&fixture.input()), policy.act(&fixture.input()));
    }

    #[test]
    fn test_position_side_feature() {
        let policy = LearnedPolicy::new(LearnedConfig::default());
        let mut fixture = Fixture::new(3, dec!(0.6));
        assert_eq!(policy.features(&fixture.input())[8], 0.0);

        fixture.position = PositionState {
            side: PositionSide::Short,
            size: dec!(4),
            entry_price: dec!(50),
            entry_time: None,
        };
        assert_eq!(policy.features(&fixture.input())[8], -1.0);

        fixture.position.side = PositionSide::Long;
        assert_eq!(policy.features(&fixture.input())[8], 1.0);
    }

    #[test]
    fn test_exploration_is_reproducible() {
        let a = LearnedPolicy::new(LearnedConfig::default()).exploring(1);
        let b = LearnedPolicy::new(LearnedConfig::default()).exploring(1);
        assert!(a.is_exploring());

        let classes = |policy: &LearnedPolicy| -> Vec<usize> {
            (0..50)
                .map(|step| {
                    let fixture = Fixture::new(step, dec!(0.2));
                    policy.propose(&fixture.input()).trace.unwrap().class
                })
                .collect()
        };

        let first = classes(&a);
        assert_eq!(first, classes(&b));
        // Low confidence keeps probabilities spread, so sampling visits more than one class
        assert!(first.iter().any(|c| *c != first[0]));
    }

    #[test]
    fn test_update_moves_toward_better_episodes() {
        let mut policy = LearnedPolicy::new(LearnedConfig {
            signal_prior: 0.0,
            ..Default::default()
        });
        let fixture = Fixture::new(1, dec!(0.5));
        let features = policy.features(&fixture.input());
        let before = policy.probabilities(&features)[CLASS_SHORT];

        let episode = |class: usize, total_return: f64| Trajectory {
            steps: vec![TrajectoryStep {
                features: features.clone(),
                class,
            }],
            total_return,
            max_drawdown: 0.0,
        };
        let batch = TrajectoryBatch::new(vec![
            episode(CLASS_SHORT, 0.05),
            episode(CLASS_LONG, -0.05),
        ]);

        let report = policy.update(&batch).unwrap();
        assert_eq!(report.steps, 2);
        assert_eq!(policy.updates(), 1);
        assert!(policy.probabilities(&features)[CLASS_SHORT] > before);
    }

    #[test]
    fn test_training_failures() {
        let mut policy = LearnedPolicy::new(LearnedConfig::default());
        assert_eq!(
            policy.update(&TrajectoryBatch::default()),
            Err(TrainingError::EmptyBatch)
        );

        let batch = TrajectoryBatch::new(vec![Trajectory {
            steps: vec![TrajectoryStep {
                features: vec![1.0; FEATURE_COUNT],
                class: CLASS_LONG,
            }],
            total_return: f64::NAN,
            max_drawdown: 0.0,
        }]);
        assert!(matches!(
            policy.update(&batch),
            Err(TrainingError::NonFinite(_))
        ));

        let batch = TrajectoryBatch::new(vec![Trajectory {
            steps: vec![TrajectoryStep {
                features: vec![1.0; 3],
                class: CLASS_LONG,
            }],
            total_return: 0.01,
            max_drawdown: 0.0,
        }]);
        assert!(matches!(
            policy.update(&batch),
            Err(TrainingError::FeatureMismatch { .. })
        ));
        assert_eq!(policy.updates(), 0);
    }
}
