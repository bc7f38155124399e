//! Policy Engine
//!
//! One contract, two variants. The decision loop only ever talks to
//! [`PolicyEngine`]; which variant sits behind it is configuration.

use crate::history::History;
use crate::learned::{LearnedConfig, LearnedPolicy};
use crate::rule::{RuleConfig, RulePolicy};
use meridian_core::{
    CapitalState, Decision, MarketContext, PositionSide, PositionState, Price, Quantity,
    SignalEstimate,
};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Everything a policy may look at for one step
///
/// Ledger state arrives as a snapshot copy; policies never hold a reference
/// to the ledger itself.
#[derive(Debug, Clone, Copy)]
pub struct PolicyInput<'a> {
    pub context: &'a MarketContext,
    pub signal: &'a SignalEstimate,
    pub position: &'a PositionState,
    pub capital: &'a CapitalState,
    pub price: Price,
    pub history: &'a History,
}

impl PolicyInput<'_> {
    /// Capital the policy may size against
    ///
    /// Margin already committed to the held position counts back in, so a
    /// same-side target is comparable to the held size.
    pub fn sizing_capital(&self) -> Decimal {
        self.capital.available_capital + self.position.entry_notional()
    }
}

/// Feature vector and chosen class behind a learned decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyTrace {
    pub features: Vec<f64>,
    pub class: usize,
}

/// Raw policy output plus what the trainer needs to learn from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub decision: Decision,
    pub trace: Option<PolicyTrace>,
}

impl Proposal {
    pub fn plain(decision: Decision) -> Self {
        Self {
            decision,
            trace: None,
        }
    }
}

/// Policy selection as it appears in run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyConfig {
    RuleConstrained(RuleConfig),
    Learned(LearnedConfig),
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig::RuleConstrained(RuleConfig::default())
    }
}

/// Decision policy (tagged variants, no trait objects)
#[derive(Debug, Clone)]
pub enum PolicyEngine {
    RuleConstrained(RulePolicy),
    Learned(LearnedPolicy),
}

impl PolicyEngine {
    pub fn new(config: &PolicyConfig) -> Self {
        match config {
            PolicyConfig::RuleConstrained(config) => {
                PolicyEngine::RuleConstrained(RulePolicy::new(config.clone()))
            }
            PolicyConfig::Learned(config) => {
                PolicyEngine::Learned(LearnedPolicy::new(config.clone()))
            }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PolicyEngine::RuleConstrained(_) => "RuleConstrained",
            PolicyEngine::Learned(_) => "Learned",
        }
    }

    /// Raw decision for one step
    pub fn decide(&self, input: &PolicyInput<'_>) -> Decision {
        self.propose(input).decision
    }

    /// Raw decision plus trace
    pub fn propose(&self, input: &PolicyInput<'_>) -> Proposal {
        match self {
            PolicyEngine::RuleConstrained(policy) => Proposal::plain(policy.decide(input)),
            PolicyEngine::Learned(policy) => policy.propose(input),
        }
    }

    /// Fit whatever can be fitted from contexts alone
    ///
    /// Only the rule variant has such parameters; the learned variant is fitted
    /// by running episodes and calling [`LearnedPolicy::update`].
    pub fn calibrate(&mut self, contexts: &[MarketContext]) {
        if let PolicyEngine::RuleConstrained(policy) = self {
            policy.calibrate(contexts);
        }
    }

    pub fn is_trainable(&self) -> bool {
        matches!(self, PolicyEngine::Learned(_))
    }

    /// Copy of this policy that samples its actions during training
    ///
    /// `salt` varies the draws between epochs. The rule variant has nothing
    /// to explore and is returned unchanged.
    pub fn explorer(&self, salt: u64) -> PolicyEngine {
        match self {
            PolicyEngine::Learned(policy) => PolicyEngine::Learned(policy.exploring(salt)),
            other => other.clone(),
        }
    }

    /// Whether decisions are sampled rather than greedy
    pub fn is_exploring(&self) -> bool {
        match self {
            PolicyEngine::Learned(policy) => policy.is_exploring(),
            _ => false,
        }
    }

    /// Training updates applied so far (always 0 for the rule variant)
    pub fn updates(&self) -> u64 {
        match self {
            PolicyEngine::Learned(policy) => policy.updates(),
            _ => 0,
        }
    }

    pub fn as_learned(&self) -> Option<&LearnedPolicy> {
        match self {
            PolicyEngine::Learned(policy) => Some(policy),
            _ => None,
        }
    }

    pub fn as_learned_mut(&mut self) -> Option<&mut LearnedPolicy> {
        match self {
            PolicyEngine::Learned(policy) => Some(policy),
            _ => None,
        }
    }
}

/// Move the position toward `target` holding `size` units
///
/// Reversals go through flat: an opposite-side target closes first.
pub(crate) fn toward(
    target: PositionSide,
    size: Quantity,
    position: &PositionState,
    resize_band: Decimal,
) -> Decision {
    let held = if position.is_flat() {
        PositionSide::Flat
    } else {
        position.side
    };

    match (target, held) {
        (PositionSide::Flat, PositionSide::Flat) => Decision::hold(),
        (PositionSide::Flat, _) => Decision::close(),
        (PositionSide::Long, PositionSide::Short) | (PositionSide::Short, PositionSide::Long) => {
            Decision::close()
        }
        (side, PositionSide::Flat) => {
            if size <= Decimal::ZERO {
                Decision::hold()
            } else if side == PositionSide::Long {
                Decision::open_long(size)
            } else {
                Decision::open_short(size)
            }
        }
        _ => {
            if size <= Decimal::ZERO {
                return Decision::hold();
            }
            let gap = (size - position.size).abs();
            if gap > resize_band * position.size {
                Decision::resize(size)
            } else {
                Decision::hold()
            }
        }
    }
}

/// Round a size down to the ledger's precision
pub(crate) fn units(size: Decimal) -> Quantity {
    size.max(Decimal::ZERO)
        .round_dp_with_strategy(8, RoundingStrategy::ToZero)
}
