//! Run configuration
//!
//! One JSON document, loaded once at startup. Every section is optional
//! and falls back to its defaults:
//!
//! ```json
//! {
//!   "ledger": { "initial_capital": "10000", "leverage": "1" },
//!   "constraints": { "max_position_size": "100", "max_drawdown_pct": "0.10" },
//!   "policy": { "kind": "rule_constrained", "entry_threshold": "0.55" },
//!   "walk_forward": { "windows": { "train_len": 200, "validate_len": 100 } },
//!   "loop": { "history_capacity": 64 },
//!   "market": { "seed": 42, "steps": 2000 }
//! }
//! ```

use crate::error::Result;
use crate::features::FeatureConfig;
use crate::signal::SignalConfig;
use crate::synthetic::MarketConfig;
use meridian_engine::LoopConfig;
use meridian_ledger::LedgerConfig;
use meridian_policy::PolicyConfig;
use meridian_risk::RiskConstraintSet;
use meridian_walkforward::WalkForwardConfig;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub ledger: LedgerConfig,
    pub constraints: RiskConstraintSet,
    pub policy: PolicyConfig,
    pub walk_forward: WalkForwardConfig,
    #[serde(rename = "loop")]
    pub loop_config: LoopConfig,
    pub market: MarketConfig,
    pub features: FeatureConfig,
    pub signal: SignalConfig,
}

impl RunConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_document_gives_defaults() {
        assert_eq!(RunConfig::from_json("{}").unwrap(), RunConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = RunConfig::from_json(
            r#"{
                "ledger": { "initial_capital": "25000", "leverage": "2" },
                "constraints": { "max_position_size": "40" },
                "policy": { "kind": "learned", "learning_rate": 0.05 },
                "walk_forward": { "ledger_mode": "carry_forward", "windows": { "train_len": 120 } },
                "loop": { "max_deferral_steps": 3 },
                "market": { "seed": 9 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.ledger.initial_capital, dec!(25000));
        assert_eq!(config.constraints.max_position_size, dec!(40));
        assert_eq!(config.constraints.max_drawdown_pct, dec!(0.10));
        assert!(matches!(config.policy, PolicyConfig::Learned(ref c) if c.learning_rate == 0.05));
        assert_eq!(
            config.walk_forward.ledger_mode,
            meridian_walkforward::LedgerMode::CarryForward
        );
        assert_eq!(config.walk_forward.windows.train_len, 120);
        assert_eq!(config.walk_forward.windows.validate_len, 100);
        assert_eq!(config.loop_config.max_deferral_steps, 3);
        assert_eq!(config.market.seed, 9);
        assert_eq!(config.market.steps, 2_000);
    }

    #[test]
    fn test_round_trips_through_json() {
        let config = RunConfig::default();
        assert_eq!(RunConfig::from_json(&config.to_json().unwrap()).unwrap(), config);
    }

    #[test]
    fn test_unknown_policy_kind_rejected() {
        assert!(RunConfig::from_json(r#"{ "policy": { "kind": "oracle" } }"#).is_err());
    }
}
