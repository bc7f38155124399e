use serde::{Deserialize, Serialize};

/// Decision loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Step records kept for the policy
    pub history_capacity: usize,
    /// Longest deferral accepted from a policy; longer ones are capped
    pub max_deferral_steps: u32,
    /// Live mode: latency budget per context/signal fetch (ms)
    pub fetch_timeout_ms: u64,
    /// Keep every step outcome in memory (needed by the trainer and metrics)
    pub record_outcomes: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            history_capacity: 64,
            max_deferral_steps: 10,
            fetch_timeout_ms: 250,
            record_outcomes: true,
        }
    }
}
