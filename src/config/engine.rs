use serde::{Deserialize, Serialize};
use crate::engine::strategy::SettlementStrategy;
use crate::types::amount::Amount;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Strategy given to newly created groups.
    pub strategy: SettlementStrategy,
    /// Largest residual the conservation check accepts. Exact decimal
    /// arithmetic never produces one, so this stays at zero.
    pub conservation_tolerance: Amount,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            strategy: SettlementStrategy::Optimal,
            conservation_tolerance: Amount::ZERO,
        }
    }
}
