use serde::{Deserialize, Serialize};
use std::fmt;

/// How a group's debt graph is maintained. Fixed per group at creation; the
/// two produce different (not bit-compatible) graphs for the same history.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStrategy {
    /// Triangular simplification applied per split, in place.
    Incremental,
    /// Greedy solver rebuilds the graph from net balances after every event.
    #[default]
    Optimal,
}

impl fmt::Display for SettlementStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementStrategy::Incremental => f.write_str("incremental"),
            SettlementStrategy::Optimal => f.write_str("optimal"),
        }
    }
}
