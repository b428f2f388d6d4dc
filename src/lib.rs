pub mod types;
pub mod events;
pub mod ledger;
pub mod graph;
pub mod settlement;
pub mod group;
pub mod engine;
pub mod invariants;
pub mod interfaces;
pub mod store;
pub mod service;
pub mod config;
pub mod observability;
pub mod error;

pub use engine::{SettlementEngine, SettlementStrategy};
pub use error::{Error, Result};
pub use events::ExpenseEvent;
pub use graph::{DebtGraph, PairwiseGraphSimplifier};
pub use group::GroupState;
pub use ledger::BalanceLedger;
pub use settlement::{OptimalSettlementSolver, SettlementReport};
pub use types::{Amount, ExpenseId, GroupId, ParticipantId};

// Group record format version
pub const RECORD_VERSION: u32 = 1;
