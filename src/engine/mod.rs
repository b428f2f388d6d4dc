pub mod settlement_engine;
pub mod strategy;

pub use settlement_engine::SettlementEngine;
pub use strategy::SettlementStrategy;
