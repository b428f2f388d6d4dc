pub mod debt_graph;
pub mod simplifier;

pub use debt_graph::{Debt, DebtGraph};
pub use simplifier::PairwiseGraphSimplifier;
