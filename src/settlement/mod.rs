pub mod report;
pub mod solver;

pub use report::SettlementReport;
pub use solver::OptimalSettlementSolver;
