pub mod balance_ledger;

pub use balance_ledger::BalanceLedger;
