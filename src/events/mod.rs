pub mod expense;

pub use expense::ExpenseEvent;
