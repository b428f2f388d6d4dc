pub mod engine;
pub mod loader;
pub mod report;
pub mod store;

pub use loader::{AppConfig, LoggingConfig};
