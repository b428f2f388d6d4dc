pub mod memory;

pub use memory::{InMemoryDirectory, InMemoryDocumentStore};
