pub mod directory;
pub mod document_store;

pub use directory::Directory;
pub use document_store::{Document, DocumentStore};
