use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A stored document together with the revision it was read at.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub revision: u64,
    pub body: Value,
}

/// Host-side keyed storage. Atomicity is per key: `compare_and_swap` only
/// writes when the stored revision still equals `expected_revision`, and
/// fails with `ConcurrentUpdateConflict` otherwise.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Document>>;

    /// Insert a new document at revision 1. Fails if the key exists.
    async fn create(&self, key: &str, body: Value) -> Result<u64>;

    /// Returns the new revision.
    async fn compare_and_swap(&self, key: &str, expected_revision: u64, body: Value) -> Result<u64>;

    /// Returns whether a document was removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Remove the document only while it is still at `expected_revision`.
    /// Fails with `ConcurrentUpdateConflict` otherwise.
    async fn compare_and_delete(&self, key: &str, expected_revision: u64) -> Result<()>;
}
