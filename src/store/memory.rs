use crate::error::{Error, Result};
use crate::interfaces::directory::Directory;
use crate::interfaces::document_store::{Document, DocumentStore};
use crate::types::ids::ParticipantId;
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;

/// Process-local document store. Each key is guarded by its own shard lock,
/// so writes to different groups never contend.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: DashMap<String, Document>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        InMemoryDocumentStore {
            documents: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.documents
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, key: &str) -> Result<Option<Document>> {
        Ok(self.documents.get(key).map(|doc| doc.value().clone()))
    }

    async fn create(&self, key: &str, body: Value) -> Result<u64> {
        match self.documents.entry(key.to_string()) {
            Entry::Occupied(_) => Err(Error::DocumentAlreadyExists(key.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(Document { revision: 1, body });
                Ok(1)
            }
        }
    }

    async fn compare_and_swap(&self, key: &str, expected_revision: u64, body: Value) -> Result<u64> {
        let mut doc = self.documents.get_mut(key).ok_or_else(|| Error::ConcurrentUpdateConflict {
            key: key.to_string(),
        })?;

        if doc.revision != expected_revision {
            tracing::debug!(
                "Stale write to {}: expected revision {}, found {}",
                key,
                expected_revision,
                doc.revision
            );
            return Err(Error::ConcurrentUpdateConflict {
                key: key.to_string(),
            });
        }

        doc.revision += 1;
        doc.body = body;
        Ok(doc.revision)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.documents.remove(key).is_some())
    }

    async fn compare_and_delete(&self, key: &str, expected_revision: u64) -> Result<()> {
        match self.documents.remove_if(key, |_, doc| doc.revision == expected_revision) {
            Some(_) => Ok(()),
            None => {
                tracing::debug!("Stale delete of {} at revision {}", key, expected_revision);
                Err(Error::ConcurrentUpdateConflict {
                    key: key.to_string(),
                })
            }
        }
    }
}

/// Fixed name table standing in for the user directory.
#[derive(Default)]
pub struct InMemoryDirectory {
    names: DashMap<ParticipantId, String>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        InMemoryDirectory {
            names: DashMap::new(),
        }
    }

    pub fn register(&self, participant: ParticipantId, name: impl Into<String>) {
        self.names.insert(participant, name.into());
    }
}

impl FromIterator<(ParticipantId, String)> for InMemoryDirectory {
    fn from_iter<I: IntoIterator<Item = (ParticipantId, String)>>(iter: I) -> Self {
        InMemoryDirectory {
            names: iter.into_iter().collect(),
        }
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn display_name(&self, participant: &ParticipantId) -> Result<Option<String>> {
        Ok(self.names.get(participant).map(|name| name.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn compare_and_swap_rejects_stale_revision() {
        let store = InMemoryDocumentStore::new();
        let rev = store.create("groups/g1", json!({"n": 1})).await.unwrap();
        assert_eq!(rev, 1);

        let rev = store.compare_and_swap("groups/g1", 1, json!({"n": 2})).await.unwrap();
        assert_eq!(rev, 2);

        let err = store.compare_and_swap("groups/g1", 1, json!({"n": 3})).await.unwrap_err();
        assert!(matches!(err, Error::ConcurrentUpdateConflict { .. }));

        let doc = store.get("groups/g1").await.unwrap().unwrap();
        assert_eq!(doc, Document { revision: 2, body: json!({"n": 2}) });
    }

    #[tokio::test]
    async fn create_refuses_existing_key_and_delete_reports_presence() {
        let store = InMemoryDocumentStore::new();
        store.create("items/i1", json!({})).await.unwrap();

        assert!(matches!(
            store.create("items/i1", json!({})).await,
            Err(Error::DocumentAlreadyExists(_))
        ));
        assert!(store.delete("items/i1").await.unwrap());
        assert!(!store.delete("items/i1").await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn compare_and_delete_keeps_document_written_since_read() {
        let store = InMemoryDocumentStore::new();
        store.create("groups/g1", json!({"n": 1})).await.unwrap();
        store.compare_and_swap("groups/g1", 1, json!({"n": 2})).await.unwrap();

        assert!(matches!(
            store.compare_and_delete("groups/g1", 1).await,
            Err(Error::ConcurrentUpdateConflict { .. })
        ));
        assert_eq!(store.len(), 1);

        store.compare_and_delete("groups/g1", 2).await.unwrap();
        assert!(store.is_empty());
        assert!(store.compare_and_delete("groups/g1", 2).await.is_err());
    }

    #[tokio::test]
    async fn directory_resolves_registered_names() {
        let directory: InMemoryDirectory = [(ParticipantId::from("u1"), "Asha".to_string())]
            .into_iter()
            .collect();

        assert_eq!(
            directory.display_name(&ParticipantId::from("u1")).await.unwrap(),
            Some("Asha".to_string())
        );
        assert_eq!(directory.display_name(&ParticipantId::from("u2")).await.unwrap(), None);
    }
}
