use crate::error::Result;
use crate::types::ids::ParticipantId;
use async_trait::async_trait;

/// Resolves user identifiers to display names.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Directory: Send + Sync {
    async fn display_name(&self, participant: &ParticipantId) -> Result<Option<String>>;
}
