use crate::error::{Error, Result};
use crate::group::state::GroupState;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Persisted envelope for a group: the state plus a digest of its canonical
/// JSON so corruption in the host store is caught on read.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupRecord {
    pub version: u32,
    pub state: GroupState,
    pub checksum: String,
}

impl GroupRecord {
    pub fn seal(state: GroupState) -> Result<Self> {
        let checksum = Self::calculate_checksum(&state)?;
        Ok(GroupRecord {
            version: crate::RECORD_VERSION,
            state,
            checksum,
        })
    }

    fn calculate_checksum(state: &GroupState) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(state.group_id.0.as_bytes());
        hasher.update(serde_json::to_vec(state)?);
        Ok(hex::encode(hasher.finalize()))
    }

    pub fn verify_checksum(&self) -> bool {
        Self::calculate_checksum(&self.state)
            .map(|calculated| calculated == self.checksum)
            .unwrap_or(false)
    }

    /// Checked unwrap of the state.
    pub fn open(self) -> Result<GroupState> {
        if !self.verify_checksum() {
            return Err(Error::ChecksumMismatch {
                group_id: self.state.group_id,
            });
        }
        Ok(self.state)
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::strategy::SettlementStrategy;
    use crate::types::amount::Amount;
    use crate::types::ids::{GroupId, ParticipantId};

    fn state() -> GroupState {
        GroupState::new(GroupId::new(), SettlementStrategy::Optimal, ["a", "b"].map(ParticipantId::from))
    }

    #[test]
    fn sealed_record_opens_after_json_round_trip() {
        let original = state();
        let json = GroupRecord::seal(original.clone()).unwrap().to_json().unwrap();
        let opened = GroupRecord::from_json(json).unwrap().open().unwrap();
        assert_eq!(opened, original);
    }

    #[test]
    fn tampered_record_is_refused() {
        let mut record = GroupRecord::seal(state()).unwrap();
        record
            .state
            .net_balance
            .apply_event(&ParticipantId::from("a"), &ParticipantId::from("b"), Amount::from_i64(1))
            .unwrap();

        assert!(matches!(record.open(), Err(Error::ChecksumMismatch { .. })));
    }
}
