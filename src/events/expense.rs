use crate::error::{Error, InvalidEventReason, Result};
use crate::group::state::GroupState;
use crate::types::amount::Amount;
use crate::types::ids::{ExpenseId, GroupId, ParticipantId};
use serde::{Deserialize, Serialize};

/// One payer covering `splitter_amounts[i]` for each `splitter_ids[i]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseEvent {
    pub expense_id: ExpenseId,
    pub group_id: GroupId,
    pub payer_id: ParticipantId,
    pub splitter_ids: Vec<ParticipantId>,
    pub splitter_amounts: Vec<Amount>,
}

impl ExpenseEvent {
    pub fn new(
        group_id: GroupId,
        payer_id: ParticipantId,
        splitter_ids: Vec<ParticipantId>,
        splitter_amounts: Vec<Amount>,
    ) -> Self {
        ExpenseEvent {
            expense_id: ExpenseId::new(),
            group_id,
            payer_id,
            splitter_ids,
            splitter_amounts,
        }
    }

    /// Convenience constructor from `(splitter, amount)` pairs.
    pub fn from_splits(
        group_id: GroupId,
        payer_id: ParticipantId,
        splits: impl IntoIterator<Item = (ParticipantId, Amount)>,
    ) -> Self {
        let (splitter_ids, splitter_amounts) = splits.into_iter().unzip();
        Self::new(group_id, payer_id, splitter_ids, splitter_amounts)
    }

    pub fn splits(&self) -> impl Iterator<Item = (&ParticipantId, Amount)> {
        self.splitter_ids.iter().zip(self.splitter_amounts.iter().copied())
    }

    /// Saturates instead of overflowing; `validate` rejects such events.
    pub fn total(&self) -> Amount {
        Amount::balanced_sum(self.splitter_amounts.iter().copied())
    }

    /// Shape and membership checks. Never touches the group.
    pub fn validate(&self, group: &GroupState) -> Result<()> {
        if self.group_id != group.group_id {
            return Err(Error::InvalidEvent(InvalidEventReason::WrongGroup {
                expected: group.group_id,
                found: self.group_id,
            }));
        }

        if self.splitter_ids.len() != self.splitter_amounts.len() {
            return Err(Error::InvalidEvent(InvalidEventReason::MismatchedSplitLengths {
                splitters: self.splitter_ids.len(),
                amounts: self.splitter_amounts.len(),
            }));
        }

        if !group.is_member(&self.payer_id) {
            return Err(Error::InvalidEvent(InvalidEventReason::UnknownParticipant(
                self.payer_id.clone(),
            )));
        }

        for (splitter, amount) in self.splits() {
            if !group.is_member(splitter) {
                return Err(Error::InvalidEvent(InvalidEventReason::UnknownParticipant(
                    splitter.clone(),
                )));
            }
            if amount.is_negative() {
                return Err(Error::InvalidEvent(InvalidEventReason::NegativeAmount {
                    participant: splitter.clone(),
                    amount,
                }));
            }
        }

        self.splitter_amounts
            .iter()
            .try_fold(Amount::ZERO, |total, amount| total.checked_add(*amount))
            .ok_or_else(|| Error::amount_overflow(&self.payer_id))?;

        Ok(())
    }
}
