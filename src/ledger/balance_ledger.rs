use crate::error::{Error, InvalidEventReason, Result};
use crate::types::amount::Amount;
use crate::types::ids::ParticipantId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Net position per participant. Positive = the group owes them, negative =
/// they owe the group.
///
/// This is the audit-grade source of truth: every applied split moves the
/// same amount in and out, so the balances always sum to exactly zero.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalanceLedger {
    balances: BTreeMap<ParticipantId, Amount>,
}

impl BalanceLedger {
    pub fn new() -> Self {
        BalanceLedger {
            balances: BTreeMap::new(),
        }
    }

    /// Ledger with a zero entry for every member.
    pub fn with_members<'a>(members: impl IntoIterator<Item = &'a ParticipantId>) -> Self {
        BalanceLedger {
            balances: members.into_iter().map(|m| (m.clone(), Amount::ZERO)).collect(),
        }
    }

    pub fn open_account(&mut self, participant: &ParticipantId) {
        self.balances.entry(participant.clone()).or_insert(Amount::ZERO);
    }

    pub fn balance(&self, participant: &ParticipantId) -> Amount {
        self.balances.get(participant).copied().unwrap_or(Amount::ZERO)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantId, Amount)> {
        self.balances.iter().map(|(p, a)| (p, *a))
    }

    /// `payer` paid `amount` on behalf of `splitter`.
    pub fn apply_event(&mut self, payer: &ParticipantId, splitter: &ParticipantId, amount: Amount) -> Result<()> {
        Self::check_amount(splitter, amount)?;
        if payer == splitter || amount.is_zero() {
            return Ok(());
        }

        self.transfer(payer, splitter, amount)
    }

    /// Exact inverse of [`BalanceLedger::apply_event`] with the same arguments.
    pub fn reverse_event(&mut self, payer: &ParticipantId, splitter: &ParticipantId, amount: Amount) -> Result<()> {
        Self::check_amount(splitter, amount)?;
        if payer == splitter || amount.is_zero() {
            return Ok(());
        }

        self.transfer(splitter, payer, amount)
    }

    /// Credit `to` and debit `from`. Both sides are computed before either is
    /// written, so an overflow leaves the ledger as it was.
    fn transfer(&mut self, to: &ParticipantId, from: &ParticipantId, amount: Amount) -> Result<()> {
        let credited = self
            .balance(to)
            .checked_add(amount)
            .ok_or_else(|| Error::amount_overflow(to))?;
        let debited = self
            .balance(from)
            .checked_sub(amount)
            .ok_or_else(|| Error::amount_overflow(from))?;

        self.balances.insert(to.clone(), credited);
        self.balances.insert(from.clone(), debited);
        Ok(())
    }

    pub fn total(&self) -> Amount {
        Amount::balanced_sum(self.balances.values().copied())
    }

    /// Fails with `LedgerInconsistency` when the balances do not cancel out.
    pub fn verify_conservation(&self, tolerance: Amount) -> Result<()> {
        let residual = self.total();
        if residual.abs() > tolerance {
            return Err(Error::LedgerInconsistency { residual });
        }
        Ok(())
    }

    fn check_amount(participant: &ParticipantId, amount: Amount) -> Result<()> {
        if amount.is_negative() {
            return Err(Error::InvalidEvent(InvalidEventReason::NegativeAmount {
                participant: participant.clone(),
                amount,
            }));
        }
        Ok(())
    }
}

impl FromIterator<(ParticipantId, Amount)> for BalanceLedger {
    fn from_iter<I: IntoIterator<Item = (ParticipantId, Amount)>>(iter: I) -> Self {
        BalanceLedger {
            balances: iter.into_iter().collect(),
        }
    }
}
