use crate::error::{Error, InvalidEventReason, Result};
use crate::graph::debt_graph::DebtGraph;
use crate::types::amount::Amount;
use crate::types::ids::ParticipantId;
use std::collections::BTreeSet;

/// Incremental triangular simplification of the direct debt graph.
///
/// Each new debt is cancelled against existing obligations through a common
/// third party before it is recorded, so the number of edges stays bounded
/// by the member count instead of the length of the history. Runs in
/// O(members) per call and never reads the balance ledger.
pub struct PairwiseGraphSimplifier;

impl PairwiseGraphSimplifier {
    /// Record that `receiver` owes `payer` `amount` more.
    pub fn apply_debt(
        graph: &mut DebtGraph,
        members: &BTreeSet<ParticipantId>,
        payer: &ParticipantId,
        receiver: &ParticipantId,
        amount: Amount,
    ) -> Result<()> {
        if amount.is_negative() {
            return Err(Error::InvalidEvent(InvalidEventReason::NegativeAmount {
                participant: receiver.clone(),
                amount,
            }));
        }
        if payer == receiver || amount.is_zero() {
            return Ok(());
        }

        // Merge with the existing direct debt, then redistribute all of it.
        let mut total = amount
            .checked_add(graph.get(payer, receiver))
            .ok_or_else(|| Error::amount_overflow(receiver))?;
        graph.set(payer, receiver, Amount::ZERO)?;

        // Forward pass: the payer's own debt to the receiver cancels first,
        // then whoever else owes the receiver pays the payer directly.
        let forward = std::iter::once(payer)
            .chain(members.iter().filter(|m| *m != payer && *m != receiver));
        for m in forward {
            if total.is_zero() {
                break;
            }
            let owed_to_receiver = graph.get(receiver, m);
            if !owed_to_receiver.is_positive() {
                continue;
            }
            let flow = total.min(owed_to_receiver);
            graph.sub(receiver, m, flow)?;
            if m != payer {
                graph.add(payer, m, flow)?;
            }
            total -= flow;
        }

        // Reverse pass: whatever the payer owes others moves onto the receiver.
        if total.is_positive() {
            for m in members.iter().filter(|m| *m != payer && *m != receiver) {
                if total.is_zero() {
                    break;
                }
                let owed_by_payer = graph.get(m, payer);
                if !owed_by_payer.is_positive() {
                    continue;
                }
                let flow = total.min(owed_by_payer);
                graph.sub(m, payer, flow)?;
                graph.add(m, receiver, flow)?;
                total -= flow;
            }
        }

        graph.set(payer, receiver, total)
    }

    /// Undo a prior [`PairwiseGraphSimplifier::apply_debt`] by replaying it
    /// with the roles swapped. The simplified graph no longer holds enough
    /// information to subtract the original debt in place.
    pub fn reverse_debt(
        graph: &mut DebtGraph,
        members: &BTreeSet<ParticipantId>,
        payer: &ParticipantId,
        receiver: &ParticipantId,
        amount: Amount,
    ) -> Result<()> {
        Self::apply_debt(graph, members, receiver, payer, amount)
    }
}
