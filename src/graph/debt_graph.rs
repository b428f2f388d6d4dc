use crate::error::{Error, InvariantViolation, Result};
use crate::types::amount::Amount;
use crate::types::ids::ParticipantId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sparse direct-debt graph: `edges[creditor][debtor]` is what `debtor`
/// owes `creditor`.
///
/// Zero entries and absent entries mean the same thing, and equality
/// ignores them.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DebtGraph {
    edges: BTreeMap<ParticipantId, BTreeMap<ParticipantId, Amount>>,
}

/// One positive edge of a [`DebtGraph`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Debt {
    pub creditor: ParticipantId,
    pub debtor: ParticipantId,
    pub amount: Amount,
}

impl DebtGraph {
    pub fn new() -> Self {
        DebtGraph {
            edges: BTreeMap::new(),
        }
    }

    pub fn get(&self, creditor: &ParticipantId, debtor: &ParticipantId) -> Amount {
        self.edges
            .get(creditor)
            .and_then(|row| row.get(debtor))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Overwrites one entry. Self-debt is refused.
    pub fn set(&mut self, creditor: &ParticipantId, debtor: &ParticipantId, amount: Amount) -> Result<()> {
        if creditor == debtor {
            return Err(Error::InvariantViolation(InvariantViolation {
                invariant: "no_self_debt",
                details: format!("refusing to record {} as owing themselves {}", creditor, amount),
            }));
        }
        self.edges
            .entry(creditor.clone())
            .or_default()
            .insert(debtor.clone(), amount);
        Ok(())
    }

    pub fn add(&mut self, creditor: &ParticipantId, debtor: &ParticipantId, amount: Amount) -> Result<()> {
        let next = self
            .get(creditor, debtor)
            .checked_add(amount)
            .ok_or_else(|| Error::amount_overflow(debtor))?;
        self.set(creditor, debtor, next)
    }

    pub fn sub(&mut self, creditor: &ParticipantId, debtor: &ParticipantId, amount: Amount) -> Result<()> {
        let next = self
            .get(creditor, debtor)
            .checked_sub(amount)
            .ok_or_else(|| Error::amount_overflow(debtor))?;
        self.set(creditor, debtor, next)
    }

    /// Every non-zero entry, ordered by creditor then debtor.
    pub fn debts(&self) -> impl Iterator<Item = Debt> + '_ {
        self.edges.iter().flat_map(|(creditor, row)| {
            row.iter()
                .filter(|(_, amount)| !amount.is_zero())
                .map(move |(debtor, amount)| Debt {
                    creditor: creditor.clone(),
                    debtor: debtor.clone(),
                    amount: *amount,
                })
        })
    }

    pub fn edge_count(&self) -> usize {
        self.debts().count()
    }

    pub fn is_empty(&self) -> bool {
        self.edge_count() == 0
    }

    /// What the graph says `participant` is owed overall, minus what they owe.
    pub fn net_position(&self, participant: &ParticipantId) -> Amount {
        Amount::balanced_sum(self.debts().map(|d| {
            if &d.creditor == participant {
                d.amount
            } else if &d.debtor == participant {
                -d.amount
            } else {
                Amount::ZERO
            }
        }))
    }

    /// Nets opposite entries between the same pair so only one direction
    /// remains, with a positive amount, and drops zeros.
    pub fn normalized(&self) -> DebtGraph {
        let mut out = DebtGraph::new();
        for debt in self.debts() {
            if debt.creditor > debt.debtor {
                continue;
            }
            let net = debt.amount - self.get(&debt.debtor, &debt.creditor);
            if net.is_positive() {
                out.edges.entry(debt.creditor).or_default().insert(debt.debtor, net);
            } else if net.is_negative() {
                out.edges.entry(debt.debtor).or_default().insert(debt.creditor, -net);
            }
        }
        // Pairs recorded only in the `creditor > debtor` direction.
        for debt in self.debts() {
            if debt.creditor > debt.debtor && self.get(&debt.debtor, &debt.creditor).is_zero() {
                out.edges.entry(debt.creditor).or_default().insert(debt.debtor, debt.amount);
            }
        }
        out
    }

    pub fn has_self_debt(&self) -> bool {
        self.edges
            .iter()
            .any(|(creditor, row)| row.get(creditor).is_some_and(|a| !a.is_zero()))
    }
}

impl PartialEq for DebtGraph {
    fn eq(&self, other: &Self) -> bool {
        self.debts().eq(other.debts())
    }
}

impl Eq for DebtGraph {}

impl FromIterator<(ParticipantId, ParticipantId, Amount)> for DebtGraph {
    fn from_iter<I: IntoIterator<Item = (ParticipantId, ParticipantId, Amount)>>(iter: I) -> Self {
        let mut graph = DebtGraph::new();
        for (creditor, debtor, amount) in iter {
            if creditor != debtor {
                graph.edges.entry(creditor).or_default().insert(debtor, amount);
            }
        }
        graph
    }
}
