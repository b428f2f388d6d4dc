use crate::engine::strategy::SettlementStrategy;
use crate::graph::debt_graph::DebtGraph;
use crate::ledger::balance_ledger::BalanceLedger;
use crate::types::ids::{ExpenseId, GroupId, ParticipantId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Everything the engine knows about one group.
///
/// The host store owns the durable copy; the engine only ever sees a
/// transient clone for the duration of one atomic update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupState {
    pub group_id: GroupId,
    pub strategy: SettlementStrategy,
    pub members: BTreeSet<ParticipantId>,
    #[serde(default)]
    pub member_names: BTreeMap<ParticipantId, String>,
    pub net_balance: BalanceLedger,
    pub debt_graph: DebtGraph,
    #[serde(default)]
    pub item_history: Vec<ExpenseId>,
}

impl GroupState {
    pub fn new(
        group_id: GroupId,
        strategy: SettlementStrategy,
        members: impl IntoIterator<Item = ParticipantId>,
    ) -> Self {
        let members: BTreeSet<ParticipantId> = members.into_iter().collect();
        GroupState {
            group_id,
            strategy,
            net_balance: BalanceLedger::with_members(&members),
            members,
            member_names: BTreeMap::new(),
            debt_graph: DebtGraph::new(),
            item_history: Vec::new(),
        }
    }

    pub fn is_member(&self, participant: &ParticipantId) -> bool {
        self.members.contains(participant)
    }

    pub fn has_applied(&self, expense_id: &ExpenseId) -> bool {
        self.item_history.contains(expense_id)
    }

    /// Display name, or the raw id when the directory had none.
    pub fn display_name<'a>(&'a self, participant: &'a ParticipantId) -> &'a str {
        self.member_names
            .get(participant)
            .map(String::as_str)
            .unwrap_or(participant.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::amount::Amount;

    #[test]
    fn new_group_starts_settled() {
        let state = GroupState::new(
            GroupId::new(),
            SettlementStrategy::Incremental,
            ["a", "b", "c"].map(ParticipantId::from),
        );

        assert_eq!(state.members.len(), 3);
        assert!(state.debt_graph.is_empty());
        assert!(state.item_history.is_empty());
        for member in &state.members {
            assert_eq!(state.net_balance.balance(member), Amount::ZERO);
        }
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let mut state = GroupState::new(GroupId::new(), SettlementStrategy::Optimal, [ParticipantId::from("u1")]);
        let u1 = ParticipantId::from("u1");
        let u2 = ParticipantId::from("u2");
        state.member_names.insert(u1.clone(), "Asha".to_string());

        assert_eq!(state.display_name(&u1), "Asha");
        assert_eq!(state.display_name(&u2), "u2");
    }

    #[test]
    fn round_trips_through_json_with_string_amounts() {
        let mut state = GroupState::new(
            GroupId::new(),
            SettlementStrategy::Optimal,
            ["a", "b"].map(ParticipantId::from),
        );
        state
            .net_balance
            .apply_event(&ParticipantId::from("a"), &ParticipantId::from("b"), Amount::from_minor(1050, 2))
            .unwrap();

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["netBalance"]["a"], "10.50");
        assert_eq!(json["strategy"], "optimal");

        let back: GroupState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
