use crate::graph::debt_graph::Debt;
use crate::group::state::GroupState;
use crate::types::ids::ParticipantId;

/// Human-readable settlement lines for a group.
pub struct SettlementReport<'a> {
    currency_symbol: &'a str,
}

impl<'a> SettlementReport<'a> {
    pub fn new(currency_symbol: &'a str) -> Self {
        SettlementReport { currency_symbol }
    }

    /// `"<creditor> gets back from <debtor>: <amount>"` for every positive
    /// debt. Opposite entries between the same pair are netted first.
    pub fn lines(&self, group: &GroupState) -> Vec<String> {
        self.render(group, |_| true)
    }

    /// Only the lines `participant` collects or pays on.
    pub fn personal_lines(&self, group: &GroupState, participant: &ParticipantId) -> Vec<String> {
        self.render(group, |debt| &debt.creditor == participant || &debt.debtor == participant)
    }

    fn render(&self, group: &GroupState, keep: impl Fn(&Debt) -> bool) -> Vec<String> {
        group
            .debt_graph
            .normalized()
            .debts()
            .filter(|debt| debt.amount.is_positive() && keep(debt))
            .map(|debt| {
                format!(
                    "{} gets back from {}: {}{}",
                    group.display_name(&debt.creditor),
                    group.display_name(&debt.debtor),
                    self.currency_symbol,
                    debt.amount
                )
            })
            .collect()
    }
}
