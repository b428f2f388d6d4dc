use crate::config::engine::EngineConfig;
use crate::error::{Error, InvalidEventReason, Result};
use crate::events::expense::ExpenseEvent;
use crate::engine::strategy::SettlementStrategy;
use crate::graph::simplifier::PairwiseGraphSimplifier;
use crate::group::state::GroupState;
use crate::invariants::checks::InvariantChecks;
use crate::observability::metrics::{EXPENSES_APPLIED, EXPENSES_REJECTED, EXPENSES_REVERSED};
use crate::observability::tracing::trace_expense;
use crate::settlement::solver::OptimalSettlementSolver;
use crate::types::amount::Amount;
use crate::types::ids::ParticipantId;

/// Applies and retracts expense events against a copy of a group's state.
///
/// Every operation takes the current state by reference and returns the
/// next state. On error the caller's state is untouched, so nothing is ever
/// half applied. The engine holds no mutable state and can be shared freely.
pub struct SettlementEngine {
    solver: OptimalSettlementSolver,
    tolerance: Amount,
}

impl SettlementEngine {
    pub fn new(config: &EngineConfig) -> Self {
        SettlementEngine {
            solver: OptimalSettlementSolver::new(config.conservation_tolerance),
            tolerance: config.conservation_tolerance,
        }
    }

    /// Apply every split of `event` and record it in the item history.
    ///
    /// Zero and self-pay splits leave the ledger and graph untouched, but the
    /// event is still recorded so its stored item can later be retracted.
    pub fn apply_expense(&self, state: &GroupState, event: &ExpenseEvent) -> Result<GroupState> {
        let _span = trace_expense(&event.group_id, &event.expense_id, "apply").entered();

        self.validate(state, event)?;
        if state.has_applied(&event.expense_id) {
            return Err(self.reject(InvalidEventReason::DuplicateExpense(event.expense_id)));
        }

        let mut next = state.clone();
        for (splitter, amount) in event.splits() {
            next.net_balance.apply_event(&event.payer_id, splitter, amount)?;
            if next.strategy == SettlementStrategy::Incremental {
                PairwiseGraphSimplifier::apply_debt(
                    &mut next.debt_graph,
                    &next.members,
                    &event.payer_id,
                    splitter,
                    amount,
                )?;
            }
        }
        if next.strategy == SettlementStrategy::Optimal {
            next.debt_graph = self.solver.rebuild_graph(&next.net_balance)?;
        }
        next.item_history.push(event.expense_id);

        InvariantChecks::check_all(&next, self.tolerance)?;

        EXPENSES_APPLIED.inc();
        tracing::info!(
            "Applied expense: payer={}, splits={}, total={}, edges={}",
            event.payer_id,
            event.splitter_ids.len(),
            event.total(),
            next.debt_graph.edge_count()
        );
        Ok(next)
    }

    /// Retract a previously applied event. Incremental groups replay every
    /// split with the roles swapped, last split first.
    pub fn reverse_expense(&self, state: &GroupState, event: &ExpenseEvent) -> Result<GroupState> {
        let _span = trace_expense(&event.group_id, &event.expense_id, "reverse").entered();

        self.validate(state, event)?;
        let position = state
            .item_history
            .iter()
            .position(|id| *id == event.expense_id)
            .ok_or_else(|| self.reject(InvalidEventReason::NotApplied(event.expense_id)))?;

        let splits: Vec<_> = event.splits().collect();
        let mut next = state.clone();
        for (splitter, amount) in splits.into_iter().rev() {
            next.net_balance.reverse_event(&event.payer_id, splitter, amount)?;
            if next.strategy == SettlementStrategy::Incremental {
                PairwiseGraphSimplifier::reverse_debt(
                    &mut next.debt_graph,
                    &next.members,
                    &event.payer_id,
                    splitter,
                    amount,
                )?;
            }
        }
        if next.strategy == SettlementStrategy::Optimal {
            next.debt_graph = self.solver.rebuild_graph(&next.net_balance)?;
        }
        next.item_history.remove(position);

        InvariantChecks::check_all(&next, self.tolerance)?;

        EXPENSES_REVERSED.inc();
        tracing::info!(
            "Reversed expense: payer={}, total={}, edges={}",
            event.payer_id,
            event.total(),
            next.debt_graph.edge_count()
        );
        Ok(next)
    }

    /// Add a member with a zero balance. Existing members only get their
    /// display name refreshed.
    pub fn add_member(
        &self,
        state: &GroupState,
        participant: &ParticipantId,
        display_name: Option<String>,
    ) -> Result<GroupState> {
        let mut next = state.clone();
        if next.members.insert(participant.clone()) {
            next.net_balance.open_account(participant);
            tracing::info!("Added member {} to group {}", participant, next.group_id);
        }
        if let Some(name) = display_name {
            next.member_names.insert(participant.clone(), name);
        }
        Ok(next)
    }

    /// Replace the graph with the solver output, whatever the group's
    /// strategy. The ledger is left as is.
    pub fn rebuild(&self, state: &GroupState) -> Result<GroupState> {
        let mut next = state.clone();
        next.debt_graph = self.solver.rebuild_graph(&next.net_balance)?;
        InvariantChecks::check_solver_edge_bound(&next.debt_graph, next.members.len())?;
        InvariantChecks::check_all(&next, self.tolerance)?;
        Ok(next)
    }

    fn validate(&self, state: &GroupState, event: &ExpenseEvent) -> Result<()> {
        event.validate(state).inspect_err(|e| {
            EXPENSES_REJECTED.inc();
            tracing::warn!("Rejected expense {}: {}", event.expense_id, e);
        })
    }

    fn reject(&self, reason: InvalidEventReason) -> Error {
        EXPENSES_REJECTED.inc();
        tracing::warn!("Rejected expense: {}", reason);
        Error::InvalidEvent(reason)
    }
}

impl Default for SettlementEngine {
    fn default() -> Self {
        SettlementEngine::new(&EngineConfig::default())
    }
}
