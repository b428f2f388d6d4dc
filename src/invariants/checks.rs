use crate::error::{Error, InvariantViolation, Result};
use crate::graph::debt_graph::DebtGraph;
use crate::group::state::GroupState;
use crate::ledger::balance_ledger::BalanceLedger;
use crate::observability::metrics::LEDGER_INCONSISTENCIES;
use crate::types::amount::Amount;

pub struct InvariantChecks;

impl InvariantChecks {
    /// Balances must sum to zero.
    pub fn check_conservation(ledger: &BalanceLedger, tolerance: Amount) -> Result<()> {
        ledger.verify_conservation(tolerance).inspect_err(|_| {
            LEDGER_INCONSISTENCIES.inc();
        })
    }

    pub fn check_no_self_debt(graph: &DebtGraph) -> Result<()> {
        if let Some(debt) = graph.debts().find(|d| d.creditor == d.debtor) {
            return Err(Error::InvariantViolation(InvariantViolation {
                invariant: "no_self_debt",
                details: format!("{} owes themselves {}", debt.creditor, debt.amount),
            }));
        }
        Ok(())
    }

    /// Both engines only ever move debt around, so each member's position in
    /// the graph must equal their ledger balance.
    pub fn check_graph_matches_ledger(state: &GroupState, tolerance: Amount) -> Result<()> {
        for member in &state.members {
            let in_graph = state.debt_graph.net_position(member);
            let in_ledger = state.net_balance.balance(member);
            let drift = in_graph.checked_sub(in_ledger).map(|d| d.abs());
            if drift.is_none_or(|d| d > tolerance) {
                LEDGER_INCONSISTENCIES.inc();
                return Err(Error::InvariantViolation(InvariantViolation {
                    invariant: "graph_matches_ledger",
                    details: format!(
                        "{} has {} in the graph but {} in the ledger",
                        member, in_graph, in_ledger
                    ),
                }));
            }
        }
        Ok(())
    }

    /// Solver output never needs more than `members - 1` payments.
    pub fn check_solver_edge_bound(graph: &DebtGraph, members: usize) -> Result<()> {
        let edges = graph.edge_count();
        if edges > members.saturating_sub(1) {
            return Err(Error::InvariantViolation(InvariantViolation {
                invariant: "solver_edge_bound",
                details: format!("{} edges for {} members", edges, members),
            }));
        }
        Ok(())
    }

    pub fn check_all(state: &GroupState, tolerance: Amount) -> Result<()> {
        Self::check_conservation(&state.net_balance, tolerance)?;
        Self::check_no_self_debt(&state.debt_graph)?;
        Self::check_graph_matches_ledger(state, tolerance)?;
        Ok(())
    }
}
