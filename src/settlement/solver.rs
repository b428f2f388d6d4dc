use crate::error::{Error, Result};
use crate::graph::debt_graph::DebtGraph;
use crate::ledger::balance_ledger::BalanceLedger;
use crate::observability::metrics::{LEDGER_INCONSISTENCIES, SOLVER_EDGES, SOLVER_RUNS};
use crate::types::amount::Amount;
use crate::types::ids::ParticipantId;

/// Greedy cash-flow minimization over net balances.
///
/// Largest creditor is matched with largest debtor until one side is
/// exhausted. Produces at most `participants - 1` edges. This is the usual
/// greedy heuristic, not an exact minimum-transaction solver.
pub struct OptimalSettlementSolver {
    tolerance: Amount,
}

impl OptimalSettlementSolver {
    pub fn new(tolerance: Amount) -> Self {
        OptimalSettlementSolver { tolerance }
    }

    /// Build a fresh one-directional graph (`graph[creditor][debtor]`) from
    /// the ledger alone. Any existing graph is ignored.
    pub fn rebuild_graph(&self, ledger: &BalanceLedger) -> Result<DebtGraph> {
        SOLVER_RUNS.inc();

        if let Err(e) = ledger.verify_conservation(self.tolerance) {
            LEDGER_INCONSISTENCIES.inc();
            tracing::error!("Refusing to settle unbalanced ledger: {}", e);
            return Err(e);
        }

        let mut creditors: Vec<(Amount, &ParticipantId)> = Vec::new();
        let mut debtors: Vec<(Amount, &ParticipantId)> = Vec::new();
        for (participant, balance) in ledger.iter() {
            if balance.is_positive() {
                creditors.push((balance, participant));
            } else if balance.is_negative() {
                debtors.push((balance.abs(), participant));
            }
        }

        // Largest magnitude first; the stable sort keeps participant order on ties.
        creditors.sort_by(|a, b| b.0.cmp(&a.0));
        debtors.sort_by(|a, b| b.0.cmp(&a.0));

        let mut graph = DebtGraph::new();
        let (mut i, mut j) = (0, 0);
        while i < creditors.len() && j < debtors.len() {
            let settled = creditors[i].0.min(debtors[j].0);
            graph.set(creditors[i].1, debtors[j].1, settled)?;

            creditors[i].0 -= settled;
            debtors[j].0 -= settled;

            if creditors[i].0.is_zero() {
                i += 1;
            }
            if debtors[j].0.is_zero() {
                j += 1;
            }
        }

        let leftover = Amount::balanced_sum(creditors[i..].iter().map(|c| c.0))
            - Amount::balanced_sum(debtors[j..].iter().map(|d| d.0));
        let unsettled = creditors[i..].len() + debtors[j..].len();
        if unsettled > 0 && leftover.abs() > self.tolerance {
            LEDGER_INCONSISTENCIES.inc();
            tracing::error!(
                "Settlement left {} participants unsettled with residual {}",
                unsettled,
                leftover
            );
            return Err(Error::LedgerInconsistency { residual: leftover });
        }

        SOLVER_EDGES.observe(graph.edge_count() as f64);
        Ok(graph)
    }
}

impl Default for OptimalSettlementSolver {
    fn default() -> Self {
        OptimalSettlementSolver::new(Amount::ZERO)
    }
}
