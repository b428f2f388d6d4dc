use lazy_static::lazy_static;
use prometheus::{Counter, Histogram, HistogramOpts, Registry};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Expense metrics
    pub static ref EXPENSES_APPLIED: Counter = Counter::new(
        "expenses_applied_total",
        "Total number of expense events applied"
    ).unwrap();

    pub static ref EXPENSES_REVERSED: Counter = Counter::new(
        "expenses_reversed_total",
        "Total number of expense events reversed"
    ).unwrap();

    pub static ref EXPENSES_REJECTED: Counter = Counter::new(
        "expenses_rejected_total",
        "Total number of expense events rejected as invalid"
    ).unwrap();

    // Ledger metrics
    pub static ref LEDGER_INCONSISTENCIES: Counter = Counter::new(
        "ledger_inconsistencies_total",
        "Total number of conservation or graph/ledger mismatches detected"
    ).unwrap();

    // Solver metrics
    pub static ref SOLVER_RUNS: Counter = Counter::new(
        "solver_runs_total",
        "Total number of settlement graph rebuilds"
    ).unwrap();

    pub static ref SOLVER_EDGES: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "solver_edges",
            "Edges produced per settlement graph rebuild"
        ).buckets(vec![0.0, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0])
    ).unwrap();

    // Store metrics
    pub static ref STORE_CONFLICTS: Counter = Counter::new(
        "store_conflicts_total",
        "Total number of optimistic write conflicts retried"
    ).unwrap();
}

pub fn register_metrics() -> prometheus::Result<()> {
    REGISTRY.register(Box::new(EXPENSES_APPLIED.clone()))?;
    REGISTRY.register(Box::new(EXPENSES_REVERSED.clone()))?;
    REGISTRY.register(Box::new(EXPENSES_REJECTED.clone()))?;
    REGISTRY.register(Box::new(LEDGER_INCONSISTENCIES.clone()))?;
    REGISTRY.register(Box::new(SOLVER_RUNS.clone()))?;
    REGISTRY.register(Box::new(SOLVER_EDGES.clone()))?;
    REGISTRY.register(Box::new(STORE_CONFLICTS.clone()))?;
    Ok(())
}
