use tracing::Span;
use tracing_subscriber::EnvFilter;
use crate::config::loader::LoggingConfig;
use crate::types::ids::{ExpenseId, GroupId};

pub fn trace_expense(group_id: &GroupId, expense_id: &ExpenseId, action: &'static str) -> Span {
    tracing::info_span!(
        "expense",
        group_id = %group_id,
        expense_id = %expense_id,
        action,
    )
}

pub fn trace_group_update(key: &str) -> Span {
    tracing::info_span!(
        "group_update",
        key = %key,
    )
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
