use std::collections::BTreeSet;
use std::io::{self, BufRead};
use std::sync::Arc;

use anyhow::{Context, bail};
use splitledger::config::AppConfig;
use splitledger::observability::metrics::register_metrics;
use splitledger::observability::tracing::init_tracing;
use splitledger::service::GroupService;
use splitledger::store::{InMemoryDirectory, InMemoryDocumentStore};
use splitledger::{Amount, ParticipantId};

/// One stdin line: `<payer> <splitter>:<amount> [<splitter>:<amount> ...]`.
struct ExpenseLine {
    payer: ParticipantId,
    splits: Vec<(ParticipantId, Amount)>,
}

fn parse_line(line: &str) -> anyhow::Result<ExpenseLine> {
    let mut tokens = line.split_whitespace();
    let payer = tokens.next().context("missing payer")?;

    let mut splits = Vec::new();
    for token in tokens {
        let Some((splitter, amount)) = token.split_once(':') else {
            bail!("expected <splitter>:<amount>, got {:?}", token);
        };
        let amount: Amount = amount
            .parse()
            .with_context(|| format!("invalid amount {:?}", amount))?;
        splits.push((ParticipantId::from(splitter), amount));
    }

    Ok(ExpenseLine {
        payer: ParticipantId::from(payer),
        splits,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = std::env::args().nth(1).unwrap_or_else(|| "development".to_string());
    let config = AppConfig::load(&env).context("loading configuration")?;
    init_tracing(&config.logging);
    register_metrics().context("registering metrics")?;

    let mut expenses = Vec::new();
    for (number, line) in io::stdin().lock().lines().enumerate() {
        let line = line.context("reading stdin")?;
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        let expense = parse_line(&line).with_context(|| format!("line {}", number + 1))?;
        expenses.push(expense);
    }

    let members: BTreeSet<ParticipantId> = expenses
        .iter()
        .flat_map(|e| std::iter::once(e.payer.clone()).chain(e.splits.iter().map(|(p, _)| p.clone())))
        .collect();

    // Participants on stdin are their own display names.
    let directory: InMemoryDirectory = members
        .iter()
        .map(|p| (p.clone(), p.as_str().to_string()))
        .collect();

    let service = GroupService::new(
        Arc::new(InMemoryDocumentStore::new()),
        Arc::new(directory),
        &config,
    );
    let group_id = service.create_group(members.into_iter().collect()).await?;

    for expense in expenses {
        service
            .record_expense(&group_id, &expense.payer, expense.splits)
            .await?;
    }

    for line in service.expense_detail(&group_id).await? {
        println!("{}", line);
    }
    Ok(())
}
