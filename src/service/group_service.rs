use crate::config::loader::AppConfig;
use crate::engine::settlement_engine::SettlementEngine;
use crate::engine::strategy::SettlementStrategy;
use crate::error::{Error, InvalidEventReason, Result};
use crate::events::expense::ExpenseEvent;
use crate::group::record::GroupRecord;
use crate::group::state::GroupState;
use crate::interfaces::directory::Directory;
use crate::interfaces::document_store::DocumentStore;
use crate::observability::metrics::STORE_CONFLICTS;
use crate::observability::tracing::trace_group_update;
use crate::settlement::report::SettlementReport;
use crate::types::amount::Amount;
use crate::types::ids::{ExpenseId, GroupId, ParticipantId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::Instrument;

const UNKNOWN_NAME: &str = "Unknown";

pub fn group_key(group_id: &GroupId) -> String {
    format!("groups/{}", group_id)
}

pub fn item_key(expense_id: &ExpenseId) -> String {
    format!("items/{}", expense_id)
}

/// Stored form of an applied expense.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    #[serde(flatten)]
    pub event: ExpenseEvent,
    pub payer_name: String,
}

/// Host-side orchestration around the engine: every group mutation is a
/// read, a pure engine call and a compare-and-swap, retried on conflict.
pub struct GroupService<S, D> {
    store: Arc<S>,
    directory: Arc<D>,
    engine: SettlementEngine,
    strategy: SettlementStrategy,
    max_retries: u32,
    currency_symbol: String,
}

impl<S, D> GroupService<S, D>
where
    S: DocumentStore,
    D: Directory,
{
    pub fn new(store: Arc<S>, directory: Arc<D>, config: &AppConfig) -> Self {
        GroupService {
            store,
            directory,
            engine: SettlementEngine::new(&config.engine),
            strategy: config.engine.strategy,
            max_retries: config.store.max_retries,
            currency_symbol: config.report.currency_symbol.clone(),
        }
    }

    pub async fn create_group(&self, members: Vec<ParticipantId>) -> Result<GroupId> {
        let group_id = GroupId::new();
        let mut state = GroupState::new(group_id, self.strategy, members);
        for member in &state.members {
            let name = self.resolve_name(member).await?;
            state.member_names.insert(member.clone(), name);
        }

        let record = GroupRecord::seal(state)?;
        self.store.create(&group_key(&group_id), record.to_json()?).await?;

        tracing::info!("Created group {} ({} strategy)", group_id, self.strategy);
        Ok(group_id)
    }

    pub async fn group(&self, group_id: &GroupId) -> Result<GroupState> {
        self.load(group_id).await.map(|(_, state)| state)
    }

    pub async fn add_member(&self, group_id: &GroupId, participant: &ParticipantId) -> Result<()> {
        let name = self.resolve_name(participant).await?;
        self.transact(group_id, |state| {
            self.engine.add_member(state, participant, Some(name.clone()))
        })
        .await?;
        Ok(())
    }

    /// Store the item, then apply the expense to its group. The group write
    /// is the commit point; if it does not happen the item is removed again.
    pub async fn record_expense(
        &self,
        group_id: &GroupId,
        payer: &ParticipantId,
        splits: Vec<(ParticipantId, Amount)>,
    ) -> Result<ExpenseId> {
        let payer_name = self.resolve_name(payer).await?;
        let record = ExpenseRecord {
            event: ExpenseEvent::from_splits(*group_id, payer.clone(), splits),
            payer_name,
        };
        let expense_id = record.event.expense_id;
        let key = item_key(&expense_id);
        self.store.create(&key, serde_json::to_value(&record)?).await?;

        let event = &record.event;
        if let Err(e) = self
            .transact(group_id, |state| self.engine.apply_expense(state, event))
            .await
        {
            self.discard_item(&key).await;
            return Err(e);
        }
        Ok(expense_id)
    }

    /// Reverse a stored expense and drop its item.
    pub async fn retract_expense(&self, expense_id: &ExpenseId) -> Result<()> {
        let record = self.load_expense(expense_id).await?;
        let event = record.event;

        match self
            .transact(&event.group_id, |state| self.engine.reverse_expense(state, &event))
            .await
        {
            Ok(_) => {}
            // Item outlived an interrupted record or retract; the group never held it.
            Err(Error::InvalidEvent(InvalidEventReason::NotApplied(_))) => {
                tracing::warn!("Expense {} not applied to group {}, dropping item", expense_id, event.group_id);
            }
            Err(e) => return Err(e),
        }

        self.store.delete(&item_key(expense_id)).await?;
        Ok(())
    }

    pub async fn load_expense(&self, expense_id: &ExpenseId) -> Result<ExpenseRecord> {
        let doc = self
            .store
            .get(&item_key(expense_id))
            .await?
            .ok_or(Error::ExpenseNotFound(*expense_id))?;
        Ok(serde_json::from_value(doc.body)?)
    }

    /// Delete a group and every item recorded against it. The group only goes
    /// at the revision whose history was cleared; an expense committed in
    /// between forces another pass.
    pub async fn delete_group(&self, group_id: &GroupId) -> Result<()> {
        let key = group_key(group_id);
        let mut attempt = 0;
        loop {
            let (revision, state) = self.load(group_id).await?;
            for expense_id in &state.item_history {
                self.store.delete(&item_key(expense_id)).await?;
            }

            match self.store.compare_and_delete(&key, revision).await {
                Ok(()) => {
                    tracing::info!("Deleted group {} with {} items", group_id, state.item_history.len());
                    return Ok(());
                }
                Err(Error::ConcurrentUpdateConflict { .. }) if attempt < self.max_retries => {
                    attempt += 1;
                    STORE_CONFLICTS.inc();
                    tracing::warn!("Group {} changed during delete, retry {}", group_id, attempt);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Replace the group's graph with the minimum-transaction settlement.
    pub async fn rebuild(&self, group_id: &GroupId) -> Result<GroupState> {
        self.transact(group_id, |state| self.engine.rebuild(state)).await
    }

    pub async fn expense_detail(&self, group_id: &GroupId) -> Result<Vec<String>> {
        let (_, state) = self.load(group_id).await?;
        Ok(SettlementReport::new(&self.currency_symbol).lines(&state))
    }

    pub async fn personal_detail(&self, group_id: &GroupId, participant: &ParticipantId) -> Result<Vec<String>> {
        let (_, state) = self.load(group_id).await?;
        Ok(SettlementReport::new(&self.currency_symbol).personal_lines(&state, participant))
    }

    async fn load(&self, group_id: &GroupId) -> Result<(u64, GroupState)> {
        let doc = self
            .store
            .get(&group_key(group_id))
            .await?
            .ok_or(Error::GroupNotFound(*group_id))?;
        let state = GroupRecord::from_json(doc.body)?.open()?;
        Ok((doc.revision, state))
    }

    /// Optimistic read-modify-write over one group record.
    async fn transact<F>(&self, group_id: &GroupId, update: F) -> Result<GroupState>
    where
        F: Fn(&GroupState) -> Result<GroupState> + Send + Sync,
    {
        let key = group_key(group_id);
        let span = trace_group_update(&key);
        self.transact_with_retry(group_id, &key, update).instrument(span).await
    }

    async fn transact_with_retry<F>(&self, group_id: &GroupId, key: &str, update: F) -> Result<GroupState>
    where
        F: Fn(&GroupState) -> Result<GroupState> + Send + Sync,
    {
        let mut attempt = 0;
        loop {
            let (revision, current) = self.load(group_id).await?;
            let next = update(&current)?;
            let body = GroupRecord::seal(next.clone())?.to_json()?;

            match self.store.compare_and_swap(key, revision, body).await {
                Ok(_) => return Ok(next),
                Err(Error::ConcurrentUpdateConflict { .. }) if attempt < self.max_retries => {
                    attempt += 1;
                    STORE_CONFLICTS.inc();
                    tracing::warn!("Conflict writing {} at revision {}, retry {}", key, revision, attempt);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn discard_item(&self, key: &str) {
        if let Err(e) = self.store.delete(key).await {
            tracing::error!("Failed to remove item {} after aborted update: {}", key, e);
        }
    }

    async fn resolve_name(&self, participant: &ParticipantId) -> Result<String> {
        let name = self.directory.display_name(participant).await?;
        Ok(name.unwrap_or_else(|| UNKNOWN_NAME.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::directory::MockDirectory;
    use crate::store::memory::InMemoryDocumentStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn p(id: &str) -> ParticipantId {
        ParticipantId::from(id)
    }

    fn directory() -> MockDirectory {
        let mut directory = MockDirectory::new();
        directory
            .expect_display_name()
            .returning(|id| match id.as_str() {
                "a" => Ok(Some("Asha".to_string())),
                "b" => Ok(Some("Bilal".to_string())),
                _ => Ok(None),
            });
        directory
    }

    fn service(config: &AppConfig) -> GroupService<InMemoryDocumentStore, MockDirectory> {
        GroupService::new(Arc::new(InMemoryDocumentStore::new()), Arc::new(directory()), config)
    }

    #[tokio::test]
    async fn names_are_denormalized_at_creation() {
        let service = service(&AppConfig::default());
        let group_id = service.create_group(vec![p("a"), p("b"), p("c")]).await.unwrap();

        let state = service.group(&group_id).await.unwrap();
        assert_eq!(state.display_name(&p("a")), "Asha");
        assert_eq!(state.display_name(&p("c")), UNKNOWN_NAME);
    }

    #[tokio::test]
    async fn directory_failure_aborts_group_creation() {
        let mut failing = MockDirectory::new();
        failing
            .expect_display_name()
            .returning(|_| Err(Error::DirectoryError("unreachable".to_string())));
        let store = Arc::new(InMemoryDocumentStore::new());
        let service = GroupService::new(store.clone(), Arc::new(failing), &AppConfig::default());

        assert!(matches!(
            service.create_group(vec![p("a")]).await,
            Err(Error::DirectoryError(_))
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn directory_failure_while_recording_leaves_group_untouched() {
        // Resolves the two members at creation, then goes away.
        let calls = AtomicUsize::new(0);
        let mut flaky = MockDirectory::new();
        flaky.expect_display_name().returning(move |_| {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Ok(None)
            } else {
                Err(Error::DirectoryError("timeout".to_string()))
            }
        });
        let store = Arc::new(InMemoryDocumentStore::new());
        let service = GroupService::new(store.clone(), Arc::new(flaky), &AppConfig::default());
        let group_id = service.create_group(vec![p("a"), p("b")]).await.unwrap();

        let result = service
            .record_expense(&group_id, &p("a"), vec![(p("b"), Amount::from_i64(10))])
            .await;

        assert!(matches!(result, Err(Error::DirectoryError(_))));
        let state = service.group(&group_id).await.unwrap();
        assert!(state.item_history.is_empty());
        assert!(state.net_balance.balance(&p("a")).is_zero());
        assert!(store.keys_with_prefix("items/").is_empty());
    }

    #[tokio::test]
    async fn stale_item_without_group_entry_can_still_be_retracted() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let service = GroupService::new(store.clone(), Arc::new(directory()), &AppConfig::default());
        let group_id = service.create_group(vec![p("a"), p("b")]).await.unwrap();

        // Item written, group update never committed.
        let record = ExpenseRecord {
            event: ExpenseEvent::from_splits(group_id, p("a"), [(p("b"), Amount::from_i64(4))]),
            payer_name: "Asha".to_string(),
        };
        let expense_id = record.event.expense_id;
        store
            .create(&item_key(&expense_id), serde_json::to_value(&record).unwrap())
            .await
            .unwrap();

        service.retract_expense(&expense_id).await.unwrap();

        assert!(store.keys_with_prefix("items/").is_empty());
        assert!(service.group(&group_id).await.unwrap().net_balance.balance(&p("a")).is_zero());
    }

    #[tokio::test]
    async fn expense_detail_uses_names_and_symbol() {
        let mut config = AppConfig::default();
        config.report.currency_symbol = "₹".to_string();
        let service = service(&config);
        let group_id = service.create_group(vec![p("a"), p("b"), p("c")]).await.unwrap();

        service
            .record_expense(&group_id, &p("a"), vec![(p("b"), Amount::from_i64(15)), (p("c"), Amount::from_i64(15))])
            .await
            .unwrap();

        assert_eq!(
            service.expense_detail(&group_id).await.unwrap(),
            vec!["Asha gets back from Bilal: ₹15".to_string(), "Asha gets back from Unknown: ₹15".to_string()]
        );
        assert_eq!(
            service.personal_detail(&group_id, &p("b")).await.unwrap(),
            vec!["Asha gets back from Bilal: ₹15".to_string()]
        );
    }

    #[tokio::test]
    async fn invalid_expense_stores_nothing() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let service = GroupService::new(store.clone(), Arc::new(directory()), &AppConfig::default());
        let group_id = service.create_group(vec![p("a"), p("b")]).await.unwrap();

        let result = service
            .record_expense(&group_id, &p("a"), vec![(p("stranger"), Amount::from_i64(5))])
            .await;

        assert!(matches!(result, Err(Error::InvalidEvent(_))));
        assert!(store.keys_with_prefix("items/").is_empty());
        assert!(service.group(&group_id).await.unwrap().item_history.is_empty());
    }
}
