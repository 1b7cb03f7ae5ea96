use std::collections::HashMap;
use std::sync::Mutex;

use futures::TryStreamExt;
use mongodb::{bson::doc, Client, Collection};

use crate::error::LedgerError;
use crate::schemas::{Expense, Group, Settlement};

/// Persistence collaborator for the ledger engine.
///
/// Implementations own atomicity: `insert_expense_with_shares` must write
/// the expense and its shares as one unit, and readers must never observe
/// an expense without its shares. The engine itself keeps no state between
/// calls.
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    async fn insert_group(&self, group: &Group) -> Result<(), LedgerError>;
    async fn find_group(&self, group_id: &str) -> Result<Option<Group>, LedgerError>;
    async fn insert_expense_with_shares(&self, expense: &Expense) -> Result<(), LedgerError>;
    async fn insert_settlement(&self, settlement: &Settlement) -> Result<(), LedgerError>;
    async fn list_expenses(&self, group_id: &str) -> Result<Vec<Expense>, LedgerError>;
    async fn list_settlements(&self, group_id: &str) -> Result<Vec<Settlement>, LedgerError>;
}

const DATABASE: &str = "CampusSplit";

/// MongoDB-backed store. Shares are embedded in the expense document, so a
/// single `insert_one` gives the atomic expense+shares write the engine
/// relies on.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
}

impl MongoStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn groups(&self) -> Collection<Group> {
        self.client.database(DATABASE).collection("Groups")
    }

    fn expenses(&self) -> Collection<Expense> {
        self.client.database(DATABASE).collection("Expenses")
    }

    fn settlements(&self) -> Collection<Settlement> {
        self.client.database(DATABASE).collection("Settlements")
    }
}

#[async_trait::async_trait]
impl LedgerStore for MongoStore {
    async fn insert_group(&self, group: &Group) -> Result<(), LedgerError> {
        self.groups().insert_one(group, None).await?;
        Ok(())
    }

    async fn find_group(&self, group_id: &str) -> Result<Option<Group>, LedgerError> {
        Ok(self.groups().find_one(doc! { "id": group_id }, None).await?)
    }

    async fn insert_expense_with_shares(&self, expense: &Expense) -> Result<(), LedgerError> {
        self.expenses().insert_one(expense, None).await?;
        Ok(())
    }

    async fn insert_settlement(&self, settlement: &Settlement) -> Result<(), LedgerError> {
        self.settlements().insert_one(settlement, None).await?;
        Ok(())
    }

    async fn list_expenses(&self, group_id: &str) -> Result<Vec<Expense>, LedgerError> {
        let cursor = self
            .expenses()
            .find(doc! { "group_id": group_id }, None)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn list_settlements(&self, group_id: &str) -> Result<Vec<Settlement>, LedgerError> {
        let cursor = self
            .settlements()
            .find(doc! { "group_id": group_id }, None)
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

#[derive(Default)]
struct MemoryInner {
    groups: HashMap<String, Group>,
    expenses: Vec<Expense>,
    settlements: Vec<Settlement>,
}

/// In-memory store used by tests and embedded callers. The mutex is only
/// held across synchronous sections, never across an await.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked<T>(
        &self,
        f: impl FnOnce(&mut MemoryInner) -> T,
    ) -> Result<T, LedgerError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| LedgerError::Storage("memory store poisoned".into()))?;
        Ok(f(&mut inner))
    }
}

#[async_trait::async_trait]
impl LedgerStore for MemoryStore {
    async fn insert_group(&self, group: &Group) -> Result<(), LedgerError> {
        self.locked(|inner| {
            inner.groups.insert(group.id.clone(), group.clone());
        })
    }

    async fn find_group(&self, group_id: &str) -> Result<Option<Group>, LedgerError> {
        self.locked(|inner| inner.groups.get(group_id).cloned())
    }

    async fn insert_expense_with_shares(&self, expense: &Expense) -> Result<(), LedgerError> {
        self.locked(|inner| inner.expenses.push(expense.clone()))
    }

    async fn insert_settlement(&self, settlement: &Settlement) -> Result<(), LedgerError> {
        self.locked(|inner| inner.settlements.push(settlement.clone()))
    }

    async fn list_expenses(&self, group_id: &str) -> Result<Vec<Expense>, LedgerError> {
        self.locked(|inner| {
            inner
                .expenses
                .iter()
                .filter(|e| e.group_id == group_id)
                .cloned()
                .collect()
        })
    }

    async fn list_settlements(&self, group_id: &str) -> Result<Vec<Settlement>, LedgerError> {
        self.locked(|inner| {
            inner
                .settlements
                .iter()
                .filter(|s| s.group_id == group_id)
                .cloned()
                .collect()
        })
    }
}
