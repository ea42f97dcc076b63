use crate::application::ports::LedgerStore;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::Arc;

/// One applied balance delta.
#[derive(Debug, Clone)]
pub struct JournalEntry {
    pub user_id: String,
    pub currency: String,
    pub delta: Decimal,
}

/// In-memory balance store with an append-only journal.
pub struct InMemoryLedgerStore {
    balances: Arc<DashMap<(String, String), Decimal>>,
    journal: Arc<RwLock<Vec<JournalEntry>>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        InMemoryLedgerStore {
            balances: Arc::new(DashMap::new()),
            journal: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Applied deltas, in application order.
    pub fn journal(&self) -> Vec<JournalEntry> {
        self.journal.read().clone()
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for InMemoryLedgerStore {
    fn clone(&self) -> Self {
        InMemoryLedgerStore {
            balances: Arc::clone(&self.balances),
            journal: Arc::clone(&self.journal),
        }
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn balance(&self, user_id: &str, currency: &str) -> anyhow::Result<Decimal> {
        Ok(self
            .balances
            .get(&(user_id.to_string(), currency.to_string()))
            .map(|b| *b)
            .unwrap_or(Decimal::ZERO))
    }

    async fn add_balance(
        &self,
        user_id: &str,
        currency: &str,
        delta: Decimal,
    ) -> anyhow::Result<()> {
        let mut balance = self
            .balances
            .entry((user_id.to_string(), currency.to_string()))
            .or_insert(Decimal::ZERO);
        *balance += delta;
        Ok(())
    }

    async fn insert_entry(
        &self,
        user_id: &str,
        currency: &str,
        delta: Decimal,
    ) -> anyhow::Result<()> {
        self.journal.write().push(JournalEntry {
            user_id: user_id.to_string(),
            currency: currency.to_string(),
            delta,
        });
        Ok(())
    }
}
