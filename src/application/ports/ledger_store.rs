use async_trait::async_trait;
use rust_decimal::Decimal;

/// Port over balance storage and the journal backing the [`Ledger`] service.
///
/// Implementations hold one balance per (user, currency) and an append-only
/// journal. Overdraft policy lives in the service, not here: `add_balance`
/// applies whatever delta it is given.
///
/// [`Ledger`]: crate::application::Ledger
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Current balance; zero for a pair with no history.
    async fn balance(&self, user_id: &str, currency: &str) -> anyhow::Result<Decimal>;

    async fn add_balance(&self, user_id: &str, currency: &str, delta: Decimal)
        -> anyhow::Result<()>;

    /// Append a journal entry for an applied delta.
    async fn insert_entry(&self, user_id: &str, currency: &str, delta: Decimal)
        -> anyhow::Result<()>;
}
