use crate::application::ports::LedgerStore;
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("balance is not enough")]
    InsufficientBalance,
    #[error("invalid transfer value")]
    InvalidValue,
    #[error("ledger store backend failure")]
    Backend(#[from] anyhow::Error),
}

/// Per-user per-currency balance service.
///
/// Every non-zero successful [`add`] applies the delta and appends exactly
/// one journal entry. A debit that would take the balance below zero is
/// rejected with [`LedgerError::InsufficientBalance`] before anything is
/// written.
///
/// [`add`]: Ledger::add
pub struct Ledger<S: LedgerStore> {
    store: Arc<S>,
}

impl<S: LedgerStore> Clone for Ledger<S> {
    fn clone(&self) -> Self {
        Ledger {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> Ledger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Ledger { store }
    }

    pub async fn balance(&self, user_id: &str, currency: &str) -> Result<Decimal, LedgerError> {
        Ok(self.store.balance(user_id, currency).await?)
    }

    /// Adjust a balance by `delta`.
    ///
    /// `delta == 0` short-circuits to success without touching the store.
    pub async fn add(
        &self,
        user_id: &str,
        currency: &str,
        delta: Decimal,
    ) -> Result<(), LedgerError> {
        if delta.is_zero() {
            return Ok(());
        }

        if delta < Decimal::ZERO {
            let balance = self.store.balance(user_id, currency).await?;
            if balance + delta < Decimal::ZERO {
                return Err(LedgerError::InsufficientBalance);
            }
        }

        self.store.add_balance(user_id, currency, delta).await?;
        self.store.insert_entry(user_id, currency, delta).await?;

        tracing::debug!(user = user_id, currency, %delta, "ledger adjusted");
        Ok(())
    }

    /// Move `amount` from `src_user_id` to `dst_user_id`.
    ///
    /// Debit then credit, sequentially. The ledger does not roll the debit
    /// back if the credit fails; callers needing atomicity wrap the pair in
    /// a backend transaction.
    pub async fn transfer(
        &self,
        src_user_id: &str,
        dst_user_id: &str,
        currency: &str,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Ok(());
        }
        if amount < Decimal::ZERO {
            return Err(LedgerError::InvalidValue);
        }

        self.add(src_user_id, currency, -amount).await?;
        self.add(dst_user_id, currency, amount).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemoryLedgerStore;
    use rust_decimal_macros::dec;

    fn ledger() -> (Ledger<InMemoryLedgerStore>, Arc<InMemoryLedgerStore>) {
        let store = Arc::new(InMemoryLedgerStore::new());
        (Ledger::new(Arc::clone(&store)), store)
    }

    #[tokio::test]
    async fn zero_delta_short_circuits() {
        let (ledger, store) = ledger();
        ledger.add("u1", "A", Decimal::ZERO).await.unwrap();
        assert!(store.journal().is_empty());
    }

    #[tokio::test]
    async fn add_journals_once_per_call() {
        let (ledger, store) = ledger();
        ledger.add("u1", "A", dec!(100)).await.unwrap();
        ledger.add("u1", "A", dec!(-30)).await.unwrap();

        assert_eq!(ledger.balance("u1", "A").await.unwrap(), dec!(70));
        let journal = store.journal();
        assert_eq!(journal.len(), 2);
        assert_eq!(journal[1].user_id, "u1");
        assert_eq!(journal[1].currency, "A");
        assert_eq!(journal[1].delta, dec!(-30));
    }

    #[tokio::test]
    async fn debit_below_zero_is_rejected() {
        let (ledger, _) = ledger();
        ledger.add("u1", "A", dec!(10)).await.unwrap();

        let err = ledger.add("u1", "A", dec!(-10.01)).await.unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance));

        // draining to exactly zero is fine
        ledger.add("u1", "A", dec!(-10)).await.unwrap();
        assert_eq!(ledger.balance("u1", "A").await.unwrap(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn unknown_pair_is_zero() {
        let (ledger, _) = ledger();
        assert_eq!(ledger.balance("ghost", "A").await.unwrap(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn transfer_moves_funds() {
        let (ledger, _) = ledger();
        ledger.add("u1", "A", dec!(100)).await.unwrap();

        ledger.transfer("u1", "u2", "A", dec!(40)).await.unwrap();
        assert_eq!(ledger.balance("u1", "A").await.unwrap(), dec!(60));
        assert_eq!(ledger.balance("u2", "A").await.unwrap(), dec!(40));
    }

    #[tokio::test]
    async fn transfer_rejects_negative_and_skips_zero() {
        let (ledger, store) = ledger();
        ledger.add("u1", "A", dec!(100)).await.unwrap();

        let err = ledger.transfer("u1", "u2", "A", dec!(-1)).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidValue));

        let entries_before = store.journal().len();
        ledger.transfer("u1", "u2", "A", Decimal::ZERO).await.unwrap();
        assert_eq!(store.journal().len(), entries_before);
    }
}
