use crate::domain::{Order, OrderId, OrderStatus, Side};
use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

/// Storage failures surfaced by an [`OrderRepository`].
///
/// `NotFound` is a distinguishable signal: the matching core treats it as
/// "no counter order available" from the best-limit queries, and surfaces it
/// from cancel. Everything else is an opaque backend failure passed through
/// unchanged.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("order not found")]
    NotFound,
    #[error("order store backend failure")]
    Backend(#[from] anyhow::Error),
}

/// Port over order storage, the price-time index, the fee table, and the
/// trade history ledger.
///
/// The repository owns the clock and the id generator: `create_order` assigns
/// `id` and `created_at`, the stamp operations write "now". Each operation is
/// atomic on its own; the matching core serializes the sequence.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist a new order, assigning its id and creation stamp.
    async fn create_order(&self, order: Order) -> Result<OrderId, RepositoryError>;

    async fn get_order(&self, id: &str) -> Result<Order, RepositoryError>;

    async fn set_status(&self, id: &str, status: OrderStatus) -> Result<(), RepositoryError>;

    /// Write status and remaining in one step and bump `matched_at` to now.
    async fn set_status_remaining_and_stamp_matched(
        &self,
        id: &str,
        status: OrderStatus,
        remaining: Decimal,
    ) -> Result<(), RepositoryError>;

    /// Set `finished_at` to now. Called once when an order leaves Active.
    async fn stamp_finished(&self, id: &str) -> Result<(), RepositoryError>;

    /// Fee owed on a fill of `amount`, denominated in the currency the user
    /// receives. Pure function of policy.
    async fn get_fee(
        &self,
        user_id: &str,
        side: Side,
        rate: Decimal,
        amount: Decimal,
    ) -> Result<Decimal, RepositoryError>;

    /// Highest-rate active limit Buy; ties broken by earliest arrival.
    /// `NotFound` when no such order exists.
    async fn best_buy_limit(&self) -> Result<Order, RepositoryError>;

    /// Lowest-rate active limit Sell; ties broken by earliest arrival.
    async fn best_sell_limit(&self) -> Result<Order, RepositoryError>;

    /// Record an executed fill. Entries are immutable once inserted; the
    /// repository stamps the execution time.
    #[allow(clippy::too_many_arguments)]
    async fn insert_history(
        &self,
        taker: &Order,
        maker: &Order,
        taker_side: Side,
        rate: Decimal,
        amount: Decimal,
        taker_fee: Decimal,
        maker_fee: Decimal,
    ) -> Result<(), RepositoryError>;
}
