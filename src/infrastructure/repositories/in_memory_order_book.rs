use crate::application::ports::{OrderRepository, RepositoryError};
use crate::domain::{Order, OrderId, OrderKind, OrderStatus, Side, Trade};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

struct StoredOrder {
    /// Arrival sequence; tie-breaks equal rates deterministically even when
    /// two creations land on the same timestamp.
    seq: u64,
    order: Order,
}

/// In-memory order repository with a flat fee policy.
///
/// Thread-safe via DashMap; the clock and id generator live here, so
/// `create_order` and the stamp operations are the only places time is read.
/// Suitable for tests and single-process deployments.
pub struct InMemoryOrderBook {
    orders: Arc<DashMap<OrderId, StoredOrder>>,
    trades: Arc<RwLock<Vec<Trade>>>,
    next_seq: Arc<AtomicU64>,
    fee_rate: Decimal,
}

impl InMemoryOrderBook {
    pub fn new() -> Self {
        InMemoryOrderBook {
            orders: Arc::new(DashMap::new()),
            trades: Arc::new(RwLock::new(Vec::new())),
            next_seq: Arc::new(AtomicU64::new(0)),
            // 25 bps of the received amount
            fee_rate: Decimal::new(25, 4),
        }
    }

    pub fn with_fee_rate(mut self, fee_rate: Decimal) -> Self {
        self.fee_rate = fee_rate;
        self
    }

    /// Recorded fills, in execution order.
    pub fn trades(&self) -> Vec<Trade> {
        self.trades.read().clone()
    }

    fn best(&self, side: Side) -> Result<Order, RepositoryError> {
        let mut best: Option<(u64, Order)> = None;
        for entry in self.orders.iter() {
            let stored = entry.value();
            let order = &stored.order;
            if order.side != side
                || order.status != OrderStatus::Active
                || order.kind != OrderKind::Limit
            {
                continue;
            }
            let better = match &best {
                None => true,
                Some((best_seq, best_order)) => {
                    if order.rate == best_order.rate {
                        stored.seq < *best_seq
                    } else {
                        match side {
                            Side::Buy => order.rate > best_order.rate,
                            Side::Sell => order.rate < best_order.rate,
                        }
                    }
                }
            };
            if better {
                best = Some((stored.seq, order.clone()));
            }
        }
        best.map(|(_, order)| order).ok_or(RepositoryError::NotFound)
    }
}

impl Default for InMemoryOrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for InMemoryOrderBook {
    fn clone(&self) -> Self {
        InMemoryOrderBook {
            orders: Arc::clone(&self.orders),
            trades: Arc::clone(&self.trades),
            next_seq: Arc::clone(&self.next_seq),
            fee_rate: self.fee_rate,
        }
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderBook {
    async fn create_order(&self, mut order: Order) -> Result<OrderId, RepositoryError> {
        let id = Uuid::new_v4().to_string();
        order.id = id.clone();
        order.created_at = Utc::now();

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.orders.insert(id.clone(), StoredOrder { seq, order });
        Ok(id)
    }

    async fn get_order(&self, id: &str) -> Result<Order, RepositoryError> {
        self.orders
            .get(id)
            .map(|stored| stored.order.clone())
            .ok_or(RepositoryError::NotFound)
    }

    async fn set_status(&self, id: &str, status: OrderStatus) -> Result<(), RepositoryError> {
        let mut stored = self.orders.get_mut(id).ok_or(RepositoryError::NotFound)?;
        stored.order.status = status;
        Ok(())
    }

    async fn set_status_remaining_and_stamp_matched(
        &self,
        id: &str,
        status: OrderStatus,
        remaining: Decimal,
    ) -> Result<(), RepositoryError> {
        let mut stored = self.orders.get_mut(id).ok_or(RepositoryError::NotFound)?;
        stored.order.status = status;
        stored.order.remaining = remaining;
        stored.order.matched_at = Some(Utc::now());
        Ok(())
    }

    async fn stamp_finished(&self, id: &str) -> Result<(), RepositoryError> {
        let mut stored = self.orders.get_mut(id).ok_or(RepositoryError::NotFound)?;
        stored.order.finished_at = Some(Utc::now());
        Ok(())
    }

    async fn get_fee(
        &self,
        _user_id: &str,
        _side: Side,
        _rate: Decimal,
        amount: Decimal,
    ) -> Result<Decimal, RepositoryError> {
        Ok(amount * self.fee_rate)
    }

    async fn best_buy_limit(&self) -> Result<Order, RepositoryError> {
        self.best(Side::Buy)
    }

    async fn best_sell_limit(&self) -> Result<Order, RepositoryError> {
        self.best(Side::Sell)
    }

    async fn insert_history(
        &self,
        taker: &Order,
        maker: &Order,
        taker_side: Side,
        rate: Decimal,
        amount: Decimal,
        taker_fee: Decimal,
        maker_fee: Decimal,
    ) -> Result<(), RepositoryError> {
        self.trades.write().push(Trade {
            taker: taker.clone(),
            maker: maker.clone(),
            taker_side,
            rate,
            amount,
            taker_fee,
            maker_fee,
            executed_at: Utc::now(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn create_assigns_id_and_stamp() {
        let repo = InMemoryOrderBook::new();
        let id = repo
            .create_order(Order::new_limit("u1", Side::Buy, dec!(2), dec!(50)))
            .await
            .unwrap();
        assert!(!id.is_empty());

        let order = repo.get_order(&id).await.unwrap();
        assert_eq!(order.id, id);
        assert_eq!(order.status, OrderStatus::Active);
        assert!(order.matched_at.is_none());
        assert!(order.finished_at.is_none());
    }

    #[tokio::test]
    async fn best_buy_prefers_highest_rate() {
        let repo = InMemoryOrderBook::new();
        repo.create_order(Order::new_limit("u1", Side::Buy, dec!(2), dec!(10)))
            .await
            .unwrap();
        let high = repo
            .create_order(Order::new_limit("u2", Side::Buy, dec!(3), dec!(10)))
            .await
            .unwrap();

        assert_eq!(repo.best_buy_limit().await.unwrap().id, high);
    }

    #[tokio::test]
    async fn best_sell_prefers_lowest_rate() {
        let repo = InMemoryOrderBook::new();
        let low = repo
            .create_order(Order::new_limit("u1", Side::Sell, dec!(2), dec!(10)))
            .await
            .unwrap();
        repo.create_order(Order::new_limit("u2", Side::Sell, dec!(3), dec!(10)))
            .await
            .unwrap();

        assert_eq!(repo.best_sell_limit().await.unwrap().id, low);
    }

    #[tokio::test]
    async fn equal_rates_break_ties_by_arrival() {
        let repo = InMemoryOrderBook::new();
        let first = repo
            .create_order(Order::new_limit("u1", Side::Sell, dec!(2), dec!(10)))
            .await
            .unwrap();
        repo.create_order(Order::new_limit("u2", Side::Sell, dec!(2), dec!(10)))
            .await
            .unwrap();

        assert_eq!(repo.best_sell_limit().await.unwrap().id, first);
    }

    #[tokio::test]
    async fn terminal_and_market_orders_never_rest() {
        let repo = InMemoryOrderBook::new();
        assert!(matches!(
            repo.best_buy_limit().await,
            Err(RepositoryError::NotFound)
        ));

        let matched = repo
            .create_order(Order::new_limit("u1", Side::Buy, dec!(2), dec!(10)))
            .await
            .unwrap();
        repo.set_status(&matched, OrderStatus::Matched).await.unwrap();

        repo.create_order(Order::new_market("u2", Side::Buy, dec!(10)))
            .await
            .unwrap();

        assert!(matches!(
            repo.best_buy_limit().await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn flat_fee_is_proportional() {
        let repo = InMemoryOrderBook::new();
        let fee = repo
            .get_fee("u1", Side::Buy, dec!(2), dec!(60))
            .await
            .unwrap();
        assert_eq!(fee, dec!(0.15));
    }
}
