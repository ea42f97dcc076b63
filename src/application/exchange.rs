use crate::application::ledger::{Ledger, LedgerError};
use crate::application::ports::{
    LedgerStore, MarketResolver, OrderRepository, RepositoryError, RequestContext,
};
use crate::domain::{Order, OrderId, OrderKind, OrderStatus, Side};
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("invalid order value")]
    InvalidValue,
    #[error("invalid order rate")]
    InvalidRate,
    #[error("invalid order side")]
    InvalidSide,
    #[error("invalid order kind")]
    InvalidKind,
    #[error("fee policy returned a fee outside [0, amount]")]
    InvalidFee,
    #[error("order not found")]
    OrderNotFound,
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("order store backend failure")]
    Repository(#[source] anyhow::Error),
}

impl From<RepositoryError> for ExchangeError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ExchangeError::OrderNotFound,
            RepositoryError::Backend(e) => ExchangeError::Repository(e),
        }
    }
}

/// Decode a wire-format side, for transport adapters feeding the engine.
pub fn parse_side(value: &str) -> Result<Side, ExchangeError> {
    Side::try_from(value).map_err(|_| ExchangeError::InvalidSide)
}

/// Decode a wire-format order kind.
pub fn parse_kind(value: &str) -> Result<OrderKind, ExchangeError> {
    OrderKind::try_from(value).map_err(|_| ExchangeError::InvalidKind)
}

/// The matching core.
///
/// Validates incoming orders, escrows funds through the [`Ledger`], drives
/// the aggressor against the best resting limit order until it stops
/// crossing, settles each fill, and handles cancellation.
///
/// One instance serves one market: an internal write lock serializes
/// placements and cancels so each best-limit read and the writes that follow
/// it form a single linearizable sequence. Errors from the repository or the
/// ledger abort the operation in place; committed sub-steps are not rolled
/// back here, transactional scope belongs to the backing stores.
pub struct Exchange<R, S, M>
where
    R: OrderRepository,
    S: LedgerStore,
    M: MarketResolver,
{
    repo: Arc<R>,
    ledger: Ledger<S>,
    market: Arc<M>,
    write_lock: Mutex<()>,
}

impl<R, S, M> Exchange<R, S, M>
where
    R: OrderRepository,
    S: LedgerStore,
    M: MarketResolver,
{
    pub fn new(repo: Arc<R>, ledger: Ledger<S>, market: Arc<M>) -> Self {
        Exchange {
            repo,
            ledger,
            market,
            write_lock: Mutex::new(()),
        }
    }

    /// Place a limit order.
    ///
    /// Escrows the full notional up front: `value * rate` buy currency for a
    /// Buy, `value` sell currency for a Sell. A failed escrow leaves nothing
    /// behind, not even the order. Returns the order id even when the order
    /// matched completely during placement.
    pub async fn place_limit_order(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        side: Side,
        rate: Decimal,
        value: Decimal,
    ) -> Result<OrderId, ExchangeError> {
        if value <= Decimal::ZERO {
            return Err(ExchangeError::InvalidValue);
        }
        if rate <= Decimal::ZERO {
            return Err(ExchangeError::InvalidRate);
        }

        let _guard = self.write_lock.lock().await;

        match side {
            Side::Buy => {
                let currency = self.market.buy_currency(ctx);
                self.ledger.add(user_id, &currency, -(value * rate)).await?;
            }
            Side::Sell => {
                let currency = self.market.sell_currency(ctx);
                self.ledger.add(user_id, &currency, -value).await?;
            }
        }

        let order_id = self
            .repo
            .create_order(Order::new_limit(user_id, side, rate, value))
            .await?;

        tracing::info!(order = %order_id, user = user_id, %side, %rate, %value, "limit order placed");

        self.match_order(ctx, &order_id).await?;

        Ok(order_id)
    }

    /// Place a market order.
    ///
    /// Market orders take no escrow; each fill is paid for as it executes.
    /// Whatever cannot be filled against the book is cancelled before this
    /// returns, so a market order never rests.
    pub async fn place_market_order(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        side: Side,
        value: Decimal,
    ) -> Result<OrderId, ExchangeError> {
        if value <= Decimal::ZERO {
            return Err(ExchangeError::InvalidValue);
        }

        let _guard = self.write_lock.lock().await;

        let order_id = self
            .repo
            .create_order(Order::new_market(user_id, side, value))
            .await?;

        tracing::info!(order = %order_id, user = user_id, %side, %value, "market order placed");

        self.match_order(ctx, &order_id).await?;
        self.cancel_resting(ctx, &order_id).await?;

        Ok(order_id)
    }

    /// Cancel an order.
    ///
    /// Idempotent on orders that already left Active: cancelling a Matched
    /// or Cancelled order succeeds with no effect. Residual escrow of a
    /// limit order is returned to its owner.
    pub async fn cancel_order(
        &self,
        ctx: &RequestContext,
        order_id: &str,
    ) -> Result<(), ExchangeError> {
        let _guard = self.write_lock.lock().await;
        self.cancel_resting(ctx, order_id).await
    }

    async fn cancel_resting(
        &self,
        ctx: &RequestContext,
        order_id: &str,
    ) -> Result<(), ExchangeError> {
        let order = self.repo.get_order(order_id).await?;

        if !order.status.is_active() {
            return Ok(());
        }

        self.repo.set_status(&order.id, OrderStatus::Cancelled).await?;
        self.repo.stamp_finished(&order.id).await?;

        // Market orders never escrowed anything, so there is nothing to
        // return; residual_escrow is zero for them.
        let refund = order.residual_escrow();
        if refund > Decimal::ZERO {
            let currency = match order.side {
                Side::Buy => self.market.buy_currency(ctx),
                Side::Sell => self.market.sell_currency(ctx),
            };
            self.ledger.add(&order.user_id, &currency, refund).await?;
        }

        tracing::info!(order = %order.id, user = %order.user_id, remaining = %order.remaining, "order cancelled");
        Ok(())
    }

    /// Load a freshly persisted order, drive it through the match loop, and
    /// write the final state back.
    async fn match_order(&self, ctx: &RequestContext, order_id: &str) -> Result<(), ExchangeError> {
        let mut order = self.repo.get_order(order_id).await?;

        if !order.is_fillable() {
            return Ok(());
        }

        self.run_matching(ctx, &mut order).await?;

        self.repo
            .set_status_remaining_and_stamp_matched(&order.id, order.status, order.remaining)
            .await?;
        if order.status == OrderStatus::Matched {
            self.repo.stamp_finished(&order.id).await?;
        }

        Ok(())
    }

    /// Repeatedly match the aggressor against the best resting counter limit
    /// order. An explicit loop rather than recursion: a large aggressor can
    /// cascade through many resting orders.
    async fn run_matching(
        &self,
        ctx: &RequestContext,
        order: &mut Order,
    ) -> Result<(), ExchangeError> {
        while order.is_fillable() {
            let counter = match order.side {
                Side::Buy => self.repo.best_sell_limit().await,
                Side::Sell => self.repo.best_buy_limit().await,
            };
            let mut counter = match counter {
                Ok(counter) => counter,
                Err(RepositoryError::NotFound) => break,
                Err(err) => return Err(err.into()),
            };

            // Market orders accept any counter; limit orders stop once the
            // book no longer crosses their rate.
            if order.is_limit() && !Self::crosses(order, &counter) {
                break;
            }

            self.execute_fill(ctx, order, &mut counter).await?;
        }
        Ok(())
    }

    fn crosses(order: &Order, counter: &Order) -> bool {
        match order.side {
            Side::Buy => counter.rate <= order.rate,
            Side::Sell => counter.rate >= order.rate,
        }
    }

    /// Execute one fill between the aggressor and the best counter order,
    /// always at the resting order's rate.
    async fn execute_fill(
        &self,
        ctx: &RequestContext,
        order: &mut Order,
        counter: &mut Order,
    ) -> Result<(), ExchangeError> {
        let rate = counter.rate;
        let amount = order.remaining.min(counter.remaining);

        order.fill(amount);
        counter.fill(amount);

        if counter.status == OrderStatus::Matched {
            self.repo.stamp_finished(&counter.id).await?;
        }
        self.repo
            .set_status_remaining_and_stamp_matched(&counter.id, counter.status, counter.remaining)
            .await?;

        let taker_fee = self.checked_fee(order, amount).await?;
        let maker_fee = self.checked_fee(counter, amount).await?;

        self.repo
            .insert_history(order, counter, order.side, rate, amount, taker_fee, maker_fee)
            .await?;

        let buy_currency = self.market.buy_currency(ctx);
        let sell_currency = self.market.sell_currency(ctx);

        // An escrow-less market order pays for the fill here. Debit before
        // either credit: if the owner cannot cover it, the fill aborts with
        // nobody paid out.
        if order.is_market() {
            match order.side {
                Side::Buy => {
                    self.ledger
                        .add(&order.user_id, &buy_currency, -(amount * rate))
                        .await?;
                }
                Side::Sell => {
                    self.ledger
                        .add(&order.user_id, &sell_currency, -amount)
                        .await?;
                }
            }
        }

        match order.side {
            Side::Buy => {
                self.ledger
                    .add(&order.user_id, &sell_currency, amount - taker_fee)
                    .await?;
                self.ledger
                    .add(&counter.user_id, &buy_currency, (amount - maker_fee) * rate)
                    .await?;
            }
            Side::Sell => {
                self.ledger
                    .add(&order.user_id, &buy_currency, (amount - taker_fee) * rate)
                    .await?;
                self.ledger
                    .add(&counter.user_id, &sell_currency, amount - maker_fee)
                    .await?;
            }
        }

        // A Buy aggressor escrowed at its own limit rate; executing below it
        // releases the unused part of that escrow.
        if order.is_limit() && order.side == Side::Buy && order.rate > rate {
            let rebate = amount * (order.rate - rate);
            self.ledger.add(&order.user_id, &buy_currency, rebate).await?;
        }

        tracing::debug!(
            taker = %order.id,
            maker = %counter.id,
            %rate,
            %amount,
            %taker_fee,
            %maker_fee,
            "fill executed"
        );

        Ok(())
    }

    async fn checked_fee(&self, order: &Order, amount: Decimal) -> Result<Decimal, ExchangeError> {
        let fee = self
            .repo
            .get_fee(&order.user_id, order.side, order.rate, amount)
            .await?;
        if fee < Decimal::ZERO || fee > amount {
            return Err(ExchangeError::InvalidFee);
        }
        Ok(fee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{FixedPair, InMemoryLedgerStore, InMemoryOrderBook};
    use rust_decimal_macros::dec;

    fn exchange() -> (
        Exchange<InMemoryOrderBook, InMemoryLedgerStore, FixedPair>,
        Ledger<InMemoryLedgerStore>,
        Arc<InMemoryOrderBook>,
    ) {
        let repo = Arc::new(InMemoryOrderBook::new());
        let ledger = Ledger::new(Arc::new(InMemoryLedgerStore::new()));
        let market = Arc::new(FixedPair::new("A", "B"));
        (
            Exchange::new(Arc::clone(&repo), ledger.clone(), market),
            ledger,
            repo,
        )
    }

    #[tokio::test]
    async fn rejects_non_positive_value_and_rate() {
        let (exchange, _, repo) = exchange();
        let ctx = RequestContext::default();

        let err = exchange
            .place_limit_order(&ctx, "u1", Side::Buy, dec!(2), Decimal::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidValue));

        let err = exchange
            .place_limit_order(&ctx, "u1", Side::Buy, dec!(-1), dec!(10))
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidRate));

        let err = exchange
            .place_market_order(&ctx, "u1", Side::Sell, dec!(-5))
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidValue));

        assert!(repo.trades().is_empty());
    }

    #[tokio::test]
    async fn failed_escrow_creates_no_order() {
        let (exchange, ledger, repo) = exchange();
        let ctx = RequestContext::default();
        ledger.add("u1", "A", dec!(10)).await.unwrap();

        let err = exchange
            .place_limit_order(&ctx, "u1", Side::Buy, dec!(2), dec!(50))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::Ledger(LedgerError::InsufficientBalance)
        ));

        assert_eq!(ledger.balance("u1", "A").await.unwrap(), dec!(10));
        assert!(repo.best_buy_limit().await.is_err());
    }

    #[tokio::test]
    async fn cancel_unknown_order_is_not_found() {
        let (exchange, _, _) = exchange();
        let ctx = RequestContext::default();

        let err = exchange.cancel_order(&ctx, "missing").await.unwrap_err();
        assert!(matches!(err, ExchangeError::OrderNotFound));
    }

    #[test]
    fn wire_format_parsing() {
        assert_eq!(parse_side("buy").unwrap(), Side::Buy);
        assert_eq!(parse_side("SELL").unwrap(), Side::Sell);
        assert!(matches!(
            parse_side("HOLD").unwrap_err(),
            ExchangeError::InvalidSide
        ));

        assert_eq!(parse_kind("limit").unwrap(), OrderKind::Limit);
        assert_eq!(parse_kind("MARKET").unwrap(), OrderKind::Market);
        assert!(matches!(
            parse_kind("STOP").unwrap_err(),
            ExchangeError::InvalidKind
        ));
    }
}
