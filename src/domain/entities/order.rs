use crate::domain::value_objects::{OrderId, OrderKind, OrderStatus, Side, Timestamp};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An order in the book.
///
/// `value` and `remaining` are denominated in sell-currency units; `rate` is
/// the price of one unit of sell currency in buy currency (zero for market
/// orders). The repository owns the persisted copy and all timestamps; the
/// matching core works on transient clones and writes them back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: String,
    pub kind: OrderKind,
    pub side: Side,
    pub rate: Decimal,
    pub value: Decimal,
    pub remaining: Decimal,
    pub status: OrderStatus,
    pub created_at: Timestamp,
    pub matched_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
}

impl Order {
    /// New limit order working copy. The repository assigns `id` and
    /// `created_at` when the order is persisted.
    pub fn new_limit(user_id: impl Into<String>, side: Side, rate: Decimal, value: Decimal) -> Self {
        Order {
            id: OrderId::new(),
            user_id: user_id.into(),
            kind: OrderKind::Limit,
            side,
            rate,
            value,
            remaining: value,
            status: OrderStatus::Active,
            created_at: Utc::now(),
            matched_at: None,
            finished_at: None,
        }
    }

    /// New market order working copy. Market orders carry a zero rate and
    /// take no escrow; they settle fill by fill.
    pub fn new_market(user_id: impl Into<String>, side: Side, value: Decimal) -> Self {
        Order {
            id: OrderId::new(),
            user_id: user_id.into(),
            kind: OrderKind::Market,
            side,
            rate: Decimal::ZERO,
            value,
            remaining: value,
            status: OrderStatus::Active,
            created_at: Utc::now(),
            matched_at: None,
            finished_at: None,
        }
    }

    pub fn is_limit(&self) -> bool {
        self.kind == OrderKind::Limit
    }

    pub fn is_market(&self) -> bool {
        self.kind == OrderKind::Market
    }

    /// True while the order can still take fills.
    pub fn is_fillable(&self) -> bool {
        self.status.is_active() && self.remaining > Decimal::ZERO
    }

    /// Apply a fill of `amount` sell-currency units. Flips the order to
    /// `Matched` when nothing remains.
    pub fn fill(&mut self, amount: Decimal) {
        self.remaining -= amount;
        if self.remaining <= Decimal::ZERO {
            self.status = OrderStatus::Matched;
        }
    }

    /// Funds held from the owner while the unfilled part of a limit order
    /// rests: `remaining * rate` buy currency for a Buy, `remaining` sell
    /// currency for a Sell. Market orders escrow nothing.
    pub fn residual_escrow(&self) -> Decimal {
        if self.is_market() {
            return Decimal::ZERO;
        }
        match self.side {
            Side::Buy => self.remaining * self.rate,
            Side::Sell => self.remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn partial_fill_stays_active() {
        let mut order = Order::new_limit("u1", Side::Buy, dec!(2), dec!(50));
        order.fill(dec!(20));
        assert_eq!(order.remaining, dec!(30));
        assert_eq!(order.status, OrderStatus::Active);
        assert!(order.is_fillable());
    }

    #[test]
    fn full_fill_matches() {
        let mut order = Order::new_limit("u1", Side::Sell, dec!(2), dec!(50));
        order.fill(dec!(50));
        assert_eq!(order.remaining, Decimal::ZERO);
        assert_eq!(order.status, OrderStatus::Matched);
        assert!(!order.is_fillable());
    }

    #[test]
    fn residual_escrow_by_side() {
        let mut buy = Order::new_limit("u1", Side::Buy, dec!(2), dec!(50));
        buy.fill(dec!(10));
        assert_eq!(buy.residual_escrow(), dec!(80));

        let sell = Order::new_limit("u2", Side::Sell, dec!(2), dec!(50));
        assert_eq!(sell.residual_escrow(), dec!(50));

        let market = Order::new_market("u1", Side::Sell, dec!(50));
        assert_eq!(market.residual_escrow(), Decimal::ZERO);
    }
}
