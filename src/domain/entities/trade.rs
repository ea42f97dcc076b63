use crate::domain::entities::Order;
use crate::domain::value_objects::{Side, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An executed fill. Immutable once recorded.
///
/// Carries full snapshots of both orders as they stood right after the fill,
/// so downstream consumers never have to re-read mutable book state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    /// The aggressor order that drove the match.
    pub taker: Order,
    /// The resting order that provided the liquidity.
    pub maker: Order,
    /// Side of the aggressor.
    pub taker_side: Side,
    /// Executed at the resting order's rate.
    pub rate: Decimal,
    /// Executed size in sell-currency units.
    pub amount: Decimal,
    /// Fee charged to the taker, in the currency the taker receives.
    pub taker_fee: Decimal,
    /// Fee charged to the maker, in the currency the maker receives.
    pub maker_fee: Decimal,
    pub executed_at: Timestamp,
}

impl Trade {
    /// Value of the fill in buy currency.
    pub fn notional(&self) -> Decimal {
        self.amount * self.rate
    }
}
