use crate::application::ports::{MarketResolver, RequestContext};

/// Single-market resolver: one buy/sell currency pair regardless of the
/// request's market tag.
pub struct FixedPair {
    buy: String,
    sell: String,
}

impl FixedPair {
    pub fn new(buy: impl Into<String>, sell: impl Into<String>) -> Self {
        FixedPair {
            buy: buy.into(),
            sell: sell.into(),
        }
    }
}

impl MarketResolver for FixedPair {
    fn buy_currency(&self, _ctx: &RequestContext) -> String {
        self.buy.clone()
    }

    fn sell_currency(&self, _ctx: &RequestContext) -> String {
        self.sell.clone()
    }
}
