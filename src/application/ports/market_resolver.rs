/// Per-request routing information.
///
/// Carries an opaque market tag so one engine deployment can multiplex
/// several currency pairs; single-market setups pass the default.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub market: String,
}

impl RequestContext {
    pub fn for_market(market: impl Into<String>) -> Self {
        RequestContext {
            market: market.into(),
        }
    }
}

/// Resolves the currency pair for a request.
///
/// Buy orders pay the buy currency and receive the sell currency; Sell
/// orders the reverse. Resolution happens on every request so the codes may
/// depend on the context tag.
pub trait MarketResolver: Send + Sync {
    fn buy_currency(&self, ctx: &RequestContext) -> String;
    fn sell_currency(&self, ctx: &RequestContext) -> String;
}
