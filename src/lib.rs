//! Continuous double-auction matching engine with an escrow-backed ledger.
//!
//! One asset pair, two currency codes: Buy orders pay the buy currency and
//! receive the sell currency, Sell orders the reverse. Limit orders escrow
//! their full notional at placement and rest in the book; market orders
//! settle fill by fill and never rest. Matching is aggressor-driven with
//! price-time priority, always executing at the resting order's rate.
//!
//! # Architecture
//!
//! The crate follows a hexagonal split:
//!
//! - **Domain**: entities and value objects ([`Order`], [`Trade`], [`Side`],
//!   [`OrderStatus`], [`OrderKind`])
//! - **Application**: the [`Exchange`] matching core and the [`Ledger`]
//!   balance service, plus the ports they consume ([`OrderRepository`],
//!   [`LedgerStore`], [`MarketResolver`])
//! - **Infrastructure**: in-memory port implementations for tests and
//!   single-process deployments
//!
//! # Example
//!
//! ```ignore
//! use exchange_core::{
//!     Exchange, FixedPair, InMemoryLedgerStore, InMemoryOrderBook, Ledger,
//!     RequestContext, Side,
//! };
//! use std::sync::Arc;
//!
//! let repo = Arc::new(InMemoryOrderBook::new());
//! let ledger = Ledger::new(Arc::new(InMemoryLedgerStore::new()));
//! let exchange = Exchange::new(repo, ledger.clone(), Arc::new(FixedPair::new("USD", "BTC")));
//!
//! let ctx = RequestContext::default();
//! let order_id = exchange
//!     .place_limit_order(&ctx, "alice", Side::Buy, rate, value)
//!     .await?;
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use domain::{Order, OrderId, OrderKind, OrderStatus, Side, Timestamp, Trade};

pub use application::ports::{
    LedgerStore, MarketResolver, OrderRepository, RepositoryError, RequestContext,
};
pub use application::{parse_kind, parse_side, Exchange, ExchangeError, Ledger, LedgerError};

pub use infrastructure::{FixedPair, InMemoryLedgerStore, InMemoryOrderBook, JournalEntry};
