pub mod ports;

mod exchange;
mod ledger;

pub use exchange::{parse_kind, parse_side, Exchange, ExchangeError};
pub use ledger::{Ledger, LedgerError};
