mod fixed_pair;
pub mod repositories;

pub use fixed_pair::FixedPair;
pub use repositories::{InMemoryLedgerStore, InMemoryOrderBook, JournalEntry};
