mod in_memory_ledger;
mod in_memory_order_book;

pub use in_memory_ledger::{InMemoryLedgerStore, JournalEntry};
pub use in_memory_order_book::InMemoryOrderBook;
