//! Value-transfer primitive and its in-memory implementation

mod in_memory_ledger;
mod traits;

pub use in_memory_ledger::InMemoryLedger;
pub use traits::{Transfer, ValueLedger};
