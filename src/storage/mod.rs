//! Durable local key-value surface backing the ledger container.

pub mod json_backend;
pub mod memory;

use crate::errors::LedgerError;

pub use json_backend::JsonFileStore;
pub use memory::MemoryStore;

/// Fixed storage keys, one per persisted container field.
pub mod keys {
    pub const TRANSACTIONS: &str = "ledger_transactions";
    pub const CATEGORIES: &str = "ledger_categories";
    pub const SELECTED_DATE: &str = "ledger_selected_date";
    pub const CURRENT_AMOUNT: &str = "ledger_current_amount";
    pub const SELECTED_CATEGORY: &str = "ledger_selected_category";
    pub const NOTE: &str = "ledger_note";
}

/// Abstraction over persistence backends. Values are JSON text; each key
/// holds the full serialized value of one container field, last write wins.
pub trait StorageBackend: Send + Sync {
    /// Returns the stored value for `key`, or `None` when nothing was ever
    /// written under it.
    fn get(&self, key: &str) -> Result<Option<String>, LedgerError>;

    /// Replaces the value stored under `key`.
    fn put(&self, key: &str, value: &str) -> Result<(), LedgerError>;
}
