//! Ledger domain models and the state container.

pub mod category;
pub mod container;
pub mod transaction;

pub use category::{default_categories, Category, CategoryPatch, NewCategory};
pub use container::LedgerContainer;
pub use transaction::{NewTransaction, Transaction, TransactionKind};
