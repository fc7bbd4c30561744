#![doc(test(attr(deny(warnings))))]

//! Pocket Ledger keeps a personal expense/income ledger: transactions,
//! spending categories, per-day and per-category summaries, all persisted to
//! a local key-value store between sessions.

pub mod cli;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Pocket Ledger tracing initialized.");
    });
}
