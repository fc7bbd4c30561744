use std::{collections::HashMap, sync::RwLock};

use crate::errors::LedgerError;

use super::StorageBackend;

/// In-memory backend. Nothing survives the process; used by tests and the
/// CLI's ephemeral mode.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates a key, mimicking data left over from a prior session.
    pub fn seed(self, key: &str, value: &str) -> Self {
        self.entries
            .write()
            .expect("MemoryStore lock poisoned")
            .insert(key.to_string(), value.to_string());
        self
    }
}

impl StorageBackend for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, LedgerError> {
        Ok(self
            .entries
            .read()
            .expect("MemoryStore lock poisoned")
            .get(key)
            .cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), LedgerError> {
        self.entries
            .write()
            .expect("MemoryStore lock poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
