use std::{
    env, fs,
    path::{Path, PathBuf},
};

use dirs::home_dir;

use crate::errors::LedgerError;

use super::StorageBackend;

const DEFAULT_DIR_NAME: &str = ".pocket_ledger";
const HOME_OVERRIDE_VAR: &str = "POCKET_LEDGER_HOME";
const VALUE_EXTENSION: &str = "json";

/// Returns the application data directory, defaulting to `~/.pocket_ledger`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_OVERRIDE_VAR) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// File-per-key store: each key lives in `<base>/<key>.json`. Writes are
/// staged to a temporary sibling and renamed so a failed write never corrupts
/// the previous value.
pub struct JsonFileStore {
    base_dir: PathBuf,
}

impl JsonFileStore {
    /// Opens a store rooted at `base_dir`, or at [`app_data_dir`] when `None`.
    pub fn new(base_dir: Option<PathBuf>) -> Result<Self, LedgerError> {
        let base_dir = base_dir.unwrap_or_else(app_data_dir);
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{key}.{VALUE_EXTENSION}"))
    }
}

impl StorageBackend for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, LedgerError> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn put(&self, key: &str, value: &str) -> Result<(), LedgerError> {
        let path = self.key_path(key);
        let tmp = path.with_extension(format!("{VALUE_EXTENSION}.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(tmp, path)?;
        Ok(())
    }
}
