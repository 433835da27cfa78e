//! Environment-driven configuration for the gradebook surface.
//!
//! Blank values count as unset.

use gradebook_core::default_log_level;
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "GRADEBOOK_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "GRADEBOOK_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "GRADEBOOK_LOG_DIR";
const DEFAULT_DB_FILE_NAME: &str = "oneroster_gradebook.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging starts only when this is set.
    pub log_dir: Option<PathBuf>,
}

impl ApiConfig {
    /// Resolves configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration through `lookup`, one call per variable name.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            db_path: read(DB_PATH_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
            log_level: read(LOG_LEVEL_VAR).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: read(LOG_DIR_VAR).map(PathBuf::from),
        }
    }
}
