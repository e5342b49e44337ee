use std::path::PathBuf;

use crate::orders::EngineKind;

/// Order store configuration
///
/// # Environment
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./data | Directory holding the store files |
/// | STORAGE_ENGINE | lsm | `lsm`/`rocksdb` or `btree`/`redb` |
/// | LOG_LEVEL | info | Log level |
/// | LOG_JSON | false | JSON log lines |
/// | LOG_DIR | (unset) | Daily rolling log files go here when set |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/var/lib/orders STORAGE_ENGINE=btree cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the store files
    pub work_dir: String,
    /// Engine backing the store
    pub storage_engine: EngineKind,
    /// Log level: trace | debug | info | warn | error
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,
    /// Directory for rolling log files
    pub log_dir: Option<String>,
}

impl Config {
    /// Load from the environment
    ///
    /// Unset or unparsable values fall back to defaults.
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            storage_engine: std::env::var("STORAGE_ENGINE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: std::env::var("LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
        }
    }

    /// Config rooted at `work_dir` with the given engine
    ///
    /// Used by tests
    pub fn with_overrides(work_dir: impl Into<String>, storage_engine: EngineKind) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.storage_engine = storage_engine;
        config
    }

    /// Location of the store: `WORK_DIR/orders.redb` or `WORK_DIR/orders.rocksdb`
    pub fn storage_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join(self.storage_engine.file_name())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
