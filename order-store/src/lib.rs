//! Order Store - order persistence on an embedded key-value store
//!
//! # Module structure
//!
//! ```text
//! order-store/src/
//! ├── core/          # Configuration
//! ├── orders/        # Keys, engines, money, repository
//! └── utils/         # Logging
//! ```

pub mod core;
pub mod orders;
pub mod utils;

use orders::error::StorageContext;

// Re-export public types
pub use core::Config;
pub use orders::{
    EngineKind, IndexReport, KvEngine, OrderError, OrderRepository, OrderResult, StorageEngine,
    StorageError,
};

// Re-export logger functions
pub use utils::logger::init_logger_with_file;

/// Load `.env`, read the configuration and install the logger
pub fn setup_environment() -> anyhow::Result<Config> {
    // A missing .env file is fine
    let _ = dotenv::dotenv();

    let config = Config::from_env();
    init_logger_with_file(&config.log_level, config.log_json, config.log_dir.as_deref())?;
    Ok(config)
}

/// Open the configured engine at `Config::storage_path`, creating the work dir
pub fn open_repository(config: &Config) -> OrderResult<OrderRepository> {
    std::fs::create_dir_all(&config.work_dir)
        .map_err(StorageError::from)
        .context("cannot create work dir")?;
    let engine = StorageEngine::open(config.storage_engine, config.storage_path())
        .context("cannot open store")?;
    Ok(OrderRepository::new(engine))
}
