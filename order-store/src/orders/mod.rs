//! Order persistence over an embedded ordered key-value store
//!
//! - **keys**: byte layout of primary records and the id index
//! - **engine**: redb (B-tree) and RocksDB (LSM) behind one [`KvEngine`] trait
//! - **money**: subtotal/tax/total in integer minor units
//! - **repository**: create, get, list (paginated) and complete
//!
//! # Architecture
//!
//! ```text
//! Request → OrderRepository → keys + money → WriteBatch → StorageEngine
//!                                                           ├── RedbEngine  (orders.redb)
//!                                                           └── RocksEngine (orders.rocksdb)
//! ```

pub mod engine;
pub mod error;
pub mod keys;
pub mod money;
pub mod repository;

// Re-exports
pub use engine::{
    EngineKind, KvEngine, RedbEngine, RocksEngine, StorageEngine, StorageError, StorageResult,
    UnknownEngine, WriteBatch,
};
pub use error::{OrderError, OrderResult};
pub use repository::{IndexReport, OrderRepository};

// Re-export shared types for convenience
pub use shared::order::{Order, OrderId, OrderStatus};
