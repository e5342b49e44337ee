//! Storage engine adapters
//!
//! A uniform byte-level interface over the embedded stores:
//!
//! - **redb** (`RedbEngine`): single-file copy-on-write B-tree
//! - **RocksDB** (`RocksEngine`): log-structured merge tree
//!
//! Both give the same guarantees: atomic batches, writes durable before the
//! call returns, and forward iteration in ascending byte order of keys.
//! The engine is picked once at startup (`StorageEngine::open`), never per
//! call, and knows nothing about orders.

use enum_dispatch::enum_dispatch;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

mod btree;
mod lsm;

pub use btree::RedbEngine;
pub use lsm::RocksEngine;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("RocksDB error: {0}")]
    Rocks(#[from] rocksdb::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupted record at {key}: {reason}")]
    Corruption { key: String, reason: String },
}

impl StorageError {
    /// Corruption of the value stored under `key`
    pub fn corruption(key: &[u8], reason: impl fmt::Display) -> Self {
        StorageError::Corruption {
            key: String::from_utf8_lossy(key).into_owned(),
            reason: reason.to_string(),
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// One `(key, value)` pair yielded by a scan
pub type KvPair = (Vec<u8>, Vec<u8>);

/// Lazy forward scan. Ends at the last key of the store.
pub type KvIter<'a> = Box<dyn Iterator<Item = StorageResult<KvPair>> + 'a>;

// ============================================================================
// Write Batch
// ============================================================================

/// Buffered puts, committed all-or-nothing by [`KvEngine::write_batch`]
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    puts: Vec<KvPair>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a put; later puts to the same key win
    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> &mut Self {
        self.puts.push((key.into(), value.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.puts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.puts.iter().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }
}

// ============================================================================
// Engine Interface
// ============================================================================

/// Capabilities every engine provides
///
/// `NotFound` is not an error here: `get` answers `Ok(None)`.
#[enum_dispatch]
pub trait KvEngine: Send + Sync {
    /// Engine name for logs
    fn name(&self) -> &'static str;

    /// Point lookup
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Single durable put
    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()>;

    /// Start an empty batch
    fn batch(&self) -> WriteBatch {
        WriteBatch::new()
    }

    /// Commit every put in `batch` atomically and durably
    fn write_batch(&self, batch: WriteBatch) -> StorageResult<()>;

    /// Iterate forward from the first key `>= lower_bound`.
    ///
    /// Not restartable: resume by opening a new scan with a new bound.
    fn scan_from(&self, lower_bound: &[u8]) -> StorageResult<KvIter<'_>>;

    /// Flush anything buffered before the handle is dropped
    fn flush(&self) -> StorageResult<()>;
}

// ============================================================================
// Engine Selection
// ============================================================================

/// Which engine backs the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineKind {
    /// Log-structured merge engine (RocksDB)
    #[default]
    Lsm,
    /// Single-file B-tree engine (redb)
    BTree,
}

impl EngineKind {
    /// File (or directory) name of the store inside the work dir
    pub fn file_name(&self) -> &'static str {
        match self {
            EngineKind::Lsm => "orders.rocksdb",
            EngineKind::BTree => "orders.redb",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::Lsm => f.write_str("lsm"),
            EngineKind::BTree => f.write_str("btree"),
        }
    }
}

/// Unknown `STORAGE_ENGINE` value
#[derive(Debug, Error)]
#[error("unknown storage engine {0:?} (expected lsm|rocksdb|btree|redb)")]
pub struct UnknownEngine(String);

impl FromStr for EngineKind {
    type Err = UnknownEngine;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lsm" | "rocksdb" => Ok(EngineKind::Lsm),
            "btree" | "b-tree" | "redb" => Ok(EngineKind::BTree),
            _ => Err(UnknownEngine(s.to_string())),
        }
    }
}

/// The engine chosen at startup
///
/// Uses enum_dispatch for zero-cost static dispatch.
#[enum_dispatch(KvEngine)]
pub enum StorageEngine {
    Redb(RedbEngine),
    Rocks(RocksEngine),
}

impl StorageEngine {
    /// Open (or create) the store of the given kind at `path`
    pub fn open(kind: EngineKind, path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let engine: StorageEngine = match kind {
            EngineKind::Lsm => RocksEngine::open(path)?.into(),
            EngineKind::BTree => RedbEngine::open(path)?.into(),
        };
        tracing::info!(engine = engine.name(), path = %path.display(), "Storage engine opened");
        Ok(engine)
    }

    pub fn kind(&self) -> EngineKind {
        match self {
            StorageEngine::Redb(_) => EngineKind::BTree,
            StorageEngine::Rocks(_) => EngineKind::Lsm,
        }
    }
}
