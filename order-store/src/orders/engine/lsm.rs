//! RocksDB-backed engine
//!
//! Every write goes through `WriteOptions::set_sync(true)`, so the WAL is
//! fsynced before `put`/`write_batch` return.

use std::path::Path;

use rocksdb::{DB, Direction, IteratorMode, Options, WriteOptions};

use super::{KvEngine, KvIter, StorageError, StorageResult, WriteBatch};

/// Engine backed by a RocksDB directory
pub struct RocksEngine {
    db: DB,
}

impl RocksEngine {
    /// Open or create the database directory at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let mut options = Options::default();
        options.create_if_missing(true);
        let db = DB::open(&options, path)?;
        Ok(Self { db })
    }
}

fn sync_writes() -> WriteOptions {
    let mut options = WriteOptions::default();
    options.set_sync(true);
    options
}

impl KvEngine for RocksEngine {
    fn name(&self) -> &'static str {
        "rocksdb"
    }

    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.db.get(key)?)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.db.put_opt(key, value, &sync_writes())?;
        Ok(())
    }

    fn write_batch(&self, batch: WriteBatch) -> StorageResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut rocks_batch = rocksdb::WriteBatch::default();
        for (key, value) in batch.iter() {
            rocks_batch.put(key, value);
        }
        self.db.write_opt(rocks_batch, &sync_writes())?;
        Ok(())
    }

    fn scan_from(&self, lower_bound: &[u8]) -> StorageResult<KvIter<'_>> {
        let iter = self
            .db
            .iterator(IteratorMode::From(lower_bound, Direction::Forward))
            .map(|entry| {
                entry
                    .map(|(key, value)| (key.into_vec(), value.into_vec()))
                    .map_err(StorageError::from)
            });
        Ok(Box::new(iter))
    }

    fn flush(&self) -> StorageResult<()> {
        self.db.flush()?;
        Ok(())
    }
}
