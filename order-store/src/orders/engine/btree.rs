//! redb-backed engine
//!
//! All keys live in one table. redb commits with `Durability::Immediate` by
//! default: a commit is on disk when `commit()` returns, and the
//! copy-on-write pointer swap means the file is never half-written.

use std::collections::VecDeque;
use std::ops::Bound;
use std::path::Path;

use redb::{Database, ReadOnlyTable, ReadableDatabase, TableDefinition};

use super::{KvEngine, KvIter, KvPair, StorageResult, WriteBatch};

/// Single table: raw key bytes -> raw value bytes
const KV_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("kv");

/// Entries copied out of the B-tree per refill of a scan
const SCAN_CHUNK: usize = 256;

/// Engine backed by a single redb file
pub struct RedbEngine {
    db: Database,
}

impl RedbEngine {
    /// Open or create the database file at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        // Create the table up front so read transactions never miss it
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(KV_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db })
    }
}

impl KvEngine for RedbEngine {
    fn name(&self) -> &'static str {
        "redb"
    }

    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(KV_TABLE)?;
        Ok(table.get(key)?.map(|guard| guard.value().to_vec()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(KV_TABLE)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn write_batch(&self, batch: WriteBatch) -> StorageResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        // Dropping an uncommitted transaction aborts it, so an error on any
        // insert leaves nothing behind
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(KV_TABLE)?;
            for (key, value) in batch.iter() {
                table.insert(key, value)?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    fn scan_from(&self, lower_bound: &[u8]) -> StorageResult<KvIter<'_>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(KV_TABLE)?;
        Ok(Box::new(RedbScan {
            table,
            lower_bound: lower_bound.to_vec(),
            resume_after: None,
            buffer: VecDeque::new(),
            exhausted: false,
        }))
    }

    fn flush(&self) -> StorageResult<()> {
        // Every commit is already durable
        Ok(())
    }
}

/// Forward scan over one read snapshot
///
/// Entries are copied out in chunks so the iterator owns its data; every
/// chunk reads from the same table handle, hence the same snapshot.
struct RedbScan {
    table: ReadOnlyTable<&'static [u8], &'static [u8]>,
    lower_bound: Vec<u8>,
    resume_after: Option<Vec<u8>>,
    buffer: VecDeque<KvPair>,
    exhausted: bool,
}

impl RedbScan {
    fn refill(&mut self) -> StorageResult<()> {
        let start: Bound<&[u8]> = match &self.resume_after {
            Some(last) => Bound::Excluded(last.as_slice()),
            None => Bound::Included(self.lower_bound.as_slice()),
        };
        let range = self.table.range::<&[u8]>((start, Bound::Unbounded))?;

        let mut fetched = 0;
        for entry in range {
            let (key, value) = entry?;
            self.buffer
                .push_back((key.value().to_vec(), value.value().to_vec()));
            fetched += 1;
            if fetched == SCAN_CHUNK {
                break;
            }
        }

        if fetched < SCAN_CHUNK {
            self.exhausted = true;
        }
        self.resume_after = self.buffer.back().map(|(key, _)| key.clone());
        Ok(())
    }
}

impl Iterator for RedbScan {
    type Item = StorageResult<KvPair>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(e) = self.refill() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_round_trip() {
        let engine = RedbEngine::open_in_memory().unwrap();
        engine.put(b"order/c1/A", b"{}").unwrap();
        assert_eq!(engine.get(b"order/c1/A").unwrap().as_deref(), Some(&b"{}"[..]));
        assert!(engine.get(b"order/c1/B").unwrap().is_none());
    }

    #[test]
    fn test_scan_sees_snapshot_taken_at_open() {
        let engine = RedbEngine::open_in_memory().unwrap();
        let mut batch = WriteBatch::new();
        for i in 0..(SCAN_CHUNK * 2) {
            batch.put(format!("k/{i:05}").into_bytes(), b"old".to_vec());
        }
        engine.write_batch(batch).unwrap();

        let mut scan = engine.scan_from(b"k/").unwrap();
        let first = scan.next().unwrap().unwrap();
        assert_eq!(first.0, b"k/00000".to_vec());

        // Writes after the scan opened stay invisible to it, including in
        // chunks fetched later
        engine.put(b"k/99999", b"new").unwrap();
        let rest: Vec<KvPair> = scan.collect::<StorageResult<_>>().unwrap();
        assert_eq!(rest.len(), SCAN_CHUNK * 2 - 1);
        assert!(rest.iter().all(|(_, v)| v == b"old"));
    }

    #[test]
    fn test_exact_chunk_multiple_terminates() {
        let engine = RedbEngine::open_in_memory().unwrap();
        let mut batch = WriteBatch::new();
        for i in 0..SCAN_CHUNK {
            batch.put(format!("k/{i:05}").into_bytes(), Vec::new());
        }
        engine.write_batch(batch).unwrap();

        let count = engine.scan_from(b"").unwrap().count();
        assert_eq!(count, SCAN_CHUNK);
    }
}
