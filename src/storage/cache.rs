//! Row Cache
//!
//! Holds a materialized snapshot of every row, live and tombstoned,
//! so reads never touch the file. The snapshot is rebuilt wholesale
//! after each mutation; a reader sees either the pre- or post-mutation
//! state, never a torn one.

use parking_lot::Mutex;

use crate::error::{DbError, Result};
use crate::row::Row;
use crate::schema::Schema;
use crate::storage::RecordFile;

/// In-memory snapshot over a [`RecordFile`]
pub struct RowCache {
    /// Next layer down: the raw file I/O
    store: RecordFile,

    /// Full copy of the file's rows as of the last rebuild
    snapshot: Mutex<Vec<Row>>,
}

impl RowCache {
    /// Wrap a record file, materializing its rows immediately
    pub fn new(store: RecordFile) -> Result<Self> {
        let cache = Self {
            store,
            snapshot: Mutex::new(Vec::new()),
        };
        cache.rebuild()?;
        Ok(cache)
    }

    /// Schema of the underlying file
    pub fn schema(&self) -> &Schema {
        self.store.schema()
    }

    /// All rows as of the last rebuild, handed out as a defensive copy
    /// so external iteration cannot race a rebuild
    pub fn read_all(&self) -> Vec<Row> {
        self.snapshot.lock().clone()
    }

    /// Field values of the live row at `record`
    ///
    /// Tombstoned and unknown record numbers both fail with
    /// RecordNotFound.
    pub fn read(&self, record: u64) -> Result<Vec<String>> {
        let snapshot = self.snapshot.lock();
        for row in snapshot.iter() {
            if row.record() == record && row.is_live() {
                return Ok(row.fields().to_vec());
            }
        }

        Err(DbError::RecordNotFound(record))
    }

    /// Existence probe that never errors
    pub fn has_row(&self, record: u64, allow_deleted: bool) -> bool {
        let snapshot = self.snapshot.lock();
        snapshot
            .iter()
            .find(|row| row.record() == record)
            .map(|row| allow_deleted || row.is_live())
            .unwrap_or(false)
    }

    /// Rows currently in the snapshot (live and tombstoned)
    pub fn row_count(&self) -> u64 {
        self.snapshot.lock().len() as u64
    }

    /// Append a record, then rebuild the snapshot before returning
    pub fn create(&self, fields: &[String]) -> Result<u64> {
        let record = self.store.create(fields)?;
        self.rebuild()?;
        Ok(record)
    }

    /// Update a record in place, then rebuild the snapshot
    pub fn update(&self, record: u64, fields: &[String]) -> Result<()> {
        self.store.update(record, fields)?;
        self.rebuild()
    }

    /// Tombstone a record, then rebuild the snapshot
    pub fn delete(&self, record: u64) -> Result<()> {
        self.store.delete(record)?;
        self.rebuild()
    }

    /// Rescan the whole file and swap the snapshot in one step
    fn rebuild(&self) -> Result<()> {
        let rows = self.store.read_all()?;
        *self.snapshot.lock() = rows;
        Ok(())
    }
}
