//! Database Facade
//!
//! The object external callers use. Composes the layers:
//!
//! ```text
//! Database → LockTable → RowCache → RecordFile
//! ```
//!
//! Mutating calls pass the locking checks first, then hit the cache,
//! which delegates to the file and rebuilds its snapshot. Queries run
//! the filter chain over the cache's current snapshot.

use std::fs::OpenOptions;
use std::path::Path;

use crate::config::Config;
use crate::error::Result;
use crate::filter::{FilterChain, MatchMode};
use crate::row::Row;
use crate::schema::{FieldSpec, Schema};
use crate::storage::{RecordFile, RowCache};
use crate::lock::LockTable;

/// A single-file record store with caching and per-record locking
pub struct Database {
    /// Top of the layer stack
    store: LockTable,

    /// Search pipeline used by `find`
    filters: FilterChain,
}

impl Database {
    /// Open a database file with default configuration
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, Config::default())
    }

    /// Open a database file
    ///
    /// Parses the header and schema, materializes the row cache, and
    /// wires the lock table on top. Fails with a metadata error when
    /// the header cannot be read or fails validation.
    pub fn open_with(path: &Path, config: Config) -> Result<Self> {
        let file = RecordFile::open(path, &config)?;
        let cache = RowCache::new(file)?;

        Ok(Self {
            store: LockTable::new(cache),
            filters: FilterChain::standard(),
        })
    }

    /// Mint a fresh database file: header and schema, zero rows
    ///
    /// Fails if the file already exists.
    pub fn create_file(path: &Path, magic: i32, fields: &[FieldSpec]) -> Result<()> {
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        Schema::write_header(&mut file, magic, fields)?;
        file.sync_all()?;

        tracing::info!(path = %path.display(), fields = fields.len(), "database file created");
        Ok(())
    }

    // =========================================================================
    // Record Access
    // =========================================================================

    /// Field values of the live record at `record`
    pub fn read(&self, record: u64) -> Result<Vec<String>> {
        self.store.read(record)
    }

    /// Every row in the current snapshot, tombstones included
    pub fn read_all(&self) -> Vec<Row> {
        self.store.read_all()
    }

    /// Overwrite a record's fields; requires the record's lock cookie
    pub fn update(&self, record: u64, fields: &[String], cookie: u64) -> Result<()> {
        self.store.update(record, fields, cookie)
    }

    /// Tombstone a record; requires the record's lock cookie
    pub fn delete(&self, record: u64, cookie: u64) -> Result<()> {
        self.store.delete(record, cookie)
    }

    /// Append a new record and return its record number
    pub fn create(&self, fields: &[String]) -> Result<u64> {
        self.store.create(fields)
    }

    /// Record numbers of live rows matching the criteria, ascending
    ///
    /// One criteria slot per field; `None` means "don't care". An
    /// all-empty criteria vector matches every live row.
    pub fn find(&self, criteria: &[Option<String>], mode: MatchMode) -> Vec<u64> {
        self.filters
            .matching(criteria, self.store.read_all(), mode)
            .iter()
            .map(Row::record)
            .collect()
    }

    // =========================================================================
    // Locking
    // =========================================================================

    /// Reserve a record for exclusive mutation; blocks until free
    pub fn lock(&self, record: u64) -> Result<u64> {
        self.store.lock(record)
    }

    /// Release a reserved record
    pub fn unlock(&self, record: u64, cookie: u64) -> Result<()> {
        self.store.unlock(record, cookie)
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Existence probe that never errors
    pub fn exists(&self, record: u64, allow_deleted: bool) -> bool {
        self.store.has_row(record, allow_deleted)
    }

    /// Rows currently on file, live and tombstoned
    pub fn row_count(&self) -> u64 {
        self.store.row_count()
    }

    /// Schema parsed at open time
    pub fn schema(&self) -> &Schema {
        self.store.store().schema()
    }
}
