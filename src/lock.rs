//! Lock Table
//!
//! Per-record exclusive locking over the cache layer. Each reserved
//! record maps to an opaque 64-bit cookie; mutations must present the
//! cookie currently on file for that record.
//!
//! ## Waiting Protocol
//! `lock` blocks, with no timeout, while the target record is held.
//! Waiters park on one table-wide condition variable that is signaled
//! on every release; each woken thread re-checks whether its own record
//! is free, so exactly one contender wins a freed lock and the rest go
//! back to sleep. The waiting thread yields the processor entirely
//! rather than polling.

use std::collections::HashMap;

use parking_lot::{Condvar, Mutex};

use crate::error::{DbError, Result};
use crate::row::Row;
use crate::storage::RowCache;

/// Tombstoned rows may not be locked
const LOCK_ALLOWS_DELETED: bool = false;

/// Tombstoned rows may be unlocked, so a holder can still clean up
/// after a concurrent delete
const UNLOCK_ALLOWS_DELETED: bool = true;

/// Per-record lock protocol over a [`RowCache`]
pub struct LockTable {
    /// Next layer down: cached row access
    store: RowCache,

    /// Record number → cookie for every currently reserved record
    locks: Mutex<HashMap<u64, u64>>,

    /// Signaled on every release; waiters re-check their record
    released: Condvar,
}

impl LockTable {
    pub fn new(store: RowCache) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
            released: Condvar::new(),
        }
    }

    /// Reserve a record, blocking until it is free
    ///
    /// Returns the cookie that `unlock`, `update`, and `delete` must
    /// present. Lock requests for different records never block each
    /// other; only contention on the same record number waits.
    pub fn lock(&self, record: u64) -> Result<u64> {
        tracing::debug!(record, "attempting to lock");
        self.validate_row(record, LOCK_ALLOWS_DELETED)?;

        let cookie: u64 = rand::random();

        let mut locks = self.locks.lock();
        while locks.contains_key(&record) {
            tracing::debug!(record, "waiting for lock");
            self.released.wait(&mut locks);
        }
        locks.insert(record, cookie);

        tracing::debug!(record, "lock acquired");
        Ok(cookie)
    }

    /// Release a reserved record and wake its waiters
    ///
    /// The record must exist (tombstoned is fine) and the cookie must
    /// match the one currently held.
    pub fn unlock(&self, record: u64, cookie: u64) -> Result<()> {
        tracing::debug!(record, "attempting to unlock");
        self.validate_row(record, UNLOCK_ALLOWS_DELETED)?;

        let mut locks = self.locks.lock();
        Self::validate_cookie(&locks, record, cookie)?;
        locks.remove(&record);
        self.released.notify_all();

        tracing::debug!(record, "lock released");
        Ok(())
    }

    /// Update a record after re-validating existence and cookie
    pub fn update(&self, record: u64, fields: &[String], cookie: u64) -> Result<()> {
        self.validate_row(record, LOCK_ALLOWS_DELETED)?;
        Self::validate_cookie(&self.locks.lock(), record, cookie)?;
        self.store.update(record, fields)
    }

    /// Delete a record after re-validating existence and cookie
    pub fn delete(&self, record: u64, cookie: u64) -> Result<()> {
        self.validate_row(record, LOCK_ALLOWS_DELETED)?;
        Self::validate_cookie(&self.locks.lock(), record, cookie)?;
        self.store.delete(record)
    }

    // =========================================================================
    // Pass-throughs
    // =========================================================================

    pub fn read(&self, record: u64) -> Result<Vec<String>> {
        self.store.read(record)
    }

    pub fn read_all(&self) -> Vec<Row> {
        self.store.read_all()
    }

    pub fn create(&self, fields: &[String]) -> Result<u64> {
        self.store.create(fields)
    }

    pub fn has_row(&self, record: u64, allow_deleted: bool) -> bool {
        self.store.has_row(record, allow_deleted)
    }

    pub fn row_count(&self) -> u64 {
        self.store.row_count()
    }

    pub fn store(&self) -> &RowCache {
        &self.store
    }

    // =========================================================================
    // Validation
    // =========================================================================

    fn validate_row(&self, record: u64, allow_deleted: bool) -> Result<()> {
        if !self.store.has_row(record, allow_deleted) {
            return Err(DbError::RecordNotFound(record));
        }
        Ok(())
    }

    fn validate_cookie(locks: &HashMap<u64, u64>, record: u64, cookie: u64) -> Result<()> {
        match locks.get(&record) {
            Some(&held) if held == cookie => Ok(()),
            _ => Err(DbError::LockDenied(record)),
        }
    }
}
