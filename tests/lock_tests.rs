//! Tests for the per-record locking protocol
//!
//! These tests verify:
//! - Cookie issue and release
//! - Cookie enforcement on unlock/update/delete
//! - Blocking until a contended record is released
//! - Independence of locks on different records
//! - Mutual exclusion under sustained contention

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use flatdb::{Database, DbError, FieldSpec};
use tempfile::TempDir;

const MAGIC: i32 = 0x0103;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_db_with_rows(rows: &[&[&str]]) -> (TempDir, Database) {
    let temp_dir = TempDir::new().unwrap();
    let path: PathBuf = temp_dir.path().join("test.db");

    let schema = [
        FieldSpec {
            name: "name".to_string(),
            width: 32,
        },
        FieldSpec {
            name: "city".to_string(),
            width: 16,
        },
    ];
    Database::create_file(&path, MAGIC, &schema).unwrap();

    let db = Database::open(&path).unwrap();
    for row in rows {
        let values: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        db.create(&values).unwrap();
    }

    (temp_dir, db)
}

fn fields(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

// =============================================================================
// Cookie Tests
// =============================================================================

#[test]
fn test_lock_then_unlock() {
    let (_temp, db) = setup_db_with_rows(&[&["A", "X"]]);

    let cookie = db.lock(0).unwrap();
    db.unlock(0, cookie).unwrap();

    // The record is free again
    let cookie = db.lock(0).unwrap();
    db.unlock(0, cookie).unwrap();
}

#[test]
fn test_unlock_with_wrong_cookie_is_denied() {
    let (_temp, db) = setup_db_with_rows(&[&["A", "X"]]);

    let cookie = db.lock(0).unwrap();
    let result = db.unlock(0, cookie.wrapping_add(1));
    assert!(matches!(result, Err(DbError::LockDenied(0))));

    // The lock is still held by the original cookie
    db.unlock(0, cookie).unwrap();
}

#[test]
fn test_unlock_without_lock_is_denied() {
    let (_temp, db) = setup_db_with_rows(&[&["A", "X"]]);

    let result = db.unlock(0, 42);
    assert!(matches!(result, Err(DbError::LockDenied(0))));
}

#[test]
fn test_update_requires_matching_cookie() {
    let (_temp, db) = setup_db_with_rows(&[&["A", "X"]]);

    let cookie = db.lock(0).unwrap();

    let result = db.update(0, &fields(&["B", "Y"]), cookie.wrapping_add(1));
    assert!(matches!(result, Err(DbError::LockDenied(0))));
    // Stored data is unchanged after the denied attempt
    assert_eq!(db.read(0).unwrap(), fields(&["A", "X"]));

    db.update(0, &fields(&["B", "Y"]), cookie).unwrap();
    assert_eq!(db.read(0).unwrap(), fields(&["B", "Y"]));

    db.unlock(0, cookie).unwrap();
}

#[test]
fn test_delete_requires_matching_cookie() {
    let (_temp, db) = setup_db_with_rows(&[&["A", "X"]]);

    let cookie = db.lock(0).unwrap();

    let result = db.delete(0, cookie.wrapping_add(1));
    assert!(matches!(result, Err(DbError::LockDenied(0))));
    assert!(db.read(0).is_ok());

    db.delete(0, cookie).unwrap();
    assert!(db.read(0).is_err());
}

#[test]
fn test_update_without_lock_is_denied() {
    let (_temp, db) = setup_db_with_rows(&[&["A", "X"]]);

    let result = db.update(0, &fields(&["B", "Y"]), 42);
    assert!(matches!(result, Err(DbError::LockDenied(0))));
}

// =============================================================================
// Existence Tests
// =============================================================================

#[test]
fn test_lock_unknown_record_is_not_found() {
    let (_temp, db) = setup_db_with_rows(&[&["A", "X"]]);

    let result = db.lock(5);
    assert!(matches!(result, Err(DbError::RecordNotFound(5))));
}

#[test]
fn test_lock_tombstoned_record_is_not_found() {
    let (_temp, db) = setup_db_with_rows(&[&["A", "X"]]);

    let cookie = db.lock(0).unwrap();
    db.delete(0, cookie).unwrap();
    db.unlock(0, cookie).unwrap();

    let result = db.lock(0);
    assert!(matches!(result, Err(DbError::RecordNotFound(0))));
}

#[test]
fn test_unlock_tombstoned_record_is_allowed() {
    let (_temp, db) = setup_db_with_rows(&[&["A", "X"]]);

    // Delete while holding the lock, then clean up: unlock must still work
    let cookie = db.lock(0).unwrap();
    db.delete(0, cookie).unwrap();
    db.unlock(0, cookie).unwrap();
}

// =============================================================================
// Blocking Tests
// =============================================================================

#[test]
fn test_second_locker_blocks_until_release() {
    let (_temp, db) = setup_db_with_rows(&[&["A", "X"]]);
    let db = &db;
    let acquired = AtomicBool::new(false);
    let acquired = &acquired;

    let cookie = db.lock(0).unwrap();

    crossbeam::thread::scope(|s| {
        let waiter = s.spawn(move |_| {
            let cookie = db.lock(0).unwrap();
            acquired.store(true, Ordering::SeqCst);
            db.unlock(0, cookie).unwrap();
        });

        // Give the waiter time to park; it must not get the lock
        std::thread::sleep(Duration::from_millis(100));
        assert!(!acquired.load(Ordering::SeqCst));

        db.unlock(0, cookie).unwrap();
        waiter.join().unwrap();
        assert!(acquired.load(Ordering::SeqCst));
    })
    .unwrap();
}

#[test]
fn test_locks_on_different_records_do_not_block() {
    let (_temp, db) = setup_db_with_rows(&[&["A", "X"], &["B", "Y"]]);
    let db = &db;

    let cookie_a = db.lock(0).unwrap();

    crossbeam::thread::scope(|s| {
        let other = s.spawn(move |_| {
            // Must complete while record 0 is still held
            let cookie_b = db.lock(1).unwrap();
            db.unlock(1, cookie_b).unwrap();
        });
        other.join().unwrap();
    })
    .unwrap();

    db.unlock(0, cookie_a).unwrap();
}

#[test]
fn test_mutual_exclusion_under_contention() {
    let (_temp, db) = setup_db_with_rows(&[&["A", "X"]]);
    let db = &db;
    let in_critical = AtomicBool::new(false);
    let in_critical = &in_critical;
    let entries = AtomicUsize::new(0);
    let entries = &entries;

    const THREADS: usize = 4;
    const ITERATIONS: usize = 25;

    crossbeam::thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(move |_| {
                for _ in 0..ITERATIONS {
                    let cookie = db.lock(0).unwrap();

                    // No other thread may be inside while we are
                    assert!(!in_critical.swap(true, Ordering::SeqCst));
                    entries.fetch_add(1, Ordering::SeqCst);
                    in_critical.store(false, Ordering::SeqCst);

                    db.unlock(0, cookie).unwrap();
                }
            });
        }
    })
    .unwrap();

    assert_eq!(entries.load(Ordering::SeqCst), THREADS * ITERATIONS);
}

#[test]
fn test_queued_waiters_proceed_one_per_release() {
    let (_temp, db) = setup_db_with_rows(&[&["A", "X"]]);
    let db = &db;
    let acquired = AtomicUsize::new(0);
    let acquired = &acquired;

    let cookie = db.lock(0).unwrap();

    crossbeam::thread::scope(|s| {
        for _ in 0..2 {
            s.spawn(move |_| {
                let cookie = db.lock(0).unwrap();
                acquired.fetch_add(1, Ordering::SeqCst);
                // Hold briefly so the other waiter stays queued
                std::thread::sleep(Duration::from_millis(100));
                db.unlock(0, cookie).unwrap();
            });
        }

        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(acquired.load(Ordering::SeqCst), 0);

        db.unlock(0, cookie).unwrap();

        // One release admits one waiter, not both
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(acquired.load(Ordering::SeqCst), 1);
    })
    .unwrap();

    assert_eq!(acquired.load(Ordering::SeqCst), 2);
}
