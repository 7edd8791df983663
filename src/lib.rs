//! # flatdb
//!
//! A single-file, schema-driven record store with:
//! - Fixed-layout binary records behind a parsed header/schema
//! - An in-memory cache serving all reads, rebuilt after each mutation
//! - Per-record pessimistic locking with opaque cookies
//! - Composable AND/OR substring search over live rows
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Database                               │
//! │                   (facade, find())                           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      LockTable                               │
//! │          (record → cookie, blocking waiters)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      RowCache                                │
//! │           (full snapshot, rebuilt on mutation)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     RecordFile                               │
//! │        (seek + one record's bytes per critical section)      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod schema;
pub mod row;
pub mod storage;
pub mod lock;
pub mod filter;
pub mod database;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{DbError, Result};
pub use config::Config;
pub use database::Database;
pub use filter::MatchMode;
pub use row::Row;
pub use schema::{FieldSpec, Schema};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of flatdb
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
