//! Storage Module
//!
//! Raw record I/O and the in-memory cache over a single database file.
//!
//! ## Responsibilities
//! - Decode/encode fixed-layout records at computed offsets
//! - Full-table scan, append-on-create, in-place update, tombstone delete
//! - Serve reads from a materialized snapshot, rebuilt after mutations
//!
//! ## File Format (big-endian)
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Header                                 │
//! │ ┌──────────┬────────────┬────────────┐ │
//! │ │Magic (4) │RecordLen(4)│ Fields (2) │ │
//! │ └──────────┴────────────┴────────────┘ │
//! ├────────────────────────────────────────┤
//! │ Schema (one entry per field)           │
//! │ ┌────────┬───────────┬──────────────┐  │
//! │ │NameLen │ Name      │ Width (2)    │  │
//! │ └────────┴───────────┴──────────────┘  │
//! ├────────────────────────────────────────┤
//! │ Data (repeated until EOF)              │
//! │ ┌──────┬────────────┬───┬──────────┐   │
//! │ │Status│ Field 0    │...│ Field n-1│   │
//! │ └──────┴────────────┴───┴──────────┘   │
//! └────────────────────────────────────────┘
//! ```
//! Each field is space-padded to its schema width; the status byte is
//! 0 for live rows and 1 for tombstones. Record stride = 1 + record
//! length, and row count is derived from the file length.

mod cache;
mod file;

pub use cache::RowCache;
pub use file::RecordFile;
