//! Record File
//!
//! Raw binary I/O over the single database file: every operation seeks
//! to a computed offset and reads or writes exactly one record's bytes
//! while holding the file mutex, so byte sequences from concurrent
//! callers never interleave.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use bytes::{Buf, BufMut};
use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{DbError, Result};
use crate::row::{Row, STATUS_LIVE, STATUS_TOMBSTONE};
use crate::schema::{Schema, SchemaReader};

/// Raw record storage over one shared file handle
pub struct RecordFile {
    /// File handle; held only around actual byte I/O
    file: Mutex<File>,

    /// Immutable metadata parsed at open time
    schema: Schema,

    /// Mutations fail fast when the file was opened read-only
    read_only: bool,
}

impl RecordFile {
    /// Open a database file and parse its schema
    ///
    /// Fails with a metadata error if the header cannot be read or the
    /// configured magic cookie does not match.
    pub fn open(path: &Path, config: &Config) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(!config.read_only)
            .open(path)?;

        let schema = SchemaReader::read(&mut file)?;

        if let Some(expected) = config.expected_magic {
            if schema.magic() != expected {
                return Err(DbError::Metadata(format!(
                    "magic cookie mismatch: expected {:#x}, found {:#x}",
                    expected,
                    schema.magic()
                )));
            }
        }

        tracing::info!(path = %path.display(), fields = schema.field_count(), "record file opened");

        Ok(Self {
            file: Mutex::new(file),
            schema,
            read_only: config.read_only,
        })
    }

    /// Schema parsed from this file
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Row count derived from the file length; never stored
    pub fn row_count(&self) -> Result<u64> {
        let file = self.file.lock();
        self.row_count_locked(&file)
    }

    /// Decode every slot from data-start to end-of-file, live and
    /// tombstoned alike. A slot beyond end-of-file simply never exists.
    pub fn read_all(&self) -> Result<Vec<Row>> {
        let count = self.row_count()?;
        let mut rows = Vec::with_capacity(count as usize);

        for record in 0..count {
            rows.push(self.read(record)?);
        }

        Ok(rows)
    }

    /// Decode the row at `record`
    ///
    /// Tombstoned rows decode like any other; the caller sees the
    /// status through [`Row::is_live`]. Out-of-range record numbers
    /// fail with RecordNotFound.
    pub fn read(&self, record: u64) -> Result<Row> {
        let mut file = self.file.lock();
        let raw = self.read_record_bytes(&mut file, record)?;
        Ok(self.decode(record, &raw))
    }

    /// True when the slot is tombstoned; out-of-range slots count as
    /// deleted so cache building can probe without erroring.
    pub fn is_deleted(&self, record: u64) -> Result<bool> {
        let mut file = self.file.lock();
        match self.read_record_bytes(&mut file, record) {
            Ok(raw) => Ok(raw[0] == STATUS_TOMBSTONE),
            Err(DbError::RecordNotFound(_)) => Ok(true),
            Err(e) => Err(e),
        }
    }

    /// Serialize the fields at current end-of-file and return the new
    /// zero-based record number
    pub fn create(&self, fields: &[String]) -> Result<u64> {
        self.ensure_writable()?;
        let encoded = self.encode(fields)?;

        let mut file = self.file.lock();
        let record = self.row_count_locked(&file)?;

        file.seek(SeekFrom::End(0))?;
        file.write_all(&encoded)?;

        tracing::debug!(record, "record appended");
        Ok(record)
    }

    /// Overwrite the row bytes in place, forcing the status byte live
    ///
    /// Tombstoned and out-of-range rows both fail with RecordNotFound.
    pub fn update(&self, record: u64, fields: &[String]) -> Result<()> {
        self.ensure_writable()?;
        let encoded = self.encode(fields)?;

        let mut file = self.file.lock();
        let raw = self.read_record_bytes(&mut file, record)?;
        if raw[0] == STATUS_TOMBSTONE {
            return Err(DbError::RecordNotFound(record));
        }

        file.seek(SeekFrom::Start(self.record_offset(record)))?;
        file.write_all(&encoded)?;

        tracing::debug!(record, "record updated");
        Ok(())
    }

    /// Overwrite only the status byte with the tombstone marker; field
    /// bytes are left untouched
    pub fn delete(&self, record: u64) -> Result<()> {
        self.ensure_writable()?;

        let mut file = self.file.lock();
        let count = self.row_count_locked(&file)?;
        if record >= count {
            return Err(DbError::RecordNotFound(record));
        }

        file.seek(SeekFrom::Start(self.record_offset(record)))?;
        file.write_all(&[STATUS_TOMBSTONE])?;

        tracing::debug!(record, "record tombstoned");
        Ok(())
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    fn ensure_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(DbError::ReadOnly);
        }
        Ok(())
    }

    fn record_offset(&self, record: u64) -> u64 {
        self.schema.data_start() + record * self.schema.record_stride()
    }

    fn row_count_locked(&self, file: &File) -> Result<u64> {
        let len = file.metadata()?.len();
        let data = len.saturating_sub(self.schema.data_start());
        Ok(data / self.schema.record_stride())
    }

    /// Read one full record (status byte + fields) into memory
    fn read_record_bytes(&self, file: &mut File, record: u64) -> Result<Vec<u8>> {
        let stride = self.schema.record_stride();
        let offset = self.record_offset(record);

        let len = file.metadata()?.len();
        if offset + stride > len {
            return Err(DbError::RecordNotFound(record));
        }

        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; stride as usize];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Decode a record's bytes: status flag, then each field trimmed of
    /// trailing padding
    fn decode(&self, record: u64, raw: &[u8]) -> Row {
        let mut buf = raw;
        let deleted = buf.get_u8() == STATUS_TOMBSTONE;

        let mut fields = Vec::with_capacity(self.schema.field_count());
        for spec in self.schema.fields() {
            let mut value = vec![0u8; spec.width as usize];
            buf.copy_to_slice(&mut value);
            let text = String::from_utf8_lossy(&value);
            fields.push(text.trim_end_matches(' ').to_string());
        }

        Row::new(record, deleted, fields)
    }

    /// Encode fields into one record's bytes: live status flag, then
    /// each value space-padded to its schema width. Values wider than
    /// their field are rejected rather than shifting the layout.
    fn encode(&self, fields: &[String]) -> Result<Vec<u8>> {
        if fields.len() != self.schema.field_count() {
            return Err(DbError::FieldCount {
                given: fields.len(),
                expected: self.schema.field_count(),
            });
        }

        let mut buf = Vec::with_capacity(self.schema.record_stride() as usize);
        buf.put_u8(STATUS_LIVE);

        for (spec, value) in self.schema.fields().iter().zip(fields) {
            let bytes = value.as_bytes();
            if bytes.len() > spec.width as usize {
                return Err(DbError::FieldOverflow {
                    field: spec.name.clone(),
                    given: bytes.len(),
                    width: spec.width,
                });
            }

            buf.put_slice(bytes);
            buf.put_bytes(b' ', spec.width as usize - bytes.len());
        }

        Ok(buf)
    }
}
