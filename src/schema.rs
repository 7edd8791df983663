//! Schema parsing
//!
//! Reads the file header and field schema once at open time, producing
//! immutable [`Schema`] metadata used for all record offset arithmetic.
//!
//! ## Header Layout (big-endian)
//! ```text
//! ┌──────────────┬────────────────┬─────────────┐
//! │ magic (i32)  │ recordLen (i32)│ fields (i16)│
//! └──────────────┴────────────────┴─────────────┘
//! followed by, per field:
//! ┌───────────────┬───────────────┬─────────────┐
//! │ nameLen (i16) │ name bytes    │ width (i16) │
//! └───────────────┴───────────────┴─────────────┘
//! ```
//! Record length excludes the one-byte status flag; the record stride
//! used for seeking is `1 + recordLen`.

use std::io::{Read, Seek, SeekFrom, Write};

use bytes::{Buf, BufMut};

use crate::error::{DbError, Result};

/// Size of the fixed header before the per-field schema entries
const FIXED_HEADER_LEN: usize = 4 + 4 + 2;

/// Size of the per-record status flag on disk
pub const STATUS_FLAG_LEN: u64 = 1;

/// One field in the schema: a name and a fixed byte width
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name as stored in the header
    pub name: String,

    /// Fixed on-disk width in bytes
    pub width: u16,
}

/// Immutable file metadata, built once per open file
///
/// Field order matches on-disk order; every offset computation in the
/// storage layer goes through [`Schema::record_stride`] and
/// [`Schema::data_start`].
#[derive(Debug, Clone)]
pub struct Schema {
    magic: i32,
    record_length: i32,
    fields: Vec<FieldSpec>,
    data_start: u64,
}

impl Schema {
    /// Magic cookie from the header (parsed, not validated here)
    pub fn magic(&self) -> i32 {
        self.magic
    }

    /// Sum of field widths, excluding the status byte
    pub fn record_length(&self) -> i32 {
        self.record_length
    }

    /// Byte offset where row data begins
    pub fn data_start(&self) -> u64 {
        self.data_start
    }

    /// Distance between consecutive records: status byte + field widths
    pub fn record_stride(&self) -> u64 {
        STATUS_FLAG_LEN + self.record_length as u64
    }

    /// Number of fields per record
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Ordered field specs (on-disk order)
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Serialize a header + schema describing `fields` with the given
    /// magic cookie. Used when minting a fresh database file.
    pub fn write_header<W: Write>(writer: &mut W, magic: i32, fields: &[FieldSpec]) -> Result<()> {
        let mut buf = Vec::with_capacity(FIXED_HEADER_LEN);

        let record_length: i32 = fields.iter().map(|f| f.width as i32).sum();
        buf.put_i32(magic);
        buf.put_i32(record_length);
        buf.put_i16(fields.len() as i16);

        for field in fields {
            buf.put_i16(field.name.len() as i16);
            buf.put_slice(field.name.as_bytes());
            buf.put_i16(field.width as i16);
        }

        writer.write_all(&buf)?;
        Ok(())
    }
}

/// Parses the header and field schema from an open file handle
///
/// Any failure here is fatal: a store whose metadata cannot be read
/// cannot serve requests.
pub struct SchemaReader;

impl SchemaReader {
    /// Read the header and schema, leaving the handle positioned at the
    /// first data row. The resulting data-start offset is taken from the
    /// handle's position after parsing.
    pub fn read<R: Read + Seek>(handle: &mut R) -> Result<Schema> {
        handle.seek(SeekFrom::Start(0)).map_err(meta_err)?;

        let mut header = [0u8; FIXED_HEADER_LEN];
        handle.read_exact(&mut header).map_err(meta_err)?;

        let mut buf = &header[..];
        let magic = buf.get_i32();
        let record_length = buf.get_i32();
        let field_count = buf.get_i16();

        if record_length < 0 {
            return Err(DbError::Metadata(format!(
                "negative record length: {}",
                record_length
            )));
        }
        if field_count < 0 {
            return Err(DbError::Metadata(format!(
                "negative field count: {}",
                field_count
            )));
        }

        let fields = Self::read_field_specs(handle, field_count as usize)?;

        let widths: i64 = fields.iter().map(|f| f.width as i64).sum();
        if widths != record_length as i64 {
            return Err(DbError::Metadata(format!(
                "field widths sum to {} but header declares record length {}",
                widths, record_length
            )));
        }

        let data_start = handle.stream_position().map_err(meta_err)?;

        tracing::debug!(
            magic,
            record_length,
            field_count,
            data_start,
            "schema parsed"
        );

        Ok(Schema {
            magic,
            record_length,
            fields,
            data_start,
        })
    }

    /// Read `count` schema entries: name length, name bytes, field width
    fn read_field_specs<R: Read>(handle: &mut R, count: usize) -> Result<Vec<FieldSpec>> {
        let mut fields = Vec::with_capacity(count);

        for _ in 0..count {
            let mut len_buf = [0u8; 2];
            handle.read_exact(&mut len_buf).map_err(meta_err)?;
            let name_len = i16::from_be_bytes(len_buf);

            if name_len < 0 {
                return Err(DbError::Metadata(format!(
                    "negative field name length: {}",
                    name_len
                )));
            }

            let mut name_bytes = vec![0u8; name_len as usize];
            handle.read_exact(&mut name_bytes).map_err(meta_err)?;
            let name = String::from_utf8_lossy(&name_bytes).into_owned();

            let mut width_buf = [0u8; 2];
            handle.read_exact(&mut width_buf).map_err(meta_err)?;
            let width = i16::from_be_bytes(width_buf);

            if width < 0 {
                return Err(DbError::Metadata(format!(
                    "negative width for field `{}`: {}",
                    name, width
                )));
            }

            fields.push(FieldSpec {
                name,
                width: width as u16,
            });
        }

        Ok(fields)
    }
}

/// Header/schema I/O failures are metadata errors, not plain IO errors
fn meta_err(e: std::io::Error) -> DbError {
    DbError::Metadata(format!("cannot read header/schema: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_header() -> Vec<u8> {
        let mut buf = Vec::new();
        Schema::write_header(
            &mut buf,
            0x0103,
            &[
                FieldSpec {
                    name: "name".to_string(),
                    width: 32,
                },
                FieldSpec {
                    name: "city".to_string(),
                    width: 16,
                },
            ],
        )
        .unwrap();
        buf
    }

    #[test]
    fn parses_round_tripped_header() {
        let bytes = sample_header();
        let schema = SchemaReader::read(&mut Cursor::new(&bytes)).unwrap();

        assert_eq!(schema.magic(), 0x0103);
        assert_eq!(schema.record_length(), 48);
        assert_eq!(schema.field_count(), 2);
        assert_eq!(schema.fields()[0].name, "name");
        assert_eq!(schema.fields()[0].width, 32);
        assert_eq!(schema.fields()[1].name, "city");
        assert_eq!(schema.record_stride(), 49);
        assert_eq!(schema.data_start(), bytes.len() as u64);
    }

    #[test]
    fn truncated_header_is_metadata_error() {
        let bytes = sample_header();
        let result = SchemaReader::read(&mut Cursor::new(&bytes[..6]));
        assert!(matches!(result, Err(DbError::Metadata(_))));
    }

    #[test]
    fn truncated_schema_entry_is_metadata_error() {
        let bytes = sample_header();
        // Cut inside the first field's name
        let result = SchemaReader::read(&mut Cursor::new(&bytes[..FIXED_HEADER_LEN + 4]));
        assert!(matches!(result, Err(DbError::Metadata(_))));
    }

    #[test]
    fn width_sum_mismatch_is_rejected() {
        let mut bytes = sample_header();
        // Corrupt the declared record length
        bytes[7] = 0xFF;
        let result = SchemaReader::read(&mut Cursor::new(&bytes));
        assert!(matches!(result, Err(DbError::Metadata(_))));
    }
}
