//! Physical layout of a stored object.
//!
//! One row per object in the data table, all cells in the configured family:
//!
//! | qualifier | contents                                   |
//! |-----------|--------------------------------------------|
//! | `v`       | version, 8-byte big-endian                 |
//! | `s`       | schema hash, 64 hex characters             |
//! | `d`       | encoded payload                            |
//! | `f`       | format tag, 4-byte big-endian              |
//!
//! The reserved row [`SEQUENCE_ROW`] holds the sequential-key counter in
//! qualifier `i`. Generated keys are ASCII, so they always sort after it.

use vbase_types::Format;

use crate::error::{StoreError, StoreResult};

pub const VERSION_COLUMN: &str = "v";
pub const SCHEMA_COLUMN: &str = "s";
pub const DATA_COLUMN: &str = "d";
pub const FORMAT_COLUMN: &str = "f";
pub const SEQUENCE_COLUMN: &str = "i";

/// Row holding the sequential-key counter.
pub const SEQUENCE_ROW: [u8; 4] = [0, 0, 0, 0];

/// Start of an unbounded scan; skips [`SEQUENCE_ROW`].
pub const FIRST_DATA_ROW: [u8; 1] = [1];

/// Qualifiers read to reconstruct a row.
pub const ROW_COLUMNS: [&str; 4] = [VERSION_COLUMN, SCHEMA_COLUMN, DATA_COLUMN, FORMAT_COLUMN];

pub fn encode_version(version: u64) -> Vec<u8> {
    version.to_be_bytes().to_vec()
}

pub fn decode_version(bytes: &[u8]) -> Option<u64> {
    let bytes: [u8; 8] = bytes.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

pub fn encode_format(format: Format) -> Vec<u8> {
    format.tag().to_be_bytes().to_vec()
}

/// Decode a format cell. A missing cell means the row predates format tags
/// and is binary.
pub fn decode_format(bytes: Option<&[u8]>) -> StoreResult<Format> {
    let Some(bytes) = bytes else {
        return Ok(Format::Binary);
    };
    let tag: [u8; 4] = bytes.try_into().map_err(|_| StoreError::CorruptRow {
        key: String::new(),
        reason: format!("format cell has {} bytes", bytes.len()),
    })?;
    let tag = u32::from_be_bytes(tag);
    Format::from_tag(tag).ok_or(StoreError::UnknownFormat(tag))
}
