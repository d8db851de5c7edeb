//! The shared fixed-width header-record layout.
//!
//! Each table entry is one 272-byte record:
//!
//! | Bytes | Field | Constraint |
//! |---|---|---|
//! | 0..32 | `name` | zero-padded byte string, no embedded NUL after trimming |
//! | 32..256 | `reserved` | must decode to all zero bytes |
//! | 256..264 | `length` | payload byte count, little-endian u64 |
//! | 264..272 | `offset` | absolute payload offset, little-endian u64 |
//!
//! The layout is owned by the same definition the companion DZ parser uses;
//! [`RecordDecode`] keeps it behind a capability boundary so the scanner
//! never depends on field widths directly.

use byteorder::{ByteOrder, LittleEndian};
use std::borrow::Cow;

use crate::error::{Error, Result};

/// Size in bytes of one encoded header record
pub const RECORD_LEN: usize = 272;

const NAME_LEN: usize = 32;
const RESERVED_LEN: usize = 224;
const LENGTH_POS: usize = NAME_LEN + RESERVED_LEN;
const OFFSET_POS: usize = LENGTH_POS + 8;

/// One decoded partition header, immutable once validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionHeader {
    /// Partition name, trimmed of trailing NUL padding
    pub name: Vec<u8>,
    /// Absolute byte offset of the payload within the container
    pub offset: u64,
    /// Payload length in bytes
    pub length: u64,
}

impl PartitionHeader {
    /// Partition name rendered for display and output-file naming
    pub fn name_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }
}

/// Capability for decoding one fixed-width header record
///
/// The table scanner is generic over this trait so an alternative record
/// layout can be plugged in without touching the scan loop.
pub trait RecordDecode {
    /// Size in bytes of one encoded record
    fn record_len(&self) -> usize;

    /// Decodes a record from `buf`
    ///
    /// `record_offset` is the record's byte position within the container,
    /// used for error reporting only.
    fn decode(&self, buf: &[u8], record_offset: u64) -> Result<PartitionHeader>;
}

/// Decoder for the shared 272-byte record layout
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDecoder;

impl RecordDecode for StandardDecoder {
    fn record_len(&self) -> usize {
        RECORD_LEN
    }

    fn decode(&self, buf: &[u8], record_offset: u64) -> Result<PartitionHeader> {
        debug_assert_eq!(buf.len(), RECORD_LEN);

        let name = trim_name(&buf[..NAME_LEN], record_offset)?;

        let reserved = &buf[NAME_LEN..LENGTH_POS];
        if let Some(pos) = reserved.iter().position(|&b| b != 0) {
            return Err(Error::malformed_header(
                record_offset,
                "reserved",
                format!("is non-zero (0x{:02x} at byte {})", reserved[pos], pos),
            ));
        }

        let length = LittleEndian::read_u64(&buf[LENGTH_POS..OFFSET_POS]);
        let offset = LittleEndian::read_u64(&buf[OFFSET_POS..RECORD_LEN]);

        Ok(PartitionHeader {
            name,
            offset,
            length,
        })
    }
}

/// Strips trailing NUL padding; an embedded NUL in what remains means the
/// field cannot be a valid name.
fn trim_name(raw: &[u8], record_offset: u64) -> Result<Vec<u8>> {
    let end = raw.iter().rposition(|&b| b != 0).map_or(0, |pos| pos + 1);
    let name = &raw[..end];

    if name.contains(&0) {
        return Err(Error::malformed_header(
            record_offset,
            "name",
            "contains an embedded NUL byte".to_string(),
        ));
    }

    Ok(name.to_vec())
}

/// Builds an encoded record for test containers
#[cfg(test)]
pub(crate) fn encode_record(name: &[u8], offset: u64, length: u64) -> Vec<u8> {
    assert!(name.len() <= NAME_LEN);
    let mut buf = vec![0u8; RECORD_LEN];
    buf[..name.len()].copy_from_slice(name);
    LittleEndian::write_u64(&mut buf[LENGTH_POS..OFFSET_POS], length);
    LittleEndian::write_u64(&mut buf[OFFSET_POS..RECORD_LEN], offset);
    buf
}
