//! Container format identification.
//!
//! A KDZ container opens with one of three known 8-byte signatures; the
//! signature selects the header dialect. The header-record layout itself is
//! shared with the companion single-format DZ parser and lives in [`record`].
//!
//! ## Signature table
//!
//! | Signature | Dialect |
//! |---|---|
//! | `28 05 00 00 34 31 25 80` | [`HeaderType::V0`] |
//! | `18 05 00 00 32 79 44 50` | [`HeaderType::V1`] |
//! | `28 05 00 00 24 38 22 25` | [`HeaderType::V2`] (shared DZ magic) |

mod record;

use std::fmt;
use std::io::Read;

use tracing::debug;

use crate::error::{Error, Result};

pub use record::{PartitionHeader, RecordDecode, StandardDecoder, RECORD_LEN};

#[cfg(test)]
pub(crate) use record::encode_record;

/// Signature of a version-0 container
pub const MAGIC_V0: [u8; 8] = [0x28, 0x05, 0x00, 0x00, 0x34, 0x31, 0x25, 0x80];

/// Signature of a version-1 container
pub const MAGIC_V1: [u8; 8] = [0x18, 0x05, 0x00, 0x00, 0x32, 0x79, 0x44, 0x50];

/// Signature of a version-2 container (the DZ magic, shared with the
/// companion single-format parser)
pub const MAGIC_V2: [u8; 8] = [0x28, 0x05, 0x00, 0x00, 0x24, 0x38, 0x22, 0x25];

/// Header dialect of a container, selected by its leading signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderType {
    /// Original format
    V0,
    /// Updated format
    V1,
    /// DZ-magic format
    V2,
}

impl HeaderType {
    /// Numeric ordinal recorded in the reconstruction parameter file
    pub fn version(self) -> u8 {
        match self {
            Self::V0 => 0,
            Self::V1 => 1,
            Self::V2 => 2,
        }
    }

    /// Looks up a signature in the known-signature table
    pub fn from_signature(signature: &[u8; 8]) -> Option<Self> {
        match *signature {
            MAGIC_V0 => Some(Self::V0),
            MAGIC_V1 => Some(Self::V1),
            MAGIC_V2 => Some(Self::V2),
            _ => None,
        }
    }
}

impl fmt::Display for HeaderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.version())
    }
}

/// Reads the leading 8 bytes of `source` and identifies the header dialect.
///
/// Advances the stream position past the signature. An unknown signature
/// fails with [`Error::UnsupportedFormat`] carrying the observed bytes.
pub fn identify<R: Read>(source: &mut R) -> Result<HeaderType> {
    let mut signature = [0u8; 8];
    source
        .read_exact(&mut signature)
        .map_err(|e| Error::source_read(0, e))?;

    match HeaderType::from_signature(&signature) {
        Some(header_type) => {
            debug!("identified {} container", header_type);
            Ok(header_type)
        }
        None => Err(Error::UnsupportedFormat { signature }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_signature_table() {
        assert_eq!(HeaderType::from_signature(&MAGIC_V0), Some(HeaderType::V0));
        assert_eq!(HeaderType::from_signature(&MAGIC_V1), Some(HeaderType::V1));
        assert_eq!(HeaderType::from_signature(&MAGIC_V2), Some(HeaderType::V2));
        assert_eq!(HeaderType::from_signature(&[0u8; 8]), None);
    }

    #[test]
    fn test_version_ordinals() {
        assert_eq!(HeaderType::V0.version(), 0);
        assert_eq!(HeaderType::V1.version(), 1);
        assert_eq!(HeaderType::V2.version(), 2);
    }

    #[test]
    fn test_identify_advances_past_signature() {
        let mut data = MAGIC_V0.to_vec();
        data.extend_from_slice(b"rest");
        let mut cursor = Cursor::new(data);

        let header_type = identify(&mut cursor).unwrap();
        assert_eq!(header_type, HeaderType::V0);
        assert_eq!(cursor.position(), 8);
    }

    #[test]
    fn test_identify_unknown_signature() {
        let raw = [0xca, 0xfe, 0xba, 0xbe, 0x01, 0x02, 0x03, 0x04];
        let mut cursor = Cursor::new(raw.to_vec());

        match identify(&mut cursor) {
            Err(Error::UnsupportedFormat { signature }) => assert_eq!(signature, raw),
            other => panic!("expected UnsupportedFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_identify_short_input() {
        let mut cursor = Cursor::new(vec![0x28, 0x05]);
        assert!(matches!(
            identify(&mut cursor),
            Err(Error::SourceRead { offset: 0, .. })
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(HeaderType::V2.to_string(), "v2");
    }
}
