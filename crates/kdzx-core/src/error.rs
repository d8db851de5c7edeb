//! Error types for the kdzx-core library.
//!
//! This module provides comprehensive error handling using the `thiserror` crate,
//! with detailed error variants for different failure modes.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for kdzx operations
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all kdzx operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The container's leading signature is not in the known-signature table
    #[error("unsupported container format: signature was {}", hex::encode(.signature))]
    UnsupportedFormat {
        /// The 8 leading bytes actually observed
        signature: [u8; 8],
    },

    /// A header record failed structural validation
    #[error("malformed header record at offset {offset}: field '{field}' {detail}")]
    MalformedHeader {
        /// Byte offset of the record within the container
        offset: u64,
        /// Name of the offending field
        field: &'static str,
        /// Description of the observed value
        detail: String,
    },

    /// The header table ends at or past the payload region
    #[error("inconsistent layout: header table ends at {header_end} but payload starts at {payload_start}")]
    InconsistentLayout {
        /// Stream position after the last consumed table byte
        header_end: u64,
        /// Lowest payload offset across all partitions
        payload_start: u64,
    },

    /// Caller supplied a partition index outside the discovered table
    #[error("partition index {index} is out of range ({count} partitions)")]
    IndexOutOfRange {
        /// The requested index
        index: usize,
        /// Number of partitions the container actually holds
        count: usize,
    },

    /// The source stream ended before a partition's declared length was copied
    #[error("truncated payload for partition '{name}': expected {expected} bytes, copied {actual}")]
    TruncatedPayload {
        /// Name of the partition being extracted
        name: String,
        /// Declared payload length
        expected: u64,
        /// Bytes actually copied before the stream ended
        actual: u64,
    },

    /// A decoded partition name would escape the output directory
    #[error("unsafe partition name '{name}' would escape the output directory")]
    UnsafeName {
        /// The offending name
        name: String,
    },

    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write output file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        /// Path to the file that failed to write
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to create output directory
    #[error("failed to create directory '{path}': {source}")]
    DirectoryCreate {
        /// Path to the directory that failed to create
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// I/O failure on the container stream itself
    #[error("container read failed at offset {offset}: {source}")]
    SourceRead {
        /// Stream offset at which the read failed
        offset: u64,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Creates a new malformed header error
    pub fn malformed_header(offset: u64, field: &'static str, detail: impl Into<String>) -> Self {
        Self::MalformedHeader {
            offset,
            field,
            detail: detail.into(),
        }
    }

    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new file write error
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a new directory creation error
    pub fn directory_create(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryCreate {
            path: path.into(),
            source,
        }
    }

    /// Creates a new container read error
    pub fn source_read(offset: u64, source: std::io::Error) -> Self {
        Self::SourceRead { offset, source }
    }

    /// Returns true if the container itself cannot be trusted past this error
    ///
    /// Scan-time failures poison the whole session; extraction-time failures
    /// only abort the extraction that raised them.
    pub fn is_scan_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat { .. }
                | Self::MalformedHeader { .. }
                | Self::InconsistentLayout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_display() {
        let err = Error::UnsupportedFormat {
            signature: [0xde, 0xad, 0xbe, 0xef, 0x00, 0x11, 0x22, 0x33],
        };
        assert!(err.to_string().contains("deadbeef00112233"));
    }

    #[test]
    fn test_malformed_header_display() {
        let err = Error::malformed_header(8, "reserved", "is non-zero");
        let msg = err.to_string();
        assert!(msg.contains("offset 8"));
        assert!(msg.contains("'reserved'"));
    }

    #[test]
    fn test_is_scan_fatal() {
        assert!(Error::malformed_header(0, "name", "bad").is_scan_fatal());
        assert!(!Error::IndexOutOfRange { index: 5, count: 2 }.is_scan_fatal());
    }
}
