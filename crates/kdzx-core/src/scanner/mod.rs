//! Header-table scanning.
//!
//! This module builds the ordered partition list from a container whose
//! header table is variable-length and self-terminating.
//!
//! ## Algorithm Overview
//!
//! 1. Decode one fixed-size header record via a [`RecordDecode`] capability
//! 2. Read the single byte that follows it: `0x03` announces exactly one
//!    further record, `0x00` ends the table immediately, and anything else
//!    is the first byte of the next record and is pushed back
//! 3. Track the running minimum payload offset while scanning
//! 4. Audit the byte range between the end of the table and the lowest
//!    payload offset
//!
//! The termination protocol is easy to get subtly wrong, so it is modeled
//! as an explicit three-state machine rather than flag variables.

mod gap;

use std::io::{Read, Seek, SeekFrom};

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::format::{PartitionHeader, RecordDecode};

pub use gap::GapAudit;

/// Control byte announcing exactly one further header record
const CTRL_LAST: u8 = 0x03;

/// Control byte ending the header table immediately
const CTRL_END: u8 = 0x00;

/// Termination state of the table scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// More records may follow
    Reading,
    /// Exactly one further record follows, then the table ends
    LastPending,
    /// The table is exhausted
    Done,
}

/// Result of scanning a container's header table
///
/// Built once by [`TableScanner::scan`] and handed immutably to the
/// extraction and manifest stages.
#[derive(Debug, Clone)]
pub struct PartitionTable {
    /// Discovered partition headers, in table-discovery order
    pub partitions: Vec<PartitionHeader>,
    /// Lowest payload offset across all partitions
    pub payload_start: u64,
    /// Stream position after the last consumed table byte
    pub header_end: u64,
    /// Audit of the byte range between table end and payload start
    pub gap: GapAudit,
}

/// Scanner for the variable-length, self-terminating header table
#[derive(Debug, Clone, Copy, Default)]
pub struct TableScanner<D> {
    decoder: D,
}

impl<D: RecordDecode> TableScanner<D> {
    /// Creates a scanner over the given record-decoder capability
    pub fn new(decoder: D) -> Self {
        Self { decoder }
    }

    /// Consumes the header table starting at the current stream position,
    /// then audits the gap up to the lowest payload offset.
    ///
    /// Decoder failures abort the scan: a corrupt record means the table
    /// structure cannot be trusted past it.
    pub fn scan<R: Read + Seek>(&self, source: &mut R) -> Result<PartitionTable> {
        let mut partitions = Vec::new();
        let mut payload_start = u64::MAX;
        let mut record_buf = vec![0u8; self.decoder.record_len()];
        let mut pos = source
            .stream_position()
            .map_err(|e| Error::source_read(0, e))?;
        let mut state = ScanState::Reading;

        debug!("scanning header table at offset {}", pos);

        while state != ScanState::Done {
            source
                .read_exact(&mut record_buf)
                .map_err(|e| Error::source_read(pos, e))?;
            let record = self.decoder.decode(&record_buf, pos)?;
            pos += record_buf.len() as u64;

            trace!(
                "record {}: '{}' offset={} length={}",
                partitions.len(),
                record.name_lossy(),
                record.offset,
                record.length
            );

            payload_start = payload_start.min(record.offset);
            partitions.push(record);

            let finishing = state == ScanState::LastPending;

            // The byte after a record is only a marker if it matches one of
            // the two control values; otherwise it already belongs to the
            // next record. This check still runs after the final record so
            // that a trailing marker is consumed as table framing.
            match next_marker(source, pos)? {
                Some(CTRL_LAST) => {
                    pos += 1;
                    state = ScanState::LastPending;
                }
                Some(CTRL_END) => {
                    pos += 1;
                    state = ScanState::Done;
                }
                _ => {}
            }

            if finishing {
                state = ScanState::Done;
            }
        }

        let header_end = pos;
        debug!(
            "scan complete: {} partitions, header table ends at {}, payload starts at {}",
            partitions.len(),
            header_end,
            payload_start
        );

        // The audited gap length is payload_start - header_end - 1; a
        // negative value means the table runs into the payload region.
        if payload_start <= header_end {
            return Err(Error::InconsistentLayout {
                header_end,
                payload_start,
            });
        }

        let gap = gap::audit(source, header_end, payload_start)?;

        Ok(PartitionTable {
            partitions,
            payload_start,
            header_end,
            gap,
        })
    }
}

/// Reads the byte following a record.
///
/// Marker bytes are consumed and returned; anything else is pushed back
/// onto the stream and `None` is returned.
fn next_marker<R: Read + Seek>(source: &mut R, pos: u64) -> Result<Option<u8>> {
    let mut byte = [0u8; 1];
    source
        .read_exact(&mut byte)
        .map_err(|e| Error::source_read(pos, e))?;

    match byte[0] {
        CTRL_LAST | CTRL_END => Ok(Some(byte[0])),
        _ => {
            source
                .seek(SeekFrom::Current(-1))
                .map_err(|e| Error::source_read(pos, e))?;
            Ok(None)
        }
    }
}
