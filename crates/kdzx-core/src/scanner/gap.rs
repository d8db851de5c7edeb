//! Auditing of the byte range between the header table and the payload.
//!
//! Some containers carry undocumented bytes between the end of the header
//! table and the first payload. The audit flags such content so a full
//! extraction can preserve it; it never interprets it.

use std::io::Read;

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Audit of the byte range between header-table end and payload start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapAudit {
    /// First byte of the gap (the header-table end offset)
    pub start: u64,
    /// Length of the audited range
    ///
    /// One byte shorter than [`persist_len`](Self::persist_len): the final
    /// control byte counts as table framing, not gap content.
    pub audited_len: u64,
    /// Length of the full range preserved by a full extraction
    pub persist_len: u64,
    /// Whether the audited range contains any non-zero byte
    pub has_data: bool,
}

/// Reads the audited range from `source`, which must be positioned at
/// `header_end`, and flags any non-zero content.
///
/// Callers guarantee `payload_start > header_end`.
pub(crate) fn audit<R: Read>(
    source: &mut R,
    header_end: u64,
    payload_start: u64,
) -> Result<GapAudit> {
    let audited_len = payload_start - header_end - 1;
    let persist_len = payload_start - header_end;

    let mut buf = vec![0u8; audited_len as usize];
    source
        .read_exact(&mut buf)
        .map_err(|e| Error::source_read(header_end, e))?;

    let has_data = buf.iter().any(|&b| b != 0);
    if has_data {
        warn!(
            "data between header table and payload (offsets {} to {})",
            header_end, payload_start
        );
    } else {
        debug!("gap {}..{} is all zero", header_end, payload_start);
    }

    Ok(GapAudit {
        start: header_end,
        audited_len,
        persist_len,
        has_data,
    })
}
