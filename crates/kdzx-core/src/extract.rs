//! Length-exact payload extraction and gap persistence.
//!
//! Payloads are copied in bounded chunks with the final chunk truncated to
//! land precisely on the declared byte boundary, so an output artifact is
//! byte-for-byte the source range `offset..offset + length` and never a
//! byte more.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::format::PartitionHeader;
use crate::scanner::GapAudit;

/// Chunk size for partition payload copies
const COPY_CHUNK: usize = 1024;

/// Chunk size for gap persistence
const EXTRAS_CHUNK: usize = 4096;

/// Copies one partition's payload range into `outdir`.
///
/// Creates `outdir` recursively if absent. The output file is named by the
/// decoded partition name; returns its path. A partition with length zero
/// produces an empty file. If the source ends early, the partial output is
/// left on disk and [`Error::TruncatedPayload`] reports how far the copy got.
pub(crate) fn extract_partition<R: Read + Seek>(
    source: &mut R,
    header: &PartitionHeader,
    outdir: &Path,
) -> Result<PathBuf> {
    let name = header.name_lossy().into_owned();
    ensure_bare_name(&name)?;

    fs::create_dir_all(outdir).map_err(|e| Error::directory_create(outdir, e))?;
    let dest = outdir.join(&name);

    source
        .seek(SeekFrom::Start(header.offset))
        .map_err(|e| Error::source_read(header.offset, e))?;
    let mut out = File::create(&dest).map_err(|e| Error::file_write(&dest, e))?;

    let mut buf = [0u8; COPY_CHUNK];
    let mut remaining = header.length;
    while remaining > 0 {
        let want = remaining.min(COPY_CHUNK as u64) as usize;
        let copied = header.length - remaining;
        let got = source
            .read(&mut buf[..want])
            .map_err(|e| Error::source_read(header.offset + copied, e))?;
        if got == 0 {
            return Err(Error::TruncatedPayload {
                name,
                expected: header.length,
                actual: copied,
            });
        }
        out.write_all(&buf[..got])
            .map_err(|e| Error::file_write(&dest, e))?;
        remaining -= got as u64;
    }

    debug!(
        "extracted '{}' ({} bytes) to {}",
        name,
        header.length,
        dest.display()
    );
    Ok(dest)
}

/// Preserves the full gap range to `dest`.
///
/// Invoked during full extraction when the audit flagged non-zero content.
pub(crate) fn save_extras<R: Read + Seek>(
    source: &mut R,
    gap: &GapAudit,
    dest: &Path,
) -> Result<()> {
    debug!(
        "preserving {} gap bytes to {}",
        gap.persist_len,
        dest.display()
    );

    source
        .seek(SeekFrom::Start(gap.start))
        .map_err(|e| Error::source_read(gap.start, e))?;
    let mut out = File::create(dest).map_err(|e| Error::file_write(dest, e))?;

    let mut buf = [0u8; EXTRAS_CHUNK];
    let mut remaining = gap.persist_len;
    while remaining > 0 {
        let want = remaining.min(EXTRAS_CHUNK as u64) as usize;
        let copied = gap.persist_len - remaining;
        let got = source
            .read(&mut buf[..want])
            .map_err(|e| Error::source_read(gap.start + copied, e))?;
        if got == 0 {
            return Err(Error::source_read(
                gap.start + copied,
                io::Error::new(io::ErrorKind::UnexpectedEof, "gap range past end of container"),
            ));
        }
        out.write_all(&buf[..got])
            .map_err(|e| Error::file_write(dest, e))?;
        remaining -= got as u64;
    }

    Ok(())
}

/// A partition name must stay a bare file name inside the output directory.
fn ensure_bare_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        return Err(Error::UnsafeName {
            name: name.to_string(),
        });
    }
    Ok(())
}
