//! Reconstruction parameter emission.
//!
//! A rebuilt container must lay payloads out in physical order while the
//! header table may list them in a different, logical order. The parameter
//! file records both orderings: partitions appear sorted by ascending
//! payload offset, each carrying the index of its original header-table
//! record.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::format::HeaderType;
use crate::scanner::PartitionTable;

/// One partition entry, in ascending physical-offset order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Partition name
    pub name: String,
    /// Payload offset within the original container
    pub offset: u64,
    /// Index of the partition's record in the header table
    pub header_index: usize,
}

/// Parameters needed to rebuild a compatible container
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Name of the source container file
    pub source: String,
    /// Header-format ordinal
    pub version: u8,
    /// Lowest payload offset
    pub data_start: u64,
    /// Partitions sorted by ascending payload offset
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Builds a manifest from a scanned table
    pub fn new(source: &str, header_type: HeaderType, table: &PartitionTable) -> Self {
        let mut entries: Vec<ManifestEntry> = table
            .partitions
            .iter()
            .enumerate()
            .map(|(header_index, p)| ManifestEntry {
                name: p.name_lossy().into_owned(),
                offset: p.offset,
                header_index,
            })
            .collect();
        entries.sort_by_key(|entry| entry.offset);

        Self {
            source: source.to_string(),
            version: header_type.version(),
            data_start: table.payload_start,
            entries,
        }
    }

    /// Writes the line-oriented key=value parameter format
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writeln!(writer, "# saved parameters from the file \"{}\"", self.source)?;
        writeln!(writer, "version={}", self.version)?;
        writeln!(
            writer,
            "# note, this is actually quite fluid, dataStart just needs to be large enough"
        )?;
        writeln!(
            writer,
            "# for headers not to overwrite data; roughly 16 bytes for overhead plus 272"
        )?;
        writeln!(
            writer,
            "# bytes per file should be sufficient (but not match original)"
        )?;
        writeln!(writer, "dataStart={}", self.data_start)?;
        writeln!(writer, "# embedded files")?;

        for (i, entry) in self.entries.iter().enumerate() {
            writeln!(writer, "payload{}={}", i, entry.name)?;
            writeln!(writer, "payload{}head={}", i, entry.header_index)?;
        }

        Ok(())
    }

    /// Writes the parameter file at `path`
    ///
    /// Failures are surfaced as [`Error::FileWrite`], never swallowed.
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::file_write(path, e))?;
        self.write_to(file).map_err(|e| Error::file_write(path, e))
    }
}
