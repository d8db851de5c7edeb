//! One extraction session over an opened container.
//!
//! A [`Container`] owns its source stream and everything the scan
//! discovered: the partition table, the payload-region boundary, and the
//! gap audit. All downstream operations (listing, extraction, manifest
//! emission) read from this one session; nothing is shared across sessions.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::extract;
use crate::format::{self, HeaderType, StandardDecoder};
use crate::manifest::Manifest;
use crate::scanner::{PartitionTable, TableScanner};

/// File name of the preserved gap bytes, written on full extraction
pub const EXTRAS_FILE: &str = "kdz_extras.bin";

/// File name of the reconstruction parameter file, written on full extraction
pub const PARAMS_FILE: &str = ".kdz.params";

/// An opened container with its scanned partition table
pub struct Container<R> {
    source: R,
    label: String,
    header_type: HeaderType,
    total_len: u64,
    table: PartitionTable,
}

impl Container<File> {
    /// Opens a container file and scans its header table
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::file_read(path, e))?;
        Self::from_reader(file, path.display().to_string())
    }
}

impl<R: Read + Seek> Container<R> {
    /// Scans a container from any seekable source.
    ///
    /// `label` names the source in the reconstruction parameter file.
    pub fn from_reader(mut source: R, label: impl Into<String>) -> Result<Self> {
        let total_len = source
            .seek(SeekFrom::End(0))
            .map_err(|e| Error::source_read(0, e))?;
        source
            .seek(SeekFrom::Start(0))
            .map_err(|e| Error::source_read(0, e))?;

        let header_type = format::identify(&mut source)?;
        let table = TableScanner::new(StandardDecoder).scan(&mut source)?;

        debug!(
            "opened {} container ({} bytes, {} partitions)",
            header_type,
            total_len,
            table.partitions.len()
        );

        Ok(Self {
            source,
            label: label.into(),
            header_type,
            total_len,
            table,
        })
    }

    /// Header dialect identified from the leading signature
    pub fn header_type(&self) -> HeaderType {
        self.header_type
    }

    /// Total length of the container in bytes
    pub fn total_len(&self) -> u64 {
        self.total_len
    }

    /// Source label recorded in the reconstruction parameter file
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The scanned partition table
    pub fn table(&self) -> &PartitionTable {
        &self.table
    }

    /// Ordered (name, length) pairs in table-discovery order
    ///
    /// The position of a pair in this listing is the index accepted by
    /// [`extract`](Self::extract).
    pub fn listing(&self) -> Vec<(String, u64)> {
        self.table
            .partitions
            .iter()
            .map(|p| (p.name_lossy().into_owned(), p.length))
            .collect()
    }

    /// Extracts one partition by discovery index into `outdir`.
    ///
    /// Returns the path of the written artifact. An out-of-range index
    /// fails before anything is created on disk.
    pub fn extract(&mut self, index: usize, outdir: impl AsRef<Path>) -> Result<PathBuf> {
        let count = self.table.partitions.len();
        let header = self
            .table
            .partitions
            .get(index)
            .cloned()
            .ok_or(Error::IndexOutOfRange { index, count })?;

        extract::extract_partition(&mut self.source, &header, outdir.as_ref())
    }

    /// Extracts every partition in discovery order, then persists any
    /// non-zero gap bytes and writes the reconstruction parameter file.
    ///
    /// A failure aborts the remaining sequence; partitions extracted before
    /// it remain on disk.
    pub fn extract_all(&mut self, outdir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let outdir = outdir.as_ref();
        let count = self.table.partitions.len();

        debug!("extracting {} partitions to {}", count, outdir.display());

        let mut written = Vec::with_capacity(count);
        for index in 0..count {
            written.push(self.extract(index, outdir)?);
        }

        if self.table.gap.has_data {
            extract::save_extras(&mut self.source, &self.table.gap, &outdir.join(EXTRAS_FILE))?;
        }

        let manifest = Manifest::new(&self.label, self.header_type, &self.table);
        manifest.write_file(&outdir.join(PARAMS_FILE))?;

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{encode_record, MAGIC_V0, MAGIC_V1};
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    struct Part {
        name: &'static [u8],
        offset: u64,
        payload: Vec<u8>,
    }

    /// Builds a complete container image: magic, header table (records in
    /// the given order, end marker), zero gap fill, payloads at their
    /// offsets.
    fn build(magic: [u8; 8], parts: &[Part], total: u64) -> Vec<u8> {
        let mut image = magic.to_vec();
        for part in parts {
            image.extend(encode_record(
                part.name,
                part.offset,
                part.payload.len() as u64,
            ));
        }
        image.push(0x00);
        image.resize(total as usize, 0);
        for part in parts {
            let start = part.offset as usize;
            image[start..start + part.payload.len()].copy_from_slice(&part.payload);
        }
        image
    }

    fn two_part_image() -> Vec<u8> {
        build(
            MAGIC_V0,
            &[
                Part {
                    name: b"boot",
                    offset: 1000,
                    payload: vec![0xaa; 100],
                },
                Part {
                    name: b"system",
                    offset: 1100,
                    payload: vec![0xbb; 200],
                },
            ],
            1300,
        )
    }

    fn open(image: Vec<u8>) -> Container<Cursor<Vec<u8>>> {
        Container::from_reader(Cursor::new(image), "test.kdz").unwrap()
    }

    #[test]
    fn test_listing_in_discovery_order() {
        let container = open(two_part_image());

        assert_eq!(container.header_type(), HeaderType::V0);
        assert_eq!(container.total_len(), 1300);
        assert_eq!(
            container.listing(),
            vec![("boot".to_string(), 100), ("system".to_string(), 200)]
        );
        assert_eq!(container.table().payload_start, 1000);
    }

    #[test]
    fn test_extract_single_partition() {
        let mut container = open(two_part_image());
        let outdir = TempDir::new().unwrap();

        let path = container.extract(1, outdir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "system");
        assert_eq!(fs::read(&path).unwrap(), vec![0xbb; 200]);
        // Single extraction writes neither extras nor parameters.
        assert!(!outdir.path().join(PARAMS_FILE).exists());
        assert!(!outdir.path().join(EXTRAS_FILE).exists());
    }

    #[test]
    fn test_extract_out_of_range_creates_nothing() {
        let mut container = open(two_part_image());
        let tmp = TempDir::new().unwrap();
        let outdir = tmp.path().join("out");

        let err = container.extract(5, &outdir).unwrap_err();
        assert!(matches!(
            err,
            Error::IndexOutOfRange { index: 5, count: 2 }
        ));
        assert!(!outdir.exists());
    }

    #[test]
    fn test_extract_all_writes_partitions_and_params() {
        let mut container = open(two_part_image());
        let outdir = TempDir::new().unwrap();

        let written = container.extract_all(outdir.path()).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(fs::read(outdir.path().join("boot")).unwrap(), vec![0xaa; 100]);
        assert_eq!(
            fs::read(outdir.path().join("system")).unwrap(),
            vec![0xbb; 200]
        );

        let params = fs::read_to_string(outdir.path().join(PARAMS_FILE)).unwrap();
        assert!(params.contains("version=0"));
        assert!(params.contains("dataStart=1000"));
        assert!(params.contains("payload0=boot\npayload0head=0\n"));
        assert!(params.contains("payload1=system\npayload1head=1\n"));

        // All-zero gap: no extras artifact.
        assert!(!outdir.path().join(EXTRAS_FILE).exists());
    }

    #[test]
    fn test_extract_all_preserves_dirty_gap() {
        // 16-byte gap between table end and payload, one non-zero byte in
        // the audited part.
        let mut image = two_part_image();
        let header_end = 8 + 2 * 272 + 1;
        image[header_end] = 0x42;
        let mut container = open(image.clone());
        let outdir = TempDir::new().unwrap();

        assert!(container.table().gap.has_data);
        container.extract_all(outdir.path()).unwrap();

        let extras = fs::read(outdir.path().join(EXTRAS_FILE)).unwrap();
        assert_eq!(extras.len() as u64, 1000 - header_end as u64);
        assert_eq!(extras, image[header_end..1000].to_vec());
    }

    #[test]
    fn test_manifest_orders_by_physical_offset() {
        // Header table lists system first, but boot sits lower in the file.
        let image = build(
            MAGIC_V1,
            &[
                Part {
                    name: b"system",
                    offset: 1100,
                    payload: vec![2; 8],
                },
                Part {
                    name: b"boot",
                    offset: 1000,
                    payload: vec![1; 8],
                },
            ],
            1200,
        );
        let mut container = open(image);
        let outdir = TempDir::new().unwrap();

        container.extract_all(outdir.path()).unwrap();
        let params = fs::read_to_string(outdir.path().join(PARAMS_FILE)).unwrap();

        assert!(params.contains("version=1"));
        assert!(params.contains("payload0=boot\npayload0head=1\n"));
        assert!(params.contains("payload1=system\npayload1head=0\n"));
    }

    #[test]
    fn test_extract_all_is_idempotent() {
        let mut container = open(two_part_image());
        let outdir = TempDir::new().unwrap();

        container.extract_all(outdir.path()).unwrap();
        let first_boot = fs::read(outdir.path().join("boot")).unwrap();
        let first_params = fs::read(outdir.path().join(PARAMS_FILE)).unwrap();

        container.extract_all(outdir.path()).unwrap();
        assert_eq!(fs::read(outdir.path().join("boot")).unwrap(), first_boot);
        assert_eq!(
            fs::read(outdir.path().join(PARAMS_FILE)).unwrap(),
            first_params
        );
    }

    #[test]
    fn test_zero_length_partition_extracts_empty_file() {
        let image = build(
            MAGIC_V0,
            &[
                Part {
                    name: b"empty",
                    offset: 1000,
                    payload: Vec::new(),
                },
                Part {
                    name: b"boot",
                    offset: 1000,
                    payload: vec![9; 16],
                },
            ],
            1100,
        );
        let mut container = open(image);
        let outdir = TempDir::new().unwrap();

        let path = container.extract(0, outdir.path()).unwrap();
        assert_eq!(fs::read(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_truncated_payload_aborts_extraction() {
        // Declared length runs past the end of the container.
        let mut image = two_part_image();
        image.truncate(1200);
        let mut container = open(image);
        let outdir = TempDir::new().unwrap();

        let err = container.extract_all(outdir.path()).unwrap_err();
        assert!(matches!(err, Error::TruncatedPayload { .. }));
        // The earlier partition and the partial one remain on disk; the
        // parameter file was never reached.
        assert!(outdir.path().join("boot").exists());
        assert!(!outdir.path().join(PARAMS_FILE).exists());
    }

    #[test]
    fn test_unknown_signature_rejected() {
        let mut image = two_part_image();
        image[..8].copy_from_slice(&[0u8; 8]);

        let err = Container::from_reader(Cursor::new(image), "bad.kdz").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }
}
