//! # kdzx-core
//!
//! A library for listing and extracting partitions from KDZ firmware containers.
//!
//! This crate provides the core functionality for:
//! - Identifying which of the known container signatures a file carries
//! - Scanning the variable-length, self-terminating header table
//! - Extracting partition payloads byte-for-byte into standalone files
//! - Emitting the parameter file needed to rebuild a compatible container
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`format`]: signature identification and header-record decoding
//! - [`scanner`]: header-table scanning and gap auditing
//! - [`container`]: the extraction session tying the stages together
//! - [`manifest`]: reconstruction parameter emission
//! - [`error`]: error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use kdzx_core::Container;
//!
//! let mut container = Container::open("firmware.kdz")?;
//!
//! for (index, (name, length)) in container.listing().iter().enumerate() {
//!     println!("{index:2} : {name} ({length} bytes)");
//! }
//!
//! container.extract_all("out")?;
//! # Ok::<(), kdzx_core::Error>(())
//! ```
//!
//! ## Extensibility
//!
//! The header-record layout is shared with a companion single-format parser;
//! the [`RecordDecode`] trait keeps the table scanner independent of it, so
//! an alternative layout can be plugged in without touching the scan loop.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod container;
pub mod error;
mod extract;
pub mod format;
pub mod manifest;
pub mod scanner;

// Re-export primary types for convenience
pub use container::{Container, EXTRAS_FILE, PARAMS_FILE};
pub use error::{Error, Result};
pub use format::{HeaderType, PartitionHeader, RecordDecode, StandardDecoder};
pub use manifest::{Manifest, ManifestEntry};
pub use scanner::{GapAudit, PartitionTable, TableScanner};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
