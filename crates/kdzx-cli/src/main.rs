//! kdzx - List and extract partitions from KDZ firmware containers
//!
//! This tool scans a KDZ container's header table and pulls individual
//! partition images, or the whole set, out into standalone files.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kdzx_core::Container;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// List and extract partitions from KDZ firmware containers
#[derive(Parser, Debug)]
#[command(name = "kdzx")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the KDZ container file
    #[arg(short, long)]
    file: PathBuf,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List partitions with their lengths and extraction indices
    List,

    /// Extract a single partition by its listing index
    Extract {
        /// Partition index as shown by `list`
        index: usize,

        /// Output directory for extracted partitions
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Extract every partition, plus gap bytes and the parameter file
    ExtractAll {
        /// Output directory for extracted partitions
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    let mut container = Container::open(&cli.file)
        .with_context(|| format!("failed to open container: {}", cli.file.display()))?;

    match cli.command {
        Command::List => list_partitions(&container),
        Command::Extract { index, output } => extract_single(&mut container, index, &output),
        Command::ExtractAll { output } => extract_all(&mut container, &output),
    }
}

/// Print the partition listing in discovery order
fn list_partitions(container: &Container<File>) -> Result<()> {
    println!("KDZ partition list (format {})", container.header_type());
    println!("=========================================");
    for (index, (name, length)) in container.listing().iter().enumerate() {
        println!("{index:2} : {name} ({length} bytes)");
    }
    Ok(())
}

/// Extract one partition by index
fn extract_single(container: &mut Container<File>, index: usize, output: &Path) -> Result<()> {
    info!(
        "extracting partition {} from {} container",
        index,
        container.header_type()
    );

    let path = container.extract(index, output)?;
    report_artifact(&path)?;
    Ok(())
}

/// Extract every partition, the gap bytes, and the parameter file
fn extract_all(container: &mut Container<File>, output: &Path) -> Result<()> {
    info!(
        "extracting all partitions from {} container",
        container.header_type()
    );

    let paths = container.extract_all(output)?;
    for path in &paths {
        report_artifact(path)?;
    }
    Ok(())
}

/// Print a written artifact together with its content digest
fn report_artifact(path: &Path) -> Result<()> {
    let digest =
        hash_file(path).with_context(|| format!("failed to hash {}", path.display()))?;
    println!("wrote {} (blake3 {})", path.display(), digest);
    Ok(())
}

/// Compute a short content hash of a file (first 16 chars of blake3)
fn hash_file(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = [0u8; 64 * 1024];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hasher.finalize().to_hex()[..16].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    /// Builds a minimal single-partition container image on disk.
    fn write_container(dir: &Path) -> PathBuf {
        let mut image = vec![0x28, 0x05, 0x00, 0x00, 0x34, 0x31, 0x25, 0x80];

        let mut record = vec![0u8; 272];
        record[..4].copy_from_slice(b"boot");
        record[256..264].copy_from_slice(&64u64.to_le_bytes()); // length
        record[264..272].copy_from_slice(&512u64.to_le_bytes()); // offset
        image.extend(record);
        image.push(0x00);

        image.resize(512, 0);
        image.extend([0xabu8; 64]);

        let path = dir.join("fw.kdz");
        File::create(&path).unwrap().write_all(&image).unwrap();
        path
    }

    #[test]
    fn test_extract_single_end_to_end() {
        let tmp = TempDir::new().unwrap();
        let container_path = write_container(tmp.path());
        let outdir = tmp.path().join("out");

        let mut container = Container::open(&container_path).unwrap();
        assert_eq!(container.listing(), vec![("boot".to_string(), 64)]);

        extract_single(&mut container, 0, &outdir).unwrap();
        assert_eq!(std::fs::read(outdir.join("boot")).unwrap(), vec![0xab; 64]);
    }

    #[test]
    fn test_hash_file_is_stable() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.bin");
        std::fs::write(&path, b"hello").unwrap();

        let first = hash_file(&path).unwrap();
        let second = hash_file(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 16);

        let other = tmp.path().join("other.bin");
        std::fs::write(&other, b"world").unwrap();
        assert_ne!(first, hash_file(&other).unwrap());
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
