//! Command-line interface for otapack

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "otapack")]
#[command(about = "Otapack - archive and OTA payload toolbox", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new archive from files or directories
    Create {
        /// Output archive file (.zip, .tar, .tar.gz/.tgz, .tar.bz2/.tbz2)
        #[arg(short, long)]
        output: PathBuf,

        /// Input files or directories (can be specified multiple times)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Base path stripped from entry names (defaults to the first
        /// input's parent directory)
        #[arg(long)]
        base: Option<PathBuf>,

        /// Compression level: store, fastest, fast, normal, good, best
        /// (applies to ZIP; tarball compression is chosen by the suffix)
        #[arg(long, default_value = "normal")]
        level: String,
    },

    /// Extract an archive
    Extract {
        /// Input archive file
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List archive contents
    List {
        /// Archive file
        archive: PathBuf,

        /// List an archive stored inside the archive instead
        /// (entry name, e.g. "inner.zip")
        #[arg(long)]
        nested: Option<String>,
    },

    /// Inspect an Android OTA payload.bin
    Payload {
        /// Payload file
        file: PathBuf,

        /// Also compute the SHA-256 of the whole file
        #[arg(long)]
        checksum: bool,
    },
}
