//! Otapack - archive and OTA payload toolbox

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use otapack_core::{
    list_archive_contents, list_nested_archive_contents, CompressionLevel, CreateSession,
    ExtractSession, ExtractionState,
};
use std::path::PathBuf;

mod cli;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Create {
            output,
            inputs,
            base,
            level,
        } => {
            let level = parse_level(&level)?;
            let base = base
                .or_else(|| {
                    inputs
                        .first()
                        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                })
                .unwrap_or_else(|| PathBuf::from("."));

            println!("Otapack - Creating archive: {}", output.display());
            println!("Input sources: {} items", inputs.len());
            println!();

            let pb = progress_bar();
            let session = CreateSession::spawn(output.clone(), inputs, base, level);

            let mut last = None;
            for snapshot in session.progress().iter() {
                pb.set_position(u64::from(snapshot.percentage));
                pb.set_message(snapshot.current_file.clone());
                last = Some(snapshot);
            }
            session.wait()?;
            pb.finish_with_message("Complete");

            let bytes_in = last.as_ref().map(|s| s.bytes_processed).unwrap_or(0);
            let files = last.as_ref().map(|s| s.files_processed).unwrap_or(0);
            let bytes_out = std::fs::metadata(&output).map(|m| m.len()).unwrap_or(0);
            println!();
            println!("Archive creation complete!");
            println!("  Files: {}", files);
            println!("  Original size: {} bytes", bytes_in);
            println!("  Archive size: {} bytes", bytes_out);
            if bytes_in > 0 {
                println!("  Ratio: {:.2}%", (bytes_out as f64 / bytes_in as f64) * 100.0);
            }
            println!();
            println!("Output: {}", output.display());
            Ok(())
        }

        Commands::Extract { input, output } => {
            println!(
                "Extracting archive: {} to {}",
                input.display(),
                output.display()
            );

            let pb = progress_bar();
            let session = ExtractSession::spawn(input, output);
            let mut error = None;
            for snapshot in session.progress().iter() {
                pb.set_position(u64::from(snapshot.percentage));
                pb.set_message(snapshot.current_file.clone());
                if snapshot.state == ExtractionState::Error {
                    error = snapshot.error.clone();
                }
            }
            match session.wait() {
                Ok(()) => {
                    pb.finish_with_message("Complete");
                    println!("Extraction complete!");
                    Ok(())
                }
                Err(e) => {
                    pb.abandon();
                    bail!("extraction failed: {}", error.unwrap_or_else(|| e.to_string()))
                }
            }
        }

        Commands::List { archive, nested } => {
            let entries = match nested {
                Some(inner) => list_nested_archive_contents(&archive, &inner)
                    .with_context(|| format!("Failed to list {} inside {}", inner, archive.display()))?,
                None => list_archive_contents(&archive)
                    .with_context(|| format!("Failed to list {}", archive.display()))?,
            };
            for entry in &entries {
                if entry.is_directory {
                    println!("{:>12}  {}", "<DIR>", entry.name);
                } else {
                    println!("{:>12}  {}", entry.size, entry.name);
                }
            }
            println!();
            println!("{} entries", entries.len());
            Ok(())
        }

        Commands::Payload { file, checksum } => {
            if !otapack_payload::is_payload_file(&file) {
                bail!("not a payload file: {}", file.display());
            }
            let info = otapack_payload::parse_payload_info(&file)
                .with_context(|| format!("Failed to parse {}", file.display()))?;

            println!("Payload: {}", info.file_path.display());
            println!("  Version: {}", info.header.version);
            println!("  Manifest size: {} bytes", info.header.manifest_size);
            println!(
                "  Signature size: {} bytes",
                info.header.manifest_signature_size
            );
            println!("  Block size: {} bytes", info.header.block_size);
            println!("  File size: {} bytes", info.total_size);
            println!();
            println!(
                "{:<20} {:>5} {:>14} {:>14} {:>8}  {}",
                "PARTITION", "OPS", "COMPRESSED", "UNCOMPRESSED", "CODEC", "SHA256"
            );
            for partition in &info.partitions {
                let digest = if partition.hash.len() > 16 {
                    &partition.hash[..16]
                } else {
                    &partition.hash
                };
                println!(
                    "{:<20} {:>5} {:>14} {:>14} {:>8}  {}",
                    partition.name,
                    partition.operations.len(),
                    partition.compressed_size,
                    partition.uncompressed_size,
                    partition.compression.to_string(),
                    digest
                );
            }

            if checksum {
                println!();
                println!("SHA-256: {}", otapack_payload::file_digest(&file)?);
            }
            Ok(())
        }
    }
}

fn parse_level(value: &str) -> Result<CompressionLevel> {
    Ok(match value.to_ascii_lowercase().as_str() {
        "store" => CompressionLevel::Store,
        "fastest" => CompressionLevel::Fastest,
        "fast" => CompressionLevel::Fast,
        "normal" => CompressionLevel::Normal,
        "good" => CompressionLevel::Good,
        "best" => CompressionLevel::Best,
        other => bail!("unknown compression level: {}", other),
    })
}

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb
}
