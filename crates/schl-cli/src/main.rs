//! SCHl CLI — inspection tool for EA SCHl game-audio streams.
//!
//! Recognizes streams, prints what a decoder would be handed, and lists the
//! block layout of a file.
//!
//! # Usage
//!
//! ```bash
//! schl info music.asf
//! schl info music.asf --json
//! schl blocks music.asf
//! schl scan *.asf *.str --no-ext-check
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use schl_format::{Block, DecodableStream, FourCc, Recognizer, SchlReader};

// ───────────────────────────── CLI definition ─────────────────────────────

/// Top-level CLI entry point for the `schl` binary.
#[derive(Parser)]
#[command(
    name = "schl",
    about = "Inspect EA SCHl chunked game-audio streams",
    version
)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Accept files whatever their extension.
    #[arg(long, global = true)]
    no_ext_check: bool,

    /// Maximum number of blocks a single body walk may visit.
    #[arg(long, global = true)]
    max_blocks: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

/// Available sub-commands.
#[derive(Subcommand)]
enum Commands {
    /// Recognize a stream and print its decoder parameters.
    Info {
        /// Input stream path.
        input: PathBuf,

        /// Output stream information as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List every block of a stream.
    Blocks {
        /// Input stream path.
        input: PathBuf,
    },

    /// Recognize many files, reporting each result.
    Scan {
        /// Input paths.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

// ───────────────────────────── main ─────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let recognizer = build_recognizer(cli.no_ext_check, cli.max_blocks);

    match cli.command {
        Commands::Info { input, json } => cmd_info(&input, json, &recognizer),
        Commands::Blocks { input } => cmd_blocks(&input, &recognizer),
        Commands::Scan { inputs } => cmd_scan(&inputs, &recognizer),
    }
}

fn build_recognizer(no_ext_check: bool, max_blocks: Option<u32>) -> Recognizer {
    let mut recognizer = Recognizer::new();
    if no_ext_check {
        recognizer.skip_extension_check();
    }
    if let Some(limit) = max_blocks {
        recognizer.set_block_limit(limit);
    }
    recognizer
}

fn open(input: &Path, recognizer: &Recognizer) -> Result<SchlReader> {
    SchlReader::open_with(input, recognizer)
        .with_context(|| format!("Failed to open SCHl file: {}", input.display()))
}

// ───────────────────────────── info ─────────────────────────────

fn cmd_info(input: &Path, json: bool, recognizer: &Recognizer) -> Result<()> {
    let reader = open(input, recognizer)?;

    let info = StreamInfo {
        path: input,
        file_size: reader.file_size(),
        stream: reader.stream(),
    };

    if json {
        let json_val = info.to_json()?;
        println!("{}", serde_json::to_string_pretty(&json_val)?);
    } else {
        info.print_human();
    }

    Ok(())
}

/// Collected information about a recognized stream, used for display.
struct StreamInfo<'a> {
    path: &'a Path,
    file_size: u64,
    stream: &'a DecodableStream,
}

impl StreamInfo<'_> {
    fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::json!({
            "file": self.path.display().to_string(),
            "file_size": self.file_size,
            "duration_secs": self.stream.duration_secs(),
            "stream": serde_json::to_value(self.stream)?,
        }))
    }

    fn print_human(&self) {
        let s = self.stream;
        println!();
        println!("  SCHl Stream Information");
        println!("  ============================================");
        println!("  File:      {}", self.path.display());
        println!(
            "  Size:      {} bytes ({})",
            self.file_size,
            human_size(self.file_size)
        );
        println!("  Platform:  {}", s.platform);
        println!("  Version:   {:?}", s.version);
        println!("  Coding:    {:?} (variant {})", s.coding, s.codec_variant);
        println!(
            "  Endian:    {}",
            if s.big_endian { "big" } else { "little" }
        );
        println!("  Channels:  {}", s.channels);
        println!("  Rate:      {} Hz", s.sample_rate);
        println!("  Samples:   {}", s.num_samples);
        println!("  Duration:  {:.2}s", s.duration_secs());
        if s.loop_flag {
            println!("  Loop:      {} .. {}", s.loop_start, s.loop_end);
        } else {
            println!("  Loop:      (none)");
        }
        println!("  Body:      0x{:X}", s.body_start);
        if let Some(offset) = s.payload_offset {
            println!("  Payload:   0x{:X}", offset);
        }

        let offsets = s.active_channel_offsets();
        if offsets.iter().any(|&o| o != 0) {
            println!();
            println!("  Channel offsets");
            println!("  --------------------------------------------");
            for (ch, offset) in offsets.iter().enumerate() {
                println!("  [{}] 0x{:X}", ch, offset);
            }
        }

        if !s.coefs.is_empty() {
            println!();
            println!("  Coefficients");
            println!("  --------------------------------------------");
            for (ch, table) in s.coefs.iter().enumerate() {
                let values: Vec<String> = table.iter().map(|c| c.to_string()).collect();
                println!("  [{}] {}", ch, values.join(" "));
            }
        }
        println!();
    }
}

// ───────────────────────────── blocks ─────────────────────────────

fn cmd_blocks(input: &Path, recognizer: &Recognizer) -> Result<()> {
    let reader = open(input, recognizer)?;

    println!("  {:>10}  {:<10}  {:>10}", "offset", "tag", "size");
    let mut count = 0usize;
    for block in reader.blocks() {
        let block: Block =
            block.with_context(|| format!("Block walk failed in {}", input.display()))?;
        println!(
            "  0x{:08X}  {:<10}  {:>10}",
            block.offset,
            FourCc(block.tag).to_string(),
            block.size
        );
        count += 1;
    }
    tracing::debug!(count, "Listed blocks");

    Ok(())
}

// ───────────────────────────── scan ─────────────────────────────

fn cmd_scan(inputs: &[PathBuf], recognizer: &Recognizer) -> Result<()> {
    let mut recognized = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;

    for input in inputs {
        tracing::debug!(path = %input.display(), "Scanning");
        match SchlReader::open_with(input, recognizer) {
            Ok(reader) => {
                let s = reader.stream();
                println!(
                    "OK    {}: {:?}, {} ch, {} Hz, {} samples",
                    input.display(),
                    s.coding,
                    s.channels,
                    s.sample_rate,
                    s.num_samples
                );
                recognized += 1;
            }
            Err(e) if e.is_not_this_format() => {
                println!("SKIP  {}: {}", input.display(), e);
                skipped += 1;
            }
            Err(e) => {
                println!("FAIL  {}: {}", input.display(), e);
                failed += 1;
            }
        }
    }

    println!();
    println!(
        "{} recognized, {} skipped, {} failed",
        recognized, skipped, failed
    );

    if failed > 0 {
        bail!("{} of {} files failed to parse", failed, inputs.len());
    }
    Ok(())
}

// ───────────────────────────── helpers ─────────────────────────────

/// Format a byte count as a human-readable size string.
fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MiB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KiB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
