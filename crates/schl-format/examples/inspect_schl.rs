//! Example: Recognize an SCHl stream and list its blocks.
//!
//! Pass a file path to inspect a real stream; with no argument a small
//! synthetic PS2 stream is built in memory.

use std::path::Path;

use schl_format::{FourCc, SchlReader};

fn block(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = tag.to_vec();
    out.extend_from_slice(&(payload.len() as u32 + 8).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Stereo PS-ADPCM at 32 kHz, two data blocks.
fn demo_stream() -> Vec<u8> {
    let header = [
        b'P', b'T', 0x05, 0x00, // PS2
        0x82, 0x01, 0x02, // channels
        0x84, 0x02, 0x7D, 0x00, // sample rate
        0xFF,
    ];
    let mut file = block(b"SCHl", &header);
    file.extend(block(b"SCCl", &2u32.to_le_bytes()));
    for _ in 0..2 {
        file.extend(block(b"SCDl", &vec![0u8; 0x808]));
    }
    file.extend(block(b"SCEl", &[]));
    file
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let reader = match std::env::args().nth(1) {
        Some(path) => SchlReader::open(Path::new(&path))?,
        None => SchlReader::from_bytes("demo.asf", demo_stream())?,
    };

    println!("=== SCHl Inspector ===\n");

    let s = reader.stream();
    println!("File: {} ({} bytes)", reader.name(), reader.file_size());
    println!("  Platform:    {} ({:?})", s.platform, s.version);
    println!("  Coding:      {:?} (variant {})", s.coding, s.codec_variant);
    println!("  Channels:    {}", s.channels);
    println!("  Sample rate: {} Hz", s.sample_rate);
    println!("  Samples:     {} ({:.2}s)", s.num_samples, s.duration_secs());
    if s.loop_flag {
        println!("  Loop:        {}..{}", s.loop_start, s.loop_end);
    }
    println!("  Body start:  0x{:X}", s.body_start);

    println!("\nBlocks:");
    for block in reader.blocks() {
        let block = block?;
        println!(
            "  0x{:08X}  {}  {} bytes",
            block.offset,
            FourCc(block.tag),
            block.size
        );
    }

    Ok(())
}
