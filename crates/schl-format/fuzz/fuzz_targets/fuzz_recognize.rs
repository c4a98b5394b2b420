//! Fuzz target for the full recognizer.
//!
//! Feeds arbitrary bytes behind an `SCHl` magic to find panics and hangs in
//! the header parser and the block walks.

#![no_main]

use libfuzzer_sys::fuzz_target;
use schl_format::{Recognizer, SchlReader};

fuzz_target!(|data: &[u8]| {
    let mut input = b"SCHl".to_vec();
    input.extend_from_slice(data);

    let mut recognizer = Recognizer::new();
    recognizer.set_block_limit(1 << 12);

    if let Ok(reader) = SchlReader::from_bytes_with("fuzz.asf", input, &recognizer) {
        let _ = reader.stream().duration_secs();
        for block in reader.blocks() {
            if block.is_err() {
                break;
            }
        }
    }
});
