//! Fuzz target for the header tag stream.
//!
//! Prepends a `PT` marker so most inputs reach the tag loop.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut input = vec![b'P', b'T', 0x00, 0x00];
    input.extend_from_slice(data);

    // Should never panic, only return errors
    let _ = schl_format::parse_header(input.as_slice(), 0, input.len() as u64);
});
