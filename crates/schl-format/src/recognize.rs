//! Format recognizer — turns a byte source into a [`DecodableStream`].
//!
//! Recognition is a gate followed by a parse:
//!
//! 1. The file extension must be on the allow-list (advisory, but it keeps
//!    unrelated files from matching) and the source must start with `SCHl`.
//!    Either mismatch is [`SchlError::NotThisFormat`], which callers treat as
//!    "try the next format" rather than as a failure.
//! 2. The header block is parsed, the body start is checked, codec-specific
//!    data is read and the body is scanned for the real sample count.

use std::path::Path;

use crate::block::{
    find_payload_offset_with, read_block_size, scan_total_samples_with, FourCc,
    BLOCK_HEADER_SIZE, DEFAULT_MAX_BLOCKS, TAG_COUNT, TAG_DATA, TAG_HEADER,
};
use crate::error::{HeaderFault, Result, SchlError};
use crate::header::{parse_header, StreamDescriptor};
use crate::platform::Codec;
use crate::source::{ByteSource, Endian};
use crate::stream::{CodingKind, CoefTable, DecodableStream, COEF_TABLE_LEN};

/// File extensions EA authoring tools gave SCHl streams.
pub const EXTENSIONS: [&str; 11] = [
    "str", "asf", "mus", "eam", "sng", "aud", "strm", "xa", "xsf", "exa", "stm",
];

/// Whether `file_name` carries an allow-listed extension (case-insensitive).
pub fn check_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

/// SCHl recognizer.
///
/// # Example
///
/// ```rust,no_run
/// use schl_format::{Recognizer, SliceSource};
///
/// let bytes = std::fs::read("music.asf").unwrap();
/// let mut recognizer = Recognizer::new();
/// recognizer.set_block_limit(4096);
/// let stream = recognizer
///     .recognize(&SliceSource::new(&bytes), "music.asf")
///     .unwrap();
/// println!("{} Hz, {} samples", stream.sample_rate, stream.num_samples);
/// ```
#[derive(Debug, Clone)]
pub struct Recognizer {
    check_extension: bool,
    max_blocks: u32,
}

impl Default for Recognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Recognizer {
    pub fn new() -> Self {
        Self {
            check_extension: true,
            max_blocks: DEFAULT_MAX_BLOCKS,
        }
    }

    /// Cap the number of blocks a single body walk may visit.
    pub fn set_block_limit(&mut self, limit: u32) {
        self.max_blocks = limit;
    }

    pub fn block_limit(&self) -> u32 {
        self.max_blocks
    }

    /// Accept any file name. Useful for extracted or renamed streams.
    pub fn skip_extension_check(&mut self) {
        self.check_extension = false;
    }

    /// Recognize the SCHl stream at the start of `source`.
    ///
    /// # Errors
    ///
    /// - [`SchlError::NotThisFormat`] on an extension or magic mismatch, or
    ///   when the body does not start with a count or data block.
    /// - [`SchlError::MalformedHeader`] for an invalid header.
    /// - [`SchlError::UnsupportedCodec`] for codecs without a decoder.
    /// - [`SchlError::TruncatedOrOutOfRange`] when a read leaves the source.
    /// - [`SchlError::BlockScanAborted`] for an inconsistent body.
    pub fn recognize<S: ByteSource + ?Sized>(
        &self,
        source: &S,
        file_name: &str,
    ) -> Result<DecodableStream> {
        if self.check_extension && !check_extension(file_name) {
            return Err(not_this_format(format!(
                "{file_name}: extension is not an SCHl extension"
            )));
        }

        if source.size() < BLOCK_HEADER_SIZE {
            return Err(not_this_format(format!("{file_name}: too short")));
        }
        let magic = source.read_u32(0, Endian::Big)?;
        if magic != TAG_HEADER {
            return Err(not_this_format(format!(
                "{file_name}: magic {} is not SCHl",
                FourCc(magic)
            )));
        }

        let header_size = read_block_size(source, 4)?;
        if u64::from(header_size) < BLOCK_HEADER_SIZE {
            return Err(HeaderFault::HeaderTooSmall(header_size).into());
        }
        let desc = parse_header(
            source,
            BLOCK_HEADER_SIZE,
            u64::from(header_size) - BLOCK_HEADER_SIZE,
        )?;

        let body_start = u64::from(header_size);
        let body_tag = source.read_u32(body_start, Endian::Big)?;
        if body_tag != TAG_COUNT && body_tag != TAG_DATA {
            return Err(not_this_format(format!(
                "{file_name}: body starts with {} at 0x{:X}",
                FourCc(body_tag),
                body_start
            )));
        }

        let coding = CodingKind::for_codec(desc.codec).ok_or(SchlError::UnsupportedCodec {
            codec: desc.codec.wire(),
            reason: unsupported_reason(desc.codec),
        })?;

        let coefs = if coding == CodingKind::NgcDsp {
            read_coef_tables(source, &desc)?
        } else {
            Vec::new()
        };

        let payload_offset = if coding.is_mpeg() {
            Some(find_payload_offset_with(
                source,
                body_start,
                &desc,
                self.max_blocks,
            )?)
        } else {
            None
        };

        // Headers under-report multi-block streams but never over-report.
        let scanned = scan_total_samples_with(source, body_start, &desc, self.max_blocks)?;
        let num_samples = u64::from(desc.num_samples).max(scanned);

        tracing::info!(
            platform = %desc.platform,
            coding = ?coding,
            channels = desc.channels,
            sample_rate = desc.sample_rate,
            num_samples,
            "Recognized SCHl stream"
        );

        Ok(DecodableStream {
            platform: desc.platform,
            version: desc.version,
            coding,
            codec_variant: desc.codec_variant,
            channels: desc.channels,
            sample_rate: desc.sample_rate,
            num_samples,
            loop_start: desc.loop_start,
            loop_end: desc.loop_end,
            loop_flag: desc.loop_flag,
            big_endian: desc.big_endian,
            channel_offsets: desc.channel_offsets,
            coefs,
            body_start,
            payload_offset,
        })
    }
}

fn not_this_format(reason: String) -> SchlError {
    tracing::debug!(%reason, "Not an SCHl stream");
    SchlError::NotThisFormat(reason)
}

fn unsupported_reason(codec: Codec) -> &'static str {
    match codec {
        Codec::MicroTalk5 => "MicroTalk 5:1 is not supported",
        Codec::EaLayer3 => "EALayer3 is not supported",
        _ => "no decoder for codec",
    }
}

/// One coefficient table per channel, in the stream's byte order.
///
/// Every active channel must have had its table offset stated by the header.
fn read_coef_tables<S: ByteSource + ?Sized>(
    source: &S,
    desc: &StreamDescriptor,
) -> Result<Vec<CoefTable>> {
    let endian = desc.endian();
    desc.coef_offsets[..usize::from(desc.channels)]
        .iter()
        .enumerate()
        .map(|(ch, &start)| -> Result<CoefTable> {
            if start == 0 {
                return Err(HeaderFault::MissingCoefTable(ch as u8).into());
            }
            let mut table = [0i16; COEF_TABLE_LEN];
            for (i, coef) in table.iter_mut().enumerate() {
                *coef = source.read_i16(start + 2 * i as u64, endian)?;
            }
            Ok(table)
        })
        .collect()
}
