//! Header parser — the `GSTR`/`PT` tag stream inside the `SCHl` block.
//!
//! The header has no fixed schema: each field is a one-byte tag followed by
//! a [patch](crate::patch), and fields are omitted whenever the platform
//! default applies. Parsing therefore runs in two steps:
//!
//! 1. [`scan_tags`] walks the tag stream into a [`RawHeader`], recording
//!    only what the stream actually states.
//! 2. [`RawHeader::resolve`] validates it and fills every omitted field from
//!    the closed per-platform tables, producing a [`StreamDescriptor`].

use serde::{Deserialize, Serialize};

use crate::error::{HeaderFault, Result, SchlError};
use crate::patch::decode_patch;
use crate::platform::{
    fold_legacy_codec, Codec, FormatVersion, Platform, GENERIC_MARKER, PLATFORM_PREFIX,
};
use crate::source::{ByteSource, Endian};

/// Maximum number of channels a stream may declare.
pub const MAX_CHANNELS: usize = 6;

/// Expected value of the integrity id tag.
pub const ID_SENTINEL: u8 = 0x65;

// Header tags.
const TAG_BLOCK_RATE: u8 = 0x00;
const TAG_ID: u8 = 0x06;
const TAG_VERSION: u8 = 0x80;
const TAG_CHANNELS: u8 = 0x82;
const TAG_LEGACY_CODEC: u8 = 0x83;
const TAG_SAMPLE_RATE: u8 = 0x84;
const TAG_NUM_SAMPLES: u8 = 0x85;
const TAG_LOOP_START: u8 = 0x86;
const TAG_LOOP_END: u8 = 0x87;
const TAG_CODEC: u8 = 0xA0;
const TAG_HEADER_END: u8 = 0xFF;

/// Channel absolute offsets, one tag per channel index.
const CHANNEL_OFFSET_TAGS: [u8; MAX_CHANNELS] = [0x88, 0x89, 0x94, 0x95, 0xA2, 0xA3];

/// Coefficient table starts (GameCube ADPCM / N64), one tag per channel index.
const COEF_OFFSET_TAGS: [u8; MAX_CHANNELS] = [0x8F, 0x90, 0x91, 0xAB, 0xAC, 0xAD];

/// Tags whose patch is consumed and ignored: unknown constants, effect bus,
/// user data, time stretch tables, azimuths and similar.
const IGNORED_PATCH_TAGS: [u8; 16] = [
    0x05, 0x0B, 0x13, 0x14, 0x8A, 0x8C, 0x92, 0x98, 0x99, 0x9C, 0x9D, 0x9E, 0x9F, 0xA6, 0xA7,
    0xA1,
];

/// Tags carrying a value stored in the header.
const VALUE_TAGS: [u8; 10] = [
    TAG_BLOCK_RATE,
    TAG_ID,
    TAG_VERSION,
    TAG_CHANNELS,
    TAG_LEGACY_CODEC,
    TAG_SAMPLE_RATE,
    TAG_NUM_SAMPLES,
    TAG_LOOP_START,
    TAG_LOOP_END,
    TAG_CODEC,
];

/// Single-byte padding and section markers.
const MARKER_TAGS: [u8; 3] = [0xFC, 0xFD, 0xFE];

/// Header fields exactly as stated by the tag stream.
///
/// `None` (or zero for counts) means the stream omitted the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHeader {
    pub platform: Platform,
    pub id: Option<u8>,
    pub version: Option<u32>,
    pub legacy_codec: Option<u32>,
    pub codec: Option<u32>,
    pub channels: u32,
    pub sample_rate: u32,
    pub num_samples: u32,
    pub loop_start: u32,
    pub loop_end: u32,
    pub channel_offsets: [u64; MAX_CHANNELS],
    pub coef_offsets: [u64; MAX_CHANNELS],
}

impl RawHeader {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            id: None,
            version: None,
            legacy_codec: None,
            codec: None,
            channels: 0,
            sample_rate: 0,
            num_samples: 0,
            loop_start: 0,
            loop_end: 0,
            channel_offsets: [0; MAX_CHANNELS],
            coef_offsets: [0; MAX_CHANNELS],
        }
    }

    /// Validate the stated fields and fill omitted ones from the platform
    /// tables.
    ///
    /// # Errors
    ///
    /// [`SchlError::MalformedHeader`] for a bad integrity id, too many
    /// channels or a missing platform default; [`SchlError::UnsupportedCodec`]
    /// for a codec value outside the known set.
    pub fn resolve(&self) -> Result<StreamDescriptor> {
        let platform = self.platform;

        if let Some(id) = self.id {
            if id != 0 && id != ID_SENTINEL {
                return Err(HeaderFault::BadIntegrityTag(u32::from(id)).into());
            }
        }
        if self.channels > MAX_CHANNELS as u32 {
            return Err(HeaderFault::TooManyChannels(self.channels).into());
        }
        let channels = self.channels.max(1) as u8;

        let version = match self.version {
            Some(wire) => FormatVersion::from_wire(wire),
            None => platform.default_version(),
        }
        .ok_or(HeaderFault::NoDefaultForPlatform {
            field: "version",
            platform,
        })?;

        let codec = match (self.codec, self.legacy_codec) {
            (Some(wire), _) => Codec::from_wire(wire).ok_or(SchlError::UnsupportedCodec {
                codec: wire,
                reason: "unknown codec value",
            })?,
            (None, Some(legacy)) => {
                fold_legacy_codec(legacy).ok_or(SchlError::UnsupportedCodec {
                    codec: legacy,
                    reason: "unknown legacy codec value",
                })?
            }
            (None, None) => platform
                .default_codec()
                .ok_or(HeaderFault::NoDefaultForPlatform {
                    field: "codec",
                    platform,
                })?,
        };

        let sample_rate = match self.sample_rate {
            0 => platform
                .default_sample_rate()
                .ok_or(HeaderFault::NoDefaultForPlatform {
                    field: "sample rate",
                    platform,
                })?,
            rate => rate,
        };

        Ok(StreamDescriptor {
            platform,
            version,
            codec,
            channels,
            sample_rate,
            num_samples: self.num_samples,
            loop_start: self.loop_start,
            loop_end: self.loop_end,
            loop_flag: self.loop_end != 0,
            channel_offsets: self.channel_offsets,
            coef_offsets: self.coef_offsets,
            big_endian: platform.is_big_endian(),
            codec_variant: codec_variant(codec, version, platform),
            id: self.id,
        })
    }
}

impl From<&StreamDescriptor> for RawHeader {
    fn from(desc: &StreamDescriptor) -> Self {
        Self {
            platform: desc.platform,
            id: desc.id,
            version: Some(desc.version.wire()),
            legacy_codec: None,
            codec: Some(desc.codec.wire()),
            channels: u32::from(desc.channels),
            sample_rate: desc.sample_rate,
            num_samples: desc.num_samples,
            loop_start: desc.loop_start,
            loop_end: desc.loop_end,
            channel_offsets: desc.channel_offsets,
            coef_offsets: desc.coef_offsets,
        }
    }
}

/// Fully resolved description of one logical stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub platform: Platform,
    pub version: FormatVersion,
    pub codec: Codec,
    /// 1..=6.
    pub channels: u8,
    pub sample_rate: u32,
    /// Sample count stated by the header; may under-report multi-block streams.
    pub num_samples: u32,
    pub loop_start: u32,
    pub loop_end: u32,
    pub loop_flag: bool,
    /// Per-channel data offsets as stated by the header (bank streams only,
    /// zero when unused).
    pub channel_offsets: [u64; MAX_CHANNELS],
    /// Absolute per-channel coefficient table offsets (zero when unused).
    pub coef_offsets: [u64; MAX_CHANNELS],
    pub big_endian: bool,
    /// Disambiguates two encodings of the same codec. MicroTalk: 0 = stereo
    /// (early), 1 = interleaved. EA-XA: 0 = ADPCM history per block,
    /// 1 = no history.
    pub codec_variant: u8,
    pub id: Option<u8>,
}

impl StreamDescriptor {
    /// Byte order of block fields and codec data.
    pub fn endian(&self) -> Endian {
        Endian::from_big(self.big_endian)
    }
}

/// Pick the on-wire variant of `codec` for this version and platform.
pub fn codec_variant(codec: Codec, version: FormatVersion, platform: Platform) -> u8 {
    match codec {
        Codec::MicroTalk10 => u8::from(version > FormatVersion::V0),
        Codec::EaXa => {
            // Console V2 keeps per-block history, as does everything up to V1.
            let console_v2 = version == FormatVersion::V2
                && matches!(platform, Platform::Ps2 | Platform::GcWii | Platform::Xbox);
            u8::from(version > FormatVersion::V1 && !console_v2)
        }
        _ => 0,
    }
}

/// Read the platform marker at `begin` and return the platform plus the
/// cursor just past the marker.
fn read_platform<S: ByteSource + ?Sized>(source: &S, begin: u64) -> Result<(Platform, u64)> {
    let is_marker = |m: u32| m == GENERIC_MARKER || (m & 0xFFFF_0000) == PLATFORM_PREFIX;

    let mut cursor = begin;
    let mut marker = source.read_u32(cursor, Endian::Big)?;
    if !is_marker(marker) {
        // A few early PS titles put an unrelated field before the marker.
        cursor += 4;
        marker = source
            .read_u32(cursor, Endian::Big)
            .map_err(|_| HeaderFault::UnrecognizedHeader { marker })?;
    }

    if marker == GENERIC_MARKER {
        // GSTR is followed by a config word we do not interpret.
        Ok((Platform::Generic, cursor + 8))
    } else if (marker & 0xFFFF_0000) == PLATFORM_PREFIX {
        let code = source.read_u16(cursor + 2, Endian::Little)? as u8;
        Ok((Platform::from_code(code), cursor + 4))
    } else {
        Err(HeaderFault::UnrecognizedHeader { marker }.into())
    }
}

/// Walk the tag stream in `[begin, begin + max_length)` into a [`RawHeader`].
///
/// Unknown tags are logged and skipped; only their tag byte is consumed.
pub fn scan_tags<S: ByteSource + ?Sized>(
    source: &S,
    begin: u64,
    max_length: u64,
) -> Result<RawHeader> {
    let (platform, mut cursor) = read_platform(source, begin)?;
    let mut raw = RawHeader::new(platform);
    let mut header_end = false;

    tracing::debug!(%platform, offset = begin, "Parsing header tags");

    while cursor - begin < max_length {
        let tag = source.read_u8(cursor)?;
        cursor += 1;

        // Coefficient tables are read later by offset: remember where the
        // patch payload starts, then skip it.
        if let Some(ch) = COEF_OFFSET_TAGS.iter().position(|&t| t == tag) {
            raw.coef_offsets[ch] = cursor + 1;
            cursor += decode_patch(source, cursor)?.consumed;
            continue;
        }

        if MARKER_TAGS.contains(&tag) {
            continue;
        }

        if tag == TAG_HEADER_END {
            header_end = true;
            continue;
        }

        if tag == TAG_BLOCK_RATE && header_end {
            // Zero padding after the header end marker.
            continue;
        }

        let known = VALUE_TAGS.contains(&tag)
            || CHANNEL_OFFSET_TAGS.contains(&tag)
            || IGNORED_PATCH_TAGS.contains(&tag);
        if !known {
            tracing::debug!(
                tag = format!("0x{:02X}", tag),
                offset = cursor - 1,
                "Skipping unknown header tag"
            );
            continue;
        }

        let patch = decode_patch(source, cursor)?;
        cursor += patch.consumed;
        let value = patch.value;

        match tag {
            TAG_ID => raw.id = Some(value as u8),
            TAG_VERSION => raw.version = Some(value),
            TAG_CHANNELS => raw.channels = value,
            TAG_LEGACY_CODEC => raw.legacy_codec = Some(value),
            TAG_SAMPLE_RATE => raw.sample_rate = value,
            TAG_NUM_SAMPLES => raw.num_samples = value,
            TAG_LOOP_START => raw.loop_start = value,
            TAG_LOOP_END => raw.loop_end = value,
            TAG_CODEC => raw.codec = Some(value),
            _ => {
                if let Some(ch) = CHANNEL_OFFSET_TAGS.iter().position(|&t| t == tag) {
                    raw.channel_offsets[ch] = u64::from(value);
                }
            }
        }
    }

    Ok(raw)
}

/// Parse and resolve the header tag stream starting at `begin`.
pub fn parse_header<S: ByteSource + ?Sized>(
    source: &S,
    begin: u64,
    max_length: u64,
) -> Result<StreamDescriptor> {
    let raw = scan_tags(source, begin, max_length)?;
    let desc = raw.resolve()?;

    tracing::debug!(
        platform = %desc.platform,
        version = ?desc.version,
        codec = ?desc.codec,
        channels = desc.channels,
        sample_rate = desc.sample_rate,
        num_samples = desc.num_samples,
        "Resolved header"
    );

    Ok(desc)
}
