//! Codec-agnostic stream description handed to decoders.

use serde::{Deserialize, Serialize};

use crate::header::MAX_CHANNELS;
use crate::platform::{Codec, FormatVersion, Platform};

/// Entries per GameCube ADPCM coefficient table.
pub const COEF_TABLE_LEN: usize = 16;

/// One channel's GameCube ADPCM predictor coefficients.
pub type CoefTable = [i16; COEF_TABLE_LEN];

/// Decoder family a stream must be fed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodingKind {
    Pcm8,
    Pcm16Be,
    Pcm16Le,
    /// EA-XA ADPCM; `codec_variant` selects per-block history.
    EaXa,
    /// MicroTalk 10:1; `codec_variant` selects stereo vs interleaved.
    EaMt10,
    /// PS-ADPCM.
    Psx,
    /// GameCube DSP ADPCM; `coefs` holds one table per channel.
    NgcDsp,
    XboxIma,
    /// MPEG audio starting at `payload_offset`.
    MpegLayer2,
    MpegLayer3,
}

impl CodingKind {
    /// Decoder family for `codec`, or `None` for codecs without a decoder.
    pub fn for_codec(codec: Codec) -> Option<Self> {
        match codec {
            Codec::Pcm8 => Some(Self::Pcm8),
            Codec::Pcm16Be => Some(Self::Pcm16Be),
            Codec::Pcm16Le => Some(Self::Pcm16Le),
            Codec::EaXa => Some(Self::EaXa),
            Codec::MicroTalk10 => Some(Self::EaMt10),
            Codec::Psx => Some(Self::Psx),
            Codec::GcAdpcm => Some(Self::NgcDsp),
            Codec::XboxAdpcm => Some(Self::XboxIma),
            Codec::MpegLayer2 => Some(Self::MpegLayer2),
            Codec::MpegLayer3 => Some(Self::MpegLayer3),
            Codec::MicroTalk5 | Codec::EaLayer3 => None,
        }
    }

    pub fn is_mpeg(&self) -> bool {
        matches!(self, Self::MpegLayer2 | Self::MpegLayer3)
    }
}

/// Everything a decoder needs to play one recognized stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodableStream {
    pub platform: Platform,
    pub version: FormatVersion,
    pub coding: CodingKind,
    pub codec_variant: u8,
    pub channels: u8,
    pub sample_rate: u32,
    /// Larger of the header's count and the body scan total.
    pub num_samples: u64,
    pub loop_start: u32,
    pub loop_end: u32,
    pub loop_flag: bool,
    pub big_endian: bool,
    /// Per-channel offsets from the header; only the first `channels` are used.
    pub channel_offsets: [u64; MAX_CHANNELS],
    /// One table per channel for [`CodingKind::NgcDsp`], empty otherwise.
    pub coefs: Vec<CoefTable>,
    /// Offset of the first body block.
    pub body_start: u64,
    /// First MPEG frame, for MPEG codings only.
    pub payload_offset: Option<u64>,
}

impl DecodableStream {
    /// Playback length at the stream's sample rate.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.num_samples as f64 / f64::from(self.sample_rate)
    }

    /// Offsets of the channels actually present.
    pub fn active_channel_offsets(&self) -> &[u64] {
        &self.channel_offsets[..usize::from(self.channels).min(MAX_CHANNELS)]
    }
}
