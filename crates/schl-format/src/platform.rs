//! Platform, header-version and codec identifiers, plus the closed
//! per-platform default tables used when a header omits a field.

use std::fmt;

use serde::{Deserialize, Serialize};

/// `GSTR` (generic stream) platform marker.
pub const GENERIC_MARKER: u32 = 0x4753_5452;

/// `PT` prefix in the upper half of a platform marker.
pub const PLATFORM_PREFIX: u32 = 0x5054_0000;

/// Hardware target a stream was authored for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// `GSTR` streams (typically Wii/X360/PS3 era tooling).
    Generic,
    Pc,
    Psx,
    N64,
    Mac,
    Ps2,
    GcWii,
    Xbox,
    X360,
    Psp,
    ThreeDs,
    /// A `PT` code with no known meaning.
    Unknown(u8),
}

impl Platform {
    /// Map the one-byte code that follows a `PT` marker.
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => Self::Pc,
            0x01 => Self::Psx,
            0x02 => Self::N64,
            0x03 => Self::Mac,
            0x05 => Self::Ps2,
            0x06 => Self::GcWii,
            0x07 => Self::Xbox,
            0x09 => Self::X360,
            0x0A => Self::Psp,
            0x14 => Self::ThreeDs,
            other => Self::Unknown(other),
        }
    }

    /// Whether block fields and codec data use big-endian byte order.
    pub fn is_big_endian(&self) -> bool {
        matches!(
            self,
            Self::N64 | Self::Mac | Self::GcWii | Self::X360 | Self::Generic
        )
    }

    /// Header version assumed when the header omits it.
    pub fn default_version(&self) -> Option<FormatVersion> {
        match self {
            Self::Generic => Some(FormatVersion::V2),
            Self::Pc | Self::Psx | Self::N64 | Self::Mac => Some(FormatVersion::V0),
            Self::Ps2 => Some(FormatVersion::V1),
            Self::GcWii | Self::Xbox => Some(FormatVersion::V2),
            Self::X360 | Self::Psp | Self::ThreeDs => Some(FormatVersion::V3),
            Self::Unknown(_) => None,
        }
    }

    /// Codec assumed when the header omits it. These did not change across
    /// header versions.
    pub fn default_codec(&self) -> Option<Codec> {
        match self {
            Self::Generic | Self::Pc | Self::Mac | Self::X360 | Self::Psp => Some(Codec::EaXa),
            Self::Psx | Self::Ps2 => Some(Codec::Psx),
            Self::GcWii => Some(Codec::Pcm16Be),
            Self::Xbox => Some(Codec::Pcm16Le),
            Self::ThreeDs => Some(Codec::GcAdpcm),
            Self::N64 | Self::Unknown(_) => None,
        }
    }

    /// Sample rate assumed when the header omits it. Not derived from any
    /// output rate of the hardware.
    pub fn default_sample_rate(&self) -> Option<u32> {
        match self {
            Self::Generic => Some(48000),
            Self::Pc | Self::Psx | Self::N64 | Self::Mac | Self::Ps2 | Self::Psp => Some(22050),
            Self::GcWii | Self::Xbox => Some(24000),
            Self::X360 => Some(44100),
            Self::ThreeDs | Self::Unknown(_) => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generic => write!(f, "Generic"),
            Self::Pc => write!(f, "PC"),
            Self::Psx => write!(f, "PSX"),
            Self::N64 => write!(f, "N64"),
            Self::Mac => write!(f, "Mac"),
            Self::Ps2 => write!(f, "PS2"),
            Self::GcWii => write!(f, "GC/Wii"),
            Self::Xbox => write!(f, "Xbox"),
            Self::X360 => write!(f, "X360"),
            Self::Psp => write!(f, "PSP"),
            Self::ThreeDs => write!(f, "3DS"),
            Self::Unknown(code) => write!(f, "unknown (0x{:02X})", code),
        }
    }
}

/// Header revision. Selects codec variants for MicroTalk and EA-XA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FormatVersion {
    /// Early PC, when the legacy codec tag was in use.
    V0,
    V1,
    /// PS1 era.
    V2,
    /// PS2 era.
    V3,
}

impl FormatVersion {
    pub fn from_wire(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::V0),
            1 => Some(Self::V1),
            2 => Some(Self::V2),
            3 => Some(Self::V3),
            _ => None,
        }
    }

    pub fn wire(&self) -> u32 {
        *self as u32
    }
}

/// Codec identifiers from the current-generation codec tag (`0xA0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Codec {
    /// MicroTalk 10:1, aka EA ADPCM.
    MicroTalk10,
    /// PS-ADPCM (VAG).
    Psx,
    Pcm16Be,
    Pcm16Le,
    Pcm8,
    /// EA-XA, a CD-XA ADPCM variant.
    EaXa,
    MpegLayer2,
    MpegLayer3,
    /// GameCube DSP ADPCM with per-channel coefficient tables.
    GcAdpcm,
    /// Xbox IMA ADPCM, interleaved mono.
    XboxAdpcm,
    /// MicroTalk 5:1. Recognized, not supported.
    MicroTalk5,
    /// MPEG variant. Recognized, not supported.
    EaLayer3,
}

impl Codec {
    pub fn from_wire(value: u32) -> Option<Self> {
        match value {
            0x04 => Some(Self::MicroTalk10),
            0x05 => Some(Self::Psx),
            0x07 => Some(Self::Pcm16Be),
            0x08 => Some(Self::Pcm16Le),
            0x09 => Some(Self::Pcm8),
            0x0A => Some(Self::EaXa),
            0x0F => Some(Self::MpegLayer2),
            0x10 => Some(Self::MpegLayer3),
            0x12 => Some(Self::GcAdpcm),
            0x14 => Some(Self::XboxAdpcm),
            0x16 => Some(Self::MicroTalk5),
            0x17 => Some(Self::EaLayer3),
            _ => None,
        }
    }

    pub fn wire(&self) -> u32 {
        match self {
            Self::MicroTalk10 => 0x04,
            Self::Psx => 0x05,
            Self::Pcm16Be => 0x07,
            Self::Pcm16Le => 0x08,
            Self::Pcm8 => 0x09,
            Self::EaXa => 0x0A,
            Self::MpegLayer2 => 0x0F,
            Self::MpegLayer3 => 0x10,
            Self::GcAdpcm => 0x12,
            Self::XboxAdpcm => 0x14,
            Self::MicroTalk5 => 0x16,
            Self::EaLayer3 => 0x17,
        }
    }

    /// MPEG payloads are containers of their own, located through the
    /// first data block.
    pub fn is_mpeg(&self) -> bool {
        matches!(self, Self::MpegLayer2 | Self::MpegLayer3)
    }
}

/// Legacy codec tag (`0x83`) value for MicroTalk 10:1 (Need for Speed 2 PC).
pub const LEGACY_MICROTALK10: u32 = 0x07;

/// Fold a legacy codec value into the current codec space.
pub fn fold_legacy_codec(value: u32) -> Option<Codec> {
    match value {
        LEGACY_MICROTALK10 => Some(Codec::MicroTalk10),
        _ => None,
    }
}
