//! Error types for the SCHl format crate.

use thiserror::Error;

use crate::platform::Platform;

/// Errors that can occur while recognizing or scanning a SCHl stream.
#[derive(Error, Debug)]
pub enum SchlError {
    /// Magic or extension mismatch. Expected while probing; callers should
    /// try the next recognizer.
    #[error("Not a SCHl stream: {0}")]
    NotThisFormat(String),

    #[error("Malformed header: {0}")]
    MalformedHeader(#[from] HeaderFault),

    #[error("Unsupported codec 0x{codec:02X}: {reason}")]
    UnsupportedCodec { codec: u32, reason: &'static str },

    #[error("Read of {len} bytes at offset 0x{offset:X} is out of range (source size {size})")]
    TruncatedOrOutOfRange { offset: u64, len: usize, size: u64 },

    #[error("Block scan aborted at offset 0x{offset:X}: {reason}")]
    BlockScanAborted { offset: u64, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchlError {
    /// True for the expected "this file is something else" outcome.
    pub fn is_not_this_format(&self) -> bool {
        matches!(self, SchlError::NotThisFormat(_))
    }
}

/// Reasons a header tag stream is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderFault {
    #[error("unrecognized platform marker 0x{marker:08X}")]
    UnrecognizedHeader { marker: u32 },

    #[error("too many channels: {0} (max 6)")]
    TooManyChannels(u32),

    #[error("integrity id 0x{0:02X} does not match 0x65")]
    BadIntegrityTag(u32),

    #[error("no default {field} for platform {platform}")]
    NoDefaultForPlatform {
        field: &'static str,
        platform: Platform,
    },

    #[error("declared header size {0} is smaller than its own prefix")]
    HeaderTooSmall(u32),

    #[error("no coefficient table for channel {0}")]
    MissingCoefTable(u8),
}

pub type Result<T> = std::result::Result<T, SchlError>;
