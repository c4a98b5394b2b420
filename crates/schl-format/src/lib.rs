//! # schl-format
//!
//! Parser and codec dispatcher for EA `SCHl` streams, the chunked audio
//! container used across two decades of console and PC games. Turns the
//! bytes of a stream into a [`DecodableStream`] that a decoder can play; no
//! sample data is decoded here.
//!
//! ## Format Overview
//!
//! A `SCHl` file is a sequence of blocks, each a big-endian tag plus a size:
//! - **SCHl**: header block holding a `GSTR`/`PT` tag stream of patches
//! - **SCCl**: block count
//! - **SCDl**: data, with a per-block sample count and channel offsets
//! - **SCLl** / **SCEl**: loop end / stream end
//!
//! Several streams may be concatenated, each starting with its own `SCHl`.
//!
//! ## Example
//! ```rust,no_run
//! use std::path::Path;
//! use schl_format::SchlReader;
//!
//! let reader = SchlReader::open(Path::new("track.asf")).unwrap();
//! println!("{:?}", reader.stream());
//! ```

pub mod block;
pub mod error;
pub mod header;
pub mod patch;
pub mod platform;
pub mod reader;
pub mod recognize;
pub mod source;
pub mod stream;

pub use block::{Block, BlockKind, BlockWalker, FourCc};
pub use error::{HeaderFault, Result, SchlError};
pub use header::{parse_header, RawHeader, StreamDescriptor};
pub use platform::{Codec, FormatVersion, Platform};
pub use reader::SchlReader;
pub use recognize::{check_extension, Recognizer};
pub use source::{ByteSource, Endian, FileSource, SliceSource};
pub use stream::{CodingKind, CoefTable, DecodableStream};
