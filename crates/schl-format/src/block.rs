//! Block scanner — walks the chunked body that follows the `SCHl` header.
//!
//! Every body block is laid out as:
//!
//! ```text
//! [4 bytes BE] tag    SCHl / SCCl / SCDl / SCLl / SCEl
//! [4 bytes]    size   little-endian, header-inclusive (see `read_block_size`)
//! [size - 8]   payload
//! ```
//!
//! Blocks are never collected. [`BlockWalker`] is a lazy sequence that can be
//! restarted by building a new walker at the body start; the two scans in
//! this module each run their own walk.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchlError};
use crate::header::StreamDescriptor;
use crate::platform::Codec;
use crate::source::{ByteSource, Endian};

pub const TAG_HEADER: u32 = 0x5343_486C; // "SCHl"
pub const TAG_COUNT: u32 = 0x5343_436C; // "SCCl"
pub const TAG_DATA: u32 = 0x5343_446C; // "SCDl"
pub const TAG_LOOP_END: u32 = 0x5343_4C6C; // "SCLl"
pub const TAG_END: u32 = 0x5343_456C; // "SCEl"

/// Size of the tag + size prefix of every block.
pub const BLOCK_HEADER_SIZE: u64 = 8;

/// Little-endian sizes above this were written big-endian (early Mac tools).
pub const SIZE_SWAP_THRESHOLD: u32 = 0xF000_0000;

/// Padding window searched for the next `SCHl` after an `SCEl`.
pub const SUBSTREAM_WINDOW: u64 = 0x80;

/// Default cap on blocks visited by a single walk.
pub const DEFAULT_MAX_BLOCKS: u32 = 1 << 20;

/// Per-block header of PS-ADPCM data blocks, excluded from the sample count.
const PSX_BLOCK_HEADER: u64 = 0x10;

/// Offset of the first per-channel offset inside a data block.
const DATA_CHANNEL_TABLE: u64 = 0x0C;

/// Offset of the sample count inside a data block.
const DATA_SAMPLE_COUNT: u64 = 0x08;

/// Block role, derived from its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    Header,
    Count,
    Data,
    LoopEnd,
    End,
    Other(u32),
}

impl BlockKind {
    pub fn from_tag(tag: u32) -> Self {
        match tag {
            TAG_HEADER => Self::Header,
            TAG_COUNT => Self::Count,
            TAG_DATA => Self::Data,
            TAG_LOOP_END => Self::LoopEnd,
            TAG_END => Self::End,
            other => Self::Other(other),
        }
    }
}

/// One body block as seen by a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Absolute offset of the block tag.
    pub offset: u64,
    pub tag: u32,
    pub kind: BlockKind,
    /// Declared size, header included.
    pub size: u64,
}

impl Block {
    pub fn payload_offset(&self) -> u64 {
        self.offset + BLOCK_HEADER_SIZE
    }

    pub fn payload_size(&self) -> u64 {
        self.size.saturating_sub(BLOCK_HEADER_SIZE)
    }
}

/// Four-character display of a tag, falling back to hex for non-ASCII tags.
pub struct FourCc(pub u32);

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.to_be_bytes();
        if bytes.iter().all(|b| b.is_ascii_graphic()) {
            bytes.iter().try_for_each(|&b| write!(f, "{}", b as char))
        } else {
            write!(f, "0x{:08X}", self.0)
        }
    }
}

/// Read a block or header size at `offset`.
///
/// Sizes are little-endian, except that some early Mac tools wrote them
/// big-endian; a little-endian reading above [`SIZE_SWAP_THRESHOLD`] is
/// re-read big-endian.
pub fn read_block_size<S: ByteSource + ?Sized>(source: &S, offset: u64) -> Result<u32> {
    let size = source.read_u32(offset, Endian::Little)?;
    if size > SIZE_SWAP_THRESHOLD {
        let swapped = source.read_u32(offset, Endian::Big)?;
        tracing::warn!(
            offset,
            raw = format!("0x{:08X}", size),
            size = swapped,
            "Big-endian block size"
        );
        return Ok(swapped);
    }
    Ok(size)
}

/// Lazy walk over body blocks.
///
/// The walk ends at end of source, on an all-zero or all-ones tag (trailing
/// padding), or after an `SCEl` with no room left for another sub-stream.
/// After an `SCEl` the walker searches the padding window for a new `SCHl`
/// and continues into the concatenated sub-stream.
///
/// Yields an error and stops on a block smaller than its own header or when
/// the block limit is exceeded.
pub struct BlockWalker<'a, S: ByteSource + ?Sized> {
    source: &'a S,
    offset: u64,
    visited: u32,
    limit: u32,
    done: bool,
}

impl<S: ByteSource + ?Sized> Clone for BlockWalker<'_, S> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

impl<'a, S: ByteSource + ?Sized> BlockWalker<'a, S> {
    pub fn new(source: &'a S, start: u64) -> Self {
        Self {
            source,
            offset: start,
            visited: 0,
            limit: DEFAULT_MAX_BLOCKS,
            done: false,
        }
    }

    /// Cap the number of blocks this walk may visit.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    fn step(&mut self) -> Result<Option<Block>> {
        let file_size = self.source.size();
        let offset = self.offset;

        if offset
            .checked_add(BLOCK_HEADER_SIZE)
            .is_none_or(|end| end > file_size)
        {
            return Ok(None);
        }

        let tag = self.source.read_u32(offset, Endian::Big)?;
        if tag == 0 || tag == u32::MAX {
            tracing::debug!(offset, "Padding reached, ending block walk");
            return Ok(None);
        }

        if self.visited >= self.limit {
            return Err(SchlError::BlockScanAborted {
                offset,
                reason: format!("more than {} blocks", self.limit),
            });
        }
        self.visited += 1;

        let size = u64::from(read_block_size(self.source, offset + 4)?);
        if size < BLOCK_HEADER_SIZE {
            return Err(SchlError::BlockScanAborted {
                offset,
                reason: format!("block {} declares size {}", FourCc(tag), size),
            });
        }

        let kind = BlockKind::from_tag(tag);
        if let BlockKind::Other(_) = kind {
            tracing::warn!(offset, tag = %FourCc(tag), size, "Unknown block tag");
        }

        let block = Block {
            offset,
            tag,
            kind,
            size,
        };

        let next = offset.saturating_add(size);
        match kind {
            BlockKind::End => match self.next_substream(next)? {
                Some(resume) => self.offset = resume,
                None => self.done = true,
            },
            _ => self.offset = next,
        }

        Ok(Some(block))
    }

    /// Locate the next sub-stream after an `SCEl` that ended at `end`.
    ///
    /// Returns the offset to resume at, or `None` when the walk is over.
    fn next_substream(&self, end: u64) -> Result<Option<u64>> {
        let file_size = self.source.size();
        if end
            .checked_add(SUBSTREAM_WINDOW)
            .is_none_or(|limit| limit > file_size)
        {
            return Ok(None);
        }

        // Sub-streams are padded to 0x80, but the search only assumes
        // 4-byte alignment.
        let mut pos = end.next_multiple_of(4);
        let mut last = 0;
        for _ in 0..SUBSTREAM_WINDOW / 4 {
            if pos + 4 > file_size {
                return Ok(None);
            }
            last = self.source.read_u32(pos, Endian::Big)?;
            if last == TAG_HEADER {
                tracing::debug!(offset = pos, "Found concatenated sub-stream");
                return Ok(Some(pos));
            }
            pos += 4;
        }

        if last == 0 || last == u32::MAX {
            return Ok(None);
        }
        Ok(Some(pos))
    }
}

impl<S: ByteSource + ?Sized> Iterator for BlockWalker<'_, S> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(block)) => Some(Ok(block)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// PS-ADPCM: 16-byte frames of 28 samples, interleaved across channels.
pub fn ps_bytes_to_samples(bytes: u64, channels: u8) -> u64 {
    if channels == 0 {
        return 0;
    }
    bytes / u64::from(channels) / 16 * 28
}

/// Total samples across every data block, including concatenated
/// sub-streams, starting at `body_start`.
pub fn scan_total_samples<S: ByteSource + ?Sized>(
    source: &S,
    body_start: u64,
    desc: &StreamDescriptor,
) -> Result<u64> {
    scan_total_samples_with(source, body_start, desc, DEFAULT_MAX_BLOCKS)
}

/// [`scan_total_samples`] with an explicit block limit.
pub fn scan_total_samples_with<S: ByteSource + ?Sized>(
    source: &S,
    body_start: u64,
    desc: &StreamDescriptor,
    max_blocks: u32,
) -> Result<u64> {
    let endian = desc.endian();
    let mut total = 0u64;
    let mut data_blocks = 0u32;

    for block in BlockWalker::new(source, body_start).with_limit(max_blocks) {
        let block = block?;
        if block.kind != BlockKind::Data {
            continue;
        }
        data_blocks += 1;
        total += match desc.codec {
            Codec::Psx => {
                ps_bytes_to_samples(block.size.saturating_sub(PSX_BLOCK_HEADER), desc.channels)
            }
            _ => u64::from(source.read_u32(block.offset + DATA_SAMPLE_COUNT, endian)?),
        };
    }

    tracing::debug!(data_blocks, total, "Scanned body sample count");
    Ok(total)
}

/// Absolute offset of the first payload byte inside the first data block,
/// for codecs that carry their own framing (MPEG).
///
/// Only count blocks may precede the first data block.
pub fn find_payload_offset<S: ByteSource + ?Sized>(
    source: &S,
    body_start: u64,
    desc: &StreamDescriptor,
) -> Result<u64> {
    find_payload_offset_with(source, body_start, desc, DEFAULT_MAX_BLOCKS)
}

/// [`find_payload_offset`] with an explicit block limit.
pub fn find_payload_offset_with<S: ByteSource + ?Sized>(
    source: &S,
    body_start: u64,
    desc: &StreamDescriptor,
    max_blocks: u32,
) -> Result<u64> {
    for block in BlockWalker::new(source, body_start).with_limit(max_blocks) {
        let block = block?;
        match block.kind {
            BlockKind::Count => continue,
            BlockKind::Data => {
                // MPEG channels share one stream; the first offset is enough.
                let table = block.offset + DATA_CHANNEL_TABLE;
                let first = source.read_u32(table, desc.endian())?;
                return Ok(table + u64::from(desc.channels) * 4 + u64::from(first));
            }
            _ => {
                return Err(SchlError::BlockScanAborted {
                    offset: block.offset,
                    reason: format!("{} block before the first data block", FourCc(block.tag)),
                })
            }
        }
    }

    Err(SchlError::BlockScanAborted {
        offset: body_start,
        reason: "no data block found".to_string(),
    })
}
