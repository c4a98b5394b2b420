//! Random-access byte sources.
//!
//! Every read in this crate is by absolute offset, so parses never share an
//! implicit cursor. A source is read-only and can back any number of
//! independent parses.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Mutex;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchlError};

/// Byte order of a multi-byte read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endian {
    Big,
    Little,
}

impl Endian {
    pub fn from_big(big_endian: bool) -> Self {
        if big_endian {
            Endian::Big
        } else {
            Endian::Little
        }
    }
}

/// Absolute-offset reader over untrusted bytes.
///
/// Implementors only provide [`size`](ByteSource::size) and
/// [`read_at`](ByteSource::read_at); `read_at` must fail with
/// [`SchlError::TruncatedOrOutOfRange`] instead of short-reading.
pub trait ByteSource {
    /// Total size of the source in bytes.
    fn size(&self) -> u64;

    /// Fill `buf` with the bytes starting at `offset`.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()>;

    fn read_u8(&self, offset: u64) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_at(offset, &mut buf)?;
        Ok(buf[0])
    }

    fn read_u16(&self, offset: u64, endian: Endian) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_at(offset, &mut buf)?;
        Ok(match endian {
            Endian::Big => BigEndian::read_u16(&buf),
            Endian::Little => LittleEndian::read_u16(&buf),
        })
    }

    fn read_i16(&self, offset: u64, endian: Endian) -> Result<i16> {
        let mut buf = [0u8; 2];
        self.read_at(offset, &mut buf)?;
        Ok(match endian {
            Endian::Big => BigEndian::read_i16(&buf),
            Endian::Little => LittleEndian::read_i16(&buf),
        })
    }

    fn read_u32(&self, offset: u64, endian: Endian) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_at(offset, &mut buf)?;
        Ok(match endian {
            Endian::Big => BigEndian::read_u32(&buf),
            Endian::Little => LittleEndian::read_u32(&buf),
        })
    }
}

/// Check that `len` bytes at `offset` fit inside a source of `size` bytes.
fn check_range(offset: u64, len: usize, size: u64) -> Result<()> {
    if offset
        .checked_add(len as u64)
        .is_none_or(|end| end > size)
    {
        return Err(SchlError::TruncatedOrOutOfRange { offset, len, size });
    }
    Ok(())
}

impl ByteSource for [u8] {
    fn size(&self) -> u64 {
        self.len() as u64
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        check_range(offset, buf.len(), self.size())?;
        let start = offset as usize;
        buf.copy_from_slice(&self[start..start + buf.len()]);
        Ok(())
    }
}

impl ByteSource for Vec<u8> {
    fn size(&self) -> u64 {
        self.as_slice().size()
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.as_slice().read_at(offset, buf)
    }
}

/// Borrowed in-memory source.
#[derive(Debug, Clone, Copy)]
pub struct SliceSource<'a> {
    data: &'a [u8],
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl ByteSource for SliceSource<'_> {
    fn size(&self) -> u64 {
        self.data.size()
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.data.read_at(offset, buf)
    }
}

/// File-backed source.
///
/// The buffered handle sits behind a mutex so reads work through `&self`
/// and the source stays `Send + Sync`.
pub struct FileSource {
    inner: Mutex<BufReader<File>>,
    size: u64,
}

impl FileSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            inner: Mutex::new(BufReader::new(file)),
            size,
        })
    }
}

impl ByteSource for FileSource {
    fn size(&self) -> u64 {
        self.size
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        check_range(offset, buf.len(), self.size)?;
        // A poisoned lock only means another reader panicked mid-read; the
        // handle is re-seeked below, so its state is irrelevant.
        let mut reader = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        reader.seek(SeekFrom::Start(offset))?;
        reader.read_exact(buf)?;
        Ok(())
    }
}
