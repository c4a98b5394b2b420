//! SCHl file reader — recognizes a file or buffer and keeps its source open
//! for inspection.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use schl_format::SchlReader;
//!
//! let reader = SchlReader::open(Path::new("music.asf")).unwrap();
//! let stream = reader.stream();
//! println!("{:?}: {} ch, {:.2}s", stream.coding, stream.channels, stream.duration_secs());
//! for block in reader.blocks() {
//!     let block = block.unwrap();
//!     println!("  0x{:08X} {:?} {}", block.offset, block.kind, block.size);
//! }
//! ```

use std::path::Path;

use crate::block::BlockWalker;
use crate::error::Result;
use crate::recognize::Recognizer;
use crate::source::{ByteSource, FileSource};
use crate::stream::DecodableStream;

type BoxedSource = Box<dyn ByteSource + Send + Sync>;

/// A recognized SCHl stream together with the bytes it came from.
pub struct SchlReader {
    name: String,
    source: BoxedSource,
    stream: DecodableStream,
    max_blocks: u32,
}

impl SchlReader {
    /// Open and recognize the file at `path` with default settings.
    ///
    /// # Errors
    ///
    /// Any [`SchlError`](crate::SchlError) from opening the file or from
    /// [`Recognizer::recognize`].
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, &Recognizer::new())
    }

    /// Open and recognize the file at `path` with a configured recognizer.
    pub fn open_with(path: &Path, recognizer: &Recognizer) -> Result<Self> {
        tracing::info!("Opening SCHl file: {}", path.display());
        let source = FileSource::open(path)?;
        Self::recognize(path.to_string_lossy().into_owned(), Box::new(source), recognizer)
    }

    /// Recognize an in-memory file. `name` is used for the extension check.
    pub fn from_bytes(name: &str, bytes: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with(name, bytes, &Recognizer::new())
    }

    pub fn from_bytes_with(name: &str, bytes: Vec<u8>, recognizer: &Recognizer) -> Result<Self> {
        Self::recognize(name.to_string(), Box::new(bytes), recognizer)
    }

    fn recognize(name: String, source: BoxedSource, recognizer: &Recognizer) -> Result<Self> {
        let stream = recognizer.recognize(source.as_ref(), &name)?;
        Ok(Self {
            name,
            source,
            stream,
            max_blocks: recognizer.block_limit(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stream(&self) -> &DecodableStream {
        &self.stream
    }

    pub fn file_size(&self) -> u64 {
        self.source.size()
    }

    /// Underlying byte source, for decoders that read blocks themselves.
    pub fn source(&self) -> &(dyn ByteSource + Send + Sync) {
        self.source.as_ref()
    }

    /// Lazy walk over every block in the file, header block included.
    ///
    /// Each call starts a fresh walk.
    pub fn blocks(&self) -> BlockWalker<'_, dyn ByteSource + Send + Sync> {
        BlockWalker::new(self.source.as_ref(), 0).with_limit(self.max_blocks)
    }
}
