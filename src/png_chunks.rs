//! Streaming PNG chunk reader and writer
//!
//! Chunks are read one at a time from any [`Read`], so a chunk stream can be
//! rewritten while the encoder on the other end is still producing it.

use std::fmt;
use std::io::{self, Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt, BE};

/// The eight bytes every PNG starts with.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Four-letter chunk type code.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkType(pub [u8; 4]);

#[allow(non_upper_case_globals)]
impl ChunkType {
    pub const IHDR: Self = Self(*b"IHDR");
    pub const PLTE: Self = Self(*b"PLTE");
    pub const tRNS: Self = Self(*b"tRNS");
    pub const IDAT: Self = Self(*b"IDAT");
    pub const IEND: Self = Self(*b"IEND");
    pub const sPLT: Self = Self(*b"sPLT");
    pub const zTXt: Self = Self(*b"zTXt");

    /// Parse a four-letter code such as `"IDAT"`.
    pub fn from_name(name: &str) -> Option<Self> {
        let bytes: [u8; 4] = name.as_bytes().try_into().ok()?;
        bytes.iter().all(u8::is_ascii_alphabetic).then_some(Self(bytes))
    }
}

impl fmt::Debug for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A chunk exactly as it appeared in the stream, CRC included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChunk {
    pub chunk_type: ChunkType,
    pub data: Vec<u8>,
    pub crc: u32,
}

/// CRC of a chunk: covers the type code and the data.
pub fn chunk_crc(chunk_type: ChunkType, data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&chunk_type.0);
    hasher.update(data);
    hasher.finalize()
}

/// Reads a PNG stream chunk by chunk.
pub struct ChunkReader<R> {
    inner: R,
}

impl<R: Read> ChunkReader<R> {
    /// Consume and check the PNG signature.
    pub fn new(mut inner: R) -> io::Result<Self> {
        let mut signature = [0u8; 8];
        inner.read_exact(&mut signature)?;
        if signature != PNG_SIGNATURE {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "missing PNG signature"));
        }
        Ok(Self { inner })
    }

    /// Next chunk, or `None` at a clean end of stream.
    pub fn next_chunk(&mut self) -> io::Result<Option<RawChunk>> {
        let mut len_bytes = [0u8; 4];
        let mut filled = 0;
        while filled < len_bytes.len() {
            match self.inner.read(&mut len_bytes[filled..]) {
                Ok(0) if filled == 0 => return Ok(None),
                Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        let len = u32::from_be_bytes(len_bytes);

        let mut chunk_type = [0u8; 4];
        self.inner.read_exact(&mut chunk_type)?;
        let mut data = vec![0u8; len as usize];
        self.inner.read_exact(&mut data)?;
        let crc = self.inner.read_u32::<BE>()?;

        Ok(Some(RawChunk { chunk_type: ChunkType(chunk_type), data, crc }))
    }
}

/// Writes a PNG stream chunk by chunk.
pub struct ChunkWriter<W> {
    inner: W,
}

impl<W: Write> ChunkWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn write_signature(&mut self) -> io::Result<()> {
        self.inner.write_all(&PNG_SIGNATURE)
    }

    /// Forward a chunk unchanged, original CRC included.
    pub fn write_raw(&mut self, chunk: &RawChunk) -> io::Result<()> {
        self.write_parts(chunk.chunk_type, &chunk.data, chunk.crc)
    }

    /// Write a new chunk, computing its CRC.
    pub fn write_chunk(&mut self, chunk_type: ChunkType, data: &[u8]) -> io::Result<()> {
        self.write_parts(chunk_type, data, chunk_crc(chunk_type, data))
    }

    fn write_parts(&mut self, chunk_type: ChunkType, data: &[u8], crc: u32) -> io::Result<()> {
        let len = u32::try_from(data.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "chunk too large"))?;
        self.inner.write_u32::<BE>(len)?;
        self.inner.write_all(&chunk_type.0)?;
        self.inner.write_all(data)?;
        self.inner.write_u32::<BE>(crc)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
