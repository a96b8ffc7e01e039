//! Tagged ROM pointers and relative pointer resolution
//!
//! Sprite table entries are 32-bit values whose top bits carry tags: bit 31
//! marks an LZ77-compressed record and bit 27 is the `0x08000000` cartridge
//! base address. [`RomPointer`] decodes the tags once so nothing downstream
//! has to re-mask them. Pointers nested inside a record are plain offsets
//! resolved as `base + 4 + value` by a [`Region`].

use byteorder::{ReadBytesExt, LE};
use std::borrow::Cow;
use std::io::{Cursor, Read};

use super::DecodeError;
use crate::lz77;

/// Bit 31: the pointer targets an LZ77 blob.
pub const LZ77_FLAG: u32 = 0x8000_0000;

/// Bit 27: the cartridge ROM base address tag.
pub const ROM_BASE_FLAG: u32 = 0x0800_0000;

/// Offset of the sprite record inside a decompressed buffer. The first four
/// bytes repeat the LZ77 header and carry no record data.
pub const COMPRESSED_RECORD_BASE: u64 = 4;

/// A sprite table entry with its tag bits decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RomPointer {
    /// The record is stored uncompressed at this ROM offset
    Direct(u32),
    /// The record is LZ77-compressed; the blob starts at this ROM offset
    Compressed(u32),
}

impl RomPointer {
    /// Decode a raw little-endian table value, clearing bits 31 and 27.
    pub fn from_raw(raw: u32) -> Self {
        let offset = raw & !(LZ77_FLAG | ROM_BASE_FLAG);
        if raw & LZ77_FLAG != 0 {
            RomPointer::Compressed(offset)
        } else {
            RomPointer::Direct(offset)
        }
    }

    /// The untagged ROM offset.
    pub fn offset(self) -> u32 {
        match self {
            RomPointer::Direct(offset) | RomPointer::Compressed(offset) => offset,
        }
    }

    pub fn is_compressed(self) -> bool {
        matches!(self, RomPointer::Compressed(_))
    }
}

/// The bytes of one sprite record, either borrowed from the ROM or owned
/// after decompression, along with the base that relative pointers use.
#[derive(Debug, Clone)]
pub struct SpriteRecord<'a> {
    data: Cow<'a, [u8]>,
    base: u64,
    pointer: RomPointer,
}

impl<'a> SpriteRecord<'a> {
    /// Locate the record a table entry points at, decompressing if needed.
    pub fn resolve(rom: &'a [u8], pointer: RomPointer) -> Result<Self, DecodeError> {
        let offset = pointer.offset();
        if offset as usize > rom.len() {
            return Err(DecodeError::OutOfRange {
                op: "sprite record",
                pointer: offset,
                offset: offset as u64,
                len: rom.len(),
            });
        }

        match pointer {
            RomPointer::Direct(offset) => {
                Ok(Self { data: Cow::Borrowed(rom), base: offset as u64, pointer })
            }
            RomPointer::Compressed(offset) => {
                let data = lz77::decompress(&rom[offset as usize..]).map_err(|source| {
                    DecodeError::Decompress { op: "sprite record", pointer: offset, source }
                })?;
                Ok(Self { data: Cow::Owned(data), base: COMPRESSED_RECORD_BASE, pointer })
            }
        }
    }

    pub fn pointer(&self) -> RomPointer {
        self.pointer
    }

    /// A view for resolving pointers stored inside this record.
    pub fn region(&self) -> Region<'_> {
        Region { bytes: &self.data, base: self.base }
    }
}

/// Bytes plus the base offset that nested relative pointers resolve against.
#[derive(Debug, Clone, Copy)]
pub struct Region<'a> {
    bytes: &'a [u8],
    base: u64,
}

impl<'a> Region<'a> {
    pub fn new(bytes: &'a [u8], base: u64) -> Self {
        Self { bytes, base }
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Absolute offset of a relative pointer: `base + 4 + value`.
    pub fn resolve(&self, value: u32, op: &'static str) -> Result<u64, DecodeError> {
        self.check(self.base + 4 + value as u64, value, op)
    }

    /// A cursor positioned at the target of a relative pointer.
    pub fn cursor_at(&self, value: u32, op: &'static str) -> Result<Cursor<&'a [u8]>, DecodeError> {
        let offset = self.resolve(value, op)?;
        Ok(self.cursor_at_offset(offset))
    }

    /// A cursor positioned at the record base.
    pub fn cursor_at_base(&self, op: &'static str) -> Result<Cursor<&'a [u8]>, DecodeError> {
        let offset = self.check(self.base, 0, op)?;
        Ok(self.cursor_at_offset(offset))
    }

    fn cursor_at_offset(&self, offset: u64) -> Cursor<&'a [u8]> {
        let mut cursor = Cursor::new(self.bytes);
        cursor.set_position(offset);
        cursor
    }

    fn check(&self, offset: u64, pointer: u32, op: &'static str) -> Result<u64, DecodeError> {
        if offset > self.bytes.len() as u64 {
            return Err(DecodeError::OutOfRange { op, pointer, offset, len: self.bytes.len() });
        }
        Ok(offset)
    }
}

/// Little-endian reads that fail with a [`DecodeError::ShortRead`] naming the
/// operation and the pointer being followed.
pub(crate) trait ReadExt {
    fn read_u8_for(&mut self, op: &'static str, pointer: u32) -> Result<u8, DecodeError>;
    fn read_i8_for(&mut self, op: &'static str, pointer: u32) -> Result<i8, DecodeError>;
    fn read_u16_for(&mut self, op: &'static str, pointer: u32) -> Result<u16, DecodeError>;
    fn read_u32_for(&mut self, op: &'static str, pointer: u32) -> Result<u32, DecodeError>;
    fn read_array_for<const N: usize>(
        &mut self,
        op: &'static str,
        pointer: u32,
    ) -> Result<[u8; N], DecodeError>;
    fn skip_for(&mut self, n: u64, op: &'static str, pointer: u32) -> Result<(), DecodeError>;
    fn remaining(&self) -> u64;
}

macro_rules! short_read {
    ($cursor:expr, $op:expr, $pointer:expr, $read:expr) => {{
        let offset = $cursor.position();
        $read.map_err(|source| DecodeError::ShortRead {
            op: $op,
            pointer: $pointer,
            offset,
            source,
        })
    }};
}

impl ReadExt for Cursor<&[u8]> {
    fn read_u8_for(&mut self, op: &'static str, pointer: u32) -> Result<u8, DecodeError> {
        short_read!(self, op, pointer, self.read_u8())
    }

    fn read_i8_for(&mut self, op: &'static str, pointer: u32) -> Result<i8, DecodeError> {
        short_read!(self, op, pointer, self.read_i8())
    }

    fn read_u16_for(&mut self, op: &'static str, pointer: u32) -> Result<u16, DecodeError> {
        short_read!(self, op, pointer, self.read_u16::<LE>())
    }

    fn read_u32_for(&mut self, op: &'static str, pointer: u32) -> Result<u32, DecodeError> {
        short_read!(self, op, pointer, self.read_u32::<LE>())
    }

    fn read_array_for<const N: usize>(
        &mut self,
        op: &'static str,
        pointer: u32,
    ) -> Result<[u8; N], DecodeError> {
        let mut buf = [0u8; N];
        short_read!(self, op, pointer, self.read_exact(&mut buf))?;
        Ok(buf)
    }

    fn skip_for(&mut self, n: u64, op: &'static str, pointer: u32) -> Result<(), DecodeError> {
        if self.remaining() < n {
            let offset = self.position();
            return Err(DecodeError::ShortRead {
                op,
                pointer,
                offset,
                source: std::io::ErrorKind::UnexpectedEof.into(),
            });
        }
        self.set_position(self.position() + n);
        Ok(())
    }

    fn remaining(&self) -> u64 {
        (self.get_ref().len() as u64).saturating_sub(self.position())
    }
}
