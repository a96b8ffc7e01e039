//! Object attribute (OAM) records
//!
//! Each record is five bytes:
//!
//! | Byte | Meaning |
//! |------|---------|
//! | 0 | tile index (`0xFF` ends the list) |
//! | 1 | x, signed |
//! | 2 | y, signed |
//! | 3 | flip bits (high nibble), size class (low nibble) |
//! | 4 | palette bank (high nibble), shape (low nibble) |

use std::io::Cursor;

use super::pointer::ReadExt;
use super::DecodeError;

/// Tile index that terminates an OAM list.
pub const OAM_END: u8 = 0xFF;

/// Size of one OAM record in bytes.
pub const OAM_RECORD_BYTES: usize = 5;

/// Horizontal and vertical flip state of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flip {
    #[default]
    None,
    Horizontal,
    Vertical,
    Both,
}

impl Flip {
    const H: u8 = 0x4;
    const V: u8 = 0x8;

    /// Decode the flip nibble (bit 2 = horizontal, bit 3 = vertical).
    pub fn from_bits(bits: u8) -> Self {
        match (bits & Self::H != 0, bits & Self::V != 0) {
            (false, false) => Flip::None,
            (true, false) => Flip::Horizontal,
            (false, true) => Flip::Vertical,
            (true, true) => Flip::Both,
        }
    }

    pub fn horizontal(self) -> bool {
        matches!(self, Flip::Horizontal | Flip::Both)
    }

    pub fn vertical(self) -> bool {
        matches!(self, Flip::Vertical | Flip::Both)
    }
}

/// Hardware sprite dimensions in tiles, indexed by `[size_class][shape]`.
/// Shape 0 is square, 1 is wide, 2 is tall.
const SHAPE_TABLE: [[(u8, u8); 3]; 4] = [
    [(1, 1), (2, 1), (1, 2)],
    [(2, 2), (4, 1), (1, 4)],
    [(4, 4), (4, 2), (2, 4)],
    [(8, 8), (8, 4), (4, 8)],
];

/// Width and height in tiles for a size class and shape, or `None` for
/// combinations the hardware does not define.
pub fn shape_dimensions(size_class: u8, shape: u8) -> Option<(u8, u8)> {
    SHAPE_TABLE.get(size_class as usize)?.get(shape as usize).copied()
}

/// One sprite placement record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OamEntry {
    /// First tile of the block in the frame's tile list
    pub tile_index: u8,
    /// Offset from the pivot, in pixels
    pub x: i8,
    pub y: i8,
    /// Block size in tiles; zero for undefined size/shape combinations
    pub width_tiles: u8,
    pub height_tiles: u8,
    /// Palette bank added to every opaque pixel, times 16
    pub palette_bank: u8,
    pub flip: Flip,
}

impl OamEntry {
    /// Decode a record. Returns `None` for the end-of-list sentinel.
    pub fn from_bytes(raw: &[u8; OAM_RECORD_BYTES]) -> Option<Self> {
        if raw[0] == OAM_END {
            return None;
        }
        let size_class = raw[3] & 0x0F;
        let shape = raw[4] & 0x0F;
        let (width_tiles, height_tiles) = shape_dimensions(size_class, shape).unwrap_or((0, 0));

        Some(Self {
            tile_index: raw[0],
            x: raw[1] as i8,
            y: raw[2] as i8,
            width_tiles,
            height_tiles,
            palette_bank: raw[4] >> 4,
            flip: Flip::from_bits(raw[3] >> 4),
        })
    }

    /// Number of tiles this entry draws.
    pub fn tile_count(&self) -> usize {
        self.width_tiles as usize * self.height_tiles as usize
    }
}

/// Read one OAM record. The sentinel is a single `0xFF` byte; the rest of
/// the record is not read after it.
pub fn read_oam_entry(
    r: &mut Cursor<&[u8]>,
    pointer: u32,
) -> Result<Option<OamEntry>, DecodeError> {
    let tile_index = r.read_u8_for("OAM tile index", pointer)?;
    if tile_index == OAM_END {
        return Ok(None);
    }
    let x = r.read_i8_for("OAM x", pointer)?;
    let y = r.read_i8_for("OAM y", pointer)?;
    let size_and_flip = r.read_u8_for("OAM size and flip", pointer)?;
    let bank_and_shape = r.read_u8_for("OAM palette bank and shape", pointer)?;

    Ok(OamEntry::from_bytes(&[tile_index, x as u8, y as u8, size_and_flip, bank_and_shape]))
}

/// Read OAM records until the sentinel.
pub fn read_oam_list(r: &mut Cursor<&[u8]>, pointer: u32) -> Result<Vec<OamEntry>, DecodeError> {
    let mut entries = Vec::new();
    loop {
        let index = entries.len();
        match read_oam_entry(r, pointer).map_err(|e| e.within(format!("OAM entry {}", index)))? {
            Some(entry) => entries.push(entry),
            None => return Ok(entries),
        }
    }
}
