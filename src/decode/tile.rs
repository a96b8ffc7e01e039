//! 4bpp tile decoding

use std::io::Cursor;

use super::pointer::ReadExt;
use super::DecodeError;

/// Tile edge length in pixels.
pub const TILE_SIZE: usize = 8;

/// Bytes per 4bpp tile.
pub const TILE_BYTES: usize = TILE_SIZE * TILE_SIZE / 2;

/// An 8×8 grid of 4-bit palette indices, row-major. Index 0 is transparent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile(pub [u8; TILE_SIZE * TILE_SIZE]);

impl Tile {
    /// Unpack 32 bytes: pixel `2i` is the low nibble of byte `i`, pixel
    /// `2i + 1` the high nibble.
    pub fn from_bytes(raw: &[u8; TILE_BYTES]) -> Self {
        let mut pixels = [0u8; TILE_SIZE * TILE_SIZE];
        for (i, byte) in raw.iter().enumerate() {
            pixels[i * 2] = byte & 0x0F;
            pixels[i * 2 + 1] = byte >> 4;
        }
        Tile(pixels)
    }

    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.0[y * TILE_SIZE + x]
    }
}

/// Read one tile from the cursor.
pub fn read_tile(r: &mut Cursor<&[u8]>, pointer: u32) -> Result<Tile, DecodeError> {
    let raw = r.read_array_for::<TILE_BYTES>("tile", pointer)?;
    Ok(Tile::from_bytes(&raw))
}

/// Read a length-prefixed tile block: a u32 byte length, then
/// `length / 32` tiles.
pub fn read_tiles(r: &mut Cursor<&[u8]>, pointer: u32) -> Result<Vec<Tile>, DecodeError> {
    let byte_len = r.read_u32_for("tile block length", pointer)?;
    let count = byte_len as usize / TILE_BYTES;

    let mut tiles = Vec::with_capacity(count.min(r.remaining() as usize / TILE_BYTES));
    for i in 0..count {
        tiles.push(read_tile(r, pointer).map_err(|e| e.within(format!("tile {}", i)))?);
    }
    Ok(tiles)
}
