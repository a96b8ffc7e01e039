//! Frame compositing - renders a frame's OAM entries onto an indexed canvas
//!
//! Pixels are palette indices stored in a [`GrayImage`]; the palette travels
//! separately with the frame. Index 0 is transparent everywhere: it is never
//! drawn over anything.

use image::{imageops, GrayImage, Luma};
use thiserror::Error;

use crate::decode::{Frame, OamEntry, Tile, TILE_SIZE};

/// An image of palette indices.
pub type IndexedImage = GrayImage;

/// Edge length of a frame canvas.
pub const CANVAS_SIZE: u32 = 512;

/// Canvas coordinate of the sprite pivot; OAM positions are relative to it.
pub const PIVOT: i32 = CANVAS_SIZE as i32 / 2;

/// Error rendering a frame
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// An OAM block runs past the frame's tile list
    #[error("OAM entry {entry} needs tiles {first}..{end} but the frame has {available}")]
    MissingTiles { entry: usize, first: usize, end: usize, available: usize },
}

/// Build the bitmap for one OAM entry: its tile block blitted row-major,
/// shifted into its palette bank, then flipped. Zero-sized entries yield
/// `None`.
pub fn render_entry(entry: &OamEntry, tiles: &[Tile]) -> Option<IndexedImage> {
    if entry.tile_count() == 0 {
        return None;
    }
    let first = entry.tile_index as usize;
    let block = tiles.get(first..first + entry.tile_count())?;

    let w = entry.width_tiles as u32 * TILE_SIZE as u32;
    let h = entry.height_tiles as u32 * TILE_SIZE as u32;
    let bank_base = entry.palette_bank * 16;

    let mut img = IndexedImage::new(w, h);
    for (i, tile) in block.iter().enumerate() {
        let tx = (i % entry.width_tiles as usize * TILE_SIZE) as u32;
        let ty = (i / entry.width_tiles as usize * TILE_SIZE) as u32;
        for y in 0..TILE_SIZE {
            for x in 0..TILE_SIZE {
                let p = tile.pixel(x, y);
                if p != 0 {
                    img.put_pixel(tx + x as u32, ty + y as u32, Luma([p + bank_base]));
                }
            }
        }
    }

    if entry.flip.horizontal() {
        img = imageops::flip_horizontal(&img);
    }
    if entry.flip.vertical() {
        img = imageops::flip_vertical(&img);
    }
    Some(img)
}

/// Copy `src` onto `dst` at `(x, y)`, skipping transparent source pixels.
/// Parts falling outside `dst` are clipped.
pub fn draw_over(dst: &mut IndexedImage, src: &IndexedImage, x: i32, y: i32) {
    for (sx, sy, pixel) in src.enumerate_pixels() {
        if pixel[0] == 0 {
            continue;
        }
        let dx = x + sx as i32;
        let dy = y + sy as i32;
        if dx < 0 || dy < 0 || dx >= dst.width() as i32 || dy >= dst.height() as i32 {
            continue;
        }
        dst.put_pixel(dx as u32, dy as u32, *pixel);
    }
}

/// Render a frame onto a fresh [`CANVAS_SIZE`] canvas centred on [`PIVOT`].
///
/// Entries are drawn in list order, so later entries cover earlier ones.
pub fn render_frame(frame: &Frame) -> Result<IndexedImage, RenderError> {
    let mut canvas = IndexedImage::new(CANVAS_SIZE, CANVAS_SIZE);

    for (i, entry) in frame.oam.iter().enumerate() {
        let Some(img) = render_entry(entry, &frame.tiles) else {
            if entry.tile_count() > 0 {
                return Err(RenderError::MissingTiles {
                    entry: i,
                    first: entry.tile_index as usize,
                    end: entry.tile_index as usize + entry.tile_count(),
                    available: frame.tiles.len(),
                });
            }
            continue;
        };
        draw_over(&mut canvas, &img, PIVOT + entry.x as i32, PIVOT + entry.y as i32);
    }

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{Flip, FrameAction};

    /// A tile whose every pixel encodes its own position within the block,
    /// so blits can be checked exactly. Values stay within 1..=15.
    fn numbered_tiles(n: usize) -> Vec<Tile> {
        (0..n).map(|i| Tile([(i % 15) as u8 + 1; 64])).collect()
    }

    fn entry(size: u8, shape: u8, flip: Flip, bank: u8) -> OamEntry {
        let mut e = OamEntry::from_bytes(&[0, 0, 0, size, shape]).unwrap();
        e.flip = flip;
        e.palette_bank = bank;
        e
    }

    fn frame(tiles: Vec<Tile>, oam: Vec<OamEntry>) -> Frame {
        Frame { tiles, palette: vec![], delay: 1, action: FrameAction::Stop, oam }
    }

    #[test]
    fn test_all_shapes_blit_row_major() {
        for size in 0..4 {
            for shape in 0..3 {
                let e = entry(size, shape, Flip::None, 0);
                let (w, h) = (e.width_tiles as usize, e.height_tiles as usize);
                let tiles = numbered_tiles(w * h);
                let img = render_entry(&e, &tiles).unwrap();
                assert_eq!(img.dimensions(), ((w * 8) as u32, (h * 8) as u32));
                for ty in 0..h {
                    for tx in 0..w {
                        let expected = tiles[ty * w + tx].pixel(0, 0);
                        let px = img.get_pixel((tx * 8 + 3) as u32, (ty * 8 + 5) as u32)[0];
                        let at = (size, shape, tx, ty);
                        assert_eq!(px, expected, "size/shape/tile {:?}", at);
                    }
                }
            }
        }
    }

    #[test]
    fn test_palette_bank_offsets_opaque_pixels_only() {
        let mut tile = Tile([0; 64]);
        tile.0[1] = 5;
        let img = render_entry(&entry(0, 0, Flip::None, 3), &[tile]).unwrap();
        assert_eq!(img.get_pixel(0, 0)[0], 0);
        assert_eq!(img.get_pixel(1, 0)[0], 5 + 48);
    }

    #[test]
    fn test_max_bank_fits_in_byte() {
        let tile = Tile([15; 64]);
        let img = render_entry(&entry(0, 0, Flip::None, 15), &[tile]).unwrap();
        assert_eq!(img.get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_flips() {
        // 2x1 wide block: tile 0 = 1s, tile 1 = 2s, with a marker in tile 0's top-left
        let mut t0 = Tile([1; 64]);
        t0.0[0] = 9;
        let tiles = vec![t0, Tile([2; 64])];

        let none = render_entry(&entry(0, 1, Flip::None, 0), &tiles).unwrap();
        assert_eq!(none.get_pixel(0, 0)[0], 9);
        assert_eq!(none.get_pixel(15, 0)[0], 2);

        let h = render_entry(&entry(0, 1, Flip::Horizontal, 0), &tiles).unwrap();
        assert_eq!(h.get_pixel(15, 0)[0], 9);
        assert_eq!(h.get_pixel(0, 0)[0], 2);

        let v = render_entry(&entry(0, 1, Flip::Vertical, 0), &tiles).unwrap();
        assert_eq!(v.get_pixel(0, 7)[0], 9);
        assert_eq!(v.get_pixel(0, 0)[0], 1);

        let both = render_entry(&entry(0, 1, Flip::Both, 0), &tiles).unwrap();
        assert_eq!(both.get_pixel(15, 7)[0], 9);
    }

    #[test]
    fn test_entry_placed_relative_to_pivot() {
        let mut e = entry(0, 0, Flip::None, 0);
        e.x = -8;
        e.y = 4;
        let canvas = render_frame(&frame(vec![Tile([7; 64])], vec![e])).unwrap();
        assert_eq!(canvas.dimensions(), (CANVAS_SIZE, CANVAS_SIZE));
        assert_eq!(canvas.get_pixel(248, 260)[0], 7);
        assert_eq!(canvas.get_pixel(255, 267)[0], 7);
        assert_eq!(canvas.get_pixel(256, 260)[0], 0);
        assert_eq!(canvas.get_pixel(248, 259)[0], 0);
    }

    #[test]
    fn test_later_entries_draw_over_earlier() {
        let mut top = Tile([0; 64]);
        top.0[0] = 3;
        let tiles = vec![Tile([1; 64]), top];
        let under = entry(0, 0, Flip::None, 0);
        let mut over = under;
        over.tile_index = 1;

        let canvas = render_frame(&frame(tiles, vec![under, over])).unwrap();
        // Opaque pixel of the later entry wins, its transparent pixels do not erase
        assert_eq!(canvas.get_pixel(256, 256)[0], 3);
        assert_eq!(canvas.get_pixel(257, 256)[0], 1);
    }

    #[test]
    fn test_zero_sized_entry_draws_nothing() {
        let e = OamEntry::from_bytes(&[0, 0, 0, 0, 3]).unwrap();
        let canvas = render_frame(&frame(vec![Tile([1; 64])], vec![e])).unwrap();
        assert!(canvas.pixels().all(|p| p[0] == 0));
    }

    /// Tiles whose pixels vary with tile, column and row, with a transparent
    /// diagonal in each tile. Opaque values stay within 1..=15.
    fn positional_tiles(n: usize) -> Vec<Tile> {
        (0..n)
            .map(|t| {
                let mut px = [0u8; 64];
                for y in 0..TILE_SIZE {
                    for x in 0..TILE_SIZE {
                        if x != y {
                            px[y * TILE_SIZE + x] = ((t * 7 + x * 3 + y * 5) % 15) as u8 + 1;
                        }
                    }
                }
                Tile(px)
            })
            .collect()
    }

    #[test]
    fn test_every_shape_flip_and_bank_pixel_exact() {
        let bank = 5u8;
        let (x, y) = (-16i8, -32i8);

        for size in 0..4u8 {
            for shape in 0..3u8 {
                for flip_bits in [0x0u8, 0x4, 0x8, 0xC] {
                    let raw = [0, x as u8, y as u8, flip_bits << 4 | size, bank << 4 | shape];
                    let e = OamEntry::from_bytes(&raw).unwrap();
                    let (w, h) = (e.width_tiles as usize, e.height_tiles as usize);
                    let (pw, ph) = (w * TILE_SIZE, h * TILE_SIZE);
                    let tiles = positional_tiles(w * h);
                    let canvas = render_frame(&frame(tiles.clone(), vec![e])).unwrap();
                    let case = (size, shape, flip_bits);

                    let mut opaque = 0;
                    for by in 0..ph {
                        for bx in 0..pw {
                            let sx = if e.flip.horizontal() { pw - 1 - bx } else { bx };
                            let sy = if e.flip.vertical() { ph - 1 - by } else { by };
                            let tile = &tiles[(sy / TILE_SIZE) * w + sx / TILE_SIZE];
                            let p = tile.pixel(sx % TILE_SIZE, sy % TILE_SIZE);
                            let expected = if p == 0 { 0 } else { p + bank * 16 };
                            opaque += (p != 0) as usize;

                            let cx = (PIVOT + x as i32) as u32 + bx as u32;
                            let cy = (PIVOT + y as i32) as u32 + by as u32;
                            let got = canvas.get_pixel(cx, cy)[0];
                            assert_eq!(got, expected, "{:?} at ({}, {})", case, bx, by);
                        }
                    }
                    // Nothing drawn outside the block
                    let drawn = canvas.pixels().filter(|p| p[0] != 0).count();
                    assert_eq!(drawn, opaque, "{:?}", case);
                }
            }
        }
    }

    #[test]
    fn test_missing_tiles_is_error() {
        let e = entry(1, 0, Flip::None, 0);
        let err = render_frame(&frame(numbered_tiles(3), vec![e])).unwrap_err();
        assert_eq!(err, RenderError::MissingTiles { entry: 0, first: 0, end: 4, available: 3 });
    }

    #[test]
    fn test_draw_over_clips() {
        let mut dst = IndexedImage::new(4, 4);
        let src = IndexedImage::from_pixel(3, 3, Luma([2]));
        draw_over(&mut dst, &src, -1, 2);
        assert_eq!(dst.get_pixel(0, 2)[0], 2);
        assert_eq!(dst.get_pixel(1, 3)[0], 2);
        assert_eq!(dst.get_pixel(2, 2)[0], 0);
    }
}
