//! Atlas packing - trims rendered frames and packs them into one sprite sheet
//!
//! Frames are placed left to right in their original order, one pixel apart.
//! When a frame does not fit in the rest of the row, the cursor wraps to the
//! left edge just below everything packed so far. The finished sheet is
//! trimmed to its occupied bounds.

use tracing::warn;

use crate::decode::{AnimationSet, Color, FrameAction};
use crate::render::{draw_over, render_frame, IndexedImage, RenderError};

/// Configuration for atlas packing
#[derive(Debug, Clone)]
pub struct AtlasConfig {
    /// Working canvas dimensions (width, height)
    pub max_size: (u32, u32),
    /// Gap between frames in pixels
    pub padding: u32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self { max_size: (2048, 2048), padding: 1 }
    }
}

/// Half-open rectangle: `left..right` by `top..bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.left + dx, self.top + dy, self.right + dx, self.bottom + dy)
    }

    /// Whether two rectangles share any pixel.
    pub fn overlaps(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }
}

/// Tightest rectangle around all non-zero pixels. An all-transparent image
/// yields the empty rectangle `(0, 0, 0, 0)`.
pub fn find_trim(img: &IndexedImage) -> Rect {
    let (w, h) = img.dimensions();
    let opaque_col = |x: u32| (0..h).any(|y| img.get_pixel(x, y)[0] != 0);
    let opaque_row = |y: u32| (0..w).any(|x| img.get_pixel(x, y)[0] != 0);

    let Some(left) = (0..w).find(|&x| opaque_col(x)) else {
        return Rect::default();
    };
    let right = (0..w).rev().find(|&x| opaque_col(x)).unwrap_or(left) + 1;
    let top = (0..h).find(|&y| opaque_row(y)).unwrap_or(0);
    let bottom = (0..h).rev().find(|&y| opaque_row(y)).unwrap_or(top) + 1;

    Rect::new(left as i32, top as i32, right as i32, bottom as i32)
}

/// Copy the `src_rect` region of `src` into `dst` at `(x, y)`.
fn copy_region(dst: &mut IndexedImage, src: &IndexedImage, src_rect: Rect, x: i32, y: i32) {
    if src_rect.is_empty() {
        return;
    }
    let region = image::imageops::crop_imm(
        src,
        src_rect.left as u32,
        src_rect.top as u32,
        src_rect.width() as u32,
        src_rect.height() as u32,
    )
    .to_image();
    draw_over(dst, &region, x, y);
}

/// A frame's place in the sheet plus what a renderer needs to play it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedFrame {
    /// Where the trimmed frame sits in the sheet
    pub bbox: Rect,
    /// Pivot position relative to the top-left of `bbox`
    pub origin: (i32, i32),
    pub delay: u16,
    pub action: FrameAction,
}

/// The packed, trimmed sprite sheet for one slot.
#[derive(Debug, Clone)]
pub struct SpriteSheet {
    pub image: IndexedImage,
    /// Palette for the sheet's pixel indices; may exceed 256 entries
    pub palette: Vec<Color>,
    /// One entry per packed frame, in original order
    pub frames: Vec<PlacedFrame>,
}

/// Incremental packer: push frames in order, then [`finish`](Self::finish).
#[derive(Debug)]
pub struct AtlasPacker {
    config: AtlasConfig,
    canvas: IndexedImage,
    left: i32,
    top: i32,
    /// Bottom edge of everything packed so far
    packed_bottom: i32,
    /// Frames that ran past the canvas and lost pixels
    clipped: usize,
    frames: Vec<PlacedFrame>,
    palette: Vec<Color>,
}

impl AtlasPacker {
    pub fn new(config: AtlasConfig) -> Self {
        let canvas = IndexedImage::new(config.max_size.0, config.max_size.1);
        Self {
            config,
            canvas,
            left: 0,
            top: 0,
            packed_bottom: 0,
            clipped: 0,
            frames: vec![],
            palette: vec![],
        }
    }

    /// Trim a rendered frame canvas and place it at the cursor.
    ///
    /// `image` is a full frame canvas with the pivot at its centre. The
    /// sheet palette becomes `palette`; frames of one slot share it.
    pub fn push(
        &mut self,
        image: &IndexedImage,
        palette: &[Color],
        delay: u16,
        action: FrameAction,
    ) {
        let trim = find_trim(image);
        let origin = (image.width() as i32 / 2 - trim.left, image.height() as i32 / 2 - trim.top);

        if self.left + trim.width() > self.config.max_size.0 as i32 {
            self.left = 0;
            self.top = self.packed_bottom + self.config.padding as i32;
        }

        let bbox =
            Rect::new(self.left, self.top, self.left + trim.width(), self.top + trim.height());
        copy_region(&mut self.canvas, image, trim, bbox.left, bbox.top);
        let (max_w, max_h) = self.config.max_size;
        if !trim.is_empty() && (bbox.right > max_w as i32 || bbox.bottom > max_h as i32) {
            self.clipped += 1;
            warn!(
                "frame {} at {:?} does not fit the {}x{} atlas canvas; pixels outside it are lost",
                self.frames.len(),
                bbox,
                max_w,
                max_h
            );
        }
        if !trim.is_empty() {
            self.packed_bottom = self.packed_bottom.max(bbox.bottom);
        }

        self.frames.push(PlacedFrame { bbox, origin, delay, action });
        self.palette = palette.to_vec();
        self.left += trim.width() + self.config.padding as i32;
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Number of frames pushed so far that were clipped by the canvas edge.
    pub fn clipped_frames(&self) -> usize {
        self.clipped
    }

    /// Trim the canvas to its occupied bounds. Returns `None` when no frame
    /// contributed a pixel. Frame boxes are shifted to the trimmed origin.
    pub fn finish(self) -> Option<SpriteSheet> {
        let bounds = find_trim(&self.canvas);
        if bounds.is_empty() {
            return None;
        }

        let image = image::imageops::crop_imm(
            &self.canvas,
            bounds.left as u32,
            bounds.top as u32,
            bounds.width() as u32,
            bounds.height() as u32,
        )
        .to_image();
        let frames = self
            .frames
            .into_iter()
            .map(|f| PlacedFrame { bbox: f.bbox.translate(-bounds.left, -bounds.top), ..f })
            .collect();

        Some(SpriteSheet { image, palette: self.palette, frames })
    }
}

/// Render and pack every frame of a slot, in animation order.
///
/// Returns `Ok(None)` when the slot has no visible pixels.
pub fn pack_animation_set(
    set: &AnimationSet,
    config: &AtlasConfig,
) -> Result<Option<SpriteSheet>, RenderError> {
    let mut packer = AtlasPacker::new(config.clone());
    for frame in set.frames() {
        let canvas = render_frame(frame)?;
        packer.push(&canvas, &frame.palette, frame.delay, frame.action);
    }
    Ok(packer.finish())
}
