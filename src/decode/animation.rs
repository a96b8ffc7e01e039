//! Animations and per-slot animation sets

use std::io::Cursor;

use super::frame::{read_frame, Frame, FRAME_HEADER_BYTES};
use super::pointer::{ReadExt, Region, RomPointer, SpriteRecord};
use super::DecodeError;

/// Frames in playback order. The last frame carries the terminal action.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Animation {
    pub frames: Vec<Frame>,
}

/// Every animation of one sprite slot. Read-only once decoded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnimationSet {
    pub animations: Vec<Animation>,
}

impl AnimationSet {
    /// Iterate all frames of all animations in order.
    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.animations.iter().flat_map(|a| a.frames.iter())
    }

    pub fn frame_count(&self) -> usize {
        self.animations.iter().map(|a| a.frames.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }
}

/// Read an animation pointer from the cursor and decode frames at its
/// target until one whose action is not [`FrameAction::Next`](super::FrameAction::Next).
/// That frame is included.
pub fn read_animation(
    region: &Region<'_>,
    r: &mut Cursor<&[u8]>,
) -> Result<Animation, DecodeError> {
    let header_at = r.position() as u32;
    let anim_ptr = r.read_u32_for("animation pointer", header_at)?;
    let mut frames_cursor = region.cursor_at(anim_ptr, "animation")?;

    let mut frames = Vec::new();
    loop {
        if frames_cursor.remaining() < FRAME_HEADER_BYTES {
            return Err(DecodeError::Unterminated { pointer: anim_ptr, frames: frames.len() });
        }
        let index = frames.len();
        let frame = read_frame(region, &mut frames_cursor)
            .map_err(|e| e.within(format!("frame {} of animation {:#010x}", index, anim_ptr)))?;
        let terminal = frame.action.is_terminal();
        frames.push(frame);
        if terminal {
            return Ok(Animation { frames });
        }
    }
}

/// Decode the animation set at the record base: three skipped bytes, a
/// one-byte count, then that many animation pointers.
pub fn read_animation_set(region: &Region<'_>) -> Result<AnimationSet, DecodeError> {
    let mut r = region.cursor_at_base("animation set")?;
    let base = region.base() as u32;
    r.skip_for(3, "animation set header", base)?;
    let count = r.read_u8_for("animation count", base)?;

    let mut animations = Vec::with_capacity(count as usize);
    for i in 0..count {
        let animation =
            read_animation(region, &mut r).map_err(|e| e.within(format!("animation {}", i)))?;
        animations.push(animation);
    }
    Ok(AnimationSet { animations })
}

/// Decode the sprite a raw sprite-table entry points at.
pub fn read_sprite(rom: &[u8], raw_pointer: u32) -> Result<AnimationSet, DecodeError> {
    let pointer = RomPointer::from_raw(raw_pointer);
    let record = SpriteRecord::resolve(rom, pointer)
        .map_err(|e| e.within(format!("sprite pointer {:#010x}", raw_pointer)))?;
    read_animation_set(&record.region())
        .map_err(|e| e.within(format!("sprite pointer {:#010x}", raw_pointer)))
}
