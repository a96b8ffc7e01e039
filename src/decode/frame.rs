//! Animation frame records
//!
//! A frame header is 20 bytes, all pointers relative to the sprite record:
//!
//! ```text
//! u32 tiles      -> u32 byte length, then 4bpp tiles
//! u32 palette    -> u32 advisory length, then 16-colour banks
//! u32 reserved
//! u32 oam        -> u32 offset of the OAM list, relative to this location
//! u16 delay
//! u16 action     0x00 next, 0x80 stop, 0xC0 loop
//! ```

use std::io::Cursor;

use super::oam::{read_oam_list, OamEntry};
use super::palette::{read_palette, Color};
use super::pointer::{ReadExt, Region};
use super::tile::{read_tiles, Tile};
use super::DecodeError;

/// Bytes in one frame header.
pub const FRAME_HEADER_BYTES: u64 = 20;

/// What playback does after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameAction {
    /// Continue to the next frame
    Next,
    /// Restart the animation
    Loop,
    /// Hold on this frame
    Stop,
}

impl FrameAction {
    pub const NEXT_CODE: u16 = 0x00;
    pub const STOP_CODE: u16 = 0x80;
    pub const LOOP_CODE: u16 = 0xC0;

    /// Decode a ROM action code. Any code other than next ends the
    /// animation; codes other than loop are treated as stop.
    pub fn from_code(code: u16) -> Self {
        match code {
            Self::NEXT_CODE => FrameAction::Next,
            Self::LOOP_CODE => FrameAction::Loop,
            _ => FrameAction::Stop,
        }
    }

    /// Code written to the animation control chunk.
    pub fn wire_code(self) -> u8 {
        match self {
            FrameAction::Next => 0,
            FrameAction::Loop => 1,
            FrameAction::Stop => 2,
        }
    }

    pub fn is_terminal(self) -> bool {
        self != FrameAction::Next
    }
}

/// One decoded frame: its own tiles, palette and sprite placements.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub tiles: Vec<Tile>,
    /// Concatenated banks; every 16th entry is transparent
    pub palette: Vec<Color>,
    /// Display time in game frames
    pub delay: u16,
    pub action: FrameAction,
    /// Placements in draw order, later entries on top
    pub oam: Vec<OamEntry>,
}

/// Read the frame whose header starts at the cursor, leaving the cursor
/// just past the header.
pub fn read_frame(region: &Region<'_>, r: &mut Cursor<&[u8]>) -> Result<Frame, DecodeError> {
    let header_at = r.position() as u32;
    let tiles_ptr = r.read_u32_for("tiles pointer", header_at)?;
    let palette_ptr = r.read_u32_for("palette pointer", header_at)?;
    r.skip_for(4, "reserved pointer", header_at)?;
    let oam_ptr_ptr = r.read_u32_for("OAM pointer pointer", header_at)?;
    let delay = r.read_u16_for("delay", header_at)?;
    let action_code = r.read_u16_for("action", header_at)?;

    let action = FrameAction::from_code(action_code);
    let known = matches!(
        action_code,
        FrameAction::NEXT_CODE | FrameAction::STOP_CODE | FrameAction::LOOP_CODE
    );
    if !known {
        tracing::debug!(code = action_code, header_at, "unknown frame action, treating as stop");
    }

    let tiles = read_tiles(&mut region.cursor_at(tiles_ptr, "tiles")?, tiles_ptr)?;
    let palette = read_palette(&mut region.cursor_at(palette_ptr, "palette")?, palette_ptr)?;

    let mut oam_ptr_cursor = region.cursor_at(oam_ptr_ptr, "OAM pointer")?;
    let oam_ptr = oam_ptr_cursor.read_u32_for("OAM pointer", oam_ptr_ptr)?;
    let oam_at = oam_ptr_ptr.checked_add(oam_ptr).ok_or(DecodeError::OutOfRange {
        op: "OAM list",
        pointer: oam_ptr,
        offset: region.base() + 4 + oam_ptr_ptr as u64 + oam_ptr as u64,
        len: region.len(),
    })?;
    let oam = read_oam_list(&mut region.cursor_at(oam_at, "OAM list")?, oam_ptr)?;

    Ok(Frame { tiles, palette, delay, action, oam })
}
