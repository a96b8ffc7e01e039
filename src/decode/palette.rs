//! BGR555 palette banks

use image::Rgba;
use std::io::Cursor;

use super::pointer::ReadExt;
use super::DecodeError;

/// An 8-bit RGBA colour.
pub type Color = Rgba<u8>;

/// Fully transparent black, forced into slot 0 of every bank.
pub const TRANSPARENT: Color = Rgba([0, 0, 0, 0]);

/// Colours per bank.
pub const BANK_COLORS: usize = 16;

/// Raw bytes per bank.
pub const BANK_BYTES: usize = BANK_COLORS * 2;

/// Upper bound on banks read from one palette region.
pub const MAX_BANKS: usize = 64;

/// Little-endian word that, found at the start of a bank, ends the region.
pub const BANK_TERMINATOR: u32 = 4;

/// Expand a BGR555 halfword to 8-bit RGBA.
pub fn bgr555_to_rgba(c: u16) -> Color {
    let expand = |v: u16| -> u8 {
        let v = (v & 0x1F) as u8;
        v << 3 | v >> 2
    };
    Rgba([expand(c), expand(c >> 5), expand(c >> 10), 0xFF])
}

/// Whether a bank's raw bytes mark the end of the palette region.
///
/// Palette regions carry an advisory byte length that does not reliably
/// bound the banks, so decoding stops at the first bank whose leading four
/// bytes read as little-endian `4`. This matches every known ROM but has no
/// documented basis; keep it in this one place.
pub fn is_bank_terminator(raw: &[u8; BANK_BYTES]) -> bool {
    u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) == BANK_TERMINATOR
}

/// Decode one bank. Slot 0 is always transparent whatever the source says.
pub fn decode_bank(raw: &[u8; BANK_BYTES]) -> [Color; BANK_COLORS] {
    let mut bank = [TRANSPARENT; BANK_COLORS];
    for (i, pair) in raw.chunks_exact(2).enumerate().skip(1) {
        bank[i] = bgr555_to_rgba(u16::from_le_bytes([pair[0], pair[1]]));
    }
    bank
}

/// Read a palette region: an advisory u32 byte length, then up to
/// [`MAX_BANKS`] banks, stopping early on a short read or a terminator bank.
/// Banks are concatenated in order.
pub fn read_palette(r: &mut Cursor<&[u8]>, pointer: u32) -> Result<Vec<Color>, DecodeError> {
    let _advisory_len = r.read_u32_for("palette length", pointer)?;

    let mut palette = Vec::new();
    for i in 0..MAX_BANKS {
        if r.remaining() < BANK_BYTES as u64 {
            break;
        }
        let raw = r
            .read_array_for::<BANK_BYTES>("palette bank", pointer)
            .map_err(|e| e.within(format!("bank {}", i)))?;
        if is_bank_terminator(&raw) {
            break;
        }
        palette.extend_from_slice(&decode_bank(&raw));
    }
    Ok(palette)
}
