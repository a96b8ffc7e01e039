//! GBA BIOS LZ77 decompression (type 0x10)
//!
//! Stream layout: a little-endian header word `0x10 | (size << 8)`, then
//! groups of one flag byte followed by eight blocks, flags read MSB first.
//! A clear flag is a literal byte; a set flag is a two-byte back-reference
//! `LLLL DDDD DDDD DDDD` copying `L + 3` bytes from `D + 1` bytes back.

use thiserror::Error;

/// Compression type tag in the low byte of the header.
const LZ77_TYPE: u8 = 0x10;

/// Error decompressing an LZ77 stream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Lz77Error {
    /// Header is missing or does not carry the LZ77 type tag
    #[error("bad LZ77 header byte {found:#04x}")]
    BadHeader { found: u8 },
    /// Input ended before the declared output size was produced
    #[error("input truncated at byte {at}: produced {produced} of {expected} bytes")]
    Truncated { at: usize, produced: usize, expected: usize },
    /// Back-reference points before the start of the output
    #[error("back-reference of distance {distance} at output byte {at}")]
    BadDistance { distance: usize, at: usize },
}

/// Decompress an LZ77 stream starting at the first byte of `input`.
///
/// Trailing input past the end of the stream is ignored.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>, Lz77Error> {
    let header = input
        .get(..4)
        .ok_or(Lz77Error::BadHeader { found: input.first().copied().unwrap_or(0) })?;
    if header[0] != LZ77_TYPE {
        return Err(Lz77Error::BadHeader { found: header[0] });
    }
    let expected = u32::from_le_bytes([header[1], header[2], header[3], 0]) as usize;

    let mut out = Vec::with_capacity(expected);
    let mut pos = 4;
    let next = |pos: &mut usize, produced: usize| -> Result<u8, Lz77Error> {
        let byte = *input.get(*pos).ok_or(Lz77Error::Truncated { at: *pos, produced, expected })?;
        *pos += 1;
        Ok(byte)
    };

    while out.len() < expected {
        let flags = next(&mut pos, out.len())?;
        for bit in 0..8 {
            if out.len() >= expected {
                break;
            }
            if flags & (0x80 >> bit) == 0 {
                let byte = next(&mut pos, out.len())?;
                out.push(byte);
                continue;
            }

            let hi = next(&mut pos, out.len())?;
            let lo = next(&mut pos, out.len())?;
            let length = (hi >> 4) as usize + 3;
            let distance = (((hi & 0x0F) as usize) << 8 | lo as usize) + 1;
            if distance > out.len() {
                return Err(Lz77Error::BadDistance { distance, at: out.len() });
            }
            for _ in 0..length {
                out.push(out[out.len() - distance]);
            }
        }
    }

    out.truncate(expected);
    Ok(out)
}
