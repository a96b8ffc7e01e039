//! PNG output with embedded animation metadata
//!
//! The sheet is encoded as an indexed PNG on one thread and streamed through
//! a bounded [`pipe`](crate::pipe::pipe) to a second thread that copies the
//! chunk stream to the output. Just before the trigger chunk (`IDAT` by
//! default) it inserts:
//!
//! - `sPLT` tagged `extra`: palette entries past index 255, only when the
//!   sheet palette has more than 256 colours
//! - `zTXt` tagged `fctrl`: one 14-byte record per packed frame
//!
//! Every other chunk is forwarded byte for byte.

use std::io::{self, Read, Write};
use std::sync::Mutex;

use thiserror::Error;

use crate::atlas::{PlacedFrame, SpriteSheet};
use crate::decode::{Color, TRANSPARENT};
use crate::pipe::pipe;
use crate::png_chunks::{ChunkReader, ChunkType, ChunkWriter};

/// Data prefix of the animation control chunk.
pub const CONTROL_TAG: &[u8] = b"fctrl\0\xff";

/// Data prefix of the overflow palette chunk.
pub const OVERFLOW_PALETTE_TAG: &[u8] = b"extra\0\x08";

/// Size of one animation control record.
pub const CONTROL_RECORD_BYTES: usize = 14;

/// Colours that fit in `PLTE`.
pub const PLTE_MAX: usize = 256;

/// Default number of buffers the encoder may run ahead of the remuxer.
pub const DEFAULT_PIPE_CAPACITY: usize = 4;

/// Error writing a sprite sheet
#[derive(Debug, Error)]
pub enum MuxError {
    #[error("PNG encode failed: {0}")]
    Encode(#[from] png::EncodingError),

    #[error("chunk stream I/O: {0}")]
    Io(#[from] io::Error),

    #[error("chunk stream ended before IEND")]
    MissingEnd,

    #[error("no {0} chunk to insert metadata before")]
    NoTrigger(ChunkType),

    #[error("frame {frame}: {field} {value} does not fit in a control record")]
    FieldOverflow { frame: usize, field: &'static str, value: i32 },
}

/// One frame's entry in the `fctrl` chunk, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRecord {
    pub left: i16,
    pub top: i16,
    pub right: i16,
    pub bottom: i16,
    pub origin_x: i16,
    pub origin_y: i16,
    pub delay: u8,
    pub action: u8,
}

impl ControlRecord {
    /// Convert a placed frame. The delay keeps its low byte.
    pub fn from_frame(index: usize, frame: &PlacedFrame) -> Result<Self, MuxError> {
        let field = |field: &'static str, value: i32| {
            i16::try_from(value).map_err(|_| MuxError::FieldOverflow { frame: index, field, value })
        };
        Ok(Self {
            left: field("left", frame.bbox.left)?,
            top: field("top", frame.bbox.top)?,
            right: field("right", frame.bbox.right)?,
            bottom: field("bottom", frame.bbox.bottom)?,
            origin_x: field("origin x", frame.origin.0)?,
            origin_y: field("origin y", frame.origin.1)?,
            delay: frame.delay as u8,
            action: frame.action.wire_code(),
        })
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        for v in [self.left, self.top, self.right, self.bottom, self.origin_x, self.origin_y] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out.push(self.delay);
        out.push(self.action);
    }

    pub fn from_bytes(b: &[u8; CONTROL_RECORD_BYTES]) -> Self {
        let i = |at: usize| i16::from_le_bytes([b[at], b[at + 1]]);
        Self {
            left: i(0),
            top: i(2),
            right: i(4),
            bottom: i(6),
            origin_x: i(8),
            origin_y: i(10),
            delay: b[12],
            action: b[13],
        }
    }
}

/// Build the `fctrl` chunk data for the packed frames, in order.
pub fn encode_control_chunk(frames: &[PlacedFrame]) -> Result<Vec<u8>, MuxError> {
    let mut data = Vec::with_capacity(CONTROL_TAG.len() + frames.len() * CONTROL_RECORD_BYTES);
    data.extend_from_slice(CONTROL_TAG);
    for (i, frame) in frames.iter().enumerate() {
        ControlRecord::from_frame(i, frame)?.write_to(&mut data);
    }
    Ok(data)
}

/// Parse `fctrl` chunk data back into records. Returns `None` if the tag
/// is missing or the length is not a whole number of records.
pub fn decode_control_chunk(data: &[u8]) -> Option<Vec<ControlRecord>> {
    let body = data.strip_prefix(CONTROL_TAG)?;
    if body.len() % CONTROL_RECORD_BYTES != 0 {
        return None;
    }
    body.chunks_exact(CONTROL_RECORD_BYTES)
        .map(|c| c.try_into().ok().map(ControlRecord::from_bytes))
        .collect()
}

/// Build the `extra` chunk data, or `None` when every colour fits in `PLTE`.
pub fn encode_overflow_palette(palette: &[Color]) -> Option<Vec<u8>> {
    let extra = palette.get(PLTE_MAX..).filter(|rest| !rest.is_empty())?;
    let mut data = Vec::with_capacity(OVERFLOW_PALETTE_TAG.len() + extra.len() * 6);
    data.extend_from_slice(OVERFLOW_PALETTE_TAG);
    for c in extra {
        data.extend_from_slice(&c.0);
        // sPLT frequency, unused
        data.extend_from_slice(&[0, 0]);
    }
    Some(data)
}

/// `PLTE` entries for a sheet: its palette capped at 256 colours, padded
/// with transparent black up to the highest index the image uses.
fn plte_entries(sheet: &SpriteSheet) -> Vec<Color> {
    let max_index = sheet.image.as_raw().iter().copied().max().unwrap_or(0) as usize;
    let len = sheet.palette.len().min(PLTE_MAX).max(max_index + 1);
    (0..len).map(|i| sheet.palette.get(i).copied().unwrap_or(TRANSPARENT)).collect()
}

/// Encode the sheet as an 8-bit indexed PNG with `PLTE` and `tRNS`.
pub fn encode_indexed_png<W: Write>(sheet: &SpriteSheet, out: W) -> Result<(), png::EncodingError> {
    let (width, height) = sheet.image.dimensions();
    let entries = plte_entries(sheet);
    let rgb: Vec<u8> = entries.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    let alpha: Vec<u8> = entries.iter().map(|c| c[3]).collect();

    let mut encoder = png::Encoder::new(out, width, height);
    encoder.set_color(png::ColorType::Indexed);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_palette(rgb);
    encoder.set_trns(alpha);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(sheet.image.as_raw())?;
    writer.finish()
}

/// Encodes sheets and splices the metadata chunks into the stream.
#[derive(Debug, Clone)]
pub struct MetadataMuxer {
    trigger: ChunkType,
    pipe_capacity: usize,
}

impl Default for MetadataMuxer {
    fn default() -> Self {
        Self { trigger: ChunkType::IDAT, pipe_capacity: DEFAULT_PIPE_CAPACITY }
    }
}

impl MetadataMuxer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the metadata before the first chunk of this type.
    pub fn with_trigger(mut self, trigger: ChunkType) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_pipe_capacity(mut self, capacity: usize) -> Self {
        self.pipe_capacity = capacity.max(1);
        self
    }

    pub fn trigger(&self) -> ChunkType {
        self.trigger
    }

    /// Write `sheet` to `out` as a PNG with metadata chunks, returning `out`.
    ///
    /// Encoding and remuxing run on separate threads joined before return.
    /// If both fail, the error raised first is reported.
    pub fn write_sheet<W: Write>(&self, sheet: &SpriteSheet, out: W) -> Result<W, MuxError> {
        let mut inserts = Vec::with_capacity(2);
        if let Some(extra) = encode_overflow_palette(&sheet.palette) {
            inserts.push((ChunkType::sPLT, extra));
        }
        inserts.push((ChunkType::zTXt, encode_control_chunk(&sheet.frames)?));

        let (mut writer, mut reader) = pipe(self.pipe_capacity);
        let first_error: Mutex<Option<MuxError>> = Mutex::new(None);
        let record = |e: MuxError| {
            let mut slot = first_error.lock().unwrap_or_else(|p| p.into_inner());
            slot.get_or_insert(e);
        };

        let written = std::thread::scope(|s| {
            s.spawn(|| {
                // The error is recorded before the writer drops, so the
                // remuxer cannot report the resulting EOF first.
                if let Err(e) = encode_indexed_png(sheet, &mut writer) {
                    record(e.into());
                }
                drop(writer);
            });

            let written = match self.remux(&mut reader, out, &inserts) {
                Ok(out) => Some(out),
                Err(e) => {
                    record(e);
                    None
                }
            };
            drop(reader);
            written
        });

        let first_error = first_error.into_inner().unwrap_or_else(|p| p.into_inner());
        match (first_error, written) {
            (Some(e), _) => Err(e),
            (None, Some(out)) => Ok(out),
            (None, None) => Err(MuxError::MissingEnd),
        }
    }

    /// Copy a chunk stream, inserting `inserts` before the trigger chunk.
    fn remux<R: Read, W: Write>(
        &self,
        input: R,
        out: W,
        inserts: &[(ChunkType, Vec<u8>)],
    ) -> Result<W, MuxError> {
        let mut reader = ChunkReader::new(input)?;
        let mut writer = ChunkWriter::new(out);
        writer.write_signature()?;

        let mut inserted = false;
        while let Some(chunk) = reader.next_chunk()? {
            if chunk.chunk_type == self.trigger && !inserted {
                for (chunk_type, data) in inserts {
                    writer.write_chunk(*chunk_type, data)?;
                }
                inserted = true;
            }
            if chunk.chunk_type == ChunkType::IEND && !inserted {
                return Err(MuxError::NoTrigger(self.trigger));
            }
            writer.write_raw(&chunk)?;
            if chunk.chunk_type == ChunkType::IEND {
                writer.flush()?;
                return Ok(writer.into_inner());
            }
        }
        Err(MuxError::MissingEnd)
    }
}
