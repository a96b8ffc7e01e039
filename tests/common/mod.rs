//! Synthetic ROM images for integration tests

#![allow(dead_code)]

use romsprite::png_chunks::{ChunkReader, ChunkType, ChunkWriter, RawChunk};

pub const BR6E_TABLE: usize = 0x0003_1CEC;
pub const BR6E_COUNT: usize = 815;

/// Where sprite records start, past the end of the BR6E table.
pub const RECORDS_AT: usize = 0x0003_3000;

/// Table entry for slots that should fail to decode.
pub const OUT_OF_RANGE: u32 = 0x08FF_0000;

/// One OAM placement: tile index, x, y, size class, shape.
pub type Oam = [u8; 5];

pub struct FrameSpec {
    /// Raw 4bpp tile data, 32 bytes per tile
    pub tiles: Vec<u8>,
    /// BGR555 colours of bank 0
    pub colors: [u16; 16],
    pub oam: Vec<Oam>,
    pub delay: u16,
    pub action: u16,
}

pub const RED: u16 = 0x001F;
pub const GREEN: u16 = 0x03E0;

pub fn palette(c1: u16, c2: u16) -> [u16; 16] {
    let mut colors = [0u16; 16];
    colors[1] = c1;
    colors[2] = c2;
    colors
}

/// Two frames: an 8x8 block of index 1 around the pivot, then a 16x8 block
/// of index 2 just above and right of it.
pub fn two_frame_sprite() -> Vec<FrameSpec> {
    vec![
        FrameSpec {
            tiles: vec![0x11; 32],
            colors: palette(RED, GREEN),
            oam: vec![[0, 0xFC, 0xFC, 0x00, 0x00]],
            delay: 5,
            action: 0x00,
        },
        FrameSpec {
            tiles: vec![0x22; 64],
            colors: palette(RED, GREEN),
            oam: vec![[0, 0x00, 0xF8, 0x00, 0x01]],
            delay: 7,
            action: 0x80,
        },
    ]
}

/// A sprite whose only frame has no OAM entries.
pub fn empty_sprite() -> Vec<FrameSpec> {
    vec![FrameSpec {
        tiles: vec![0x11; 32],
        colors: palette(RED, GREEN),
        oam: vec![],
        delay: 1,
        action: 0xC0,
    }]
}

/// Encode a sprite record with one animation. Pointers are relative to the
/// record start plus 4.
pub fn sprite_record(frames: &[FrameSpec]) -> Vec<u8> {
    let rel = |at: usize| (at - 4) as u32;

    let frames_at = 8;
    let data_at = frames_at + frames.len() * 20;
    let mut headers = Vec::new();
    let mut body = Vec::new();

    for frame in frames {
        let tiles_at = data_at + body.len();
        body.extend_from_slice(&(frame.tiles.len() as u32).to_le_bytes());
        body.extend_from_slice(&frame.tiles);

        let palette_at = data_at + body.len();
        body.extend_from_slice(&64u32.to_le_bytes());
        for c in frame.colors {
            body.extend_from_slice(&c.to_le_bytes());
        }
        // Bank terminator
        body.extend_from_slice(&4u32.to_le_bytes());
        body.extend_from_slice(&[0; 28]);

        let oam_ptr_at = data_at + body.len();
        body.extend_from_slice(&4u32.to_le_bytes());
        for entry in &frame.oam {
            body.extend_from_slice(entry);
        }
        body.push(0xFF);

        headers.extend_from_slice(&rel(tiles_at).to_le_bytes());
        headers.extend_from_slice(&rel(palette_at).to_le_bytes());
        headers.extend_from_slice(&0u32.to_le_bytes());
        headers.extend_from_slice(&rel(oam_ptr_at).to_le_bytes());
        headers.extend_from_slice(&frame.delay.to_le_bytes());
        headers.extend_from_slice(&frame.action.to_le_bytes());
    }

    let mut record = vec![0, 0, 0, 1];
    record.extend_from_slice(&rel(frames_at).to_le_bytes());
    record.extend_from_slice(&headers);
    record.extend_from_slice(&body);
    record
}

/// LZ77 (type 0x10) stream made only of literal blocks.
pub fn lz77_literal(data: &[u8]) -> Vec<u8> {
    let size = data.len() as u32;
    let mut out = vec![0x10, size as u8, (size >> 8) as u8, (size >> 16) as u8];
    for group in data.chunks(8) {
        out.push(0x00);
        out.extend_from_slice(group);
    }
    out
}

/// A BR6E image: slot 0 holds `two_frame_sprite` directly, slot 1 the same
/// record LZ77-compressed, slot 2 `empty_sprite`, every other slot points
/// past the end of the ROM.
pub fn br6e_rom() -> Vec<u8> {
    let mut rom = vec![0u8; RECORDS_AT];
    rom[0xA0..0xAC].copy_from_slice(b"MEGAMAN6_FXX");
    rom[0xAC..0xB0].copy_from_slice(b"BR6E");

    let mut entries = vec![OUT_OF_RANGE; BR6E_COUNT];

    entries[0] = 0x0800_0000 | rom.len() as u32;
    rom.extend_from_slice(&sprite_record(&two_frame_sprite()));

    while rom.len() % 4 != 0 {
        rom.push(0);
    }
    let mut unpacked = vec![0u8; 4];
    unpacked.extend_from_slice(&sprite_record(&two_frame_sprite()));
    entries[1] = 0x8800_0000 | rom.len() as u32;
    rom.extend_from_slice(&lz77_literal(&unpacked));

    while rom.len() % 4 != 0 {
        rom.push(0);
    }
    entries[2] = 0x0800_0000 | rom.len() as u32;
    rom.extend_from_slice(&sprite_record(&empty_sprite()));

    for (i, entry) in entries.iter().enumerate() {
        let at = BR6E_TABLE + i * 4;
        rom[at..at + 4].copy_from_slice(&entry.to_le_bytes());
    }
    rom
}

pub fn read_chunks(png: &[u8]) -> Vec<RawChunk> {
    let mut reader = ChunkReader::new(png).expect("PNG signature");
    let mut chunks = vec![];
    while let Some(chunk) = reader.next_chunk().expect("well-formed chunk") {
        chunks.push(chunk);
    }
    chunks
}

/// Rebuild a PNG without the private metadata chunks.
pub fn strip_metadata(png: &[u8]) -> Vec<u8> {
    let mut writer = ChunkWriter::new(Vec::new());
    writer.write_signature().unwrap();
    for chunk in read_chunks(png) {
        if chunk.chunk_type != ChunkType::zTXt && chunk.chunk_type != ChunkType::sPLT {
            writer.write_raw(&chunk).unwrap();
        }
    }
    writer.into_inner()
}

/// Decode a PNG to (width, height, raw palette indices).
pub fn decode_indexed(png: &[u8]) -> (u32, u32, Vec<u8>) {
    let mut decoder = png::Decoder::new(png);
    decoder.set_transformations(png::Transformations::IDENTITY);
    let mut reader = decoder.read_info().unwrap();
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).unwrap();
    assert_eq!(info.color_type, png::ColorType::Indexed);
    buf.truncate(info.buffer_size());
    (info.width, info.height, buf)
}
