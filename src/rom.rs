//! Cartridge header and sprite table lookup

use byteorder::{ByteOrder, LE};

use crate::decode::DecodeError;

/// Offset of the 12-byte game title in the cartridge header.
pub const TITLE_OFFSET: usize = 0xA0;

/// Offset of the 4-byte game ID in the cartridge header.
pub const ID_OFFSET: usize = 0xAC;

/// Identification fields from the cartridge header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomHeader {
    /// Game title with trailing NULs removed
    pub title: String,
    /// Four-character game code, e.g. `BR6E`
    pub id: String,
}

/// Location of a title's sprite table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomInfo {
    pub id: &'static str,
    /// ROM offset of the first table entry
    pub offset: u32,
    /// Number of 4-byte entries
    pub count: usize,
}

const fn info(id: &'static str, offset: u32, count: usize) -> RomInfo {
    RomInfo { id, offset, count }
}

/// Sprite tables of every supported title and region.
pub const ROM_TABLE: &[RomInfo] = &[
    info("BR6E", 0x0003_1CEC, 815),
    info("BR6P", 0x0003_1CEC, 815),
    info("BR5E", 0x0003_1CEC, 815),
    info("BR5P", 0x0003_1CEC, 815),
    info("BR6J", 0x0003_2CA8, 815),
    info("BR5J", 0x0003_2CA8, 815),
    info("BRBE", 0x0003_2750, 664),
    info("BRKE", 0x0003_2754, 664),
    info("BRBJ", 0x0003_26E8, 664),
    info("BRKJ", 0x0003_26EC, 664),
    info("BR4J", 0x0002_B39C, 568),
    info("B4BE", 0x0002_7968, 616),
    info("B4WE", 0x0002_7964, 616),
    info("B4BJ", 0x0002_7880, 616),
    info("B4WJ", 0x0002_787C, 616),
    info("A6BE", 0x0002_47A0, 821),
    info("A3XE", 0x0002_4788, 821),
    info("A6BJ", 0x0002_48F8, 565),
    info("A3XJ", 0x0002_48E0, 564),
    info("AE2E", 0x0001_E9FC, 501),
    info("AE2J", 0x0001_E888, 501),
    info("AREE", 0x0001_2690, 344),
    info("AREP", 0x0001_269C, 344),
    info("AREJ", 0x0001_2614, 344),
];

/// Look up the sprite table for a game ID.
pub fn find_rom_info(id: &str) -> Option<RomInfo> {
    ROM_TABLE.iter().find(|info| info.id == id).copied()
}

fn header_field<'a>(
    rom: &'a [u8],
    offset: usize,
    len: usize,
    op: &'static str,
) -> Result<&'a [u8], DecodeError> {
    rom.get(offset..offset + len).ok_or(DecodeError::ShortRead {
        op,
        pointer: offset as u32,
        offset: offset as u64,
        source: std::io::ErrorKind::UnexpectedEof.into(),
    })
}

/// Read the title and game ID from the cartridge header.
pub fn read_header(rom: &[u8]) -> Result<RomHeader, DecodeError> {
    let title = header_field(rom, TITLE_OFFSET, 12, "ROM title")?;
    let id = header_field(rom, ID_OFFSET, 4, "ROM ID")?;
    Ok(RomHeader {
        title: String::from_utf8_lossy(title).trim_end_matches('\0').to_string(),
        id: String::from_utf8_lossy(id).into_owned(),
    })
}

/// Read the raw 32-bit entry for a sprite slot.
pub fn read_table_entry(rom: &[u8], info: &RomInfo, slot: usize) -> Result<u32, DecodeError> {
    let at = info.offset as usize + slot * 4;
    let raw = rom.get(at..at + 4).ok_or(DecodeError::OutOfRange {
        op: "sprite table entry",
        pointer: info.offset,
        offset: at as u64,
        len: rom.len(),
    })?;
    Ok(LE::read_u32(raw))
}
