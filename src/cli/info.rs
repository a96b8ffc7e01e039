//! Info command: ROM identification

use std::path::Path;
use std::process::ExitCode;

use crate::rom::{find_rom_info, read_header};

use super::{read_rom, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Execute the info command
pub fn run_info(path: &Path) -> ExitCode {
    let rom = match read_rom(path) {
        Ok(rom) => rom,
        Err(code) => return code,
    };

    let header = match read_header(&rom) {
        Ok(header) => header,
        Err(e) => {
            eprintln!("Error: {}: {}", path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    println!("Title: {}", header.title);
    println!("ID:    {}", header.id);

    match find_rom_info(&header.id) {
        Some(info) => {
            println!("Sprite table: {:#010x}", info.offset);
            println!("Sprites:      {}", info.count);
            ExitCode::from(EXIT_SUCCESS)
        }
        None => {
            eprintln!("Error: unsupported game {:?}", header.id);
            ExitCode::from(EXIT_INVALID_ARGS)
        }
    }
}
