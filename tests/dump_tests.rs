//! End-to-end dumping of a synthetic BR6E ROM image

mod common;

use common::*;
use romsprite::decode::read_sprite;
use romsprite::dump::{dump_rom, DumpOptions, DumpSummary};
use romsprite::mux::decode_control_chunk;
use romsprite::png_chunks::ChunkType;
use romsprite::rom::{find_rom_info, read_header, read_table_entry};
use std::fs;
use tempfile::TempDir;

fn dump(rom: &[u8], configure: impl FnOnce(&mut DumpOptions)) -> (TempDir, DumpSummary) {
    let dir = TempDir::new().expect("should create temp dir");
    let mut options = DumpOptions::new(dir.path().join("sprites"));
    options.jobs = 2;
    configure(&mut options);
    let summary = dump_rom(rom, &options).expect("dump should succeed");
    (dir, summary)
}

#[test]
fn test_br6e_selects_sprite_table() {
    let rom = br6e_rom();
    let header = read_header(&rom).unwrap();
    assert_eq!(header.id, "BR6E");
    assert_eq!(header.title, "MEGAMAN6_FXX");

    let info = find_rom_info(&header.id).unwrap();
    assert_eq!(info.offset, 0x0003_1CEC);
    assert_eq!(info.count, 815);

    let set = read_sprite(&rom, read_table_entry(&rom, &info, 0).unwrap()).unwrap();
    assert_eq!(set.animations.len(), 1);
    assert_eq!(set.frame_count(), 2);
}

#[test]
fn test_compressed_slot_decodes_like_direct() {
    let rom = br6e_rom();
    let info = find_rom_info("BR6E").unwrap();
    let direct = read_sprite(&rom, read_table_entry(&rom, &info, 0).unwrap()).unwrap();
    let packed = read_sprite(&rom, read_table_entry(&rom, &info, 1).unwrap()).unwrap();
    assert_eq!(direct, packed);
}

#[test]
fn test_dump_whole_table() {
    let rom = br6e_rom();
    let (dir, summary) = dump(&rom, |_| {});
    let out = dir.path().join("sprites");

    assert_eq!(summary.decoded, 3);
    assert_eq!(summary.decode_failed, BR6E_COUNT - 3);
    assert_eq!(summary.written, 2);
    assert_eq!(summary.empty, 1);
    assert_eq!(summary.render_failed, 0);

    let mut files: Vec<String> = fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    assert_eq!(files, ["0000.png", "0001.png"]);

    // Same record, same bytes, whether or not it was compressed
    assert_eq!(fs::read(out.join("0000.png")).unwrap(), fs::read(out.join("0001.png")).unwrap());
}

#[test]
fn test_control_chunk_precedes_image_data() {
    let rom = br6e_rom();
    let (dir, _) = dump(&rom, |o| o.slot = Some(0));
    let png = fs::read(dir.path().join("sprites").join("0000.png")).unwrap();

    let chunks = read_chunks(&png);
    let types: Vec<_> = chunks.iter().map(|c| c.chunk_type).collect();
    let ctrl = types.iter().position(|&t| t == ChunkType::zTXt).expect("control chunk");
    assert_eq!(types[ctrl + 1], ChunkType::IDAT);
    assert!(!types.contains(&ChunkType::sPLT));
    assert_eq!(types.first(), Some(&ChunkType::IHDR));
    assert_eq!(types.last(), Some(&ChunkType::IEND));

    let records = decode_control_chunk(&chunks[ctrl].data).expect("fctrl records");
    assert_eq!(records.len(), 2);

    let (a, b) = (records[0], records[1]);
    assert_eq!((a.left, a.top, a.right, a.bottom), (0, 0, 8, 8));
    assert_eq!((a.origin_x, a.origin_y), (4, 4));
    assert_eq!((a.delay, a.action), (5, 0));

    assert_eq!((b.left, b.top, b.right, b.bottom), (9, 0, 25, 8));
    assert_eq!((b.origin_x, b.origin_y), (0, 8));
    assert_eq!((b.delay, b.action), (7, 2));
}

#[test]
fn test_sheet_pixels_and_palette() {
    let rom = br6e_rom();
    let (dir, _) = dump(&rom, |o| o.slot = Some(0));
    let png = fs::read(dir.path().join("sprites").join("0000.png")).unwrap();

    let plain = strip_metadata(&png);
    let (width, height, pixels) = decode_indexed(&plain);
    assert_eq!((width, height), (25, 8));
    let at = |x: usize, y: usize| pixels[y * width as usize + x];
    assert_eq!(at(0, 0), 1);
    assert_eq!(at(7, 7), 1);
    assert_eq!(at(8, 0), 0);
    assert_eq!(at(9, 0), 2);
    assert_eq!(at(24, 7), 2);

    let chunks = read_chunks(&png);
    let plte = &chunks.iter().find(|c| c.chunk_type == ChunkType::PLTE).unwrap().data;
    let trns = &chunks.iter().find(|c| c.chunk_type == ChunkType::tRNS).unwrap().data;
    assert_eq!(&plte[3..9], &[255, 0, 0, 0, 255, 0]);
    assert_eq!(trns[0], 0);
    assert_eq!(trns[1], 255);
}

#[test]
fn test_single_slot_filter() {
    let rom = br6e_rom();
    let (dir, summary) = dump(&rom, |o| o.slot = Some(1));
    assert_eq!(summary.decoded, 1);
    assert_eq!(summary.written, 1);
    let out = dir.path().join("sprites");
    assert!(out.join("0001.png").exists());
    assert!(!out.join("0000.png").exists());
}

#[test]
fn test_undecodable_slot_is_skipped_not_fatal() {
    let rom = br6e_rom();
    let (dir, summary) = dump(&rom, |o| o.slot = Some(500));
    assert_eq!(summary.decoded, 0);
    assert_eq!(summary.decode_failed, 1);
    assert_eq!(fs::read_dir(dir.path().join("sprites")).unwrap().count(), 0);
}

#[test]
fn test_single_worker_matches_parallel() {
    let rom = br6e_rom();
    let (serial, _) = dump(&rom, |o| o.jobs = 1);
    let (parallel, _) = dump(&rom, |o| o.jobs = 8);
    for name in ["0000.png", "0001.png"] {
        let a = fs::read(serial.path().join("sprites").join(name)).unwrap();
        let b = fs::read(parallel.path().join("sprites").join(name)).unwrap();
        assert_eq!(a, b, "{} differs", name);
    }
}
