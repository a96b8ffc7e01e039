//! romsprite - GBA sprite decoding and sprite sheet export
//!
//! This library provides functionality to:
//! - Decode sprite records (LZ77, tiles, palettes, OAM, frames, animations)
//!   from Mega Man Battle Network and related ROM images
//! - Composite frames onto indexed canvases and pack them into trimmed atlases
//! - Write indexed PNGs carrying per-frame animation metadata chunks
//! - Dump a whole sprite table in parallel, one sheet per slot

pub mod atlas;
pub mod cli;
pub mod config;
pub mod decode;
pub mod dump;
pub mod lz77;
pub mod mux;
pub mod pipe;
pub mod png_chunks;
pub mod progress;
pub mod render;
pub mod rom;
