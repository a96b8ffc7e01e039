//! Sprite record decoding
//!
//! A sprite table entry points (possibly through an LZ77 blob) at a record
//! holding a list of animations. Each animation is a run of frame headers,
//! and each frame points at its own tiles, palette banks and OAM list.
//!
//! # Example
//!
//! ```ignore
//! use romsprite::decode::read_sprite;
//!
//! let set = read_sprite(&rom, table_entry)?;
//! for frame in set.frames() {
//!     println!("{} tiles, {} OAM entries", frame.tiles.len(), frame.oam.len());
//! }
//! ```

pub mod animation;
pub mod error;
pub mod frame;
pub mod oam;
pub mod palette;
pub mod pointer;
pub mod tile;

pub use animation::*;
pub use error::*;
pub use frame::*;
pub use oam::*;
pub use palette::*;
pub use pointer::{Region, RomPointer, SpriteRecord};
pub use tile::*;
