//! Configuration for romsprite
//!
//! Provides types and loading for the optional `romsprite.toml`.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
