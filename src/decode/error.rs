//! Error types for sprite decoding

use std::io;
use thiserror::Error;

use crate::lz77::Lz77Error;

/// An error raised while walking the pointer web of a sprite record.
///
/// Every variant names the operation that failed and the pointer value it was
/// following, since a bare "unexpected EOF" is useless when debugging a ROM.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// A relative pointer resolved outside of the data it points into
    #[error("{op}: pointer {pointer:#010x} resolves to offset {offset:#x}, past the end of {len:#x} bytes")]
    OutOfRange { op: &'static str, pointer: u32, offset: u64, len: usize },

    /// Fixed-size data ended early
    #[error("{op}: short read at offset {offset:#x} (pointer {pointer:#010x}): {source}")]
    ShortRead {
        op: &'static str,
        pointer: u32,
        offset: u64,
        #[source]
        source: io::Error,
    },

    /// The LZ77 blob behind a compressed pointer could not be expanded
    #[error("{op}: LZ77 blob at pointer {pointer:#010x} is malformed: {source}")]
    Decompress {
        op: &'static str,
        pointer: u32,
        #[source]
        source: Lz77Error,
    },

    /// The data ran out before any frame ended the animation
    #[error("animation at pointer {pointer:#010x} has no terminal frame after {frames} frames")]
    Unterminated { pointer: u32, frames: usize },

    /// An inner error annotated with where in the record it happened
    #[error("{context}: {inner}")]
    Within { context: String, inner: Box<DecodeError> },
}

impl DecodeError {
    /// Wrap this error with a description of the enclosing structure.
    pub fn within(self, context: impl Into<String>) -> Self {
        DecodeError::Within { context: context.into(), inner: Box::new(self) }
    }

    /// The innermost error, with all `Within` layers peeled off.
    pub fn root(&self) -> &DecodeError {
        match self {
            DecodeError::Within { inner, .. } => inner.root(),
            other => other,
        }
    }
}
