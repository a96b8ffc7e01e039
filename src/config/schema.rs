//! Configuration schema types for `romsprite.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::dump::{default_jobs, DumpOptions};
use crate::mux::{MetadataMuxer, DEFAULT_PIPE_CAPACITY};
use crate::png_chunks::ChunkType;

/// Chunk the metadata chunks are written in front of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InjectPoint {
    /// First image data chunk
    #[default]
    #[serde(rename = "IDAT")]
    Idat,
    /// Transparency chunk
    #[serde(rename = "tRNS")]
    Trns,
}

impl InjectPoint {
    pub fn chunk_type(self) -> ChunkType {
        match self {
            InjectPoint::Idat => ChunkType::IDAT,
            InjectPoint::Trns => ChunkType::tRNS,
        }
    }
}

/// `[output]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory the sheets are written to
    #[serde(default = "default_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub inject_before: InjectPoint,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dir: default_dir(), inject_before: InjectPoint::default() }
    }
}

fn default_dir() -> PathBuf {
    PathBuf::from("sprites")
}

/// `[dump]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpConfig {
    /// Worker count; all available cores when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
    /// Buffers the PNG encoder may run ahead of the chunk rewriter
    #[serde(default = "default_pipe_capacity")]
    pub pipe_capacity: usize,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self { jobs: None, pipe_capacity: default_pipe_capacity() }
    }
}

fn default_pipe_capacity() -> usize {
    DEFAULT_PIPE_CAPACITY
}

/// Root of `romsprite.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RomspriteConfig {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub dump: DumpConfig,
}

/// A config field with an invalid value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "dump.jobs")
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "romsprite.toml: '{}' {}", self.field, self.message)
    }
}

impl RomspriteConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.dump.jobs == Some(0) {
            errors.push(ConfigValidationError {
                field: "dump.jobs".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }
        if self.dump.pipe_capacity == 0 {
            errors.push(ConfigValidationError {
                field: "dump.pipe_capacity".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }
        if self.output.dir.as_os_str().is_empty() {
            errors.push(ConfigValidationError {
                field: "output.dir".to_string(),
                message: "must be a non-empty path".to_string(),
            });
        }

        errors
    }

    /// Dump settings described by this config.
    pub fn dump_options(&self) -> DumpOptions {
        let mut options = DumpOptions::new(&self.output.dir);
        options.jobs = self.dump.jobs.unwrap_or_else(default_jobs);
        options.muxer = MetadataMuxer::new()
            .with_trigger(self.output.inject_before.chunk_type())
            .with_pipe_capacity(self.dump.pipe_capacity);
        options
    }
}
