//! Whole-ROM sprite dumping
//!
//! Slots are decoded one after another, then a fixed pool of workers turns
//! each decoded [`AnimationSet`] into `<dir>/<slot:04>.png`.
//!
//! # Example
//!
//! ```ignore
//! use romsprite::dump::{dump_rom, DumpOptions};
//!
//! let rom = std::fs::read("game.gba")?;
//! let summary = dump_rom(&rom, &DumpOptions::new("sprites"))?;
//! println!("wrote {} sheets", summary.written);
//! ```

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::atlas::{pack_animation_set, AtlasConfig};
use crate::decode::{read_sprite, AnimationSet, DecodeError};
use crate::mux::{MetadataMuxer, MuxError};
use crate::progress::Progress;
use crate::rom::{find_rom_info, read_header, read_table_entry, RomInfo};

/// Default number of parallel jobs (uses available parallelism).
pub fn default_jobs() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// Batch-level dump failure
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("unsupported game {id:?} ({title})")]
    UnsupportedRom { id: String, title: String },

    #[error("failed to read ROM header: {0}")]
    Header(#[source] DecodeError),

    #[error("slot {slot} is outside the sprite table ({count} entries)")]
    SlotOutOfRange { slot: usize, count: usize },

    #[error("failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("slot {slot}: {source}")]
    Mux {
        slot: usize,
        #[source]
        source: MuxError,
    },

    #[error("dump worker panicked")]
    WorkerPanicked,
}

/// A decoded slot waiting to be rendered.
#[derive(Debug, Clone)]
pub struct SlotJob {
    /// Position in the sprite table; names the output file
    pub slot: usize,
    pub animations: AnimationSet,
}

/// What happened to one slot.
#[derive(Debug)]
pub enum SlotOutcome {
    Written(PathBuf),
    /// No frame had a visible pixel; nothing written
    Empty,
    /// Frames referenced missing tiles; logged and skipped
    Skipped,
}

/// Counts for a finished dump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpSummary {
    /// Slots decoded successfully
    pub decoded: usize,
    /// Slots whose decode failed and were skipped
    pub decode_failed: usize,
    pub written: usize,
    pub empty: usize,
    /// Slots skipped because a frame could not be rendered
    pub render_failed: usize,
}

impl DumpSummary {
    fn record(&mut self, outcome: &SlotOutcome) {
        match outcome {
            SlotOutcome::Written(_) => self.written += 1,
            SlotOutcome::Empty => self.empty += 1,
            SlotOutcome::Skipped => self.render_failed += 1,
        }
    }

    fn merge(&mut self, other: &DumpSummary) {
        self.decoded += other.decoded;
        self.decode_failed += other.decode_failed;
        self.written += other.written;
        self.empty += other.empty;
        self.render_failed += other.render_failed;
    }
}

/// Output settings for a dump.
#[derive(Debug, Clone)]
pub struct DumpOptions {
    pub out_dir: PathBuf,
    pub jobs: usize,
    /// Restrict the dump to one slot
    pub slot: Option<usize>,
    pub atlas: AtlasConfig,
    pub muxer: MetadataMuxer,
}

impl DumpOptions {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            jobs: default_jobs(),
            slot: None,
            atlas: AtlasConfig::default(),
            muxer: MetadataMuxer::default(),
        }
    }
}

/// Output path for a slot.
pub fn slot_path(dir: &Path, slot: usize) -> PathBuf {
    dir.join(format!("{:04}.png", slot))
}

/// Decode the requested slots of the sprite table. Slots that fail to decode
/// are logged and left out; the returned count says how many.
pub fn decode_slots(
    rom: &[u8],
    info: &RomInfo,
    slots: impl IntoIterator<Item = usize>,
) -> (Vec<SlotJob>, usize) {
    let mut jobs = Vec::new();
    let mut failed = 0;
    for slot in slots {
        let decoded = read_table_entry(rom, info, slot).and_then(|raw| read_sprite(rom, raw));
        match decoded {
            Ok(animations) => {
                debug!(
                    "slot {:04}: {} animations, {} frames",
                    slot,
                    animations.animations.len(),
                    animations.frame_count()
                );
                jobs.push(SlotJob { slot, animations });
            }
            Err(e) => {
                warn!("slot {:04}: skipped: {}", slot, e);
                failed += 1;
            }
        }
    }
    (jobs, failed)
}

/// Render, pack and write one slot.
pub fn process_slot(job: &SlotJob, options: &DumpOptions) -> Result<SlotOutcome, DumpError> {
    let sheet = match pack_animation_set(&job.animations, &options.atlas) {
        Ok(Some(sheet)) => sheet,
        Ok(None) => {
            debug!("slot {:04}: empty", job.slot);
            return Ok(SlotOutcome::Empty);
        }
        Err(e) => {
            warn!("slot {:04}: skipped: {}", job.slot, e);
            return Ok(SlotOutcome::Skipped);
        }
    };

    let path = slot_path(&options.out_dir, job.slot);
    let file =
        File::create(&path).map_err(|source| DumpError::Write { path: path.clone(), source })?;

    let written = options
        .muxer
        .write_sheet(&sheet, BufWriter::new(file))
        .map_err(|source| DumpError::Mux { slot: job.slot, source })
        .and_then(|mut w| {
            w.flush().map_err(|source| DumpError::Write { path: path.clone(), source })
        });
    if let Err(e) = written {
        // Do not leave a truncated sheet behind
        let _ = fs::remove_file(&path);
        return Err(e);
    }

    debug!("slot {:04}: {} frames -> {}", job.slot, sheet.frames.len(), path.display());
    Ok(SlotOutcome::Written(path))
}

/// Fixed-size worker pool over decoded slots.
pub struct DumpScheduler {
    options: DumpOptions,
}

impl DumpScheduler {
    pub fn new(options: DumpOptions) -> Self {
        Self { options }
    }

    /// Set the number of parallel jobs.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.options.jobs = jobs.max(1);
        self
    }

    pub fn jobs(&self) -> usize {
        self.options.jobs
    }

    /// Process every job. The first worker error fails the batch: running
    /// slots finish, no new ones start, and that error is returned.
    pub fn run(&self, jobs: &[SlotJob]) -> Result<DumpSummary, DumpError> {
        let progress = Progress::new(jobs.len());
        let next_idx = AtomicUsize::new(0);
        let failed = AtomicBool::new(false);
        let first_error: Mutex<Option<DumpError>> = Mutex::new(None);
        let num_workers = self.options.jobs.max(1).min(jobs.len());

        let results: Vec<_> = std::thread::scope(|s| {
            let mut handles = Vec::with_capacity(num_workers);
            for _ in 0..num_workers {
                let next_idx = &next_idx;
                let failed = &failed;
                let first_error = &first_error;
                let progress = &progress;
                let options = &self.options;

                handles.push(s.spawn(move || {
                    let mut summary = DumpSummary::default();
                    loop {
                        if failed.load(Ordering::SeqCst) {
                            break;
                        }
                        let idx = next_idx.fetch_add(1, Ordering::SeqCst);
                        let Some(job) = jobs.get(idx) else {
                            break;
                        };

                        match process_slot(job, options) {
                            Ok(outcome) => summary.record(&outcome),
                            Err(e) => {
                                failed.store(true, Ordering::SeqCst);
                                let mut slot =
                                    first_error.lock().unwrap_or_else(|p| p.into_inner());
                                slot.get_or_insert(e);
                                break;
                            }
                        }
                        progress.advance(job.slot);
                    }
                    summary
                }));
            }
            handles.into_iter().map(|h| h.join()).collect()
        });

        if let Some(e) = first_error.into_inner().unwrap_or_else(|p| p.into_inner()) {
            return Err(e);
        }

        let mut summary = DumpSummary::default();
        for result in results {
            summary.merge(&result.map_err(|_| DumpError::WorkerPanicked)?);
        }
        info!(
            "processed {} slots in {:.2?} ({} workers)",
            progress.done(),
            progress.elapsed(),
            num_workers
        );
        Ok(summary)
    }
}

/// Dump every sprite of a ROM image according to `options`.
pub fn dump_rom(rom: &[u8], options: &DumpOptions) -> Result<DumpSummary, DumpError> {
    let header = read_header(rom).map_err(DumpError::Header)?;
    let info = find_rom_info(&header.id)
        .ok_or_else(|| DumpError::UnsupportedRom {
            id: header.id.clone(),
            title: header.title.clone(),
        })?;
    info!(
        "{} ({}): sprite table at {:#010x}, {} entries",
        header.title, header.id, info.offset, info.count
    );

    let slots = match options.slot {
        Some(slot) if slot >= info.count => {
            return Err(DumpError::SlotOutOfRange { slot, count: info.count });
        }
        Some(slot) => slot..slot + 1,
        None => 0..info.count,
    };

    let (jobs, decode_failed) = decode_slots(rom, &info, slots);
    info!("decoded {} slots, skipped {}", jobs.len(), decode_failed);

    fs::create_dir_all(&options.out_dir)
        .map_err(|source| DumpError::CreateDir { path: options.out_dir.clone(), source })?;

    let mut summary = DumpScheduler::new(options.clone()).run(&jobs)?;
    summary.decoded = jobs.len();
    summary.decode_failed = decode_failed;
    info!(
        "wrote {} sheets to {} ({} empty, {} unrenderable)",
        summary.written,
        options.out_dir.display(),
        summary.empty,
        summary.render_failed
    );
    Ok(summary)
}
