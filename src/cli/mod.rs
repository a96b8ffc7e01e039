//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod dump;
mod info;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Process exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// romsprite - Dump GBA sprite animations to PNG sprite sheets
#[derive(Parser)]
#[command(name = "romsprite")]
#[command(about = "romsprite - Dump GBA sprite animations to PNG sprite sheets with frame metadata")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decode every sprite slot and write one PNG sheet per slot
    Dump {
        /// ROM image to read
        rom: PathBuf,

        /// Output directory (default: from romsprite.toml, else "sprites")
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of parallel jobs (default: number of CPUs)
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
        jobs: Option<u64>,

        /// Only dump this sprite table slot
        #[arg(long)]
        slot: Option<usize>,

        /// Config file (default: search for romsprite.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show the ROM title, ID and sprite table location
    Info {
        /// ROM image to read
        rom: PathBuf,
    },
}

/// Read a whole ROM image, reporting failures on stderr.
pub(crate) fn read_rom(path: &Path) -> Result<Vec<u8>, ExitCode> {
    std::fs::read(path).map_err(|e| {
        eprintln!("Error: cannot read {}: {}", path.display(), e);
        ExitCode::from(EXIT_ERROR)
    })
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Dump { rom, output, jobs, slot, config } => dump::run_dump(
            &rom,
            output.as_deref(),
            jobs.map(|j| j as usize),
            slot,
            config.as_deref(),
        ),
        Commands::Info { rom } => info::run_info(&rom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_dump_flags() {
        let args = ["romsprite", "dump", "bn6.gba", "-o", "out", "-j", "2", "--slot", "5"];
        let cli = Cli::try_parse_from(args).unwrap();
        let Commands::Dump { rom, output, jobs, slot, config } = cli.command else {
            panic!("expected dump command");
        };
        assert_eq!(rom, PathBuf::from("bn6.gba"));
        assert_eq!(output, Some(PathBuf::from("out")));
        assert_eq!(jobs, Some(2));
        assert_eq!(slot, Some(5));
        assert_eq!(config, None);
    }

    #[test]
    fn test_zero_jobs_rejected() {
        assert!(Cli::try_parse_from(["romsprite", "dump", "bn6.gba", "-j", "0"]).is_err());
    }
}
