//! Dump command implementation

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::{default_config, find_config, load_config, merge_cli_overrides, CliOverrides};
use crate::dump::{dump_rom, DumpError};

use super::{read_rom, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Run the dump command
pub fn run_dump(
    rom_path: &Path,
    out: Option<&Path>,
    jobs: Option<usize>,
    slot: Option<usize>,
    config_path: Option<&Path>,
) -> ExitCode {
    let config_path = config_path.map(Path::to_path_buf).or_else(find_config);
    let mut config = match config_path {
        Some(ref p) => match load_config(Some(p)) {
            Ok(cfg) => {
                tracing::info!("using config {}", p.display());
                cfg
            }
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        },
        None => default_config(),
    };

    let overrides = CliOverrides { out: out.map(PathBuf::from), jobs };
    merge_cli_overrides(&mut config, &overrides);

    let rom = match read_rom(rom_path) {
        Ok(rom) => rom,
        Err(code) => return code,
    };

    let mut options = config.dump_options();
    options.slot = slot;

    match dump_rom(&rom, &options) {
        Ok(summary) => {
            println!(
                "Wrote {} sprite sheets to {} ({} slots skipped)",
                summary.written,
                options.out_dir.display(),
                summary.decode_failed + summary.render_failed
            );
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e @ (DumpError::UnsupportedRom { .. } | DumpError::SlotOutOfRange { .. })) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_INVALID_ARGS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
