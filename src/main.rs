//! dataview-build - release builds for the DataView apps
//!
//! Expands a target × environment matrix into Flutter builds, packs each
//! build into `build/<version>.zip` and, with `--deploy`, publishes it over
//! rsync.
//!
//! ## Architecture
//!
//! ```text
//! CLI → build::matrix → build::platforms → flutter / zip / rsync
//! ```

mod build;
mod cli;
mod config;
mod deploy;
mod error;
mod exec;
mod utils;

use std::process::ExitCode;

use clap::Parser;

use cli::Cli;
use error::{exit_code_for, ReleaseError};
use utils::terminal::print_error;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.chain().find_map(|cause| cause.downcast_ref::<ReleaseError>()) {
                Some(release_err) => {
                    // Outer context, e.g. which release was being built
                    if err.to_string() != release_err.to_string() {
                        print_error(&err.to_string());
                    }
                    release_err.display_with_hints();
                }
                None => print_error(&format!("{:#}", err)),
            }
            ExitCode::from(exit_code_for(&err))
        }
    }
}
