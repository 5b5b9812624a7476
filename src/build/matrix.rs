//! Build matrix orchestration
//!
//! Runs one job per (target, environment) cell, strictly in sequence. The
//! first failure aborts the run: nothing after it is attempted and nothing
//! already built or deployed is rolled back.
//!
//! A target that cannot be built on this host (mac off macOS) stops the
//! *whole* remaining matrix, not just that cell. Scripts relying on mac
//! being the last target depend on this, so it is kept as is. The cell's
//! defines are still looked up first, so a missing `dart_define` entry is
//! fatal even on a host that would skip the build.

use anyhow::{Context, Result};

use super::platforms::{format_duration, get_builder};
use super::{BuildJob, BuildResult, JobContext, JobSettings, RunOptions};
use crate::config::BuildConfig;
use crate::exec::CommandRunner;
use crate::utils::terminal::{print_highlight, print_info, print_warning};

/// Outcome of a run that did not fail
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Jobs that finished, in order
    pub results: Vec<BuildResult>,
    /// Job at which the run stopped because the host cannot build it
    pub stopped_at: Option<BuildJob>,
}

/// Drives the build matrix
pub struct Orchestrator<'a> {
    options: &'a RunOptions,
    config: &'a BuildConfig,
    runner: &'a dyn CommandRunner,
    host_os: &'a str,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        options: &'a RunOptions,
        config: &'a BuildConfig,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            options,
            config,
            runner,
            host_os: std::env::consts::OS,
        }
    }

    /// Pretend to run on another OS (`std::env::consts::OS` naming)
    #[cfg(test)]
    pub fn with_host_os(mut self, host_os: &'a str) -> Self {
        self.host_os = host_os;
        self
    }

    /// Run every job of the matrix
    pub fn run(&self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for job in self.options.jobs() {
            let version = job.version();
            print_highlight(&format!("building {}", version));

            let defines = job
                .resolve_defines(self.config)
                .with_context(|| format!("Cannot build {}", version))?;

            let builder = get_builder(job.target);
            if !builder.supports_host(self.host_os) {
                print_highlight(&format!(
                    "Not on a {} host, skipping build",
                    builder.platform_name()
                ));
                summary.stopped_at = Some(job);
                break;
            }

            let settings = JobSettings::resolve(self.config, &job, defines, self.options.deploy)
                .with_context(|| format!("Cannot build {}", version))?;

            let ctx = JobContext {
                job: &job,
                settings: &settings,
                runner: self.runner,
                project_root: &self.options.project_root,
            };
            let result = builder
                .build(&ctx)
                .with_context(|| format!("Failed to build {}", version))?;
            summary.results.push(result);
        }

        Ok(summary)
    }
}

/// Print build results summary
pub fn print_summary(summary: &RunSummary, verbose: bool) {
    if let Some(job) = &summary.stopped_at {
        print_warning(&format!(
            "stopped at {}: {} builds are not supported on this host; remaining jobs were not run",
            job.version(),
            job.target
        ));
    }

    if summary.results.is_empty() {
        eprintln!("No builds completed.");
        return;
    }

    let total_duration: f64 = summary.results.iter().map(|r| r.duration_secs).sum();
    eprintln!(
        "\n✓ {} release(s) built in {}",
        summary.results.len(),
        format_duration(total_duration)
    );

    for result in &summary.results {
        eprintln!("  {} ({:.2}s)", result.version, result.duration_secs);
        eprintln!("    Archive: {}", result.archive.display());
        if result.deployed {
            let marker = if result.latest_marker_written {
                "latest updated"
            } else {
                "latest unchanged"
            };
            eprintln!("    Deployed ({})", marker);
        }

        if verbose {
            if let Err(e) = super::archive::print_zip_tree(&result.archive, "      ") {
                eprintln!("      Warning: Failed to print archive contents: {}", e);
            }
        }
    }

    if summary.stopped_at.is_none() {
        print_info("all requested builds completed");
    }
}
