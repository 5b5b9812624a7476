//! rsync-based file transfer
//!
//! Destinations are anything rsync accepts: `host:/path/`, `user@host:/path/`
//! or a local directory.

use std::path::Path;

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::exec::{CommandRunner, Invocation};
use crate::utils::paths::with_trailing_slash;

/// Patterns never mirrored to, nor deleted from, the web host
pub const MIRROR_EXCLUDES: &[&str] = &["**/.DS_Store", "**/._*", "/public"];

/// Sends files over rsync through a [`CommandRunner`]
pub struct RsyncTransport<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> RsyncTransport<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Copy a file or directory to `destination`
    ///
    /// Archive mode, compressed, quiet; unchanged files are skipped and
    /// existing ones overwritten.
    pub fn send_file(&self, path: &Path, destination: &str) -> Result<()> {
        let inv = Invocation::new("rsync")
            .arg("-azq")
            .arg(path.display().to_string())
            .arg(destination);
        self.runner.run_checked(&inv)?;
        Ok(())
    }

    /// Write `content` to `destination/<filename>` without keeping a local copy
    ///
    /// The temporary directory is removed on every path out of this function.
    pub fn write_remote_file(
        &self,
        filename: &str,
        destination: &str,
        content: impl AsRef<[u8]>,
    ) -> Result<()> {
        let temp_dir = TempDir::new().context("Failed to create temporary directory")?;
        let temp_path = temp_dir.path().join(filename);
        std::fs::write(&temp_path, content.as_ref())
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;

        self.send_file(&temp_path, destination)
    }

    /// Make `destination` an exact copy of the contents of `source_dir`
    ///
    /// Remote files missing locally are deleted, except those matching
    /// [`MIRROR_EXCLUDES`].
    pub fn mirror_directory(&self, source_dir: &Path, destination: &str) -> Result<()> {
        let mut inv = Invocation::new("rsync").arg("-azqP").arg("--delete");
        for pattern in MIRROR_EXCLUDES {
            inv = inv.arg("--exclude").arg(*pattern);
        }
        inv = inv
            .arg(with_trailing_slash(source_dir))
            .arg(destination);
        self.runner.run_checked(&inv)?;
        Ok(())
    }
}
