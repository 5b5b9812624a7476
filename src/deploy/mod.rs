//! Remote publication of release archives
//!
//! A release is published by copying its archive into the environment's
//! public directory and then pointing the `latest` marker at the run date.
//! Nightly builds are copied but never become `latest`.

pub mod transport;

use std::path::Path;

use anyhow::Result;

use crate::build::BuildJob;
use crate::utils::terminal::print_highlight;

pub use transport::RsyncTransport;

/// Name of the marker file in each public directory
pub const LATEST_MARKER: &str = "latest";

/// Copy the archive to `public_dir` and update the marker
///
/// Returns whether the `latest` marker was written.
pub fn publish_release(
    transport: &RsyncTransport<'_>,
    archive: &Path,
    public_dir: &str,
    job: &BuildJob,
) -> Result<bool> {
    print_highlight("sending public files");
    transport.send_file(archive, public_dir)?;

    if job.nightly {
        return Ok(false);
    }

    transport.write_remote_file(LATEST_MARKER, public_dir, &job.date)?;
    Ok(true)
}
