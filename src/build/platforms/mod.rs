//! Platform-specific build procedures
//!
//! Each target has a builder implementing [`PlatformBuilder`]. A builder
//! runs the Flutter build, packs the output into `build/<version>.zip` and,
//! when the job carries deploy destinations, publishes it.

pub mod macos;
pub mod web;

use super::{BuildTarget, PlatformBuilder};

/// Get the platform builder for a target
pub fn get_builder(target: BuildTarget) -> Box<dyn PlatformBuilder> {
    match target {
        BuildTarget::Web => Box::new(web::WebBuilder::new()),
        BuildTarget::Mac => Box::new(macos::MacosBuilder::new()),
    }
}

/// Format duration in human-readable format (e.g., "2m 34s" or "45s")
pub fn format_duration(secs: f64) -> String {
    let total_secs = secs as u64;
    let mins = total_secs / 60;
    let secs = total_secs % 60;
    if mins > 0 {
        format!("{}m {}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}
