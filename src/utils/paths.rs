//! Path utilities for the release build

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Directory holding every build output and archive
pub const BUILD_DIR: &str = "build";

/// Get the build directory for a project
pub fn get_build_dir(project_root: &Path) -> PathBuf {
    project_root.join(BUILD_DIR)
}

/// Get the archive path for a version: `build/<version>.zip`
pub fn get_archive_path(project_root: &Path, version: &str) -> PathBuf {
    get_build_dir(project_root).join(format!("{}.zip", version))
}

/// Ensure a directory exists
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Render a directory path with a trailing separator
///
/// rsync copies the *contents* of `src/` but the directory itself for `src`.
pub fn with_trailing_slash(path: &Path) -> String {
    let rendered = path.display().to_string();
    if rendered.ends_with('/') {
        rendered
    } else {
        format!("{}/", rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_path_layout() {
        let path = get_archive_path(Path::new("/proj"), "dataview-web-public-2024.06.01");
        assert_eq!(
            path,
            PathBuf::from("/proj/build/dataview-web-public-2024.06.01.zip")
        );
    }

    #[test]
    fn test_trailing_slash_added_once() {
        assert_eq!(with_trailing_slash(Path::new("build/web")), "build/web/");
        assert_eq!(with_trailing_slash(Path::new("build/web/")), "build/web/");
    }
}
