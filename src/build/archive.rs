//! ZIP packaging of build output trees
//!
//! An archive always holds exactly one top-level directory, named after the
//! packed directory:
//!
//! ```text
//! dataview-mac-public-2024.06.01.zip
//! └── DataView.app/
//!     └── Contents/
//!         ├── Info.plist
//!         ├── Frameworks/
//!         │   └── FlutterMacOS.framework/
//!         │       └── Versions/Current -> A   (stored as a link)
//!         └── MacOS/DataView
//! ```
//!
//! Finder metadata (`*.DS_Store`) and AppleDouble files (`._*`) are left out
//! at every depth. Entries keep the source modification time.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, Local, Timelike};
use walkdir::{DirEntry, WalkDir};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ReleaseError;
use crate::utils::paths::ensure_dir;
use crate::utils::terminal::create_spinner;

/// Whether a file name is OS metadata that must never be archived or synced
pub fn is_os_metadata(name: &str) -> bool {
    name.ends_with(".DS_Store") || name.starts_with("._")
}

fn is_excluded(entry: &DirEntry) -> bool {
    // The root is always packed, whatever it is called
    entry.depth() > 0 && is_os_metadata(&entry.file_name().to_string_lossy())
}

/// Pack `source_dir` into a fresh ZIP archive at `archive_path`
///
/// Any archive already at `archive_path` is deleted first, so the result
/// never carries entries from an earlier run.
pub fn pack_directory(source_dir: &Path, archive_path: &Path) -> Result<()> {
    if !source_dir.is_dir() {
        return Err(ReleaseError::MissingOutput {
            path: source_dir.to_path_buf(),
        }
        .into());
    }

    let root_name = archive_root_name(source_dir)?;

    if let Some(parent) = archive_path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
    }
    if archive_path.exists() {
        fs::remove_file(archive_path).with_context(|| {
            format!("Failed to remove previous archive: {}", archive_path.display())
        })?;
    }

    let spinner = create_spinner(&format!("Packing {}", root_name));

    let file = File::create(archive_path)
        .with_context(|| format!("Failed to create archive: {}", archive_path.display()))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let base_options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(6));

    let walker = WalkDir::new(source_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_excluded(e));

    for entry in walker {
        let entry = entry.context("Failed to read directory entry")?;
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .context("Failed to get relative path")?;

        let mut name = root_name.clone();
        for component in relative.components() {
            name.push('/');
            name.push_str(&component.as_os_str().to_string_lossy());
        }

        let metadata = entry
            .path()
            .symlink_metadata()
            .with_context(|| format!("Failed to stat {}", entry.path().display()))?;
        let mut options = base_options;
        if let Some(mode) = unix_mode(&metadata) {
            options = options.unix_permissions(mode);
        }
        if let Some(modified) = zip_timestamp(&metadata) {
            options = options.last_modified_time(modified);
        }

        let file_type = entry.file_type();
        if file_type.is_symlink() {
            let target = fs::read_link(entry.path())
                .with_context(|| format!("Failed to read link: {}", entry.path().display()))?;
            let target = target.to_string_lossy().replace('\\', "/");
            zip.add_symlink(name.as_str(), target.as_str(), options)
                .with_context(|| format!("Failed to add symlink to archive: {}", name))?;
        } else if file_type.is_dir() {
            zip.add_directory(name.as_str(), options)
                .with_context(|| format!("Failed to add directory to archive: {}", name))?;
        } else {
            let options = options.large_file(metadata.len() >= u64::from(u32::MAX));
            zip.start_file(name.as_str(), options)
                .with_context(|| format!("Failed to start file in archive: {}", name))?;
            let mut reader = BufReader::new(
                File::open(entry.path())
                    .with_context(|| format!("Failed to open file: {}", entry.path().display()))?,
            );
            std::io::copy(&mut reader, &mut zip)
                .with_context(|| format!("Failed to write file to archive: {}", name))?;
        }
    }

    zip.finish().context("Failed to finish ZIP archive")?;
    spinner.finish_and_clear();
    Ok(())
}

/// Name of the single top-level directory inside the archive
fn archive_root_name(source_dir: &Path) -> Result<String> {
    let name = match source_dir.file_name() {
        Some(name) => name.to_os_string(),
        None => source_dir
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", source_dir.display()))?
            .file_name()
            .map(|n| n.to_os_string())
            .with_context(|| format!("Cannot archive a filesystem root: {}", source_dir.display()))?,
    };
    Ok(name.to_string_lossy().into_owned())
}

/// Source mtime as a ZIP (DOS, local time) timestamp
///
/// `None` outside the 1980..=2107 range the format can store.
fn zip_timestamp(metadata: &fs::Metadata) -> Option<zip::DateTime> {
    let modified: chrono::DateTime<Local> = metadata.modified().ok()?.into();
    zip::DateTime::from_date_and_time(
        u16::try_from(modified.year()).ok()?,
        modified.month() as u8,
        modified.day() as u8,
        modified.hour() as u8,
        modified.minute() as u8,
        modified.second() as u8,
    )
    .ok()
}

#[cfg(unix)]
fn unix_mode(metadata: &fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn unix_mode(_metadata: &fs::Metadata) -> Option<u32> {
    None
}

/// Print the tree structure of a ZIP archive
///
/// Example output:
/// ```text
///     ZIP contents:
///     └── web/
///         ├── assets/
///         │   └── AssetManifest.bin (1.20 KB)
///         ├── index.html (1.02 KB)
///         └── main.dart.wasm (3.41 MB)
/// ```
pub fn print_zip_tree(archive_path: &Path, indent: &str) -> Result<()> {
    use zip::ZipArchive;

    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open archive: {}", archive_path.display()))?;

    let mut zip = ZipArchive::new(file)
        .with_context(|| format!("Failed to read ZIP archive: {}", archive_path.display()))?;

    let mut tree: BTreeMap<String, TreeNode> = BTreeMap::new();

    for i in 0..zip.len() {
        let file = zip.by_index(i)?;
        let path = file.name().trim_end_matches('/').to_string();
        let is_dir = file.is_dir();
        let size = file.size();

        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        let mut current = &mut tree;

        for (idx, part) in parts.iter().enumerate() {
            let is_last = idx == parts.len() - 1;

            if is_last && !is_dir {
                current.insert(part.to_string(), TreeNode::File { size });
                continue;
            }

            let node = current
                .entry(part.to_string())
                .or_insert_with(|| TreeNode::Dir(BTreeMap::new()));
            match node {
                TreeNode::Dir(children) => current = children,
                TreeNode::File { .. } => break,
            }
        }
    }

    eprintln!("{}ZIP contents:", indent);
    print_tree_level(&tree, indent, "");

    Ok(())
}

/// Tree node type for directory structure
enum TreeNode {
    File { size: u64 },
    Dir(BTreeMap<String, TreeNode>),
}

fn format_size(size: u64) -> String {
    if size >= 1024 * 1024 {
        format!("{:.2} MB", size as f64 / (1024.0 * 1024.0))
    } else if size >= 1024 {
        format!("{:.2} KB", size as f64 / 1024.0)
    } else {
        format!("{} B", size)
    }
}

/// Recursively print a level of the tree structure
fn print_tree_level(tree: &BTreeMap<String, TreeNode>, base_indent: &str, prefix: &str) {
    let len = tree.len();

    for (i, (name, node)) in tree.iter().enumerate() {
        let is_last = i == len - 1;
        let connector = if is_last { "└── " } else { "├── " };

        match node {
            TreeNode::File { size } => {
                eprintln!(
                    "{}{}{}{} ({})",
                    base_indent,
                    prefix,
                    connector,
                    name,
                    format_size(*size)
                );
            }
            TreeNode::Dir(children) => {
                eprintln!("{}{}{}{}/", base_indent, prefix, connector, name);

                let new_prefix = if is_last {
                    format!("{}    ", prefix)
                } else {
                    format!("{}│   ", prefix)
                };

                print_tree_level(children, base_indent, &new_prefix);
            }
        }
    }
}
