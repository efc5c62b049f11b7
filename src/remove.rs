//! Bulk removal of directories and pattern-matched files.

use crate::patterns::glob_in;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// What a removal step deleted
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RemovalReport {
    pub removed: Vec<PathBuf>,
    pub bytes: u64,
}

impl RemovalReport {
    pub fn merge(&mut self, other: RemovalReport) {
        self.removed.extend(other.removed);
        self.bytes += other.bytes;
    }

    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }

    fn record(&mut self, path: &Path, size: u64) {
        self.removed.push(path.to_path_buf());
        self.bytes += size;
    }
}

/// Total size of a directory, not following symlinks
fn calculate_dir_size(path: &Path) -> u64 {
    let mut total = 0;

    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(err) => {
            log::warn!("Failed to read directory {}: {}", path.display(), err);
            return 0;
        }
    };

    for entry_result in entries {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("Error reading entry in {}: {}", path.display(), err);
                continue;
            }
        };

        let entry_path = entry.path();
        match fs::symlink_metadata(&entry_path) {
            Ok(metadata) if metadata.is_dir() => total += calculate_dir_size(&entry_path),
            Ok(metadata) if metadata.is_file() => total += metadata.len(),
            Ok(_) => {}
            Err(err) => {
                log::warn!(
                    "Could not get metadata for {}: {}",
                    entry_path.display(),
                    err
                );
            }
        }
    }

    total
}

/// Recursively remove each directory in `dirs` (relative to `root`). Missing entries
/// and entries that are not directories are skipped.
pub fn remove_dirs(root: &Path, dirs: &[String]) -> Result<RemovalReport> {
    let mut report = RemovalReport::default();

    for dir in dirs {
        let path = root.join(dir);
        let metadata = match fs::symlink_metadata(&path) {
            Ok(meta) => meta,
            Err(_) => {
                log::debug!("did not find {}, skipping", path.display());
                continue;
            }
        };

        if !metadata.is_dir() {
            log::debug!("{} is not a directory, skipping", path.display());
            continue;
        }

        let size = calculate_dir_size(&path);
        fs::remove_dir_all(&path)
            .with_context(|| format!("Failed to remove directory {}", path.display()))?;
        log::debug!("removed directory {}", path.display());
        report.record(&path, size);
    }

    Ok(report)
}

/// Remove every regular file under `dir` matching one of `patterns`. Directories that
/// match are left alone; nothing is recursed into.
pub fn remove_matching(dir: &Path, patterns: &[String]) -> Result<RemovalReport> {
    let mut report = RemovalReport::default();

    for pattern in patterns {
        let matches = glob_in(dir, pattern)?;
        if matches.is_empty() {
            log::debug!("nothing matches {}", pattern);
        }

        for path in matches {
            remove_file_if_present(&path, &mut report)?;
        }
    }

    Ok(report)
}

/// Remove the given files. Paths that no longer exist are skipped.
pub fn remove_files<I, P>(paths: I) -> Result<RemovalReport>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut report = RemovalReport::default();
    for path in paths {
        remove_file_if_present(path.as_ref(), &mut report)?;
    }
    Ok(report)
}

fn remove_file_if_present(path: &Path, report: &mut RemovalReport) -> Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(_) => {
            log::debug!("{} is already gone, skipping", path.display());
            return Ok(());
        }
    };

    if metadata.is_dir() {
        log::debug!("{} is a directory, skipping", path.display());
        return Ok(());
    }

    fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    log::debug!("removed {}", path.display());
    report.record(path, metadata.len());
    Ok(())
}
