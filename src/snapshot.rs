//! Whole-tree copy taken before anything is modified.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Copy the tree at `src` to `dest` and return the number of files copied.
///
/// `dest` must not exist yet and must not lie inside `src`. Symlinks are skipped.
pub fn snapshot(src: &Path, dest: &Path) -> Result<u64> {
    if dest.exists() {
        bail!("Snapshot destination {} already exists", dest.display());
    }

    let src = src
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", src.display()))?;
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        let parent = parent
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", parent.display()))?;
        if parent.starts_with(&src) {
            bail!(
                "Snapshot destination {} lies inside the project {}",
                dest.display(),
                src.display()
            );
        }
    }

    let mut copied = 0u64;
    for entry in WalkDir::new(&src) {
        let entry = entry.with_context(|| format!("Failed to walk {}", src.display()))?;
        let relative = entry.path().strip_prefix(&src).unwrap_or(entry.path());
        let target = dest.join(relative);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
            copied += 1;
        } else {
            log::debug!("skipping symlink {}", entry.path().display());
        }
    }

    Ok(copied)
}
