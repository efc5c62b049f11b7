//! Comment removal for documents and the bibliography.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Remove every comment span from `text`.
///
/// A span starts at `marker` and runs up to the next `\n`, which is kept, or to the end
/// of the text when no line break follows. There is no escape handling: `\%` starts a
/// comment like any other `%`.
pub fn strip_comments(text: &str, marker: char) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(marker) {
        out.push_str(&rest[..start]);
        match rest[start..].find('\n') {
            Some(newline) => rest = &rest[start + newline..],
            None => rest = "",
        }
    }
    out.push_str(rest);

    out
}

/// Drop bibliography lines that are comments: after leading whitespace the line starts
/// with `comment`. Kept lines retain their terminators and order.
pub fn strip_bib_comments(text: &str) -> String {
    text.split_inclusive('\n')
        .filter(|line| !is_bib_comment(line))
        .collect()
}

fn is_bib_comment(line: &str) -> bool {
    line.trim_start().starts_with("comment")
}

/// Apply `transform` to the file at `path` and write the result back in place.
/// Returns whether the content changed. The file is rewritten either way.
pub fn rewrite_file(path: &Path, transform: impl Fn(&str) -> String) -> Result<bool> {
    let original =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let stripped = transform(&original);
    fs::write(path, &stripped).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(stripped != original)
}
