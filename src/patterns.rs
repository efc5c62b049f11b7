//! Cleaning rules loaded from cleaner.toml, plus glob and path helpers.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Component, Path, PathBuf};

// Embed the TOML file directly in the binary at compile time
const CLEANER_TOML: &str = include_str!("../cleaner.toml");

/// Name of the optional per-project override file
pub const PROJECT_CONFIG_FILE: &str = "latexclean.toml";

/// All rules that drive a cleaning run
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleanConfig {
    pub documents: DocumentRules,
    pub figures: FigureRules,
    pub auxiliary: PatternRules,
    pub output: PatternRules,
    #[serde(default)]
    pub bibliography: BibliographyRules,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentRules {
    /// Markup extension without the dot (e.g. "tex")
    pub extension: String,
    /// Character that starts a comment running to the end of the line
    pub comment_marker: char,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FigureRules {
    /// Inclusion directive whose braced argument names a figure
    pub directive: String,
    /// Canonical figure extension, appended to references that lack it
    pub extension: String,
    /// Directories holding compiled figures, relative to the project root
    pub dirs: Vec<String>,
    /// Directories holding figure sources, removed wholesale
    pub source_dirs: Vec<String>,
    /// Source file extensions removed from inside `dirs`
    pub source_extensions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternRules {
    /// Glob patterns relative to the project root
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BibliographyRules {
    pub path: Option<PathBuf>,
}

impl CleanConfig {
    /// The rules embedded in the binary
    pub fn builtin() -> Result<Self> {
        let table = builtin_table()?;
        Self::from_table(table)
    }

    /// Load the builtin rules, then layer `latexclean.toml` from the project root and an
    /// optional extra file on top. Later layers override individual keys.
    pub fn load(root: &Path, extra: Option<&Path>) -> Result<Self> {
        let mut table = builtin_table()?;

        let project_file = root.join(PROJECT_CONFIG_FILE);
        if project_file.is_file() {
            log::debug!("loading project config {}", project_file.display());
            merge_tables(&mut table, read_table(&project_file)?);
        }

        if let Some(extra) = extra {
            log::debug!("loading config {}", extra.display());
            merge_tables(&mut table, read_table(extra)?);
        }

        Self::from_table(table)
    }

    fn from_table(table: toml::Table) -> Result<Self> {
        toml::Value::Table(table)
            .try_into()
            .context("Invalid cleaning configuration")
    }

    /// Dotted extension of document files (e.g. ".tex")
    pub fn document_suffix(&self) -> String {
        format!(".{}", self.documents.extension)
    }

    /// Dotted canonical figure extension (e.g. ".pdf")
    pub fn figure_suffix(&self) -> String {
        format!(".{}", self.figures.extension)
    }
}

fn builtin_table() -> Result<toml::Table> {
    toml::from_str(CLEANER_TOML).context("Failed to parse embedded cleaner.toml")
}

fn read_table(path: &Path) -> Result<toml::Table> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse config {}", path.display()))
}

/// Recursively merge `overlay` into `base`. Nested tables merge key by key, anything
/// else replaces the base value.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        if let toml::Value::Table(incoming) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                merge_tables(existing, incoming);
                continue;
            }
            base.insert(key, toml::Value::Table(incoming));
        } else {
            base.insert(key, value);
        }
    }
}

/// Expand a glob pattern relative to `dir`. The directory part is escaped so that
/// project paths containing `[` or `*` match literally.
pub fn glob_in(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let full = format!("{}/{}", escaped.trim_end_matches('/'), pattern);

    let mut matches = Vec::new();
    for entry in glob::glob(&full).with_context(|| format!("Invalid glob pattern '{}'", pattern))? {
        match entry {
            Ok(path) => matches.push(path),
            Err(err) => log::warn!("Failed to access {}: {}", err.path().display(), err),
        }
    }
    matches.sort();
    Ok(matches)
}

/// Path of `path` relative to `root`, joined with `/`. This is the form figure
/// references are written in, so it is what reconciliation compares.
pub fn relative_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(os_str) => Some(os_str.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Check whether a path carries the given extension (without dot), case-sensitively
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == extension)
}
