//! Document discovery, figure reference extraction and reconciliation against disk.

use crate::patterns::{glob_in, has_extension, relative_key, CleanConfig};

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Extract the filenames named by every `directive{...}` in `text`, in order.
///
/// From each directive the scan jumps to the next `}`; the filename is whatever lies
/// between the last `{` before it and the `}` itself, so optional arguments such as
/// `\includegraphics[width=3cm]{fig}` are skipped over. Filenames not ending in
/// `suffix` get it appended. Scanning stops silently at a directive with no closing
/// brace. Duplicates are kept.
pub fn extract_references(text: &str, directive: &str, suffix: &str) -> Vec<String> {
    let mut references = Vec::new();
    if directive.is_empty() {
        return references;
    }

    let mut pos = 0;
    while let Some(found) = text[pos..].find(directive) {
        let start = pos + found;
        let Some(close_offset) = text[start..].find('}') else {
            break;
        };
        let close = start + close_offset;

        let span = &text[start..close];
        if let Some(open) = span.rfind('{') {
            let mut name = span[open + 1..].to_string();
            if !name.ends_with(suffix) {
                name.push_str(suffix);
            }
            references.push(name);
        }

        pos = close;
    }

    references
}

/// Document files directly inside the project root, sorted
pub fn find_root_documents(root: &Path, config: &CleanConfig) -> Result<Vec<PathBuf>> {
    let pattern = format!("*{}", config.document_suffix());
    let documents = glob_in(root, &pattern)?
        .into_iter()
        .filter(|p| p.is_file())
        .collect();
    Ok(documents)
}

/// Every document file below the project root, recursively
pub fn walk_documents(root: &Path, config: &CleanConfig) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .hidden(false)
        // The whole tree is ours to clean, so ignore files must not hide documents
        .git_ignore(false)
        .ignore(false)
        .git_global(false)
        .git_exclude(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut documents = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("Failed to access entry in {}: {}", root.display(), err);
                continue;
            }
        };

        let path = entry.path();
        if entry.file_type().is_some_and(|ft| ft.is_file())
            && has_extension(path, &config.documents.extension)
        {
            documents.push(path.to_path_buf());
        }
    }

    documents
}

/// Read every document in the tree and concatenate the figure references they contain
pub fn collect_references(root: &Path, config: &CleanConfig) -> Result<Vec<String>> {
    let mut references = Vec::new();

    for document in walk_documents(root, config) {
        let text = fs::read_to_string(&document)
            .with_context(|| format!("Failed to read {}", document.display()))?;
        let found = extract_references(&text, &config.figures.directive, &config.figure_suffix());
        log::debug!(
            "{}: {} figure reference(s)",
            document.display(),
            found.len()
        );
        references.extend(found);
    }

    Ok(references)
}

/// Figure files present on disk, as root-relative keys. Only files carrying the canonical
/// extension directly inside a configured figure directory count.
pub fn collect_resources(root: &Path, config: &CleanConfig) -> Result<BTreeSet<String>> {
    let mut resources = BTreeSet::new();
    let pattern = format!("*{}", config.figure_suffix());

    for dir in &config.figures.dirs {
        let figure_dir = root.join(dir);
        if !figure_dir.is_dir() {
            log::debug!("no figure directory {}, skipping", figure_dir.display());
            continue;
        }

        for path in glob_in(&figure_dir, &pattern)? {
            if path.is_file() {
                resources.insert(relative_key(root, &path));
            }
        }
    }

    Ok(resources)
}

/// Figures on disk that no document references. Comparison is exact and case-sensitive
/// on the root-relative path; a reference to `a.pdf` does not protect `images/a.pdf`.
pub fn unused_resources(on_disk: &BTreeSet<String>, referenced: &[String]) -> BTreeSet<String> {
    let referenced: BTreeSet<&str> = referenced.iter().map(String::as_str).collect();
    on_disk
        .iter()
        .filter(|resource| !referenced.contains(resource.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const DIRECTIVE: &str = "\\includegraphics";

    fn extract(text: &str) -> Vec<String> {
        extract_references(text, DIRECTIVE, ".pdf")
    }

    #[test]
    fn test_no_directive_yields_nothing() {
        assert!(extract("").is_empty());
        assert!(extract("\\section{Intro} plain text {braces}").is_empty());
    }

    #[test]
    fn test_appends_missing_extension() {
        assert_eq!(extract("\\includegraphics{images/a}"), vec!["images/a.pdf"]);
    }

    #[test]
    fn test_keeps_existing_extension() {
        assert_eq!(extract("\\includegraphics{images/b.pdf}"), vec!["images/b.pdf"]);
    }

    #[test]
    fn test_other_extension_still_gets_canonical_suffix() {
        assert_eq!(extract("\\includegraphics{photo.png}"), vec!["photo.png.pdf"]);
    }

    #[test]
    fn test_optional_argument_is_skipped() {
        assert_eq!(
            extract("\\includegraphics[width=0.5\\linewidth]{figures/plot}"),
            vec!["figures/plot.pdf"]
        );
    }

    #[test]
    fn test_multiple_directives_in_order_with_duplicates() {
        let text = "\\includegraphics{b}\ntext\n\\includegraphics{a}\\includegraphics{b}";
        assert_eq!(extract(text), vec!["b.pdf", "a.pdf", "b.pdf"]);
    }

    #[test]
    fn test_unterminated_directive_stops_scan() {
        let text = "\\includegraphics{a}\n\\includegraphics{never closed\n\\includegraphics";
        assert_eq!(extract(text), vec!["a.pdf"]);
    }

    #[test]
    fn test_directive_without_open_brace_is_dropped() {
        let text = "\\includegraphics x} \\includegraphics{kept}";
        assert_eq!(extract(text), vec!["kept.pdf"]);
    }

    #[test]
    fn test_references_in_comments_still_count() {
        assert_eq!(extract("% \\includegraphics{old}"), vec!["old.pdf"]);
    }

    #[test]
    fn test_unused_is_exact_set_difference() {
        let on_disk: BTreeSet<String> = ["images/a.pdf", "images/b.pdf", "images/c.pdf"]
            .into_iter()
            .map(String::from)
            .collect();
        let referenced = vec![
            "images/a.pdf".to_string(),
            "images/b.pdf".to_string(),
            "images/b.pdf".to_string(),
            "images/missing.pdf".to_string(),
        ];

        let unused = unused_resources(&on_disk, &referenced);
        assert_eq!(unused.into_iter().collect::<Vec<_>>(), vec!["images/c.pdf"]);
    }

    #[test]
    fn test_unused_does_not_match_basename_or_case() {
        let on_disk: BTreeSet<String> = ["images/a.pdf", "images/B.pdf"]
            .into_iter()
            .map(String::from)
            .collect();
        let referenced = vec!["a.pdf".to_string(), "images/b.pdf".to_string()];

        let unused = unused_resources(&on_disk, &referenced);
        assert_eq!(unused, on_disk);
    }

    #[test]
    fn test_collect_resources_only_direct_children_with_extension() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("images/nested")).unwrap();
        fs::create_dir_all(root.join("figures")).unwrap();
        fs::write(root.join("images/a.pdf"), "a").unwrap();
        fs::write(root.join("images/b.png"), "b").unwrap();
        fs::write(root.join("images/nested/c.pdf"), "c").unwrap();
        fs::write(root.join("figures/d.pdf"), "d").unwrap();
        fs::write(root.join("loose.pdf"), "e").unwrap();

        let config = CleanConfig::builtin().unwrap();
        let resources = collect_resources(root, &config).unwrap();
        assert_eq!(
            resources.into_iter().collect::<Vec<_>>(),
            vec!["figures/d.pdf", "images/a.pdf"]
        );
    }

    #[test]
    fn test_collect_references_walks_subdirectories() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("chapters")).unwrap();
        fs::write(root.join("main.tex"), "\\includegraphics{images/a}").unwrap();
        fs::write(
            root.join("chapters/one.tex"),
            "\\includegraphics[scale=2]{figures/b.pdf}",
        )
        .unwrap();
        fs::write(root.join("notes.txt"), "\\includegraphics{images/ignored}").unwrap();

        let config = CleanConfig::builtin().unwrap();
        let mut references = collect_references(root, &config).unwrap();
        references.sort();
        assert_eq!(references, vec!["figures/b.pdf", "images/a.pdf"]);
    }

    #[test]
    fn test_find_root_documents_is_not_recursive() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("sub/inner.tex"), "").unwrap();

        let config = CleanConfig::builtin().unwrap();
        assert!(find_root_documents(root, &config).unwrap().is_empty());

        fs::write(root.join("root.tex"), "").unwrap();
        assert_eq!(
            find_root_documents(root, &config).unwrap(),
            vec![root.join("root.tex")]
        );
    }
}
