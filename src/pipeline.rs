//! The cleaning run: precondition, snapshot, global gate, then each selected phase.

use crate::comments::{rewrite_file, strip_bib_comments, strip_comments};
use crate::confirm::Confirm;
use crate::patterns::{glob_in, CleanConfig};
use crate::remove::{remove_dirs, remove_files, remove_matching, RemovalReport};
use crate::scanner::{
    collect_references, collect_resources, find_root_documents, unused_resources, walk_documents,
};
use crate::snapshot::snapshot;
use crate::tasks::{Task, TaskSelection};

use anyhow::{bail, Context, Result};
use colored::Colorize;
use humansize::{format_size, BINARY};
use std::path::{Path, PathBuf};

/// Runtime choices for a cleaning run
#[derive(Debug, Clone, Default)]
pub struct CleanOptions {
    pub tasks: TaskSelection,
    /// Bibliography file, relative to the project root
    pub bibliography: Option<PathBuf>,
    /// Copy the project here first and clean the copy
    pub output: Option<PathBuf>,
}

/// How a phase ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStatus {
    Completed,
    /// A gate inside the phase was declined; earlier steps of the phase may have run
    Declined,
    /// Nothing to work on
    Skipped,
}

/// What one phase did
#[derive(Debug, Clone)]
pub struct PhaseReport {
    pub task: Task,
    pub status: PhaseStatus,
    pub removed: RemovalReport,
    /// Files rewritten in place
    pub rewritten: Vec<PathBuf>,
}

impl PhaseReport {
    fn new(task: Task) -> Self {
        PhaseReport {
            task,
            status: PhaseStatus::Completed,
            removed: RemovalReport::default(),
            rewritten: Vec::new(),
        }
    }
}

/// Result of a whole run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// The directory that was cleaned (the snapshot when one was taken)
    pub workdir: PathBuf,
    pub phases: Vec<PhaseReport>,
}

impl RunReport {
    pub fn bytes_removed(&self) -> u64 {
        self.phases.iter().map(|p| p.removed.bytes).sum()
    }

    pub fn phase(&self, task: Task) -> Option<&PhaseReport> {
        self.phases.iter().find(|p| p.task == task)
    }
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The global gate was declined; nothing was modified
    Declined,
    Completed(RunReport),
}

const GLOBAL_PROMPT: &str =
    "This removes files and rewrites documents in place. It cannot be undone.";

/// Clean the project at `root`.
///
/// Fails before touching anything when `root` holds no document file. Filesystem errors
/// inside a phase abort the run and leave finished work in place.
///
/// Both the project and the snapshot are worked on through canonical paths, since figure
/// keys are derived by stripping the working directory off every globbed path.
pub fn run(
    root: &Path,
    config: &CleanConfig,
    options: &CleanOptions,
    confirm: &mut dyn Confirm,
) -> Result<RunOutcome> {
    let root = &root
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", root.display()))?;

    if find_root_documents(root, config)?.is_empty() {
        bail!(
            "No *{} files found in {}, this does not look like a LaTeX project",
            config.document_suffix(),
            root.display()
        );
    }

    let workdir = match &options.output {
        Some(output) => {
            let copied = snapshot(root, output)?;
            println!(
                "Copied {} files to {}, cleaning the copy",
                copied,
                output.display()
            );
            output
                .canonicalize()
                .with_context(|| format!("Failed to resolve {}", output.display()))?
        }
        None => root.to_path_buf(),
    };

    if !confirm.confirm(GLOBAL_PROMPT)? {
        return Ok(RunOutcome::Declined);
    }

    let mut phases = Vec::new();
    for task in options.tasks.iter() {
        print_header(task);
        let report = match task {
            Task::Images => clean_images(&workdir, config, confirm)?,
            Task::Comments => strip_document_comments(&workdir, config)?,
            Task::Auxiliary => remove_auxiliary(&workdir, config, confirm)?,
            Task::MainPdf => remove_output(&workdir, config, confirm)?,
            Task::BibComments => {
                strip_bibliography(&workdir, config, options.bibliography.as_deref())?
            }
        };
        print_summary(&report);
        phases.push(report);
    }

    Ok(RunOutcome::Completed(RunReport { workdir, phases }))
}

fn print_header(task: Task) {
    println!("{}", "------------------------".dimmed());
    println!("{}", format!("[{}]", task).bold());
}

fn print_summary(report: &PhaseReport) {
    match report.status {
        PhaseStatus::Declined => println!("  {}", "declined, skipping".yellow()),
        PhaseStatus::Skipped => println!("  nothing to do."),
        PhaseStatus::Completed => {}
    }
    if !report.removed.is_empty() {
        println!(
            "  {}",
            format!(
                "Removed {} item(s), {}",
                report.removed.removed.len(),
                format_size(report.removed.bytes, BINARY)
            )
            .green()
        );
    }
    if !report.rewritten.is_empty() {
        println!(
            "  {}",
            format!("Rewrote {} file(s)", report.rewritten.len()).green()
        );
    }
}

/// Figure sources first, then figures no document references
fn clean_images(
    root: &Path,
    config: &CleanConfig,
    confirm: &mut dyn Confirm,
) -> Result<PhaseReport> {
    let mut report = PhaseReport::new(Task::Images);

    println!("removing figure source files...");
    let prompt = format!(
        "Remove figure source directories ({}) and *.{{{}}} files in figure directories?",
        config.figures.source_dirs.join(", "),
        config.figures.source_extensions.join(",")
    );
    if confirm.confirm(&prompt)? {
        report.removed.merge(remove_dirs(root, &config.figures.source_dirs)?);

        let source_patterns: Vec<String> = config
            .figures
            .source_extensions
            .iter()
            .map(|ext| format!("*.{}", ext))
            .collect();
        for dir in &config.figures.dirs {
            let figure_dir = root.join(dir);
            if figure_dir.is_dir() {
                report
                    .removed
                    .merge(remove_matching(&figure_dir, &source_patterns)?);
            }
        }
    } else {
        report.status = PhaseStatus::Declined;
    }

    println!("searching included figures in documents...");
    let referenced = collect_references(root, config)?;
    println!("  found {} figure references", referenced.len());
    for reference in &referenced {
        log::debug!("referenced: {}", reference);
    }

    let on_disk = collect_resources(root, config)?;
    let unused = unused_resources(&on_disk, &referenced);
    if unused.is_empty() {
        if report.removed.is_empty() && report.status == PhaseStatus::Completed {
            report.status = PhaseStatus::Skipped;
        }
        return Ok(report);
    }

    println!("{} unused figure(s):", unused.len());
    for figure in &unused {
        println!("  {}", figure);
    }
    if confirm.confirm(&format!("Remove these {} unused figures?", unused.len()))? {
        report
            .removed
            .merge(remove_files(unused.iter().map(|key| root.join(key)))?);
    } else {
        report.status = PhaseStatus::Declined;
    }

    Ok(report)
}

fn strip_document_comments(root: &Path, config: &CleanConfig) -> Result<PhaseReport> {
    let mut report = PhaseReport::new(Task::Comments);
    let marker = config.documents.comment_marker;

    println!("removing all comments from *{} files...", config.document_suffix());
    for document in walk_documents(root, config) {
        if rewrite_file(&document, |text| strip_comments(text, marker))? {
            log::debug!("stripped comments from {}", document.display());
            report.rewritten.push(document);
        }
    }

    if report.rewritten.is_empty() {
        report.status = PhaseStatus::Skipped;
    }
    Ok(report)
}

fn remove_auxiliary(
    root: &Path,
    config: &CleanConfig,
    confirm: &mut dyn Confirm,
) -> Result<PhaseReport> {
    remove_gated(
        Task::Auxiliary,
        root,
        &config.auxiliary.patterns,
        "auxiliary files",
        confirm,
    )
}

fn remove_output(
    root: &Path,
    config: &CleanConfig,
    confirm: &mut dyn Confirm,
) -> Result<PhaseReport> {
    remove_gated(
        Task::MainPdf,
        root,
        &config.output.patterns,
        "compiled output",
        confirm,
    )
}

fn remove_gated(
    task: Task,
    root: &Path,
    patterns: &[String],
    what: &str,
    confirm: &mut dyn Confirm,
) -> Result<PhaseReport> {
    let mut report = PhaseReport::new(task);

    let prompt = format!("Remove {} matching {}?", what, patterns.join(" "));
    if confirm.confirm(&prompt)? {
        report.removed = remove_matching(root, patterns)?;
        for path in &report.removed.removed {
            println!("  {}", path.display());
        }
        if report.removed.is_empty() {
            report.status = PhaseStatus::Skipped;
        }
    } else {
        report.status = PhaseStatus::Declined;
    }

    Ok(report)
}

/// Explicit path, then configured path, then the first `*.bib` in the root
fn resolve_bibliography(
    root: &Path,
    config: &CleanConfig,
    explicit: Option<&Path>,
) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit.or(config.bibliography.path.as_deref()) {
        return Ok(Some(root.join(path)));
    }
    Ok(glob_in(root, "*.bib")?.into_iter().find(|p| p.is_file()))
}

fn strip_bibliography(
    root: &Path,
    config: &CleanConfig,
    explicit: Option<&Path>,
) -> Result<PhaseReport> {
    let mut report = PhaseReport::new(Task::BibComments);

    let bibliography = match resolve_bibliography(root, config, explicit)? {
        Some(path) if path.is_file() => path,
        Some(path) => {
            log::debug!("did not find bibliography {}, skipping", path.display());
            report.status = PhaseStatus::Skipped;
            return Ok(report);
        }
        None => {
            log::debug!("no bibliography in {}, skipping", root.display());
            report.status = PhaseStatus::Skipped;
            return Ok(report);
        }
    };

    println!("removing comment lines from {}...", bibliography.display());
    if rewrite_file(&bibliography, strip_bib_comments)? {
        report.rewritten.push(bibliography);
    } else {
        report.status = PhaseStatus::Skipped;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::{AssumeYes, ScriptedConfirm};
    use std::fs;
    use tempfile::tempdir;

    fn config() -> CleanConfig {
        CleanConfig::builtin().unwrap()
    }

    #[test]
    fn test_bibliography_resolution_order() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("b.bib"), "").unwrap();
        fs::write(root.join("a.bib"), "").unwrap();

        let mut config = config();
        assert_eq!(
            resolve_bibliography(root, &config, None).unwrap(),
            Some(root.join("a.bib"))
        );

        config.bibliography.path = Some(PathBuf::from("refs/configured.bib"));
        assert_eq!(
            resolve_bibliography(root, &config, None).unwrap(),
            Some(root.join("refs/configured.bib"))
        );

        assert_eq!(
            resolve_bibliography(root, &config, Some(Path::new("explicit.bib"))).unwrap(),
            Some(root.join("explicit.bib"))
        );
    }

    #[test]
    fn test_missing_bibliography_is_skipped() {
        let dir = tempdir().unwrap();
        let report =
            strip_bibliography(dir.path(), &config(), Some(Path::new("nope.bib"))).unwrap();
        assert_eq!(report.status, PhaseStatus::Skipped);
    }

    #[test]
    fn test_declined_source_gate_still_reconciles() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("images-src")).unwrap();
        fs::create_dir_all(root.join("images")).unwrap();
        fs::write(root.join("main.tex"), "\\includegraphics{images/a}").unwrap();
        fs::write(root.join("images/a.pdf"), "a").unwrap();
        fs::write(root.join("images/b.pdf"), "b").unwrap();

        let mut confirm = ScriptedConfirm::new([false, true]);
        let report = clean_images(root, &config(), &mut confirm).unwrap();

        assert!(root.join("images-src").exists());
        assert!(!root.join("images/b.pdf").exists());
        assert!(root.join("images/a.pdf").exists());
        assert_eq!(report.removed.removed, vec![root.join("images/b.pdf")]);
    }

    #[test]
    fn test_no_unused_figures_asks_once() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("figures")).unwrap();
        fs::write(root.join("main.tex"), "\\includegraphics{figures/x.pdf}").unwrap();
        fs::write(root.join("figures/x.pdf"), "x").unwrap();

        let mut confirm = ScriptedConfirm::new([true, true]);
        let report = clean_images(root, &config(), &mut confirm).unwrap();

        assert_eq!(confirm.prompts.len(), 1);
        assert_eq!(report.status, PhaseStatus::Skipped);
        assert!(root.join("figures/x.pdf").exists());
    }

    #[test]
    fn test_run_without_documents_fails_before_snapshot() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("project");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("build.aux"), "aux").unwrap();

        let options = CleanOptions {
            output: Some(dir.path().join("copy")),
            ..CleanOptions::default()
        };
        let result = run(&root, &config(), &options, &mut AssumeYes);

        assert!(result.is_err());
        assert!(!dir.path().join("copy").exists());
        assert!(root.join("build.aux").exists());
    }
}
