//! latexclean - Submission Cleaner for LaTeX Projects
//!
//! latexclean prepares a LaTeX project for submission. It removes figure source files,
//! deletes figures that no document includes, strips `%` comments from `.tex` files,
//! removes auxiliary build files and the compiled output, and optionally drops comment
//! lines from the bibliography.
//!
//! ## Pipeline
//!
//! Every run recomputes its state from the filesystem:
//! - precondition: at least one document file in the project root
//! - optional snapshot of the whole tree, after which only the copy is touched
//! - a global confirmation gate, then each selected phase in canonical order
//!
//! Deletions are irreversible. The snapshot is the only safety net.

pub mod comments;
pub mod confirm;
pub mod patterns;
pub mod pipeline;
pub mod remove;
pub mod scanner;
pub mod snapshot;
pub mod tasks;

// Re-export commonly used items
pub use comments::{strip_bib_comments, strip_comments};
pub use confirm::{AssumeYes, Confirm, Prompt, ScriptedConfirm};
pub use patterns::CleanConfig;
pub use pipeline::{run, CleanOptions, PhaseReport, PhaseStatus, RunOutcome, RunReport};
pub use remove::RemovalReport;
pub use scanner::{
    collect_references, collect_resources, extract_references, find_root_documents,
    unused_resources,
};
pub use snapshot::snapshot;
pub use tasks::{Task, TaskSelection};
