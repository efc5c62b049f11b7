//! Named cleaning phases and the canonical order they run in.

use clap::ValueEnum;
use std::collections::BTreeSet;
use std::fmt;

/// A cleaning phase. Variant order is execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
pub enum Task {
    /// Remove figure sources and figures no document includes
    Images,
    /// Strip comments from every document
    Comments,
    /// Remove auxiliary build files
    Auxiliary,
    /// Remove the compiled output
    MainPdf,
    /// Drop comment lines from the bibliography
    BibComments,
}

impl Task {
    pub const ALL: [Task; 5] = [
        Task::Images,
        Task::Comments,
        Task::Auxiliary,
        Task::MainPdf,
        Task::BibComments,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Task::Images => "images",
            Task::Comments => "comments",
            Task::Auxiliary => "auxiliary",
            Task::MainPdf => "main-pdf",
            Task::BibComments => "bib-comments",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The phases chosen for a run. Iteration always follows canonical order, whatever
/// order the tasks were given in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSelection(BTreeSet<Task>);

impl TaskSelection {
    pub fn all() -> Self {
        TaskSelection(Task::ALL.into_iter().collect())
    }

    pub fn contains(&self, task: Task) -> bool {
        self.0.contains(&task)
    }

    pub fn iter(&self) -> impl Iterator<Item = Task> + '_ {
        self.0.iter().copied()
    }
}

impl Default for TaskSelection {
    fn default() -> Self {
        TaskSelection::all()
    }
}

impl FromIterator<Task> for TaskSelection {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        TaskSelection(iter.into_iter().collect())
    }
}
