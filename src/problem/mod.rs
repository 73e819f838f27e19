//! Diagnostics raised by the checkers, and their delivery to whatever is
//! consuming them.

use std::path::PathBuf;

use serde::Serialize;

use crate::language::{NodeId, SourceId};

mod format;
mod messages;

// Re-export all public symbols
pub use format::*;
pub use messages::*;

/// Where a diagnostic applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// A byte offset within the source the given element was read from.
    Node { element: NodeId, offset: usize },
    /// One-origin line and column in a source, as found by scanning the
    /// whole text.
    Raw {
        source: SourceId,
        line: usize,
        column: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub rule: &'static str,
    pub message: String,
    pub location: Location,
}

/// A diagnostic with its location resolved to a file, line, and column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub rule: &'static str,
    pub message: String,
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    #[serde(skip)]
    pub source: SourceId,
}

/// Accumulates diagnostics during a run. They are only ever appended.
#[derive(Debug, Default)]
pub struct Problems {
    diagnostics: Vec<Diagnostic>,
}

impl Problems {
    pub fn new() -> Problems {
        Problems::default()
    }

    pub fn report(&mut self, rule: &'static str, message: impl Into<String>, location: Location) {
        self.diagnostics
            .push(Diagnostic {
                rule,
                message: message.into(),
                location,
            });
    }

    /// Report at an absolute offset in the source of the given element.
    pub fn at(
        &mut self,
        rule: &'static str,
        message: impl Into<String>,
        element: NodeId,
        offset: usize,
    ) {
        self.report(rule, message, Location::Node { element, offset });
    }

    pub fn len(&self) -> usize {
        self.diagnostics
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics
            .is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
    }

    /// Take over everything another accumulator gathered.
    pub fn append(&mut self, other: Problems) {
        self.diagnostics
            .extend(other.diagnostics);
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// Receives reports once they have been resolved and sorted.
pub trait Sink {
    fn emit(&mut self, report: &Report);
}

impl Sink for Vec<Report> {
    fn emit(&mut self, report: &Report) {
        self.push(report.clone());
    }
}
