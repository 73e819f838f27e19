//! Readers for specification documents and the two languages embedded in
//! them. The checkers only see these through the Document arena and the
//! StepParser and GrammarCompiler traits.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::language::*;

pub mod grammar;
pub mod markup;
pub mod steps;

pub use grammar::GrammarReader;
pub use steps::{ParsingError, StepReader};

/// Turns the markup inside an algorithm block into steps, and each step's
/// content into a sequence of items.
pub trait StepParser {
    fn read_algorithm<'i>(&self, source: &'i str) -> Result<StepList<'i>, ParsingError>;

    fn parse_step<'i>(&self, step: &Step<'i>) -> Result<Seq<'i>, ParsingError>;
}

/// Compiles one or more pieces of grammar notation together. When `checks`
/// is set the result includes diagnostics about the grammar as a whole
/// (unused parameters, duplicate productions) and not just syntax errors.
pub trait GrammarCompiler {
    fn compile<'i>(&self, sources: &[GrammarSource<'i>], checks: bool) -> Compilation<'i>;
}

/// One non-blank line of a block of source, with its position.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Line<'i> {
    pub(crate) indent: usize,
    /// Offset of the first non-whitespace character.
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) text: &'i str,
}

pub(crate) fn split_lines(source: &str) -> Vec<Line<'_>> {
    let mut lines = vec![];
    let mut offset = 0;

    for raw in source.split('\n') {
        let trimmed = raw.trim_start();
        let indent = raw.len() - trimmed.len();
        let text = trimmed.trim_end();

        if !text.is_empty() {
            let start = offset + indent;
            lines.push(Line {
                indent,
                start,
                end: start + text.len(),
                text,
            });
        }

        offset += raw.len() + 1;
    }

    lines
}

/// Read a file and return an owned String, which the Document takes
/// ownership of.
pub fn load(filename: &Path) -> Result<String, LoadingError> {
    match std::fs::read_to_string(filename) {
        Ok(content) => Ok(content),
        Err(error) => {
            debug!(?error);
            match error.kind() {
                std::io::ErrorKind::NotFound => Err(LoadingError {
                    problem: "File not found".to_string(),
                    details: String::new(),
                    filename: filename.to_path_buf(),
                }),
                _ => Err(LoadingError {
                    problem: "Failed reading".to_string(),
                    details: error
                        .kind()
                        .to_string(),
                    filename: filename.to_path_buf(),
                }),
            }
        }
    }
}

/// Load a document and everything it pulls in with `<emu-import href="…">`.
/// Each imported file becomes its own source, and its content is attached
/// beneath the import element. A file already imported is not read again.
pub fn load_document(filename: &Path) -> Result<Document, LoadingError> {
    let content = load(filename)?;
    let mut document = markup::read(filename, content);

    let mut visited: HashSet<PathBuf> = HashSet::new();
    visited.insert(filename.to_path_buf());

    // imported sources append nodes, so this also reaches imports nested
    // inside imported files
    let mut i = 0;
    while i < document.node_count() {
        let id = NodeId(i);
        i += 1;

        if !document.is(id, "emu-import") {
            continue;
        }

        let href = match document.attribute(id, "href") {
            Some(href) => href.to_string(),
            None => continue,
        };

        let importer = match document.element(id) {
            Some(element) => element.source,
            None => continue,
        };

        let path = document
            .source(importer)
            .filename
            .parent()
            .unwrap_or(Path::new(""))
            .join(&href);

        if !visited.insert(path.clone()) {
            debug!("Already imported {}", path.display());
            continue;
        }

        debug!("Importing {}", path.display());
        let content = load(&path)?;
        let source = document.add_source(&path, content);
        markup::read_into(&mut document, source, id);
    }

    debug!(
        "Loaded {} source{}",
        document
            .sources()
            .count(),
        if document
            .sources()
            .count()
            == 1
        {
            ""
        } else {
            "s"
        }
    );

    Ok(document)
}
