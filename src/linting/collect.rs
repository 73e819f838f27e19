//! A single walk over the document sorting out which elements each checker
//! is interested in.

use tracing::{debug, warn};

use crate::language::*;
use crate::linting::Options;
use crate::problem::Problems;

const EARLY_ERRORS: &str = "Static Semantics: Early Errors";

/// Context carried down through the walk. Each recursive call gets its own
/// copy, so a flag set for a subtree goes away when the walk leaves it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Context {
    pub in_annex: bool,
    pub in_example: bool,
    pub in_deleted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// The <h1> of a clause.
    pub element: NodeId,
    pub in_annex: bool,
}

/// A grammar fragment used by a syntax-directed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sdo {
    pub grammar: NodeId,
    pub algorithm: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EarlyErrors {
    pub grammar: NodeId,
    pub lists: Vec<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlgorithmBlock {
    pub element: NodeId,
    pub context: Context,
}

/// Everything found by the walk. Built once and read-only afterwards.
#[derive(Debug, Default)]
pub struct Collection {
    pub headers: Vec<Header>,
    pub grammars: Vec<NodeId>,
    pub sdos: Vec<Sdo>,
    pub early_errors: Vec<EarlyErrors>,
    pub algorithms: Vec<AlgorithmBlock>,
}

/// Collection could not complete. The reason has already been reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionFailed;

pub fn collect(
    document: &Document,
    options: &Options,
    problems: &mut Problems,
) -> Result<Collection, CollectionFailed> {
    let mut walker = Walker {
        document,
        options,
        problems: Problems::new(),
        collection: Collection::default(),
        failed: false,
    };

    // a malformed early errors group discards whatever else the walk found
    if let Err(failure) = walker.walk(document.root(), Context::default()) {
        for diagnostic in walker
            .problems
            .iter()
            .filter(|diagnostic| diagnostic.rule == "early-error-shape")
        {
            problems.report(diagnostic.rule, diagnostic.message.clone(), diagnostic.location);
        }
        return Err(failure);
    }

    problems.append(walker.problems);

    if walker.failed {
        warn!("Collection failed; grammar and algorithms will not be checked");
        return Err(CollectionFailed);
    }

    let collection = walker.collection;
    debug!(
        "Collected {} headers, {} grammar definitions, {} SDOs, {} early error groups, {} algorithms",
        collection
            .headers
            .len(),
        collection
            .grammars
            .len(),
        collection
            .sdos
            .len(),
        collection
            .early_errors
            .len(),
        collection
            .algorithms
            .len()
    );

    Ok(collection)
}

struct Walker<'a> {
    document: &'a Document,
    options: &'a Options,
    problems: Problems,
    collection: Collection,
    failed: bool,
}

impl<'a> Walker<'a> {
    fn walk(&mut self, node: NodeId, context: Context) -> Result<(), CollectionFailed> {
        let document = self.document;

        for child in document.element_children(node) {
            let mut context = context;

            if document.attribute(child, "id") == Some(self.options.annex.as_str()) {
                context.in_annex = true;
            }
            if document.is(child, "emu-example") {
                context.in_example = true;
            }
            if document.is(child, "del") {
                context.in_deleted = true;
            }

            match document.name(child) {
                Some("emu-clause") | Some("emu-annex") => {
                    self.visit_clause(child, context)?;
                    self.walk(child, context)?;
                }
                Some("emu-grammar") => {
                    self.visit_grammar(child, context);
                }
                Some("emu-alg") => {
                    self.visit_algorithm(child, context);
                }
                _ => {
                    self.walk(child, context)?;
                }
            }
        }

        Ok(())
    }

    fn visit_clause(&mut self, clause: NodeId, context: Context) -> Result<(), CollectionFailed> {
        let document = self.document;

        let first = match document.first_element_child(clause) {
            Some(first) if document.is(first, "h1") => first,
            _ => return Ok(()),
        };

        self.collection
            .headers
            .push(Header {
                element: first,
                in_annex: context.in_annex,
            });

        if context.in_annex {
            return Ok(());
        }

        let title = document.text_content_excluding(first, "del");
        if title.trim() == EARLY_ERRORS {
            self.visit_early_errors(clause)?;
        }

        Ok(())
    }

    /// An Early Errors clause alternates between a grammar and the lists of
    /// errors which apply to it. Anything else is fatal.
    fn visit_early_errors(&mut self, clause: NodeId) -> Result<(), CollectionFailed> {
        let document = self.document;

        let mut grammar: Option<NodeId> = None;
        let mut lists: Vec<NodeId> = vec![];
        let mut found = vec![];

        for child in document.element_children(clause) {
            if document.is(child, "emu-grammar") {
                if let Some(previous) = grammar {
                    if lists.is_empty() {
                        return self.shape(
                            child,
                            "unrecognized structure for early errors: multiple consecutive <emu-grammar>s without intervening <ul> of errors",
                        );
                    }
                    found.push(EarlyErrors {
                        grammar: previous,
                        lists: std::mem::take(&mut lists),
                    });
                }
                grammar = Some(child);
            } else if document.is(child, "ul") {
                if grammar.is_none() {
                    return self.shape(
                        child,
                        "unrecognized structure for early errors: <ul> without preceding <emu-grammar>",
                    );
                }
                lists.push(child);
            }
        }

        match grammar {
            None => {
                return self.shape(
                    clause,
                    "unrecognized structure for early errors: no <emu-grammar>",
                )
            }
            Some(grammar) => {
                if lists.is_empty() {
                    return self.shape(
                        grammar,
                        "unrecognized structure for early errors: <emu-grammar> without following <ul> of errors",
                    );
                }
                found.push(EarlyErrors { grammar, lists });
            }
        }

        for group in &found {
            self.require_end_tag(group.grammar);
        }

        self.collection
            .early_errors
            .extend(found);

        Ok(())
    }

    fn shape(&mut self, element: NodeId, message: &str) -> Result<(), CollectionFailed> {
        let offset = self.start_of(element);
        self.problems
            .at("early-error-shape", message, element, offset);
        warn!("{}", message);
        Err(CollectionFailed)
    }

    fn visit_grammar(&mut self, grammar: NodeId, context: Context) {
        if context.in_annex || context.in_deleted {
            return;
        }

        let document = self.document;

        if document.attribute(grammar, "type") == Some("definition") {
            if self.require_end_tag(grammar) {
                self.collection
                    .grammars
                    .push(grammar);
            }
            return;
        }

        if let Some(next) = document.next_element_sibling(grammar) {
            if document.is(next, "emu-alg") && self.require_end_tag(grammar) {
                self.collection
                    .sdos
                    .push(Sdo {
                        grammar,
                        algorithm: next,
                    });
            }
        }
    }

    fn visit_algorithm(&mut self, algorithm: NodeId, context: Context) {
        let document = self.document;

        if document.has_attribute(algorithm, "example")
            || document.attribute(algorithm, "type") == Some("example")
        {
            return;
        }

        let missing = document
            .location(algorithm)
            .map(|location| {
                location
                    .end_tag
                    .is_none()
            })
            .unwrap_or(true);

        if missing {
            let offset = self.start_of(algorithm);
            self.problems
                .at(
                    "missing-close-tag",
                    "could not find closing tag for emu-alg",
                    algorithm,
                    offset,
                );
            return;
        }

        self.collection
            .algorithms
            .push(AlgorithmBlock {
                element: algorithm,
                context,
            });
    }

    /// Grammar offsets can't be worked out without the closing tag, so its
    /// absence fails the whole collection.
    fn require_end_tag(&mut self, grammar: NodeId) -> bool {
        let found = self
            .document
            .location(grammar)
            .map(|location| {
                location
                    .end_tag
                    .is_some()
            })
            .unwrap_or(false);

        if !found {
            let offset = self.start_of(grammar);
            self.problems
                .at(
                    "missing-close-tag",
                    "could not find closing tag for emu-grammar",
                    grammar,
                    offset,
                );
            self.failed = true;
        }

        found
    }

    fn start_of(&self, element: NodeId) -> usize {
        self.document
            .location(element)
            .map(|location| {
                location
                    .start_tag
                    .start
            })
            .unwrap_or(0)
    }
}
