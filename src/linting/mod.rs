//! The checks run over a loaded document, and the driver that runs them in
//! order and turns their diagnostics into sorted reports.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::language::*;
use crate::parsing::{GrammarCompiler, StepParser};
use crate::problem::{Diagnostic, Location, Problems, Report, Sink};

pub mod collect;
mod consistency;
mod headers;
mod scope;
mod spelling;
mod style;

/// Parsed content of each step in one algorithm. Filled once, then read by
/// both the style and scope checkers.
pub(crate) type Cache<'i> = HashMap<StepId, Seq<'i>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Id of the annex whose contents are exempt from grammar and algorithm
    /// checks.
    pub annex: String,
    pub spelling: bool,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            annex: "sec-additional-ecmascript-features-for-web-browsers".to_string(),
            spelling: true,
        }
    }
}

/// Run every check over the document, returning reports sorted by line and
/// column.
pub fn lint(
    document: &Document,
    options: &Options,
    steps: &impl StepParser,
    grammar: &impl GrammarCompiler,
) -> Vec<Report> {
    let mut problems = Problems::new();

    if options.spelling {
        spelling::check(document, &mut problems);
    }

    match collect::collect(document, options, &mut problems) {
        Ok(collection) => {
            consistency::check(document, &collection, grammar, &mut problems);

            for block in &collection.algorithms {
                check_algorithm(document, options, block, steps, &mut problems);
            }

            headers::check(document, &collection.headers, &mut problems);
        }
        Err(_) => {
            info!("Skipping grammar, algorithm, and header checks");
        }
    }

    let reports = resolve(document, problems.into_diagnostics());
    debug!("{} diagnostics", reports.len());
    reports
}

fn check_algorithm(
    document: &Document,
    options: &Options,
    block: &collect::AlgorithmBlock,
    steps: &impl StepParser,
    problems: &mut Problems,
) {
    let element = block.element;
    let (base, text) = match document
        .location(element)
        .and_then(|location| location.inner())
    {
        Some(inner) => inner,
        None => return,
    };

    let list = match steps.read_algorithm(text) {
        Ok(list) => list,
        Err(error) => {
            problems.at("algorithm-error", error.message(), element, base + error.offset());
            return;
        }
    };

    let mut cache = Cache::new();
    fill_cache(&list, steps, element, base, &mut cache, problems);

    if !block
        .context
        .in_example
    {
        style::check(&list, &cache, element, base, problems);
    }
    scope::check(
        document,
        block,
        &options.annex,
        base,
        &list,
        &cache,
        problems,
    );
}

fn fill_cache<'i>(
    list: &StepList<'i>,
    steps: &impl StepParser,
    element: NodeId,
    base: usize,
    cache: &mut Cache<'i>,
    problems: &mut Problems,
) {
    for step in &list.steps {
        match steps.parse_step(step) {
            Ok(seq) => {
                cache.insert(step.id, seq);
            }
            Err(error) => {
                problems.at(
                    "expression-parsing",
                    error.message(),
                    element,
                    base + error.offset(),
                );
                continue;
            }
        }

        if let Some(sublist) = &step.sublist {
            fill_cache(sublist, steps, element, base, cache, problems);
        }
    }
}

/// Work out the file, line, and column of every diagnostic, then sort. The
/// sort is stable so diagnostics at the same position keep the order they
/// were raised in.
fn resolve(document: &Document, diagnostics: Vec<Diagnostic>) -> Vec<Report> {
    let mut reports: Vec<Report> = diagnostics
        .into_iter()
        .map(|diagnostic| {
            let (source, line, column) = match diagnostic.location {
                Location::Node { element, offset } => {
                    let source = document
                        .element(element)
                        .map(|element| element.source)
                        .unwrap_or(SourceId(0));
                    let (line, column) = document.line_column(source, offset);
                    (source, line, column)
                }
                Location::Raw {
                    source,
                    line,
                    column,
                } => (source, line, column),
            };

            Report {
                rule: diagnostic.rule,
                message: diagnostic.message,
                file: document
                    .source(source)
                    .filename
                    .clone(),
                line,
                column,
                source,
            }
        })
        .collect();

    reports.sort_by_key(|report| (report.line, report.column));
    reports
}

/// Hand reports to a sink, in order.
pub fn emit(reports: &[Report], sink: &mut impl Sink) {
    for report in reports {
        sink.emit(report);
    }
}
