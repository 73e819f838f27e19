//! Checking that grammar used by syntax-directed operations and early errors
//! agrees with the grammar definitions.

use std::collections::HashMap;

use tracing::debug;

use crate::language::*;
use crate::linting::collect::Collection;
use crate::parsing::GrammarCompiler;
use crate::problem::Problems;

fn rule_for(problem: &GrammarProblem<'_>) -> &'static str {
    match problem {
        GrammarProblem::Syntax(_) => "grammar:syntax",
        GrammarProblem::UnusedParameter { .. } => "grammar:unused-parameter",
        GrammarProblem::DuplicateProduction(_) => "grammar:duplicate-production",
    }
}

/// The markup between an element's tags, with the offset it starts at.
fn inner_of(document: &Document, element: NodeId) -> Option<(usize, &str)> {
    document
        .location(element)?
        .inner()
}

pub(crate) fn check(
    document: &Document,
    collection: &Collection,
    compiler: &impl GrammarCompiler,
    problems: &mut Problems,
) {
    let mut elements = vec![];
    let mut sources = vec![];
    for grammar in &collection.grammars {
        if let Some((base, text)) = inner_of(document, *grammar) {
            elements.push((*grammar, base));
            sources.push(GrammarSource { text });
        }
    }

    let canonical = compiler.compile(&sources, true);

    let mut held = vec![];
    for diagnostic in &canonical.diagnostics {
        if let GrammarProblem::UnusedParameter { .. } = diagnostic.problem {
            held.push(diagnostic);
            continue;
        }
        if let Some((element, base)) = elements.get(diagnostic.source) {
            problems.at(
                rule_for(&diagnostic.problem),
                diagnostic
                    .problem
                    .message(),
                *element,
                base + diagnostic.offset,
            );
        }
    }

    let mut definitions: HashMap<&str, Vec<&RightHandSide<'_>>> = HashMap::new();
    for production in &canonical.productions {
        definitions
            .entry(production.name)
            .or_default()
            .extend(
                production
                    .rhses
                    .iter(),
            );
    }

    let fragments: Vec<NodeId> = collection
        .sdos
        .iter()
        .map(|sdo| sdo.grammar)
        .chain(
            collection
                .early_errors
                .iter()
                .map(|group| group.grammar),
        )
        .collect();

    debug!(
        "Checking {} grammar fragments against {} productions",
        fragments.len(),
        definitions.len()
    );

    let mut associated: HashMap<&str, Vec<&str>> = HashMap::new();

    for element in fragments {
        let (base, text) = match inner_of(document, element) {
            Some(inner) => inner,
            None => continue,
        };

        let compilation = compiler.compile(&[GrammarSource { text }], false);
        for diagnostic in &compilation.diagnostics {
            if let GrammarProblem::Syntax(_) = diagnostic.problem {
                problems.at(
                    "grammar:syntax",
                    diagnostic
                        .problem
                        .message(),
                    element,
                    base + diagnostic.offset,
                );
            }
        }

        for production in &compilation.productions {
            associated
                .entry(production.name)
                .or_default()
                .push(text);

            for rhs in &production.rhses {
                check_fragment_rhs(rhs, element, base, problems);

                let candidates = match definitions.get(production.name) {
                    Some(candidates) => candidates,
                    None => {
                        problems.at(
                            "undefined-nonterminal",
                            format!(
                                "Could not find a definition for LHS in syntactic grammar ({})",
                                production.name
                            ),
                            element,
                            base + rhs.offset,
                        );
                        continue;
                    }
                };

                let found = candidates
                    .iter()
                    .any(|canonical| span_matches(&rhs.symbols, &canonical.symbols));
                if !found {
                    problems.at(
                        "undefined-nonterminal",
                        format!(
                            "Could not find a production matching RHS in syntactic grammar ({})",
                            production.name
                        ),
                        element,
                        base + rhs.offset,
                    );
                }
            }
        }
    }

    for diagnostic in held {
        if let GrammarProblem::UnusedParameter {
            production,
            parameter,
        } = diagnostic.problem
        {
            let needle = format!("[{}]", parameter);
            let mentioned = associated
                .get(production)
                .map(|texts| {
                    texts
                        .iter()
                        .any(|text| text.contains(&needle))
                })
                .unwrap_or(false);
            if mentioned {
                continue;
            }

            if let Some((element, base)) = elements.get(diagnostic.source) {
                problems.at(
                    "grammar:unused-parameter",
                    diagnostic
                        .problem
                        .message(),
                    *element,
                    base + diagnostic.offset,
                );
            }
        }
    }
}

/// Restrictions and guards belong in the grammar definitions only.
fn check_fragment_rhs(rhs: &RightHandSide<'_>, element: NodeId, base: usize, problems: &mut Problems) {
    if let Some(guard) = &rhs.guard {
        problems.at(
            "guard-in-SDO",
            "productions referenced in SDOs and early errors should not include parameter guards",
            element,
            base + guard.offset,
        );
    }

    for symbol in &rhs.symbols {
        if let Some(offset) = no_line_terminator(symbol) {
            problems.at(
                "NLTH-in-SDO",
                "productions referenced in SDOs and early errors should not include [no LineTerminator here] restrictions",
                element,
                base + offset,
            );
        }
    }
}

fn no_line_terminator(symbol: &Symbol<'_>) -> Option<usize> {
    match &symbol.kind {
        SymbolKind::Restriction(Restriction::NoLineTerminatorHere) => Some(symbol.offset),
        SymbolKind::ButNot { left, right } => {
            no_line_terminator(left).or_else(|| no_line_terminator(right))
        }
        SymbolKind::OneOf(symbols) => symbols
            .iter()
            .find_map(no_line_terminator),
        _ => None,
    }
}

/// Symbols a definition may have which a fragment can leave out.
fn skippable(symbol: &Symbol<'_>) -> bool {
    symbol.optional || matches!(symbol.kind, SymbolKind::Restriction(_))
}

/// Whether a fragment's symbols match a canonical right-hand side, which is
/// allowed optional symbols and restrictions the fragment doesn't have.
pub(crate) fn span_matches(fragment: &[Symbol<'_>], canonical: &[Symbol<'_>]) -> bool {
    match (fragment.split_first(), canonical.split_first()) {
        (None, None) => true,
        (None, Some(_)) => canonical
            .iter()
            .all(skippable),
        (Some(_), None) => false,
        (Some((first, rest)), Some((candidate, remaining))) => {
            (symbol_matches(first, candidate) && span_matches(rest, remaining))
                || (skippable(candidate) && span_matches(fragment, remaining))
        }
    }
}

fn symbol_matches(fragment: &Symbol<'_>, canonical: &Symbol<'_>) -> bool {
    if fragment.optional && !canonical.optional {
        return false;
    }

    match (&fragment.kind, &canonical.kind) {
        (SymbolKind::Terminal(a), SymbolKind::Terminal(b)) => a == b,
        (
            SymbolKind::Nonterminal {
                name: a,
                arguments: given,
            },
            SymbolKind::Nonterminal {
                name: b,
                arguments: expected,
            },
        ) => a == b && (given.is_none() || given == expected),
        (
            SymbolKind::ButNot { left, right },
            SymbolKind::ButNot {
                left: other_left,
                right: other_right,
            },
        ) => symbol_matches(left, other_left) && symbol_matches(right, other_right),
        (SymbolKind::OneOf(a), SymbolKind::OneOf(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b.iter())
                    .all(|(x, y)| symbol_matches(x, y))
        }
        (SymbolKind::Empty, SymbolKind::Empty) => true,
        (SymbolKind::Restriction(a), SymbolKind::Restriction(b)) => {
            std::mem::discriminant(a) == std::mem::discriminant(b)
        }
        _ => false,
    }
}

#[cfg(test)]
mod check {
    use super::*;
    use crate::linting::collect::collect;
    use crate::linting::Options;
    use crate::parsing::{markup, GrammarReader};
    use std::path::Path;

    fn run(content: &str) -> Vec<(&'static str, String)> {
        let document = markup::read(Path::new("test.html"), content.to_string());
        let mut problems = Problems::new();
        let collection = collect(&document, &Options::default(), &mut problems).unwrap();
        check(&document, &collection, &GrammarReader, &mut problems);

        problems
            .into_diagnostics()
            .into_iter()
            .map(|diagnostic| (diagnostic.rule, diagnostic.message))
            .collect()
    }

    fn rules(content: &str) -> Vec<&'static str> {
        run(content)
            .into_iter()
            .map(|(rule, _)| rule)
            .collect()
    }

    fn symbols(text: &'static str) -> Vec<Symbol<'static>> {
        let mut compilation = GrammarReader.compile(&[GrammarSource { text }], false);
        assert!(compilation
            .diagnostics
            .is_empty());
        compilation
            .productions
            .remove(0)
            .rhses
            .remove(0)
            .symbols
    }

    #[test]
    fn optional_symbols_may_be_left_out() {
        let canonical = symbols("X : A B? C");

        assert!(span_matches(&symbols("X : A B C"), &canonical));
        assert!(span_matches(&symbols("X : A C"), &canonical));
        assert!(!span_matches(&symbols("X : A D C"), &canonical));
        assert!(!span_matches(&symbols("X : A B? C"), &symbols("X : A B C")));
    }

    #[test]
    fn restrictions_may_be_left_out() {
        let canonical = symbols("X : `return` [no LineTerminator here] Expression `;`");
        assert!(span_matches(&symbols("X : `return` Expression `;`"), &canonical));

        let canonical = symbols("X : [lookahead ≠ `{`] Expression `;`");
        assert!(span_matches(&symbols("X : Expression `;`"), &canonical));
        assert!(!span_matches(&symbols("X : Expression"), &canonical));
    }

    #[test]
    fn arguments_compared_when_given() {
        let canonical = symbols("X : Expression[+In, ?Yield]");
        assert!(span_matches(&symbols("X : Expression"), &canonical));
        assert!(span_matches(&symbols("X : Expression[+In, ?Yield]"), &canonical));
        assert!(!span_matches(&symbols("X : Expression[~In, ?Yield]"), &canonical));
    }

    #[test]
    fn fragments_matching_definitions() {
        let content = r#"
<emu-grammar type="definition">
  Foo :
    `a`
    `a` Bar? `c`
</emu-grammar>
<emu-clause id="sec-foo-eval">
  <h1>Runtime Semantics: Evaluation</h1>
  <emu-grammar>Foo : `a` `c`</emu-grammar>
  <emu-alg>1. Return *true*.</emu-alg>
</emu-clause>
"#;
        assert!(run(content).is_empty());
    }

    #[test]
    fn early_errors_with_unknown_alternative() {
        let content = r#"
<emu-grammar type="definition">Foo : `a`</emu-grammar>
<emu-clause id="sec-foo-early">
  <h1>Static Semantics: Early Errors</h1>
  <emu-grammar>Foo : `a` `b`</emu-grammar>
  <ul><li>It is a Syntax Error if so.</li></ul>
</emu-clause>
"#;
        let found = run(content);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "undefined-nonterminal");
        assert!(found[0]
            .1
            .starts_with("Could not find a production matching RHS"));
    }

    #[test]
    fn undefined_productions() {
        let content = r#"
<emu-grammar type="definition">Foo : `a`</emu-grammar>
<emu-grammar>Bar : `a`</emu-grammar>
<emu-alg>1. Return *true*.</emu-alg>
"#;
        let found = run(content);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "undefined-nonterminal");
        assert!(found[0]
            .1
            .starts_with("Could not find a definition for LHS"));
    }

    #[test]
    fn restrictions_in_fragments() {
        let content = r#"
<emu-grammar type="definition">
  Statement[Yield] :
    [+Yield] `return` [no LineTerminator here] Expression
</emu-grammar>
<emu-grammar type="definition">Expression : `x`</emu-grammar>
<emu-grammar>
  Statement :
    [+Yield] `return` [no LineTerminator here] Expression
</emu-grammar>
<emu-alg>1. Return *true*.</emu-alg>
"#;
        let found = rules(content);
        assert!(found.contains(&"guard-in-SDO"));
        assert!(found.contains(&"NLTH-in-SDO"));
        assert!(!found.contains(&"undefined-nonterminal"));
    }

    #[test]
    fn unused_parameters() {
        let content = r#"
<emu-grammar type="definition">Foo[Yield] : `a`</emu-grammar>
"#;
        let found = run(content);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "grammar:unused-parameter");

        // mentioned in the markup of a fragment for the same production
        let content = r#"
<emu-grammar type="definition">Foo[Yield] : `a`</emu-grammar>
<emu-grammar>Foo[Yield] : `a`</emu-grammar>
<emu-alg>1. Return *true*.</emu-alg>
"#;
        assert!(run(content).is_empty());
    }

    #[test]
    fn syntax_errors_are_forwarded() {
        let content = r#"
<emu-grammar type="definition">Foo :</emu-grammar>
"#;
        assert_eq!(rules(content), vec!["grammar:syntax"]);
    }
}
