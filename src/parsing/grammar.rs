//! Reader for grammar notation, as found inside `<emu-grammar>` blocks:
//!
//! ```text
//! Name[Param] :
//!   [+Param] Other[?Param] `terminal`?
//!   `a` [no LineTerminator here] Other but not `b`
//! Digit :: one of `0` `1`
//! ```
//!
//! Each source is read independently; every offset recorded is relative to
//! the source it came from.

use std::collections::HashMap;

use tracing::debug;

use crate::language::*;
use crate::parsing::{split_lines, GrammarCompiler, Line};

/// The standard compiler for grammar notation.
#[derive(Debug, Default, Clone, Copy)]
pub struct GrammarReader;

impl GrammarCompiler for GrammarReader {
    fn compile<'i>(&self, sources: &[GrammarSource<'i>], checks: bool) -> Compilation<'i> {
        let mut compilation = Compilation::default();

        for (index, source) in sources
            .iter()
            .enumerate()
        {
            read_source(index, source.text, &mut compilation);
        }

        if checks {
            check_duplicates(&mut compilation);
            check_parameters(&mut compilation);
        }

        debug!(
            "Compiled {} production{} from {} source{}, {} diagnostic{}",
            compilation
                .productions
                .len(),
            if compilation
                .productions
                .len()
                == 1
            {
                ""
            } else {
                "s"
            },
            sources.len(),
            if sources.len() == 1 { "" } else { "s" },
            compilation
                .diagnostics
                .len(),
            if compilation
                .diagnostics
                .len()
                == 1
            {
                ""
            } else {
                "s"
            }
        );

        compilation
    }
}

#[derive(Debug, PartialEq, Eq)]
struct SyntaxError {
    offset: usize,
    expected: &'static str,
}

impl SyntaxError {
    fn new(offset: usize, expected: &'static str) -> SyntaxError {
        SyntaxError { offset, expected }
    }
}

fn report<'i>(compilation: &mut Compilation<'i>, source: usize, error: SyntaxError) {
    compilation
        .diagnostics
        .push(GrammarDiagnostic {
            source,
            offset: error.offset,
            problem: GrammarProblem::Syntax(error.expected),
        });
}

struct Pending<'i> {
    production: Production<'i>,
    one_of: bool,
}

fn read_source<'i>(index: usize, text: &'i str, compilation: &mut Compilation<'i>) {
    let mut base: Option<usize> = None;
    let mut current: Option<Pending<'i>> = None;
    // set when a header failed to read; its right-hand sides are skipped
    let mut skipping = false;

    for line in split_lines(text) {
        let is_header = match base {
            Some(indent) => line.indent <= indent,
            None => true,
        };

        if is_header {
            base.get_or_insert(line.indent);

            if let Some(pending) = current.take() {
                finish(pending, compilation);
            }

            match read_header(index, line) {
                Ok(pending) => {
                    current = Some(pending);
                    skipping = false;
                }
                Err(error) => {
                    report(compilation, index, error);
                    skipping = true;
                }
            }
            continue;
        }

        let pending = match current.as_mut() {
            Some(pending) => pending,
            None => {
                if !skipping {
                    report(
                        compilation,
                        index,
                        SyntaxError::new(line.start, "a production"),
                    );
                    skipping = true;
                }
                continue;
            }
        };

        let mut input = RhsReader::new(line.text, line.start);
        if pending.one_of {
            match input.read_alternatives() {
                Ok(symbols) => extend_one_of(&mut pending.production, symbols, line.start),
                Err(error) => report(compilation, index, error),
            }
        } else {
            match input.read_rhs() {
                Ok(rhs) => pending
                    .production
                    .rhses
                    .push(rhs),
                Err(error) => report(compilation, index, error),
            }
        }
    }

    if let Some(pending) = current.take() {
        finish(pending, compilation);
    }
}

fn finish<'i>(pending: Pending<'i>, compilation: &mut Compilation<'i>) {
    let production = pending.production;

    if production
        .rhses
        .is_empty()
    {
        report(
            compilation,
            production.source,
            SyntaxError::new(production.offset, "a right-hand side"),
        );
        return;
    }

    compilation
        .productions
        .push(production);
}

/// Add terminals to the single `one of` alternative of a production.
fn extend_one_of<'i>(production: &mut Production<'i>, symbols: Vec<Symbol<'i>>, offset: usize) {
    if production
        .rhses
        .is_empty()
    {
        production
            .rhses
            .push(RightHandSide {
                guard: None,
                symbols: vec![Symbol {
                    kind: SymbolKind::OneOf(vec![]),
                    optional: false,
                    offset,
                }],
                offset,
            });
    }

    let rhs = &mut production.rhses[0];
    match &mut rhs.symbols[0].kind {
        SymbolKind::OneOf(existing) => existing.extend(symbols),
        _ => panic!("one of production without a one of alternative"),
    }
}

fn read_header<'i>(index: usize, line: Line<'i>) -> Result<Pending<'i>, SyntaxError> {
    let re = regex!(r"^([A-Za-z_][A-Za-z0-9_]*)(?:\[([^\]]*)\])?\s*(?::::|::|:)(?:\s+(.*))?$");
    let cap = re
        .captures(line.text)
        .ok_or(SyntaxError::new(line.start, "a production"))?;

    let name = cap
        .get(1)
        .ok_or(SyntaxError::new(line.start, "a production name"))?;

    let mut parameters = vec![];
    if let Some(list) = cap.get(2) {
        let mut offset = line.start + list.start();
        for piece in list
            .as_str()
            .split(',')
        {
            let trimmed = piece.trim();
            let leading = piece.len() - piece.trim_start().len();
            if !regex!(r"^[A-Za-z_][A-Za-z0-9_]*$").is_match(trimmed) {
                return Err(SyntaxError::new(offset + leading, "a parameter name"));
            }
            parameters.push(Parameter {
                name: trimmed,
                offset: offset + leading,
            });
            offset += piece.len() + 1;
        }
    }

    let mut production = Production {
        name: name.as_str(),
        offset: line.start,
        source: index,
        parameters,
        rhses: vec![],
    };

    let mut one_of = false;

    if let Some(tail) = cap.get(3) {
        let start = line.start + tail.start();
        let text = tail.as_str();

        if let Some(m) = regex!(r"^one\s+of\b\s*").find(text) {
            one_of = true;
            let rest = &text[m.end()..];
            if !rest.is_empty() {
                let mut input = RhsReader::new(rest, start + m.end());
                let symbols = input.read_alternatives()?;
                extend_one_of(&mut production, symbols, start + m.end());
            }
        } else {
            let mut input = RhsReader::new(text, start);
            let rhs = input.read_rhs()?;
            production
                .rhses
                .push(rhs);
        }
    }

    Ok(Pending { production, one_of })
}

struct RhsReader<'i> {
    text: &'i str,
    base: usize,
    position: usize,
}

impl<'i> RhsReader<'i> {
    fn new(text: &'i str, base: usize) -> RhsReader<'i> {
        RhsReader {
            text,
            base,
            position: 0,
        }
    }

    fn rest(&self) -> &'i str {
        &self.text[self.position..]
    }

    fn offset(&self) -> usize {
        self.base + self.position
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.position += rest.len() - rest.trim_start().len();
    }

    /// Consume a keyword (with following whitespace) if it is next.
    fn take_keyword(&mut self, re: &::regex::Regex) -> bool {
        match re.find(self.rest()) {
            Some(m) => {
                self.position += m.end();
                self.skip_whitespace();
                true
            }
            None => false,
        }
    }

    fn read_rhs(&mut self) -> Result<RightHandSide<'i>, SyntaxError> {
        let offset = self.offset();
        let guard = self.read_guard()?;
        self.skip_whitespace();

        let mut symbols = vec![];

        if let Some(prose) = self
            .rest()
            .strip_prefix('>')
        {
            symbols.push(Symbol {
                kind: SymbolKind::Restriction(Restriction::Prose(prose.trim())),
                optional: false,
                offset: self.offset(),
            });
            self.position = self
                .text
                .len();
        }

        loop {
            self.skip_whitespace();
            if self
                .rest()
                .is_empty()
            {
                break;
            }

            if self.take_keyword(regex!(r"^but\s+not\b")) {
                let left = symbols
                    .pop()
                    .ok_or(SyntaxError::new(self.offset(), "a symbol before 'but not'"))?;
                let right = self.read_exclusion()?;
                symbols.push(Symbol {
                    offset: left.offset,
                    optional: false,
                    kind: SymbolKind::ButNot {
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                });
                continue;
            }

            let symbol = self.read_symbol()?;
            symbols.push(symbol);
        }

        if symbols.is_empty() {
            return Err(SyntaxError::new(offset, "a symbol"));
        }

        Ok(RightHandSide {
            guard,
            symbols,
            offset,
        })
    }

    /// Terminals separated by whitespace, as after `one of`.
    fn read_alternatives(&mut self) -> Result<Vec<Symbol<'i>>, SyntaxError> {
        let mut symbols = vec![];
        loop {
            self.skip_whitespace();
            if self
                .rest()
                .is_empty()
            {
                return Ok(symbols);
            }
            symbols.push(self.read_symbol()?);
        }
    }

    /// The right operand of `but not`: one symbol, or `one of A or B`.
    fn read_exclusion(&mut self) -> Result<Symbol<'i>, SyntaxError> {
        let offset = self.offset();

        if !self.take_keyword(regex!(r"^one\s+of\b")) {
            return self.read_symbol();
        }

        let mut alternatives = vec![self.read_symbol()?];
        loop {
            self.skip_whitespace();
            if !self.take_keyword(regex!(r"^or\b")) {
                break;
            }
            alternatives.push(self.read_symbol()?);
        }

        Ok(Symbol {
            kind: SymbolKind::OneOf(alternatives),
            optional: false,
            offset,
        })
    }

    fn read_guard(&mut self) -> Result<Option<Guard<'i>>, SyntaxError> {
        let re = regex!(r"^\[\s*([+~][A-Za-z_][A-Za-z0-9_]*(?:\s*,\s*[+~][A-Za-z_][A-Za-z0-9_]*)*)\s*\]");
        let cap = match re.captures(self.rest()) {
            Some(cap) => cap,
            None => return Ok(None),
        };

        let offset = self.offset();
        let list = cap
            .get(1)
            .ok_or(SyntaxError::new(offset, "a guard"))?;
        let conditions = read_arguments(list.as_str());
        self.position += cap[0].len();

        Ok(Some(Guard { conditions, offset }))
    }

    fn read_symbol(&mut self) -> Result<Symbol<'i>, SyntaxError> {
        let offset = self.offset();
        let rest = self.rest();

        let kind = if rest.starts_with('`') {
            let close = rest[1..]
                .find('`')
                .ok_or(SyntaxError::new(offset, "a closing '`'"))?;
            self.position += close + 2;
            SymbolKind::Terminal(&rest[1..close + 1])
        } else if rest.starts_with('[') {
            return self.read_restriction();
        } else if let Some(m) = regex!(r"^<[A-Z][A-Za-z0-9_]*>").find(rest) {
            self.position += m.end();
            SymbolKind::Terminal(m.as_str())
        } else if let Some(m) = regex!(r"^[A-Za-z_][A-Za-z0-9_]*").find(rest) {
            self.position += m.end();
            let arguments = self.read_arguments()?;
            SymbolKind::Nonterminal {
                name: m.as_str(),
                arguments,
            }
        } else {
            return Err(SyntaxError::new(offset, "a symbol"));
        };

        let optional = if self
            .rest()
            .starts_with('?')
        {
            self.position += 1;
            true
        } else {
            false
        };

        Ok(Symbol {
            kind,
            optional,
            offset,
        })
    }

    /// An argument list written directly after a nonterminal's name.
    fn read_arguments(&mut self) -> Result<Option<Vec<Argument<'i>>>, SyntaxError> {
        if !self
            .rest()
            .starts_with('[')
        {
            return Ok(None);
        }

        let re = regex!(r"^\[\s*([+~?][A-Za-z_][A-Za-z0-9_]*(?:\s*,\s*[+~?][A-Za-z_][A-Za-z0-9_]*)*)\s*\]");
        let cap = re
            .captures(self.rest())
            .ok_or(SyntaxError::new(self.offset(), "an argument list"))?;
        let list = cap
            .get(1)
            .ok_or(SyntaxError::new(self.offset(), "an argument list"))?;

        let arguments = read_arguments(list.as_str());
        self.position += cap[0].len();

        Ok(Some(arguments))
    }

    fn read_restriction(&mut self) -> Result<Symbol<'i>, SyntaxError> {
        let offset = self.offset();
        let rest = self.rest();

        let width = matching_bracket(rest).ok_or(SyntaxError::new(offset, "a closing ']'"))?;
        let inner = rest[1..width - 1].trim();

        let kind = if inner == "empty" {
            SymbolKind::Empty
        } else if regex!(r"^no\s+LineTerminator\s+here$").is_match(inner) {
            SymbolKind::Restriction(Restriction::NoLineTerminatorHere)
        } else if inner.starts_with("lookahead") {
            SymbolKind::Restriction(Restriction::Lookahead(inner))
        } else if let Some(prose) = inner.strip_prefix('>') {
            SymbolKind::Restriction(Restriction::Prose(prose.trim()))
        } else {
            return Err(SyntaxError::new(offset, "a restriction"));
        };

        self.position += width;

        Ok(Symbol {
            kind,
            optional: false,
            offset,
        })
    }
}

/// Width of a bracketed restriction through its matching `]`, ignoring
/// brackets quoted inside terminals.
fn matching_bracket(content: &str) -> Option<usize> {
    let mut depth = 0;
    let mut quoted = false;

    for (i, c) in content.char_indices() {
        match c {
            '`' => quoted = !quoted,
            '[' if !quoted => depth += 1,
            ']' if !quoted => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => (),
        }
    }

    None
}

/// Split an already-validated list like `+In, ?Yield`.
fn read_arguments(list: &str) -> Vec<Argument<'_>> {
    list.split(',')
        .map(|piece| {
            let piece = piece.trim();
            let operator = match piece.chars().next() {
                Some('+') => Operator::Plus,
                Some('~') => Operator::Tilde,
                _ => Operator::Question,
            };
            Argument {
                operator,
                name: &piece[1..],
            }
        })
        .collect()
}

fn check_duplicates(compilation: &mut Compilation<'_>) {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut found = vec![];

    for production in &compilation.productions {
        let count = seen
            .entry(production.name)
            .or_insert(0);
        *count += 1;
        if *count > 1 {
            found.push(GrammarDiagnostic {
                source: production.source,
                offset: production.offset,
                problem: GrammarProblem::DuplicateProduction(production.name),
            });
        }
    }

    compilation
        .diagnostics
        .extend(found);
}

fn check_parameters(compilation: &mut Compilation<'_>) {
    let mut found = vec![];

    for production in &compilation.productions {
        for parameter in &production.parameters {
            let used = production
                .rhses
                .iter()
                .any(|rhs| rhs_references(rhs, parameter.name));

            if !used {
                found.push(GrammarDiagnostic {
                    source: production.source,
                    offset: parameter.offset,
                    problem: GrammarProblem::UnusedParameter {
                        production: production.name,
                        parameter: parameter.name,
                    },
                });
            }
        }
    }

    compilation
        .diagnostics
        .extend(found);
}

fn rhs_references(rhs: &RightHandSide<'_>, name: &str) -> bool {
    let guarded = rhs
        .guard
        .as_ref()
        .map(|guard| {
            guard
                .conditions
                .iter()
                .any(|condition| condition.name == name)
        })
        .unwrap_or(false);

    guarded
        || rhs
            .symbols
            .iter()
            .any(|symbol| symbol_references(symbol, name))
}

fn symbol_references(symbol: &Symbol<'_>, name: &str) -> bool {
    match &symbol.kind {
        SymbolKind::Nonterminal {
            arguments: Some(arguments),
            ..
        } => arguments
            .iter()
            .any(|argument| argument.operator == Operator::Question && argument.name == name),
        SymbolKind::ButNot { left, right } => {
            symbol_references(left, name) || symbol_references(right, name)
        }
        SymbolKind::OneOf(symbols) => symbols
            .iter()
            .any(|symbol| symbol_references(symbol, name)),
        _ => false,
    }
}
