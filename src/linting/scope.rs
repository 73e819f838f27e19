//! Tracking where variables in an algorithm are declared and used.
//!
//! Declarations are hoisted: once a name has been declared anywhere in an
//! algorithm it is visible to every later step, whichever branch it was
//! declared in. Each level of ordered steps also keeps a strict set of the
//! names declared at that level, and declaring one of those a second time is
//! an error unless the declaration is one permitted to shadow.

use std::collections::{HashMap, HashSet};

use crate::language::*;
use crate::linting::collect::AlgorithmBlock;
use crate::linting::Cache;
use crate::problem::Problems;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    Parameter,
    Variable,
    LoopVariable,
    ClosureParameter,
    ClosureCapture,
    AttributeDeclaration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Declaration {
    pub(crate) kind: Kind,
    pub(crate) used: bool,
    /// Offset of the declaring token; None for names seeded from prose.
    pub(crate) at: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Declared {
    New,
    Existing,
    Conflict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Scope {
    stack: Vec<HashSet<String>>,
    vars: HashMap<String, Declaration>,
}

impl Scope {
    pub(crate) fn new() -> Scope {
        Scope {
            stack: vec![HashSet::new()],
            vars: HashMap::new(),
        }
    }

    /// A scope whose base level already holds the given names, as
    /// parameters.
    pub(crate) fn seeded<'a>(names: impl IntoIterator<Item = &'a str>) -> Scope {
        let mut scope = Scope::new();
        for name in names {
            scope.declare(name, Kind::Parameter, None, true);
        }
        scope
    }

    pub(crate) fn push(&mut self) {
        self.stack
            .push(HashSet::new());
    }

    pub(crate) fn pop(&mut self) {
        // the base level stays
        if self
            .stack
            .len()
            > 1
        {
            self.stack
                .pop();
        }
    }

    fn current(&mut self) -> &mut HashSet<String> {
        // new() creates the base level and pop() never removes it
        match self
            .stack
            .last_mut()
        {
            Some(level) => level,
            None => panic!("scope stack lost its base level"),
        }
    }

    pub(crate) fn declare(
        &mut self,
        name: &str,
        kind: Kind,
        at: Option<usize>,
        shadow: bool,
    ) -> Declared {
        if self
            .vars
            .contains_key(name)
        {
            if shadow {
                return Declared::Existing;
            }
            if !self
                .current()
                .insert(name.to_string())
            {
                return Declared::Conflict;
            }
            return Declared::Existing;
        }

        self.vars
            .insert(
                name.to_string(),
                Declaration {
                    kind,
                    used: false,
                    at,
                },
            );
        if !shadow {
            self.current()
                .insert(name.to_string());
        }
        Declared::New
    }

    pub(crate) fn is_declared(&self, name: &str) -> bool {
        self.vars
            .contains_key(name)
    }

    /// Mark a name as used, returning false if it was never declared.
    pub(crate) fn use_name(&mut self, name: &str) -> bool {
        match self
            .vars
            .get_mut(name)
        {
            Some(declaration) => {
                declaration.used = true;
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Declaration> {
        for set in &mut self.stack {
            set.remove(name);
        }
        self.vars
            .remove(name)
    }

    /// Declarations never used, in the order they were written.
    pub(crate) fn unused(&self) -> Vec<(&str, Declaration)> {
        let mut result: Vec<(&str, Declaration)> = self
            .vars
            .iter()
            .filter(|(_, declaration)| !declaration.used)
            .map(|(name, declaration)| (name.as_str(), *declaration))
            .collect();
        result.sort_by_key(|(name, declaration)| (declaration.at, *name));
        result
    }
}

pub(crate) fn check<'i>(
    document: &Document,
    block: &AlgorithmBlock,
    annex: &str,
    base: usize,
    list: &StepList<'i>,
    cache: &Cache<'i>,
    problems: &mut Problems,
) {
    if block
        .context
        .in_annex
        || document.has_attribute(block.element, "replaces-step")
    {
        return;
    }

    let seeds = preceding_variables(document, block.element, annex);
    let mut scope = Scope::seeded(
        seeds
            .iter()
            .map(String::as_str),
    );

    let mut checker = ScopeChecker {
        cache,
        element: block.element,
        base,
        problems,
    };

    checker.walk_ordered(list, &mut scope);
    checker.report_unused(&scope);
}

/// Names written as variables in the prose leading up to an algorithm,
/// anywhere earlier in the same clause. Walking back stops at the excluded
/// annex.
fn preceding_variables(document: &Document, algorithm: NodeId, annex: &str) -> Vec<String> {
    let mut names = vec![];
    let mut pointer = algorithm;

    while let Some(parent) = document.parent(pointer) {
        if document.attribute(parent, "id") == Some(annex) {
            break;
        }

        let siblings = document.children(parent);
        let before = siblings
            .iter()
            .position(|sibling| *sibling == pointer)
            .unwrap_or(siblings.len());

        for sibling in siblings[..before]
            .iter()
            .rev()
        {
            if document.attribute(*sibling, "id") == Some(annex) {
                return names;
            }
            let text = document.text_content(*sibling);
            for cap in regex!(r"\b_([a-zA-Z0-9]+)_\b").captures_iter(&text) {
                names.push(cap[1].to_string());
            }
        }

        if parent == document.root()
            || document.is(parent, "emu-clause")
            || document.is(parent, "emu-annex")
            || document.is(parent, "emu-intro")
        {
            break;
        }
        pointer = parent;
    }

    names
}

fn is_separator(text: &str) -> bool {
    matches!(text, ", " | ", and " | " and ")
}

struct ScopeChecker<'a, 'i> {
    cache: &'a Cache<'i>,
    element: NodeId,
    /// Offset of the algorithm's markup within its source.
    base: usize,
    problems: &'a mut Problems,
}

impl<'a, 'i> ScopeChecker<'a, 'i> {
    fn report(&mut self, rule: &'static str, message: impl Into<String>, offset: usize) {
        self.problems
            .at(rule, message, self.element, self.base + offset);
    }

    fn report_unused(&mut self, scope: &Scope) {
        for (name, declaration) in scope.unused() {
            let at = match declaration.at {
                Some(at) => at,
                None => continue,
            };
            match declaration.kind {
                Kind::Parameter | Kind::ClosureParameter => (),
                Kind::ClosureCapture => self.report(
                    "unused-capture",
                    format!("closure captures {:?}, but never uses it", name),
                    at,
                ),
                Kind::Variable | Kind::LoopVariable | Kind::AttributeDeclaration => self.report(
                    "unused-declaration",
                    format!("{:?} is declared here, but never referred to", name),
                    at,
                ),
            }
        }
    }

    fn declare(&mut self, scope: &mut Scope, item: &Item<'i>, kind: Kind, shadow: bool) -> Declared {
        let name = match item.variable_name() {
            Some(name) => name,
            None => return Declared::Existing,
        };
        let at = item.start();

        let result = scope.declare(name, kind, Some(at), shadow);
        if result == Declared::Conflict {
            self.report(
                "re-declaration",
                format!("{:?} is already declared", name),
                at,
            );
        }
        result
    }

    fn use_variable(&mut self, scope: &mut Scope, item: &Item<'i>) {
        if let Some(name) = item.variable_name() {
            if !scope.use_name(name) {
                self.report(
                    "use-before-def",
                    format!("could not find a preceding declaration for {:?}", name),
                    item.start(),
                );
            }
        }
    }

    /// Walk a level of ordered steps; the caller has arranged the strict
    /// set for this level.
    fn walk_ordered(&mut self, list: &StepList<'i>, scope: &mut Scope) {
        for step in &list.steps {
            self.visit_step(step, scope);
        }
    }

    /// Steps in unordered lists, and everything beneath them, only refer to
    /// variables.
    fn walk_unordered(&mut self, list: &StepList<'i>, scope: &mut Scope) {
        let cache = self.cache;
        for step in &list.steps {
            let seq = match cache.get(&step.id)
            {
                Some(seq) => seq,
                None => continue,
            };
            seq.for_each_variable(&mut |item| self.use_variable(scope, item));

            if let Some(sublist) = &step.sublist {
                self.walk_unordered(sublist, scope);
            }
        }
    }

    fn walk_sublist(&mut self, step: &Step<'i>, scope: &mut Scope) {
        if let Some(sublist) = &step.sublist {
            match sublist.kind {
                ListKind::Ordered => {
                    scope.push();
                    self.walk_ordered(sublist, scope);
                    scope.pop();
                }
                ListKind::Unordered => self.walk_unordered(sublist, scope),
            }
        }
    }

    fn visit_step(&mut self, step: &Step<'i>, scope: &mut Scope) {
        let cache = self.cache;
        let seq = match cache.get(&step.id)
        {
            Some(seq) => seq,
            None => return,
        };

        if let Some(attribute) = step.attribute("declared") {
            self.visit_declared(attribute, scope);
        }

        if regex!(r" performs the following steps (?:atomically )?when called:$")
            .is_match(&seq.last_text())
        {
            self.visit_closure(step, seq, scope);
            return;
        }

        let items = &seq.items;
        let mut declared_here: HashSet<usize> = HashSet::new();

        // the loop variable lasts only until this step is done
        let mut introduced = None;
        if seq
            .first_text()
            .starts_with("For each ")
        {
            if let Some(variable) = items
                .iter()
                .find(|item| item.is_variable())
            {
                declared_here.insert(variable.start());
                if self.declare(scope, variable, Kind::LoopVariable, true) == Declared::New {
                    introduced = variable.variable_name();
                }
            }
        }

        let conditional = regex!(r"^(?:If|Else|Otherwise)\b").is_match(seq.first_text());

        for (i, item) in items
            .iter()
            .enumerate()
        {
            if !item.is_variable() || declared_here.contains(&item.start()) {
                continue;
            }

            let previous = i
                .checked_sub(1)
                .and_then(|j| items[j].as_text())
                .unwrap_or("");
            let next = items
                .get(i + 1)
                .and_then(Item::as_text)
                .unwrap_or("");

            let existential = regex!(
                r"\b(?:for any|for some|there exists|there is|there does not exist)(?: (?:an?|some|any))?(?: [\w-]+)? $"
            );
            if existential.is_match(previous) {
                declared_here.insert(item.start());
                self.declare(scope, item, Kind::Variable, true);
                continue;
            }

            let be = next.starts_with(" be ");
            let such_that = next.starts_with(" such that ");
            if !be && !such_that {
                continue;
            }

            // a list like "_a_, _b_, and _c_" declared together
            let mut j = i;
            while j >= 2
                && items[j - 2].is_variable()
                && items[j - 1]
                    .as_text()
                    .map(is_separator)
                    .unwrap_or(false)
            {
                j -= 2;
            }

            let shadow = if be {
                let before = j
                    .checked_sub(1)
                    .and_then(|k| items[k].as_text())
                    .unwrap_or("");
                if !regex!(r"\b[Ll]et (?:each of )?$").is_match(before) {
                    continue;
                }
                conditional
            } else {
                true
            };

            for variable in items[j..=i]
                .iter()
                .filter(|item| item.is_variable())
            {
                if declared_here.insert(variable.start()) {
                    self.declare(scope, variable, Kind::Variable, shadow);
                }
            }
        }

        seq.for_each_variable(&mut |item| {
            if !declared_here.contains(&item.start()) {
                self.use_variable(scope, item);
            }
        });

        self.walk_sublist(step, scope);

        if let Some(name) = introduced {
            if let Some(declaration) = scope.remove(name) {
                if !declaration.used {
                    if let Some(at) = declaration.at {
                        self.report(
                            "unused-declaration",
                            format!("{:?} is declared here, but never referred to", name),
                            at,
                        );
                    }
                }
            }
        }
    }

    fn visit_declared(&mut self, attribute: &StepAttribute<'i>, scope: &mut Scope) {
        let value = attribute.value;
        let mut offset = value.offset;

        for part in value
            .text
            .split(',')
        {
            let name = part.trim();
            let at = offset
                + (part.len()
                    - part
                        .trim_start()
                        .len());
            offset += part.len() + 1;

            if name.is_empty() {
                continue;
            }

            if scope.is_declared(name) {
                self.report(
                    "unnecessary-declared-var",
                    format!(
                        "{:?} is already declared and does not need an explicit annotation",
                        name
                    ),
                    at,
                );
            } else {
                scope.declare(name, Kind::AttributeDeclaration, Some(at), true);
            }
        }
    }

    fn bad_closure(&mut self, message: &str, offset: usize) {
        self.report("bad-ac", message, offset);
    }

    fn visit_closure(&mut self, step: &Step<'i>, seq: &Seq<'i>, scope: &mut Scope) {
        let items = &seq.items;

        if let [Item::Text(first), variable @ Item::Variable(_), Item::Text(after), ..] = &items[..] {
            if first.text == "Let "
                && after
                    .text
                    .starts_with(" be ")
            {
                self.declare(scope, variable, Kind::Variable, false);
            }
        }

        let mut inner = Scope::new();

        // parameters, "with parameters (_a_, _b_)"
        if let Some(i) = items
            .iter()
            .position(|item| {
                item.as_text()
                    .map(|text| text.ends_with(" with parameters "))
                    .unwrap_or(false)
            })
        {
            let paren = match items.get(i + 1) {
                Some(Item::Paren(paren)) => paren,
                other => {
                    let offset = other
                        .map(Item::start)
                        .unwrap_or_else(|| items[i].end());
                    self.bad_closure(
                        "expected to find a parenthesized list of parameter names here",
                        offset,
                    );
                    return;
                }
            };

            let parameters = &paren
                .inner
                .items;
            if parameters.is_empty() {
                self.bad_closure("expected to find a parameter name here", paren.start + 1);
                return;
            }
            for (k, parameter) in parameters
                .iter()
                .enumerate()
            {
                if k % 2 == 0 {
                    if !parameter.is_variable() {
                        self.bad_closure("expected to find a parameter name here", parameter.start());
                        return;
                    }
                    self.declare(&mut inner, parameter, Kind::ClosureParameter, false);
                } else if parameter.as_text() != Some(", ") {
                    self.bad_closure("expected to find \", \" here", parameter.start());
                    return;
                }
            }
            if parameters.len() % 2 == 0 {
                let last = &parameters[parameters.len() - 1];
                self.bad_closure("expected to find a parameter name here", last.end());
                return;
            }
        }

        // captures, "that captures _a_ and _b_ and performs"
        if let Some(i) = items
            .iter()
            .position(|item| {
                item.as_text()
                    .map(|text| text.ends_with(" that captures "))
                    .unwrap_or(false)
            })
        {
            let mut k = i + 1;
            loop {
                let capture = match items.get(k) {
                    Some(item) if item.is_variable() => item,
                    other => {
                        let offset = other
                            .map(Item::start)
                            .unwrap_or_else(|| items[k - 1].end());
                        self.bad_closure("expected to find a capture name here", offset);
                        return;
                    }
                };
                self.use_variable(scope, capture);
                self.declare(&mut inner, capture, Kind::ClosureCapture, false);

                match items
                    .get(k + 1)
                    .and_then(Item::as_text)
                {
                    Some(text) if is_separator(text) => k += 2,
                    Some(text) if text.starts_with(" and performs") || text.starts_with(" performs") => {
                        break
                    }
                    _ => {
                        let offset = items
                            .get(k + 1)
                            .map(Item::start)
                            .unwrap_or_else(|| capture.end());
                        self.bad_closure("expected to find \", \" or \" and \" here", offset);
                        return;
                    }
                }
            }
        }

        if let Some(sublist) = &step.sublist {
            if sublist.kind == ListKind::Ordered {
                self.walk_ordered(sublist, &mut inner);
            }
        }

        self.report_unused(&inner);
    }
}

#[cfg(test)]
mod check {
    use super::*;
    use crate::linting::collect::Context;
    use crate::parsing::{markup, StepParser, StepReader};
    use crate::problem::Location;
    use std::path::Path;

    const ANNEX: &str = "sec-additional-ecmascript-features-for-web-browsers";

    fn run(content: &str) -> Vec<(&'static str, String, usize)> {
        let document = markup::read(Path::new("test.html"), content.to_string());

        let element = (0..document.node_count())
            .map(NodeId)
            .find(|id| document.is(*id, "emu-alg"))
            .unwrap();
        let (_, inner) = document
            .location(element)
            .unwrap()
            .inner()
            .unwrap();

        let list = StepReader
            .read_algorithm(inner)
            .unwrap();
        let mut cache = Cache::new();
        fn fill<'i>(list: &StepList<'i>, cache: &mut Cache<'i>) {
            for step in &list.steps {
                cache.insert(
                    step.id,
                    StepReader
                        .parse_step(step)
                        .unwrap(),
                );
                if let Some(sublist) = &step.sublist {
                    fill(sublist, cache);
                }
            }
        }
        fill(&list, &mut cache);

        let block = AlgorithmBlock {
            element,
            context: Context::default(),
        };
        let mut problems = Problems::new();
        check(&document, &block, ANNEX, 0, &list, &cache, &mut problems);

        problems
            .into_diagnostics()
            .into_iter()
            .map(|diagnostic| match diagnostic.location {
                Location::Node { offset, .. } => (diagnostic.rule, diagnostic.message, offset),
                _ => unreachable!(),
            })
            .collect()
    }

    fn rules(content: &str) -> Vec<&'static str> {
        run(content)
            .into_iter()
            .map(|(rule, _, _)| rule)
            .collect()
    }

    #[test]
    fn stack_operations() {
        let mut scope = Scope::seeded(["a"]);
        assert!(scope.is_declared("a"));

        assert_eq!(scope.declare("x", Kind::Variable, Some(1), false), Declared::New);
        assert_eq!(scope.declare("x", Kind::Variable, Some(5), false), Declared::Conflict);

        scope.push();
        assert_eq!(scope.declare("x", Kind::Variable, Some(9), false), Declared::Existing);
        assert_eq!(scope.declare("y", Kind::Variable, Some(12), true), Declared::New);
        assert_eq!(scope.declare("y", Kind::Variable, Some(14), true), Declared::Existing);
        scope.pop();

        // hoisted out of the nested level
        assert!(scope.is_declared("y"));
        assert!(scope.use_name("y"));
        assert!(!scope.use_name("z"));

        let unused: Vec<&str> = scope
            .unused()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(unused, vec!["a", "x"]);

        scope.remove("x");
        assert!(!scope.is_declared("x"));
    }

    #[test]
    fn clean_algorithm() {
        let content = r#"<emu-clause id="sec-f">
<h1>F ( _a_ )</h1>
<p>The abstract operation F takes argument _a_.</p>
<emu-alg>
  1. Let _x_ be _a_.
  1. If _x_ is *true*, then
    1. Let _y_ be 1.
  1. Else,
    1. Let _y_ be 2.
  1. Return _y_.
</emu-alg>
</emu-clause>"#;
        assert!(run(content).is_empty());
    }

    #[test]
    fn redeclaration_at_the_same_level() {
        let content = "<emu-alg>\n1. Let _x_ be 1.\n1. Let _x_ be 2.\n1. Return _x_.\n</emu-alg>";
        let found = run(content);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "re-declaration");
        assert_eq!(found[0].1, "\"x\" is already declared");
        assert_eq!(found[0].2, 25);
    }

    #[test]
    fn use_before_definition() {
        let content = "<emu-alg>\n1. Return _z_.\n</emu-alg>";
        let found = run(content);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "use-before-def");
        assert_eq!(found[0].1, "could not find a preceding declaration for \"z\"");
        assert_eq!(found[0].2, 11);
    }

    #[test]
    fn loop_variables_end_with_their_step() {
        let content = r#"<emu-alg>
1. Let _list_ be a new empty List.
1. For each element _e_ of _list_, do
  1. Perform Print(_e_).
1. Return _e_.
</emu-alg>"#;
        assert_eq!(rules(content), vec!["use-before-def"]);

        let content = r#"<emu-alg>
1. Let _list_ be a new empty List.
1. For each element _e_ of _list_, do
  1. Perform Print(_list_).
</emu-alg>"#;
        let found = run(content);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "unused-declaration");
        assert_eq!(found[0].1, "\"e\" is declared here, but never referred to");
    }

    #[test]
    fn unused_declarations() {
        let content = "<emu-alg>\n1. Let _x_ be 1.\n1. Let _y_ be 2.\n1. Return _y_.\n</emu-alg>";
        let found = run(content);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "unused-declaration");
        assert_eq!(found[0].2, 8);
    }

    #[test]
    fn lists_and_existentials() {
        let content = r#"<emu-alg>
1. Let _a_, _b_, and _c_ be 0.
1. If there exists an integer _i_ such that _i_ &gt; _a_, then
  1. Return _i_ + _b_ + _c_.
1. Return _a_.
</emu-alg>"#;
        assert!(run(content).is_empty());

        let content = r#"<emu-alg>
1. Let _k_ be the smallest integer _n_ such that _n_ &gt; 0.
1. Return _k_.
</emu-alg>"#;
        assert!(run(content).is_empty());
    }

    #[test]
    fn branches_may_shadow() {
        let content = r#"<emu-alg>
1. Let _x_ be 1.
1. If _x_ is 1, let _x_ be 2.
1. Return _x_.
</emu-alg>"#;
        assert!(run(content).is_empty());
    }

    #[test]
    fn declared_attributes() {
        let content = r#"<emu-alg>
1. [declared="x"] Return _x_.
</emu-alg>"#;
        assert!(run(content).is_empty());

        let content = r#"<emu-alg>
1. Let _x_ be 1.
1. [declared="x"] Return _x_.
</emu-alg>"#;
        let found = run(content);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "unnecessary-declared-var");
        assert_eq!(found[0].2, 32);
    }

    #[test]
    fn unordered_lists_only_use() {
        let content = r#"<emu-alg>
1. Let _x_ be 1.
1. Assert: one of the following is true:
  * _x_ is 1.
  * _y_ is 2.
</emu-alg>"#;
        assert_eq!(rules(content), vec!["use-before-def"]);
    }

    #[test]
    fn closures() {
        let content = r#"<emu-alg>
1. Let _y_ be 1.
1. Let _closure_ be a new Abstract Closure with parameters (_a_, _b_) that captures _y_ and performs the following steps when called:
  1. Return _a_ + _y_.
1. Return _closure_.
</emu-alg>"#;
        assert!(run(content).is_empty());

        let content = r#"<emu-alg>
1. Let _y_ be 1.
1. Let _z_ be 2.
1. Let _closure_ be a new Abstract Closure with no parameters that captures _y_ and _z_ and performs the following steps when called:
  1. Return _y_.
1. Return _closure_.
</emu-alg>"#;
        let found = run(content);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "unused-capture");
        assert_eq!(found[0].1, "closure captures \"z\", but never uses it");
    }

    #[test]
    fn closures_see_only_their_captures() {
        let content = r#"<emu-alg>
1. Let _y_ be 1.
1. Let _closure_ be a new Abstract Closure with no parameters that captures nothing and performs the following steps when called:
  1. Return _y_.
1. Return _closure_.
</emu-alg>"#;
        assert_eq!(rules(content), vec!["use-before-def", "unused-declaration"]);
    }

    #[test]
    fn malformed_parameters() {
        let content = r#"<emu-alg>
1. Let _closure_ be a new Abstract Closure with parameters _a_ that captures nothing and performs the following steps when called:
  1. Return _a_.
1. Return _closure_.
</emu-alg>"#;
        let found = run(content);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "bad-ac");
        assert_eq!(
            found[0].1,
            "expected to find a parenthesized list of parameter names here"
        );
    }

    /// Offset of `needle` within the markup inside the first algorithm.
    fn inner_offset(content: &str, needle: &str) -> usize {
        let start = content
            .find("<emu-alg")
            .unwrap();
        let inner = start
            + content[start..]
                .find('>')
                .unwrap()
            + 1;
        content
            .find(needle)
            .unwrap()
            - inner
    }

    #[test]
    fn base_level_survives_pops() {
        let mut scope = Scope::new();
        scope.pop();
        scope.pop();

        assert_eq!(scope.declare("x", Kind::Variable, Some(0), false), Declared::New);
        assert_eq!(
            scope.declare("x", Kind::Variable, Some(4), false),
            Declared::Conflict
        );
    }

    #[test]
    fn existential_phrasings() {
        for phrase in [
            "there exists an integer",
            "there is an integer",
            "there does not exist an integer",
            "for any integer",
            "for some integer",
        ] {
            let content = format!(
                "<emu-alg>\n1. If {} _i_ such that _i_ is positive, return *true*.\n1. Return *false*.\n</emu-alg>",
                phrase
            );
            assert!(run(&content).is_empty(), "{}", phrase);
        }

        let content = r#"<emu-alg>
1. If an integer _i_ is positive, return _i_.
1. Return 0.
</emu-alg>"#;
        let found = run(content);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].0, "use-before-def");
        assert_eq!(found[0].2, inner_offset(content, "_i_ is positive"));
    }

    #[test]
    fn atomic_closures() {
        let content = r#"<emu-alg>
1. Let _y_ be 1.
1. Let _closure_ be a new Abstract Closure with no parameters that captures _y_ and performs the following steps atomically when called:
  1. Return _y_.
1. Return _closure_.
</emu-alg>"#;
        assert!(run(content).is_empty());

        let content = r#"<emu-alg>
1. Let _x_ be 1.
1. Let _y_ be 2.
1. Let _closure_ be a new Abstract Closure with no parameters that captures _y_ and performs the following steps atomically when called:
  1. Return _x_ + _y_.
1. Return _closure_.
</emu-alg>"#;
        let found = run(content);
        assert_eq!(
            found
                .iter()
                .map(|(rule, _, _)| *rule)
                .collect::<Vec<_>>(),
            vec!["use-before-def", "unused-declaration"]
        );
        assert_eq!(found[0].2, inner_offset(content, "_x_ + _y_"));
    }

    #[test]
    fn malformed_captures() {
        let content = r#"<emu-alg>
1. Let _q_ be 1.
1. Let _closure_ be a new Abstract Closure with no parameters that captures _q_, and performs the following steps when called:
  1. Return _q_.
1. Return _closure_.
</emu-alg>"#;
        let found = run(content);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "bad-ac");
        assert_eq!(found[0].1, "expected to find \", \" or \" and \" here");
        assert_eq!(found[0].2, inner_offset(content, ", and performs"));
    }

    #[test]
    fn else_and_otherwise_may_shadow() {
        for keyword in ["Else", "Otherwise"] {
            let content = format!(
                "<emu-alg>\n1. Let _x_ be 1.\n1. If _x_ is 2, return _x_.\n1. {}, let _x_ be 3.\n1. Return _x_.\n</emu-alg>",
                keyword
            );
            assert!(run(&content).is_empty(), "{}", keyword);
        }

        let content = r#"<emu-alg>
1. Let _x_ be 1.
1. If _x_ is 2, return _x_.
1. Then let _x_ be 3.
1. Return _x_.
</emu-alg>"#;
        let found = run(content);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "re-declaration");
        assert_eq!(found[0].2, inner_offset(content, "_x_ be 3"));
    }

    #[test]
    fn prose_seeding_stops_at_the_annex() {
        let content = r#"<emu-annex id="sec-additional-ecmascript-features-for-web-browsers">
  <p>The value _legacy_ is left alone.</p>
</emu-annex>
<emu-alg>
1. Return _legacy_.
</emu-alg>"#;
        let found = run(content);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "use-before-def");
        assert_eq!(found[0].2, inner_offset(content, "_legacy_."));

        let content = r#"<emu-annex id="sec-elsewhere">
  <p>The value _legacy_ is left alone.</p>
</emu-annex>
<emu-alg>
1. Return _legacy_.
</emu-alg>"#;
        assert!(run(content).is_empty());
    }

    #[test]
    fn algorithms_replacing_steps_are_skipped() {
        let content = r#"<emu-alg replaces-step="step-foo">
1. Return _x_.
</emu-alg>"#;
        assert!(run(content).is_empty());
    }
}
