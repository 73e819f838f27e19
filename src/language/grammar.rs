//! Types for the grammar notation language. Offsets are byte offsets into
//! the grammar source text the production was compiled from.

#[derive(Debug, PartialEq, Eq)]
pub struct Production<'i> {
    pub name: &'i str,
    pub offset: usize,
    /// Index of the source this production was read from.
    pub source: usize,
    pub parameters: Vec<Parameter<'i>>,
    pub rhses: Vec<RightHandSide<'i>>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Parameter<'i> {
    pub name: &'i str,
    pub offset: usize,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RightHandSide<'i> {
    pub guard: Option<Guard<'i>>,
    pub symbols: Vec<Symbol<'i>>,
    pub offset: usize,
}

/// A leading `[+Yield, ~Await]` restricting when an alternative applies.
#[derive(Debug, PartialEq, Eq)]
pub struct Guard<'i> {
    pub conditions: Vec<Argument<'i>>,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Plus,
    Tilde,
    Question,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Argument<'i> {
    pub operator: Operator,
    pub name: &'i str,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Symbol<'i> {
    pub kind: SymbolKind<'i>,
    pub optional: bool,
    pub offset: usize,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SymbolKind<'i> {
    Terminal(&'i str),
    Nonterminal {
        name: &'i str,
        arguments: Option<Vec<Argument<'i>>>,
    },
    ButNot {
        left: Box<Symbol<'i>>,
        right: Box<Symbol<'i>>,
    },
    OneOf(Vec<Symbol<'i>>),
    Empty,
    Restriction(Restriction<'i>),
}

#[derive(Debug, PartialEq, Eq)]
pub enum Restriction<'i> {
    NoLineTerminatorHere,
    Lookahead(&'i str),
    Prose(&'i str),
}

/// One named piece of grammar source handed to the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrammarSource<'i> {
    pub text: &'i str,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Compilation<'i> {
    pub productions: Vec<Production<'i>>,
    pub diagnostics: Vec<GrammarDiagnostic<'i>>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct GrammarDiagnostic<'i> {
    pub source: usize,
    pub offset: usize,
    pub problem: GrammarProblem<'i>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum GrammarProblem<'i> {
    Syntax(&'static str),
    UnusedParameter {
        production: &'i str,
        parameter: &'i str,
    },
    DuplicateProduction(&'i str),
}

impl<'i> GrammarProblem<'i> {
    pub fn code(&self) -> &'static str {
        match self {
            GrammarProblem::Syntax(_) => "syntax",
            GrammarProblem::UnusedParameter { .. } => "unused-parameter",
            GrammarProblem::DuplicateProduction(_) => "duplicate-production",
        }
    }

    pub fn message(&self) -> String {
        match self {
            GrammarProblem::Syntax(expected) => format!("expected {}", expected),
            GrammarProblem::UnusedParameter { parameter, .. } => {
                format!("Parameter {:?} is unused", parameter)
            }
            GrammarProblem::DuplicateProduction(name) => {
                format!("Production {:?} is defined more than once", name)
            }
        }
    }
}
