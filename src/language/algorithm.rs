//! Types for the pseudocode algorithm language: nested step lists as read
//! from an algorithm block, and the parsed expression sequence of each step.
//! All offsets are byte offsets into the markup between the algorithm's
//! start and end tags.

/// A piece of source text and where it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment<'i> {
    pub text: &'i str,
    pub offset: usize,
}

impl<'i> Fragment<'i> {
    pub fn new(text: &'i str, offset: usize) -> Fragment<'i> {
        Fragment { text, offset }
    }

    pub fn end(&self) -> usize {
        self.offset
            + self
                .text
                .len()
    }
}

/// Identifies a step uniquely within one algorithm, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Ordered,
    Unordered,
}

#[derive(Debug, PartialEq, Eq)]
pub struct StepList<'i> {
    pub kind: ListKind,
    pub steps: Vec<Step<'i>>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Step<'i> {
    pub id: StepId,
    /// "1." for ordered steps, "*" for unordered ones, as written.
    pub marker: Fragment<'i>,
    pub attributes: Vec<StepAttribute<'i>>,
    pub content: Fragment<'i>,
    pub sublist: Option<StepList<'i>>,
}

impl<'i> Step<'i> {
    pub fn attribute(&self, key: &str) -> Option<&StepAttribute<'i>> {
        self.attributes
            .iter()
            .find(|attribute| {
                attribute
                    .key
                    .text
                    == key
            })
    }
}

// attributes like [id="step-foo", declared="x, y"]

#[derive(Debug, PartialEq, Eq)]
pub struct StepAttribute<'i> {
    pub key: Fragment<'i>,
    pub value: Fragment<'i>,
}

/// The parsed content of one step.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Seq<'i> {
    pub items: Vec<Item<'i>>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Item<'i> {
    Text(Fragment<'i>),
    /// `_name_`, including the underscores.
    Variable(Fragment<'i>),
    /// `~atom~`, including the tildes.
    Enum(Fragment<'i>),
    Paren(Paren<'i>),
    /// `<figure>` through the matching `</figure>`.
    Figure(Fragment<'i>),
    /// `|Name|`, including the pipes.
    Nonterminal(Fragment<'i>),
    RecordSpec(RecordSpec<'i>),
    /// Markup the analysis looks through: other tags, `*values*`, `code`.
    Opaque(Fragment<'i>),
}

#[derive(Debug, PartialEq, Eq)]
pub struct Paren<'i> {
    pub start: usize,
    pub end: usize,
    pub inner: Seq<'i>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RecordSpec<'i> {
    pub start: usize,
    pub end: usize,
    pub fields: Vec<Field<'i>>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Field<'i> {
    pub name: Fragment<'i>,
    pub value: Seq<'i>,
}

impl<'i> Item<'i> {
    pub fn start(&self) -> usize {
        match self {
            Item::Text(fragment)
            | Item::Variable(fragment)
            | Item::Enum(fragment)
            | Item::Figure(fragment)
            | Item::Nonterminal(fragment)
            | Item::Opaque(fragment) => fragment.offset,
            Item::Paren(paren) => paren.start,
            Item::RecordSpec(record) => record.start,
        }
    }

    pub fn end(&self) -> usize {
        match self {
            Item::Text(fragment)
            | Item::Variable(fragment)
            | Item::Enum(fragment)
            | Item::Figure(fragment)
            | Item::Nonterminal(fragment)
            | Item::Opaque(fragment) => fragment.end(),
            Item::Paren(paren) => paren.end,
            Item::RecordSpec(record) => record.end,
        }
    }

    /// The text of a Text item.
    pub fn as_text(&self) -> Option<&'i str> {
        match self {
            Item::Text(fragment) => Some(fragment.text),
            _ => None,
        }
    }

    /// The bare name of a Variable item, without its underscores.
    pub fn variable_name(&self) -> Option<&'i str> {
        match self {
            Item::Variable(fragment) => Some(strip_delimiters(fragment.text)),
            _ => None,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Item::Variable(_))
    }
}

/// Remove the single leading and trailing delimiter characters from a token
/// like `_x_` or `~empty~`.
pub fn strip_delimiters(token: &str) -> &str {
    let mut chars = token.chars();
    chars.next();
    chars.next_back();
    chars.as_str()
}

impl<'i> Seq<'i> {
    pub fn first_text(&self) -> &'i str {
        match self
            .items
            .first()
        {
            Some(Item::Text(fragment)) => fragment.text,
            _ => "",
        }
    }

    /// The text the step ends with. A trailing parenthesised sequence
    /// contributes its own trailing text followed by the closing paren, so
    /// that "(see below.)" ends with ".)".
    pub fn last_text(&self) -> String {
        match self
            .items
            .last()
        {
            Some(Item::Text(fragment)) => fragment
                .text
                .to_string(),
            Some(Item::Paren(paren)) => {
                let mut text = paren
                    .inner
                    .last_text();
                text.push(')');
                text
            }
            _ => String::new(),
        }
    }

    /// Visit every item in the sequence, descending into parentheses and
    /// record specs. Containers are visited before their contents.
    pub fn for_each_item<'s>(&'s self, f: &mut dyn FnMut(&'s Item<'i>)) {
        for item in &self.items {
            f(item);
            match item {
                Item::Paren(paren) => paren
                    .inner
                    .for_each_item(f),
                Item::RecordSpec(record) => {
                    for field in &record.fields {
                        field
                            .value
                            .for_each_item(f);
                    }
                }
                _ => (),
            }
        }
    }

    pub fn for_each_variable<'s>(&'s self, f: &mut dyn FnMut(&'s Item<'i>)) {
        self.for_each_item(&mut |item| {
            if item.is_variable() {
                f(item)
            }
        });
    }
}
