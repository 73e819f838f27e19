//! Reader for algorithm blocks: nested lists of steps laid out by
//! indentation, and the pseudocode expression inside each step.

use crate::language::*;
use crate::parsing::{split_lines, Line, StepParser};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    ExpectedStep(usize),
    InconsistentMarkers(usize),
    InvalidAttributes(usize),
    Unbalanced(usize, char),
    UnclosedFigure(usize),
    UnclosedRecord(usize),
}

impl ParsingError {
    pub fn offset(&self) -> usize {
        match self {
            ParsingError::ExpectedStep(offset) => *offset,
            ParsingError::InconsistentMarkers(offset) => *offset,
            ParsingError::InvalidAttributes(offset) => *offset,
            ParsingError::Unbalanced(offset, _) => *offset,
            ParsingError::UnclosedFigure(offset) => *offset,
            ParsingError::UnclosedRecord(offset) => *offset,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ParsingError::ExpectedStep(_) => "expected a numbered or bulleted step".to_string(),
            ParsingError::InconsistentMarkers(_) => {
                "a list cannot mix numbered and bulleted steps".to_string()
            }
            ParsingError::InvalidAttributes(_) => "invalid step attributes".to_string(),
            ParsingError::Unbalanced(_, c) => format!("unbalanced '{}'", c),
            ParsingError::UnclosedFigure(_) => "could not find the matching </figure>".to_string(),
            ParsingError::UnclosedRecord(_) => "unterminated record".to_string(),
        }
    }
}

/// The standard reader for algorithm markup.
#[derive(Debug, Default, Clone, Copy)]
pub struct StepReader;

impl StepParser for StepReader {
    fn read_algorithm<'i>(&self, source: &'i str) -> Result<StepList<'i>, ParsingError> {
        let lines = split_lines(source);

        let indent = match lines.first() {
            Some(line) => line.indent,
            None => {
                return Ok(StepList {
                    kind: ListKind::Ordered,
                    steps: vec![],
                })
            }
        };

        let mut reader = ListReader {
            source,
            lines,
            position: 0,
            next: 0,
        };

        let list = reader.read_list(indent)?;

        // a line indented less than the first step
        if let Some(line) = reader.peek() {
            return Err(ParsingError::ExpectedStep(line.start));
        }

        Ok(list)
    }

    fn parse_step<'i>(&self, step: &Step<'i>) -> Result<Seq<'i>, ParsingError> {
        let mut parser = ExpressionParser::new(step.content);
        parser.read_seq(&[])
    }
}

fn is_marker(content: &str) -> bool {
    let re = regex!(r"^(?:\d+\.|\*)(?:\s|$)");
    re.is_match(content)
}

fn is_attribute_list(content: &str) -> bool {
    let re = regex!(r#"^\[\s*[A-Za-z][A-Za-z0-9-]*\s*=\s*""#);
    re.is_match(content)
}

struct ListReader<'i> {
    source: &'i str,
    lines: Vec<Line<'i>>,
    position: usize,
    next: usize,
}

impl<'i> ListReader<'i> {
    fn peek(&self) -> Option<Line<'i>> {
        self.lines
            .get(self.position)
            .copied()
    }

    fn read_list(&mut self, indent: usize) -> Result<StepList<'i>, ParsingError> {
        let mut kind = None;
        let mut steps = vec![];

        while let Some(line) = self.peek() {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                return Err(ParsingError::ExpectedStep(line.start));
            }

            let (marker, step) = self.read_step()?;
            match kind {
                None => kind = Some(marker),
                Some(existing) if existing != marker => {
                    return Err(ParsingError::InconsistentMarkers(
                        step.marker
                            .offset,
                    ));
                }
                Some(_) => (),
            }
            steps.push(step);
        }

        Ok(StepList {
            kind: kind.unwrap_or(ListKind::Ordered),
            steps,
        })
    }

    fn read_step(&mut self) -> Result<(ListKind, Step<'i>), ParsingError> {
        let line = self.lines[self.position];
        self.position += 1;

        let re = regex!(r"^(?:(\d+\.)|(\*))(?:\s+|$)");
        let cap = re
            .captures(line.text)
            .ok_or(ParsingError::ExpectedStep(line.start))?;

        let (kind, m) = match (cap.get(1), cap.get(2)) {
            (Some(m), _) => (ListKind::Ordered, m),
            (None, Some(m)) => (ListKind::Unordered, m),
            (None, None) => return Err(ParsingError::ExpectedStep(line.start)),
        };
        let marker = Fragment::new(m.as_str(), line.start);

        let id = StepId(self.next);
        self.next += 1;

        let mut i = cap[0].len();
        let mut attributes = vec![];

        if is_attribute_list(&line.text[i..]) {
            let (list, width) = read_attributes(&line.text[i..], line.start + i)?;
            attributes = list;
            i += width;
        }

        let start = line.start + i;
        let mut end = line
            .end
            .max(start);

        // lines indented further which don't begin a step continue this one
        while let Some(next) = self.peek() {
            if next.indent > line.indent && !is_marker(next.text) {
                end = next.end;
                self.position += 1;
            } else {
                break;
            }
        }

        let content = Fragment::new(&self.source[start..end], start);

        let sublist = match self.peek() {
            Some(next) if next.indent > line.indent => Some(self.read_list(next.indent)?),
            _ => None,
        };

        Ok((
            kind,
            Step {
                id,
                marker,
                attributes,
                content,
                sublist,
            },
        ))
    }
}

/// Read `[key="value", ...]` and any whitespace following it, returning the
/// attributes and the width consumed.
fn read_attributes<'i>(
    content: &'i str,
    offset: usize,
) -> Result<(Vec<StepAttribute<'i>>, usize), ParsingError> {
    let mut i = 1;
    let mut attributes = vec![];

    loop {
        let re = regex!(r#"^\s*([A-Za-z][A-Za-z0-9-]*)\s*=\s*"([^"]*)""#);
        let cap = re
            .captures(&content[i..])
            .ok_or(ParsingError::InvalidAttributes(offset + i))?;

        let key = cap
            .get(1)
            .ok_or(ParsingError::InvalidAttributes(offset + i))?;
        let value = cap
            .get(2)
            .ok_or(ParsingError::InvalidAttributes(offset + i))?;

        attributes.push(StepAttribute {
            key: Fragment::new(key.as_str(), offset + i + key.start()),
            value: Fragment::new(value.as_str(), offset + i + value.start()),
        });
        i += cap[0].len();

        let re = regex!(r"^\s*(,|\])\s*");
        let separator = re
            .captures(&content[i..])
            .ok_or(ParsingError::InvalidAttributes(offset + i))?;
        let closing = &separator[1] == "]";
        i += separator[0].len();

        if closing {
            return Ok((attributes, i));
        }
    }
}

/// Width of a <figure> through its matching </figure>, counting nested
/// figures.
fn matching_figure_end(content: &str) -> Option<usize> {
    let re = regex!(r"<(/?)figure[\s>]");
    let mut depth = 0;

    for cap in re.captures_iter(content) {
        if cap[1].is_empty() {
            depth += 1;
        } else {
            depth -= 1;
            if depth == 0 {
                let m = cap.get(0)?;
                let close = content[m.start()..].find('>')?;
                return Some(m.start() + close + 1);
            }
        }
    }

    None
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

struct ExpressionParser<'i> {
    original: &'i str,
    base: usize,
    position: usize,
}

impl<'i> ExpressionParser<'i> {
    fn new(content: Fragment<'i>) -> ExpressionParser<'i> {
        ExpressionParser {
            original: content.text,
            base: content.offset,
            position: 0,
        }
    }

    fn rest(&self) -> &'i str {
        &self.original[self.position..]
    }

    fn offset(&self) -> usize {
        self.base + self.position
    }

    fn after_word(&self) -> bool {
        self.original[..self.position]
            .chars()
            .next_back()
            .map(is_word)
            .unwrap_or(false)
    }

    /// Read items until the end of input or one of the terminating
    /// characters, which is left unconsumed.
    fn read_seq(&mut self, terminators: &[char]) -> Result<Seq<'i>, ParsingError> {
        let mut items = vec![];
        let mut text = self.position;

        while let Some(c) = self
            .rest()
            .chars()
            .next()
        {
            if terminators.contains(&c) {
                break;
            }

            let start = self.position;
            let item = match c {
                '(' => Some(self.read_paren()?),
                ')' => return Err(ParsingError::Unbalanced(self.offset(), ')')),
                '{' => self.read_record()?,
                '<' => self.read_tag()?,
                '_' => self.read_delimited(regex!(r"^_[A-Za-z0-9]+_"), Item::Variable),
                '~' => self.read_delimited(regex!(r"^~[^~\s<>]+~"), Item::Enum),
                '*' => self.read_delimited(regex!(r"^\*[^*\s](?:[^*\n]*[^*\s])?\*"), Item::Opaque),
                '|' => self.read_delimited(
                    regex!(r"^\|[A-Za-z][A-Za-z0-9]*(?:\[[^\]|]*\])?(?:_opt)?\|"),
                    Item::Nonterminal,
                ),
                '`' => self.read_delimited(regex!(r"^`[^`\n]*`"), Item::Opaque),
                _ => None,
            };

            match item {
                Some(item) => {
                    if text < start {
                        items.push(Item::Text(Fragment::new(
                            &self.original[text..start],
                            self.base + text,
                        )));
                    }
                    items.push(item);
                    text = self.position;
                }
                None => self.position += c.len_utf8(),
            }
        }

        if text < self.position {
            items.push(Item::Text(Fragment::new(
                &self.original[text..self.position],
                self.base + text,
            )));
        }

        Ok(Seq { items })
    }

    fn read_paren(&mut self) -> Result<Item<'i>, ParsingError> {
        let start = self.offset();
        self.position += 1;

        let inner = self.read_seq(&[')'])?;
        if !self
            .rest()
            .starts_with(')')
        {
            return Err(ParsingError::Unbalanced(start, '('));
        }
        self.position += 1;

        Ok(Item::Paren(Paren {
            start,
            end: self.offset(),
            inner,
        }))
    }

    /// A token bracketed by delimiter characters; these only begin at a
    /// word boundary.
    fn read_delimited(
        &mut self,
        re: &::regex::Regex,
        f: fn(Fragment<'i>) -> Item<'i>,
    ) -> Option<Item<'i>> {
        if self.after_word() {
            return None;
        }

        let rest = self.rest();
        let m = re.find(rest)?;
        if rest[m.end()..]
            .chars()
            .next()
            .map(is_word)
            .unwrap_or(false)
        {
            return None;
        }

        let fragment = Fragment::new(m.as_str(), self.offset());
        self.position += m.end();
        Some(f(fragment))
    }

    fn read_tag(&mut self) -> Result<Option<Item<'i>>, ParsingError> {
        let rest = self.rest();

        if regex!(r"^<figure[\s>]").is_match(rest) {
            let width =
                matching_figure_end(rest).ok_or(ParsingError::UnclosedFigure(self.offset()))?;
            let fragment = Fragment::new(&rest[..width], self.offset());
            self.position += width;
            return Ok(Some(Item::Figure(fragment)));
        }

        let re = regex!(r"^</?[A-Za-z][A-Za-z0-9-]*(?:\s[^<>]*)?/?>");
        match re.find(rest) {
            Some(m) => {
                let fragment = Fragment::new(m.as_str(), self.offset());
                self.position += m.end();
                Ok(Some(Item::Opaque(fragment)))
            }
            None => Ok(None),
        }
    }

    fn read_record(&mut self) -> Result<Option<Item<'i>>, ParsingError> {
        if !regex!(r"^\{\s*\[\[").is_match(self.rest()) {
            return Ok(None);
        }

        let start = self.offset();
        self.position += 1;

        let mut fields = vec![];
        loop {
            let re = regex!(r"^\s*(\[\[[A-Za-z][A-Za-z0-9]*\]\])\s*:\s*");
            let cap = re
                .captures(self.rest())
                .ok_or(ParsingError::UnclosedRecord(start))?;
            let m = cap
                .get(1)
                .ok_or(ParsingError::UnclosedRecord(start))?;
            let name = Fragment::new(m.as_str(), self.offset() + m.start());
            self.position += cap[0].len();

            let value = self.read_seq(&[',', '}'])?;
            fields.push(Field { name, value });

            match self
                .rest()
                .chars()
                .next()
            {
                Some(',') => self.position += 1,
                Some('}') => {
                    self.position += 1;
                    break;
                }
                _ => return Err(ParsingError::UnclosedRecord(start)),
            }
        }

        Ok(Some(Item::RecordSpec(RecordSpec {
            start,
            end: self.offset(),
            fields,
        })))
    }
}
