//! Reader for the HTML-like markup that specification documents are written
//! in. It is forgiving the way browsers are: an element left open when an
//! ancestor closes (or the input ends) is closed implicitly, and such an
//! element records no end tag.

use std::path::Path;

use crate::language::*;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

// elements which a second opening tag of the same name closes
const SELF_NESTING: &[&str] = &["p", "li"];

/// Parse text into a Document. Imports are not followed; see
/// parsing::load_document() for that.
pub fn read(filename: &Path, content: String) -> Document {
    let mut document = Document::new(filename, content);
    let root = document.root();
    read_into(&mut document, SourceId(0), root);
    document
}

/// Parse the given source, attaching everything found to `parent`.
pub fn read_into(document: &mut Document, source: SourceId, parent: NodeId) {
    let text = document
        .source(source)
        .text
        .clone();

    let mut input = Parser::new(&text);
    let mut open: Vec<(NodeId, String)> = vec![];

    while !input.is_finished() {
        let current = open
            .last()
            .map(|(id, _)| *id)
            .unwrap_or(parent);

        match input.next_token() {
            Token::Text(span) => {
                document.append_text(current, source, span);
            }
            Token::Comment => {}
            Token::StartTag {
                name,
                attributes,
                span,
                closed,
            } => {
                let current = match open.last() {
                    Some((id, last)) if *last == name && SELF_NESTING.contains(&name.as_str()) => {
                        let id = *id;
                        open.pop();
                        document
                            .parent(id)
                            .unwrap_or(parent)
                    }
                    _ => current,
                };

                let id = document.append_element(
                    current,
                    Element {
                        name: name.clone(),
                        attributes,
                        children: vec![],
                        source,
                        start_tag: span,
                        end_tag: None,
                    },
                );

                if closed || VOID_ELEMENTS.contains(&name.as_str()) {
                    document.close_element(id, Some(Span::new(span.end, span.end)));
                } else if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                    let (inner, end) = input.take_raw_text(&name);
                    if inner.end > inner.start {
                        document.append_text(id, source, inner);
                    }
                    document.close_element(id, end);
                } else {
                    open.push((id, name));
                }
            }
            Token::EndTag { name, span } => {
                // anything opened after the matching element was never
                // closed, and keeps end_tag as None. Stray end tags are
                // dropped.
                if let Some(i) = open
                    .iter()
                    .rposition(|(_, n)| *n == name)
                {
                    let id = open[i].0;
                    open.truncate(i);
                    document.close_element(id, Some(span));
                }
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Text(Span),
    Comment,
    StartTag {
        name: String,
        attributes: Vec<Attribute>,
        span: Span,
        closed: bool,
    },
    EndTag {
        name: String,
        span: Span,
    },
}

#[derive(Debug)]
struct Parser<'i> {
    source: &'i str,
    offset: usize,
}

impl<'i> Parser<'i> {
    fn new(content: &'i str) -> Parser<'i> {
        Parser {
            source: content,
            offset: 0,
        }
    }

    fn advance(&mut self, width: usize) {
        self.source = &self.source[width..];
        self.offset += width;
    }

    fn entire(&self) -> &'i str {
        self.source
    }

    fn is_finished(&self) -> bool {
        self.source
            .is_empty()
    }

    fn next_token(&mut self) -> Token {
        let content = self.entire();

        if content.starts_with("<!--") {
            let width = content
                .find("-->")
                .map(|i| i + 3)
                .unwrap_or(content.len());
            self.advance(width);
            return Token::Comment;
        }

        if content.starts_with("<!") || content.starts_with("<?") {
            let width = content
                .find('>')
                .map(|i| i + 1)
                .unwrap_or(content.len());
            self.advance(width);
            return Token::Comment;
        }

        let re = regex!(r"^</([A-Za-z][A-Za-z0-9-]*)\s*>");
        if let Some(cap) = re.captures(content) {
            let width = cap[0].len();
            let span = Span::new(self.offset, self.offset + width);
            let name = cap[1].to_ascii_lowercase();
            self.advance(width);
            return Token::EndTag { name, span };
        }

        if let Some(token) = self.read_start_tag() {
            return token;
        }

        // plain text runs to the next '<'; a '<' which didn't begin a tag
        // is included as text
        let skip = if content.starts_with('<') { 1 } else { 0 };
        let width = content[skip..]
            .find('<')
            .map(|i| i + skip)
            .unwrap_or(content.len());
        let span = Span::new(self.offset, self.offset + width);
        self.advance(width);
        Token::Text(span)
    }

    fn read_start_tag(&mut self) -> Option<Token> {
        let content = self.entire();

        let re = regex!(r"^<([A-Za-z][A-Za-z0-9-]*)");
        let cap = re.captures(content)?;
        let name = cap[1].to_ascii_lowercase();

        let mut i = cap[0].len();
        let mut attributes = vec![];

        loop {
            let rest = &content[i..];

            let re = regex!(r"^\s*(/?)>");
            if let Some(end) = re.captures(rest) {
                let closed = !end[1].is_empty();
                i += end[0].len();
                let span = Span::new(self.offset, self.offset + i);
                self.advance(i);
                return Some(Token::StartTag {
                    name,
                    attributes,
                    span,
                    closed,
                });
            }

            let re = regex!(
                r#"^\s+([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#
            );
            let attribute = re.captures(rest)?;
            let value = attribute
                .get(2)
                .or(attribute.get(3))
                .or(attribute.get(4))
                .map(|m| {
                    m.as_str()
                        .to_string()
                })
                .unwrap_or_default();

            attributes.push(Attribute {
                name: attribute[1].to_ascii_lowercase(),
                value,
            });
            i += attribute[0].len();
        }
    }

    /// Consume everything up to and including the closing tag of a raw text
    /// element, returning the span of the contents and of the end tag.
    fn take_raw_text(&mut self, name: &str) -> (Span, Option<Span>) {
        let content = self.entire();
        let start = self.offset;
        let close = format!("</{}", name);

        let found = content
            .to_ascii_lowercase()
            .find(&close);

        match found {
            Some(i) => {
                let end = content[i..]
                    .find('>')
                    .map(|j| i + j + 1)
                    .unwrap_or(content.len());
                self.advance(end);
                (
                    Span::new(start, start + i),
                    Some(Span::new(start + i, start + end)),
                )
            }
            None => {
                self.advance(content.len());
                (Span::new(start, self.offset), None)
            }
        }
    }
}
