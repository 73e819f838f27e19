//! Types representing a specification document as an arena of element and
//! text nodes. The tree is built once by a reader and is read-only to every
//! checker afterwards; nodes are addressed by their stable NodeId.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub usize);

/// A byte range within one source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Span {
        Span { start, end }
    }
}

#[derive(Debug)]
pub struct Source {
    pub filename: PathBuf,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<NodeId>,
    pub source: SourceId,
    pub start_tag: Span,
    /// None when the closing tag could not be found in the source.
    pub end_tag: Option<Span>,
}

#[derive(Debug)]
pub enum Content {
    Element(Element),
    Text { source: SourceId, span: Span },
}

#[derive(Debug)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub content: Content,
}

/// Where an element sits in its source, as needed to slice out the raw
/// markup between its tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementLocation<'d> {
    pub source: SourceId,
    pub text: &'d str,
    pub start_tag: Span,
    pub end_tag: Option<Span>,
}

impl<'d> ElementLocation<'d> {
    /// The markup between the start and end tags, along with the offset at
    /// which it begins. None if the closing tag is missing.
    pub fn inner(&self) -> Option<(usize, &'d str)> {
        let end = self.end_tag?;
        let start = self
            .start_tag
            .end;
        Some((start, &self.text[start..end.start]))
    }
}

#[derive(Debug)]
pub struct Document {
    sources: Vec<Source>,
    nodes: Vec<Node>,
}

impl Document {
    /// Create a document whose root is a synthetic element spanning the
    /// whole of the main source.
    pub fn new(filename: &Path, text: String) -> Document {
        let length = text.len();
        let root = Node {
            parent: None,
            content: Content::Element(Element {
                name: "#document".to_string(),
                attributes: vec![],
                children: vec![],
                source: SourceId(0),
                start_tag: Span::new(0, 0),
                end_tag: Some(Span::new(length, length)),
            }),
        };

        Document {
            sources: vec![Source {
                filename: filename.to_path_buf(),
                text,
            }],
            nodes: vec![root],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn add_source(&mut self, filename: &Path, text: String) -> SourceId {
        self.sources
            .push(Source {
                filename: filename.to_path_buf(),
                text,
            });
        SourceId(
            self.sources
                .len()
                - 1,
        )
    }

    pub fn source(&self, id: SourceId) -> &Source {
        &self.sources[id.0]
    }

    pub fn sources(&self) -> impl Iterator<Item = (SourceId, &Source)> {
        self.sources
            .iter()
            .enumerate()
            .map(|(i, source)| (SourceId(i), source))
    }

    pub fn append_element(&mut self, parent: NodeId, element: Element) -> NodeId {
        self.append(
            parent,
            Content::Element(element),
        )
    }

    pub fn append_text(&mut self, parent: NodeId, source: SourceId, span: Span) -> NodeId {
        self.append(parent, Content::Text { source, span })
    }

    fn append(&mut self, parent: NodeId, content: Content) -> NodeId {
        let id = NodeId(
            self.nodes
                .len(),
        );
        self.nodes
            .push(Node {
                parent: Some(parent),
                content,
            });
        if let Content::Element(element) = &mut self.nodes[parent.0].content {
            element
                .children
                .push(id);
        }
        id
    }

    /// Record where the closing tag of an element was found.
    pub fn close_element(&mut self, id: NodeId, end_tag: Option<Span>) {
        if let Content::Element(element) = &mut self.nodes[id.0].content {
            element.end_tag = end_tag;
        }
    }

    /// Nodes are numbered consecutively from the root; this is one past the
    /// highest NodeId in use.
    pub fn node_count(&self) -> usize {
        self.nodes
            .len()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].content {
            Content::Element(element) => Some(element),
            Content::Text { .. } => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// The (lowercase) tag name, or None for text nodes.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.element(id)
            .map(|element| {
                element
                    .name
                    .as_str()
            })
    }

    pub fn is(&self, id: NodeId, name: &str) -> bool {
        self.name(id) == Some(name)
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?
            .attributes
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| {
                attribute
                    .value
                    .as_str()
            })
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name)
            .is_some()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.element(id) {
            Some(element) => &element.children,
            None => &[],
        }
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| {
                self.element(*child)
                    .is_some()
            })
    }

    pub fn first_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.element_children(id)
            .next()
    }

    pub fn last_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.element_children(id)
            .last()
    }

    fn position(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let i = self
            .children(parent)
            .iter()
            .position(|child| *child == id)?;
        Some((parent, i))
    }

    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, i) = self.position(id)?;
        self.children(parent)[i + 1..]
            .iter()
            .copied()
            .find(|sibling| {
                self.element(*sibling)
                    .is_some()
            })
    }

    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, i) = self.position(id)?;
        self.children(parent)[..i]
            .iter()
            .rev()
            .copied()
            .find(|sibling| {
                self.element(*sibling)
                    .is_some()
            })
    }

    /// Whether any descendant (not the node itself) is an element with the
    /// given name.
    pub fn contains_element(&self, id: NodeId, name: &str) -> bool {
        self.children(id)
            .iter()
            .any(|child| self.is(*child, name) || self.contains_element(*child, name))
    }

    /// The raw text of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].content {
            Content::Text { source, span } => Some(&self.sources[source.0].text[span.start..span.end]),
            Content::Element(_) => None,
        }
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut result = String::new();
        self.collect_text(id, None, &mut |_, text| result.push_str(text));
        result
    }

    /// Text content, leaving out anything inside elements with the given
    /// name (used to drop <del> markup from headers).
    pub fn text_content_excluding(&self, id: NodeId, excluded: &str) -> String {
        let mut result = String::new();
        self.collect_text(id, Some(excluded), &mut |_, text| result.push_str(text));
        result
    }

    fn collect_text<'d>(
        &'d self,
        id: NodeId,
        excluded: Option<&str>,
        f: &mut dyn FnMut(NodeId, &'d str),
    ) {
        match &self.nodes[id.0].content {
            Content::Text { source, span } => {
                f(id, &self.sources[source.0].text[span.start..span.end]);
            }
            Content::Element(element) => {
                if excluded == Some(element.name.as_str()) {
                    return;
                }
                for child in &element.children {
                    self.collect_text(*child, excluded, f);
                }
            }
        }
    }

    /// Map a byte index into the result of text_content_excluding() back to
    /// an absolute offset in the element's source.
    pub fn text_index_to_offset(&self, id: NodeId, excluded: &str, index: usize) -> Option<usize> {
        let mut seen = 0;
        let mut found = None;
        let mut last = None;
        self.collect_text(id, Some(excluded), &mut |node, text| {
            if found.is_some() {
                return;
            }
            if let Content::Text { span, .. } = &self.nodes[node.0].content {
                if index < seen + text.len() {
                    found = Some(span.start + (index - seen));
                }
                last = Some(span.end);
            }
            seen += text.len();
        });
        found.or(last)
    }

    pub fn location(&self, id: NodeId) -> Option<ElementLocation<'_>> {
        let element = self.element(id)?;
        Some(ElementLocation {
            source: element.source,
            text: &self.sources[element.source.0].text,
            start_tag: element.start_tag,
            end_tag: element.end_tag,
        })
    }

    /// Convert a byte offset in a source to a one-origin line and column.
    pub fn line_column(&self, source: SourceId, offset: usize) -> (usize, usize) {
        let text = &self.sources[source.0].text;
        let offset = offset.min(text.len());
        (
            calculate_line_number(text, offset) + 1,
            calculate_column_number(text, offset) + 1,
        )
    }
}

// These return zero-origin results; for display to humans you'll have to add
// one.
pub fn calculate_line_number(content: &str, offset: usize) -> usize {
    content[..offset]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
}

pub fn calculate_column_number(content: &str, offset: usize) -> usize {
    let before = &content[..offset];
    match before.rfind('\n') {
        Some(start) => content[start + 1..offset]
            .chars()
            .count(),
        None => before
            .chars()
            .count(),
    }
}
