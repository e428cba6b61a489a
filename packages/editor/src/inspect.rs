//! # Inspect Index
//!
//! Flat index of every markup element in a buffer, with the literal text
//! ranges each element renders. Built once per buffer version and queried by
//! pointer position.
//!
//! Entries are in pre-order by start offset, so an entry's id is also its
//! position in `collect_elements`; writers use that to get back to the node.

use serde::{Deserialize, Serialize};
use snippet_parser::ast::*;
use snippet_parser::visitor::Visitor;
use snippet_sourcemap::{LineIndex, SourcePosition, TextRange};

/// Upper bound on text ranges kept per entry
pub const MAX_TEXT_RANGES: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Element,
    Fragment,
}

impl From<ElementKind> for EntryKind {
    fn from(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Element => EntryKind::Element,
            ElementKind::Fragment => EntryKind::Fragment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectIndexEntry {
    pub id: usize,
    pub parent_id: Option<usize>,
    pub range: TextRange,
    pub kind: EntryKind,
    pub name: Option<String>,
    pub text_ranges: Vec<TextRange>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectIndex {
    entries: Vec<InspectIndexEntry>,
}

/// Every element and fragment of a document, in pre-order by start offset
pub fn collect_elements(doc: &Document) -> Vec<&Element> {
    struct Collector<'a> {
        elements: Vec<&'a Element>,
    }

    impl<'a> Collector<'a> {
        fn visit_nodes(&mut self, nodes: &'a [Node]) {
            for node in nodes {
                self.visit_node_ref(node);
            }
        }

        // The Visitor trait hands out short-lived borrows, so collection
        // keeps its own walk to hold on to `'a` references.
        fn visit_node_ref(&mut self, node: &'a Node) {
            match node {
                Node::Element(element) => self.visit_element_ref(element),
                Node::Function(function) => self.visit_nodes(&function.body),
                Node::TemplateLiteral(template) => self.visit_nodes(&template.expressions),
                Node::Object(object) => {
                    for property in &object.properties {
                        match property {
                            Property::KeyValue { value, .. } => self.visit_node_ref(value),
                            Property::Spread { argument, .. } => self.visit_node_ref(argument),
                            Property::Method { function, .. } => {
                                self.visit_nodes(&function.body)
                            }
                            Property::Shorthand { .. } => {}
                        }
                    }
                }
                Node::Array { elements, .. } => self.visit_nodes(elements),
                Node::Conditional {
                    test,
                    consequent,
                    alternate,
                    ..
                } => {
                    self.visit_node_ref(test);
                    self.visit_node_ref(consequent);
                    self.visit_node_ref(alternate);
                }
                Node::Logical { left, right, .. } => {
                    self.visit_node_ref(left);
                    self.visit_node_ref(right);
                }
                Node::Sequence { expressions, .. } => self.visit_nodes(expressions),
                Node::Spread { argument, .. } => self.visit_node_ref(argument),
                Node::Compound { children, .. } => self.visit_nodes(children),
                Node::StringLiteral(_) | Node::NumberLiteral { .. } | Node::Identifier { .. } => {}
            }
        }

        fn visit_element_ref(&mut self, element: &'a Element) {
            self.elements.push(element);
            for attribute in &element.attributes {
                match attribute {
                    Attribute::Named { value, .. } => match value {
                        Some(AttributeValue::Expression(container)) => {
                            if let Some(expression) = &container.expression {
                                self.visit_node_ref(expression);
                            }
                        }
                        Some(AttributeValue::Element(element)) => self.visit_element_ref(element),
                        Some(AttributeValue::String(_)) | None => {}
                    },
                    Attribute::Spread { argument, .. } => self.visit_node_ref(argument),
                }
            }
            for child in &element.children {
                match child {
                    Child::Element(element) => self.visit_element_ref(element),
                    Child::Expression(container) => {
                        if let Some(expression) = &container.expression {
                            self.visit_node_ref(expression);
                        }
                    }
                    Child::Text { .. } => {}
                }
            }
        }
    }

    let mut collector = Collector {
        elements: Vec::new(),
    };
    collector.visit_nodes(&doc.body);
    collector.elements.sort_by_key(|element| element.span.start);
    collector.elements
}

/// Byte spans of the literal text an element renders, in document order
struct TextCollector<'s> {
    source: &'s str,
    spans: Vec<Span>,
}

impl TextCollector<'_> {
    fn push(&mut self, span: Span) {
        if self.spans.len() < MAX_TEXT_RANGES {
            self.spans.push(span);
        }
    }

    fn text(&mut self, span: Span) {
        let raw = span.slice(self.source);
        let leading = raw.len() - raw.trim_start().len();
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let start = span.start + leading;
            self.push(Span::new(start, start + trimmed.len()));
        }
    }

    /// A container whose whole expression is one literal
    fn literal(&mut self, expression: &Node) -> bool {
        let content = match expression {
            Node::StringLiteral(literal) => literal.content,
            Node::TemplateLiteral(template) if template.is_static() => template.content,
            _ => return false,
        };
        if !content.slice(self.source).trim().is_empty() {
            self.push(content);
        }
        true
    }
}

impl Visitor for TextCollector<'_> {
    fn visit_element(&mut self, element: &Element) {
        // Attributes never contribute rendered text
        for child in &element.children {
            self.visit_child(child);
        }
    }

    fn visit_child(&mut self, child: &Child) {
        match child {
            Child::Text { span, .. } => self.text(*span),
            Child::Expression(container) => {
                if let Some(expression) = &container.expression {
                    if !self.literal(expression) {
                        self.visit_node(expression);
                    }
                }
            }
            Child::Element(element) => self.visit_element(element),
        }
    }

    fn visit_function(&mut self, _function: &Function) {}
}

impl InspectIndex {
    /// Index a buffer; unparsable input gives an empty index
    pub fn build(source: &str) -> Self {
        match snippet_parser::parse(source) {
            Ok(doc) => Self::from_document(&doc, source),
            Err(err) => {
                tracing::debug!(error = %err, "buffer unparsable; empty inspect index");
                Self::default()
            }
        }
    }

    pub fn from_document(doc: &Document, source: &str) -> Self {
        let lines = LineIndex::new(source);
        let elements = collect_elements(doc);

        let mut entries = Vec::with_capacity(elements.len());
        let mut open: Vec<(usize, Span)> = Vec::new();

        for (id, element) in elements.iter().enumerate() {
            while open
                .last()
                .is_some_and(|(_, span)| !span.covers(element.span))
            {
                open.pop();
            }
            let parent_id = open.last().map(|(parent, _)| *parent);
            open.push((id, element.span));

            let mut texts = TextCollector {
                source,
                spans: Vec::new(),
            };
            texts.visit_element(element);

            entries.push(InspectIndexEntry {
                id,
                parent_id,
                range: lines.range(element.span.start, element.span.end),
                kind: element.kind.into(),
                name: element.name.clone(),
                text_ranges: texts
                    .spans
                    .into_iter()
                    .map(|span| lines.range(span.start, span.end))
                    .collect(),
            });
        }

        tracing::debug!(entries = entries.len(), "built inspect index");
        Self { entries }
    }

    pub fn from_entries(entries: Vec<InspectIndexEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[InspectIndexEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<InspectIndexEntry> {
        self.entries
    }

    pub fn get(&self, id: usize) -> Option<&InspectIndexEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Innermost element at `position`: the smallest enclosing range
    pub fn find_match(&self, position: SourcePosition) -> Option<&InspectIndexEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.range.contains(position))
            .min_by(|a, b| compare_spans(a, b))
    }

    /// Innermost element owning a text range at `position`
    pub fn find_text(&self, position: SourcePosition) -> Option<(&InspectIndexEntry, TextRange)> {
        self.entries.iter().rev().find_map(|entry| {
            entry
                .text_ranges
                .iter()
                .find(|range| range.contains(position))
                .map(|range| (entry, *range))
        })
    }
}

/// Order by specificity: "less" is the better match
fn compare_spans(a: &InspectIndexEntry, b: &InspectIndexEntry) -> std::cmp::Ordering {
    let (ra, rb) = (&a.range, &b.range);
    match (ra.is_single_line(), rb.is_single_line()) {
        (true, false) => return std::cmp::Ordering::Less,
        (false, true) => return std::cmp::Ordering::Greater,
        (true, true) => {
            let by_width = ra.column_width().cmp(&rb.column_width());
            if by_width.is_ne() {
                return by_width;
            }
        }
        (false, false) => {
            let by_lines = ra.line_span().cmp(&rb.line_span());
            if by_lines.is_ne() {
                return by_lines;
            }
        }
    }
    // Later start, then higher id
    rb.start()
        .cmp(&ra.start())
        .then(b.id.cmp(&a.id))
}
