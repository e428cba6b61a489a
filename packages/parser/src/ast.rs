use crate::error::ParseError;
use serde::{Deserialize, Serialize};

/// Byte range into the parsed buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    pub fn covers(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Source text under the span; empty when the span is out of bounds
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end).unwrap_or("")
    }
}

/// Root of a parsed buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub body: Vec<Node>,
    /// Recovered errors; the tree still holds everything parsed around them
    #[serde(skip)]
    pub errors: Vec<ParseError>,
    pub span: Span,
}

impl Document {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    Element(Element),
    Function(Function),
    StringLiteral(StringLiteral),
    TemplateLiteral(TemplateLiteral),
    NumberLiteral {
        raw: String,
        span: Span,
    },
    Identifier {
        name: String,
        span: Span,
    },
    Object(ObjectLiteral),
    Array {
        elements: Vec<Node>,
        span: Span,
    },
    Conditional {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Box<Node>,
        span: Span,
    },
    Logical {
        operator: LogicalOperator,
        left: Box<Node>,
        right: Box<Node>,
        span: Span,
    },
    Sequence {
        expressions: Vec<Node>,
        span: Span,
    },
    Spread {
        argument: Box<Node>,
        span: Span,
    },
    /// Everything the engine does not need to tell apart
    Compound {
        kind: CompoundKind,
        children: Vec<Node>,
        span: Span,
    },
}

impl Node {
    pub fn span(&self) -> Span {
        match self {
            Node::Element(element) => element.span,
            Node::Function(function) => function.span,
            Node::StringLiteral(literal) => literal.span,
            Node::TemplateLiteral(literal) => literal.span,
            Node::Object(object) => object.span,
            Node::NumberLiteral { span, .. }
            | Node::Identifier { span, .. }
            | Node::Array { span, .. }
            | Node::Conditional { span, .. }
            | Node::Logical { span, .. }
            | Node::Sequence { span, .. }
            | Node::Spread { span, .. }
            | Node::Compound { span, .. } => *span,
        }
    }

    pub fn compound(kind: CompoundKind, children: Vec<Node>, span: Span) -> Self {
        Node::Compound {
            kind,
            children,
            span,
        }
    }

    /// Strip any parentheses wrapping the expression
    pub fn unparenthesized(&self) -> &Node {
        let mut node = self;
        while let Node::Compound {
            kind: CompoundKind::Parenthesized,
            children,
            ..
        } = node
        {
            match children.as_slice() {
                [inner] => node = inner,
                _ => break,
            }
        }
        node
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOperator {
    And,
    Or,
    Nullish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompoundKind {
    Call,
    Member,
    Binary,
    Unary,
    Update,
    Assignment,
    Parenthesized,
    New,
    TaggedTemplate,
    Declaration,
    Return,
    If,
    Block,
    Statement,
    Class,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionKind {
    Declaration,
    Expression,
    Arrow,
    Method,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: Option<String>,
    pub kind: FunctionKind,
    /// Statements, or the single expression of a concise arrow body
    pub body: Vec<Node>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementKind {
    Element,
    Fragment,
}

/// Markup element or fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub kind: ElementKind,
    pub name: Option<String>,
    /// Tag name; empty and placed after `<` for fragments
    pub name_span: Span,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Child>,
    /// `<` through the `>` (or `/>`) of the opening tag
    pub opening: Span,
    /// False when input ended inside the opening tag
    pub opening_complete: bool,
    pub closing: Option<Span>,
    pub self_closing: bool,
    pub span: Span,
}

impl Element {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name() == Some(name))
    }

    /// Offset where a new attribute can be inserted, after the last one
    pub fn attribute_insert_offset(&self) -> usize {
        self.attributes
            .last()
            .map(|attribute| attribute.span().end)
            .unwrap_or(self.name_span.end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Attribute {
    Named {
        name: String,
        name_span: Span,
        value: Option<AttributeValue>,
        span: Span,
    },
    Spread {
        argument: Box<Node>,
        span: Span,
    },
}

impl Attribute {
    pub fn name(&self) -> Option<&str> {
        match self {
            Attribute::Named { name, .. } => Some(name),
            Attribute::Spread { .. } => None,
        }
    }

    pub fn value(&self) -> Option<&AttributeValue> {
        match self {
            Attribute::Named { value, .. } => value.as_ref(),
            Attribute::Spread { .. } => None,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Attribute::Named { span, .. } | Attribute::Spread { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AttributeValue {
    String(StringLiteral),
    Expression(ExpressionContainer),
    Element(Box<Element>),
}

impl AttributeValue {
    pub fn span(&self) -> Span {
        match self {
            AttributeValue::String(literal) => literal.span,
            AttributeValue::Expression(container) => container.span,
            AttributeValue::Element(element) => element.span,
        }
    }
}

/// `{ expression }` inside markup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionContainer {
    /// None for `{}` and comment-only containers
    pub expression: Option<Box<Node>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Child {
    Text { raw: String, span: Span },
    Expression(ExpressionContainer),
    Element(Element),
}

impl Child {
    pub fn span(&self) -> Span {
        match self {
            Child::Text { span, .. } => *span,
            Child::Expression(container) => container.span,
            Child::Element(element) => element.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringLiteral {
    /// Unescaped value (markup attribute strings are taken verbatim)
    pub value: String,
    pub quote: char,
    pub span: Span,
    /// Between the quotes
    pub content: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateQuasi {
    pub raw: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateLiteral {
    pub quasis: Vec<TemplateQuasi>,
    pub expressions: Vec<Node>,
    pub span: Span,
    /// Between the backticks
    pub content: Span,
}

impl TemplateLiteral {
    pub fn is_static(&self) -> bool {
        self.expressions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectLiteral {
    pub properties: Vec<Property>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyKind {
    Identifier,
    String,
    Number,
    Computed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyKey {
    /// Identifier text or unescaped string value; raw source for computed keys
    pub name: String,
    pub span: Span,
    pub kind: KeyKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Property {
    KeyValue {
        key: PropertyKey,
        value: Box<Node>,
        span: Span,
    },
    Shorthand {
        key: PropertyKey,
        span: Span,
    },
    Spread {
        argument: Box<Node>,
        span: Span,
    },
    Method {
        key: PropertyKey,
        function: Function,
        span: Span,
    },
}

impl Property {
    pub fn key(&self) -> Option<&PropertyKey> {
        match self {
            Property::KeyValue { key, .. }
            | Property::Shorthand { key, .. }
            | Property::Method { key, .. } => Some(key),
            Property::Spread { .. } => None,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Property::KeyValue { span, .. }
            | Property::Shorthand { span, .. }
            | Property::Spread { span, .. }
            | Property::Method { span, .. } => *span,
        }
    }
}
