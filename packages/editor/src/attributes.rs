//! Class and style attributes of an element, as the reader and the writers
//! see them.

use snippet_parser::ast::*;

pub const CLASS_ATTRIBUTES: [&str; 2] = ["className", "class"];
pub const STYLE_ATTRIBUTE: &str = "style";

/// The class list attribute of an element
#[derive(Debug, Clone, Copy)]
pub enum ClassAttribute<'a> {
    Missing,
    /// A literal list; `content` is the byte range of the raw list text
    Static {
        attribute: &'a Attribute,
        content: Span,
    },
    Dynamic {
        attribute: &'a Attribute,
    },
}

impl<'a> ClassAttribute<'a> {
    /// The last `className`/`class` attribute wins, as when rendering
    pub fn of(element: &'a Element) -> Self {
        let Some(attribute) = element
            .attributes
            .iter()
            .rev()
            .find(|attribute| attribute.name().is_some_and(|name| CLASS_ATTRIBUTES.contains(&name)))
        else {
            return ClassAttribute::Missing;
        };

        match attribute.value() {
            Some(AttributeValue::String(literal)) => ClassAttribute::Static {
                attribute,
                content: literal.content,
            },
            Some(AttributeValue::Expression(container)) => {
                match container.expression.as_deref() {
                    Some(Node::StringLiteral(literal)) => ClassAttribute::Static {
                        attribute,
                        content: literal.content,
                    },
                    Some(Node::TemplateLiteral(template)) if template.is_static() => {
                        ClassAttribute::Static {
                            attribute,
                            content: template.content,
                        }
                    }
                    _ => ClassAttribute::Dynamic { attribute },
                }
            }
            Some(AttributeValue::Element(_)) | None => ClassAttribute::Dynamic { attribute },
        }
    }

    /// Class tokens in document order
    pub fn tokens<'s>(&self, source: &'s str) -> Vec<&'s str> {
        match self {
            ClassAttribute::Static { content, .. } => {
                content.slice(source).split_whitespace().collect()
            }
            ClassAttribute::Missing | ClassAttribute::Dynamic { .. } => Vec::new(),
        }
    }
}

/// The inline style attribute of an element
#[derive(Debug, Clone, Copy)]
pub enum StyleAttribute<'a> {
    Missing,
    Object {
        attribute: &'a Attribute,
        object: &'a ObjectLiteral,
    },
    /// Any expression that is not an object literal
    Expression {
        attribute: &'a Attribute,
        container: &'a ExpressionContainer,
        expression: &'a Node,
    },
    /// `style` without a usable value: `style`, `style={}`
    Empty {
        attribute: &'a Attribute,
    },
    String {
        attribute: &'a Attribute,
    },
}

impl<'a> StyleAttribute<'a> {
    pub fn of(element: &'a Element) -> Self {
        let Some(attribute) = element
            .attributes
            .iter()
            .rev()
            .find(|attribute| attribute.name() == Some(STYLE_ATTRIBUTE))
        else {
            return StyleAttribute::Missing;
        };

        match attribute.value() {
            Some(AttributeValue::Expression(container)) => match container.expression.as_deref() {
                Some(expression) => match expression.unparenthesized() {
                    Node::Object(object) => StyleAttribute::Object { attribute, object },
                    _ => StyleAttribute::Expression {
                        attribute,
                        container,
                        expression,
                    },
                },
                None => StyleAttribute::Empty { attribute },
            },
            Some(AttributeValue::String(_)) => StyleAttribute::String { attribute },
            Some(AttributeValue::Element(_)) | None => StyleAttribute::Empty { attribute },
        }
    }
}

/// Key of an object property as written, for identifier and string keys
pub fn property_key(property: &Property) -> Option<&str> {
    match property {
        Property::KeyValue { key, .. } if matches!(key.kind, KeyKind::Identifier | KeyKind::String) => {
            Some(key.name.as_str())
        }
        _ => None,
    }
}

/// Span covering an attribute and the whitespace before it, for removal
pub fn attribute_removal_span(source: &str, attribute: &Attribute) -> Span {
    let span = attribute.span();
    let before = &source[..span.start];
    let trimmed = before.trim_end_matches([' ', '\t', '\r', '\n']);
    Span::new(trimmed.len(), span.end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::collect_elements;

    fn with_element<T>(source: &str, f: impl FnOnce(&Element) -> T) -> T {
        let doc = snippet_parser::parse(source).unwrap();
        let elements = collect_elements(&doc);
        f(elements[0])
    }

    #[test]
    fn test_class_attribute_kinds() {
        let source = r#"<div className="a  b" />"#;
        with_element(source, |element| {
            let class = ClassAttribute::of(element);
            assert!(matches!(class, ClassAttribute::Static { .. }));
            assert_eq!(class.tokens(source), vec!["a", "b"]);
        });

        let source = "<div class={`x y`} />";
        with_element(source, |element| {
            assert_eq!(ClassAttribute::of(element).tokens(source), vec!["x", "y"]);
        });

        with_element("<div className={cn('a', b)} />", |element| {
            assert!(matches!(ClassAttribute::of(element), ClassAttribute::Dynamic { .. }));
        });
        with_element("<div className={`a ${b}`} />", |element| {
            assert!(matches!(ClassAttribute::of(element), ClassAttribute::Dynamic { .. }));
        });
        with_element("<div id=\"x\" />", |element| {
            assert!(matches!(ClassAttribute::of(element), ClassAttribute::Missing));
        });
    }

    #[test]
    fn test_style_attribute_kinds() {
        with_element("<div style={{ color: 'red' }} />", |element| {
            assert!(matches!(StyleAttribute::of(element), StyleAttribute::Object { .. }));
        });
        with_element("<div style={styles.card} />", |element| {
            assert!(matches!(StyleAttribute::of(element), StyleAttribute::Expression { .. }));
        });
        with_element("<div style=\"color: red\" />", |element| {
            assert!(matches!(StyleAttribute::of(element), StyleAttribute::String { .. }));
        });
        with_element("<div style={} />", |element| {
            assert!(matches!(StyleAttribute::of(element), StyleAttribute::Empty { .. }));
        });
    }

    #[test]
    fn test_removal_span_takes_leading_whitespace() {
        let source = "<div id=\"a\"\n  hidden />";
        with_element(source, |element| {
            let span = attribute_removal_span(source, &element.attributes[1]);
            assert_eq!(span.slice(source), "\n  hidden");
        });
    }
}
