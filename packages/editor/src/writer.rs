//! Shared pieces of the layout, style and text writers: target resolution,
//! class list edits and inline style merges.

use serde::{Deserialize, Serialize};
use snippet_parser::ast::*;
use snippet_sourcemap::SourcePosition;

use crate::attributes::{attribute_removal_span, property_key, ClassAttribute, StyleAttribute};
use crate::edits::{apply_edits, SourceEdit};
use crate::errors::{WriteError, WriteResult};
use crate::inspect::{collect_elements, InspectIndex};
use crate::utilities::{camel_case, unprefixed_utility};

/// Result of a write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOutcome {
    pub source: String,
    pub changed: bool,
    pub edits: Vec<SourceEdit>,
}

impl WriteOutcome {
    pub fn unchanged(source: &str) -> Self {
        Self {
            source: source.to_string(),
            changed: false,
            edits: Vec::new(),
        }
    }
}

/// Apply `edits`, dropping the ones that change nothing
pub(crate) fn finish(source: &str, edits: Vec<SourceEdit>) -> WriteResult<WriteOutcome> {
    let edits: Vec<SourceEdit> = edits
        .into_iter()
        .filter(|edit| !edit.is_noop(source))
        .collect();
    if edits.is_empty() {
        return Ok(WriteOutcome::unchanged(source));
    }

    let updated = apply_edits(source, &edits)?;
    Ok(WriteOutcome {
        changed: updated != source,
        source: updated,
        edits,
    })
}

/// Innermost editable element at `position`
pub(crate) fn resolve_target<'d>(
    doc: &'d Document,
    source: &str,
    position: SourcePosition,
) -> WriteResult<&'d Element> {
    let index = InspectIndex::from_document(doc, source);
    let entry = index
        .find_match(position)
        .ok_or(WriteError::TargetNotFound)?;
    let element = collect_elements(doc)
        .get(entry.id)
        .copied()
        .ok_or(WriteError::TargetNotFound)?;

    if element.kind == ElementKind::Fragment {
        return Err(WriteError::NotEditable {
            reason: "fragments cannot carry attributes".to_string(),
        });
    }
    if !element.opening_complete {
        return Err(WriteError::InvalidOpeningTag);
    }
    if let ClassAttribute::Dynamic { .. } = ClassAttribute::of(element) {
        return Err(WriteError::NotEditable {
            reason: "the class list is computed at runtime".to_string(),
        });
    }
    Ok(element)
}

pub(crate) fn parse_target(source: &str) -> WriteResult<Document> {
    snippet_parser::parse(source).map_err(|err| {
        tracing::debug!(error = %err, "write on unparsable buffer");
        WriteError::TargetNotFound
    })
}

/// Round to two decimals; anything closer to zero than 0.005 is zero
pub fn round_value(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.abs() < 0.005 {
        0.0
    } else {
        rounded
    }
}

/// Shortest decimal form of a rounded value: `10`, `1.5`, `-0.25`.
/// NaN and infinities have no CSS form and are rejected.
pub fn format_number(value: f64) -> WriteResult<String> {
    if !value.is_finite() {
        return Err(WriteError::NonFiniteValue { value });
    }
    let value = round_value(value);
    if value.fract() == 0.0 {
        return Ok(format!("{}", value as i64));
    }
    let text = format!("{:.2}", value);
    Ok(text.trim_end_matches('0').trim_end_matches('.').to_string())
}

pub fn format_px(value: f64) -> WriteResult<String> {
    Ok(format!("{}px", format_number(value)?))
}

/// String literal in `quote` quotes
pub fn quote_string(text: &str, quote: char) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Rewrite an element's class list: drop tokens matching `remove`, append
/// `add`. A token already equal to one being added keeps its position.
pub(crate) fn class_edits(
    source: &str,
    element: &Element,
    remove: impl Fn(&str) -> bool,
    add: &[&str],
) -> WriteResult<Vec<SourceEdit>> {
    let class = ClassAttribute::of(element);
    match class {
        ClassAttribute::Missing => {
            if add.is_empty() {
                return Ok(Vec::new());
            }
            Ok(vec![SourceEdit::insert(
                element.attribute_insert_offset(),
                format!(" className=\"{}\"", add.join(" ")),
            )])
        }
        ClassAttribute::Static { attribute, content } => {
            let tokens = class.tokens(source);
            let mut kept: Vec<&str> = tokens
                .iter()
                .copied()
                .filter(|token| add.contains(token) || !remove(*token))
                .collect();
            for &token in add {
                if !kept.contains(&token) {
                    kept.push(token);
                }
            }

            if kept == tokens {
                return Ok(Vec::new());
            }
            if kept.is_empty() {
                let span = attribute_removal_span(source, attribute);
                return Ok(vec![SourceEdit::delete(span.start, span.end)]);
            }
            Ok(vec![SourceEdit::new(content.start, content.end, kept.join(" "))])
        }
        ClassAttribute::Dynamic { .. } => Err(WriteError::NotEditable {
            reason: "the class list is computed at runtime".to_string(),
        }),
    }
}

/// Remove unprefixed tokens whose utility satisfies `matches`
pub(crate) fn utility_filter(matches: impl Fn(&str) -> bool) -> impl Fn(&str) -> bool {
    move |token: &str| unprefixed_utility(token).is_some_and(&matches)
}

/// A value to render into a style object, quoted to match its neighbours
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StyleLiteral {
    Number(String),
    Text(String),
}

impl StyleLiteral {
    fn render(&self, quote: char) -> String {
        match self {
            StyleLiteral::Number(number) => number.clone(),
            StyleLiteral::Text(text) => quote_string(text, quote),
        }
    }
}

fn key_matches(written: &str, key: &str) -> bool {
    written == key || camel_case(written) == key
}

fn render_key(key: &str) -> String {
    let identifier = key
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if identifier {
        key.to_string()
    } else {
        quote_string(key, '"')
    }
}

/// Quote used by the first string value in the object, `"` by default
fn object_quote(object: &ObjectLiteral) -> char {
    object
        .properties
        .iter()
        .find_map(|property| match property {
            Property::KeyValue { value, .. } => match value.as_ref() {
                Node::StringLiteral(literal) => Some(literal.quote),
                _ => None,
            },
            _ => None,
        })
        .unwrap_or('"')
}

/// Leading whitespace of the line holding `offset`, when only whitespace
/// precedes `offset` on that line
fn line_indent(source: &str, offset: usize) -> Option<&str> {
    let line_start = source[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let before = &source[line_start..offset];
    before
        .chars()
        .all(|c| c == ' ' || c == '\t')
        .then_some(before)
}

/// Indentation for a new property on its own line
fn property_indent(source: &str, object: &ObjectLiteral) -> String {
    if let Some(indent) = object
        .properties
        .first()
        .and_then(|property| line_indent(source, property.span().start))
    {
        return indent.to_string();
    }
    let close = object.span.end.saturating_sub(1);
    let close_indent = line_indent(source, close)
        .or_else(|| line_indent(source, object.span.start))
        .unwrap_or("");
    format!("{}  ", close_indent)
}

/// Text between two properties, following the object's layout
fn property_separator(source: &str, object: &ObjectLiteral) -> String {
    if object.span.slice(source).contains('\n') {
        format!(",\n{}", property_indent(source, object))
    } else {
        ", ".to_string()
    }
}

/// Offset past the comma after `end` and the whitespace following it
fn past_comma(source: &str, end: usize) -> Option<usize> {
    let rest = &source[end..];
    let after = rest.trim_start().strip_prefix(',')?;
    Some(source.len() - after.trim_start().len())
}

/// Merge `updates` into the element's inline style
pub(crate) fn style_edits(
    source: &str,
    element: &Element,
    updates: &[(String, Option<StyleLiteral>)],
) -> WriteResult<Vec<SourceEdit>> {
    let additions: Vec<(&str, &StyleLiteral)> = updates
        .iter()
        .filter_map(|(key, value)| value.as_ref().map(|value| (key.as_str(), value)))
        .collect();

    match StyleAttribute::of(element) {
        StyleAttribute::Missing => {
            if additions.is_empty() {
                return Ok(Vec::new());
            }
            Ok(vec![SourceEdit::insert(
                element.attribute_insert_offset(),
                format!(" style={{{}}}", new_object(&additions)),
            )])
        }
        StyleAttribute::Empty { attribute } => {
            if additions.is_empty() {
                return Ok(Vec::new());
            }
            let span = attribute.span();
            Ok(vec![SourceEdit::new(
                span.start,
                span.end,
                format!("style={{{}}}", new_object(&additions)),
            )])
        }
        StyleAttribute::String { .. } => {
            if additions.is_empty() {
                Ok(Vec::new())
            } else {
                Err(WriteError::StringStyle)
            }
        }
        StyleAttribute::Expression {
            container,
            expression,
            ..
        } => {
            if additions.is_empty() {
                return Ok(Vec::new());
            }
            let mut pieces = vec![format!("...{}", expression.span().slice(source))];
            pieces.extend(
                additions
                    .iter()
                    .map(|(key, value)| format!("{}: {}", render_key(key), value.render('"'))),
            );
            Ok(vec![SourceEdit::new(
                container.span.start,
                container.span.end,
                format!("{{{{ {} }}}}", pieces.join(", ")),
            )])
        }
        StyleAttribute::Object { attribute, object } => {
            merge_object(source, attribute, object, updates)
        }
    }
}

fn new_object(additions: &[(&str, &StyleLiteral)]) -> String {
    let pieces: Vec<String> = additions
        .iter()
        .map(|(key, value)| format!("{}: {}", render_key(key), value.render('"')))
        .collect();
    format!("{{ {} }}", pieces.join(", "))
}

/// Edit an object style in place. Only the properties being replaced, added
/// or removed are touched; comments and layout around them survive.
fn merge_object(
    source: &str,
    attribute: &Attribute,
    object: &ObjectLiteral,
    updates: &[(String, Option<StyleLiteral>)],
) -> WriteResult<Vec<SourceEdit>> {
    let quote = object_quote(object);
    let properties = &object.properties;

    let mut removed = vec![false; properties.len()];
    let mut edits = Vec::new();
    let mut additions = Vec::new();
    for (key, value) in updates {
        let found: Vec<usize> = properties
            .iter()
            .enumerate()
            .filter(|(_, property)| property_key(property).is_some_and(|written| key_matches(written, key)))
            .map(|(index, _)| index)
            .collect();

        match (value, found.split_last()) {
            (None, _) => found.iter().for_each(|&index| removed[index] = true),
            (Some(value), Some((&last, duplicates))) => {
                // The last duplicate wins at runtime; the others go
                duplicates.iter().for_each(|&index| removed[index] = true);
                if let Property::KeyValue { value: node, .. } = &properties[last] {
                    let span = node.span();
                    edits.push(SourceEdit::new(span.start, span.end, value.render(quote)));
                }
            }
            (Some(value), None) => {
                additions.push(format!("{}: {}", render_key(key), value.render(quote)));
            }
        }
    }

    let Some(last_kept) = (0..properties.len()).rev().find(|&index| !removed[index]) else {
        return Ok(match (properties.first(), properties.last()) {
            (Some(_), Some(_)) if additions.is_empty() => {
                let span = attribute_removal_span(source, attribute);
                vec![SourceEdit::delete(span.start, span.end)]
            }
            (Some(first), Some(last)) => {
                let separator = property_separator(source, object);
                vec![SourceEdit::new(first.span().start, last.span().end, additions.join(&separator))]
            }
            _ if additions.is_empty() => Vec::new(),
            _ => vec![SourceEdit::new(
                object.span.start,
                object.span.end,
                format!("{{ {} }}", additions.join(", ")),
            )],
        });
    };

    let mut index = 0;
    while index < properties.len() {
        if !removed[index] {
            index += 1;
            continue;
        }
        let run_start = index;
        while index < properties.len() && removed[index] {
            index += 1;
        }
        let start = properties[run_start].span().start;
        let end = properties[index - 1].span().end;
        if index < properties.len() {
            // Followed by a kept property: take the run's trailing comma
            edits.push(SourceEdit::delete(start, past_comma(source, end).unwrap_or(end)));
        } else {
            // Trailing run: take the comma before it, keep a trailing comma
            edits.push(SourceEdit::delete(properties[run_start - 1].span().end, end));
        }
    }

    if !additions.is_empty() {
        let separator = property_separator(source, object);
        let text = format!("{}{}", separator, additions.join(&separator));
        let anchor = properties[last_kept].span().end;
        match edits.iter_mut().find(|edit| edit.start == anchor && edit.end > anchor) {
            Some(trailing) => trailing.replacement = text,
            None => edits.push(SourceEdit::insert(anchor, text)),
        }
    }
    Ok(edits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_element_edits(
        source: &str,
        updates: &[(String, Option<StyleLiteral>)],
    ) -> WriteResult<String> {
        let doc = snippet_parser::parse(source).unwrap();
        let element = collect_elements(&doc)[0];
        let edits = style_edits(source, element, updates)?;
        Ok(apply_edits(source, &edits)?)
    }

    fn set(key: &str, text: &str) -> (String, Option<StyleLiteral>) {
        (key.to_string(), Some(StyleLiteral::Text(text.to_string())))
    }

    fn unset(key: &str) -> (String, Option<StyleLiteral>) {
        (key.to_string(), None)
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(10.0).unwrap(), "10");
        assert_eq!(format_number(10.004).unwrap(), "10");
        assert_eq!(format_number(1.5).unwrap(), "1.5");
        assert_eq!(format_number(-0.256).unwrap(), "-0.26");
        assert_eq!(format_number(0.004).unwrap(), "0");
        assert_eq!(format_number(-0.004).unwrap(), "0");
        assert_eq!(format_px(120.0).unwrap(), "120px");
    }

    #[test]
    fn test_non_finite_numbers_are_rejected() {
        assert!(matches!(format_number(f64::NAN), Err(WriteError::NonFiniteValue { .. })));
        assert_eq!(
            format_px(f64::INFINITY),
            Err(WriteError::NonFiniteValue { value: f64::INFINITY })
        );
        assert!(format_px(f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_quote_string() {
        assert_eq!(quote_string("a\"b", '"'), "\"a\\\"b\"");
        assert_eq!(quote_string("it's", '\''), "'it\\'s'");
    }

    #[test]
    fn test_replacement_is_byte_precise() {
        let source = "<div style={{ color:'red',   translate: '1px 2px' }} />";
        let out = first_element_edits(source, &[set("translate", "10px 20px")]).unwrap();
        assert_eq!(out, "<div style={{ color:'red',   translate: '10px 20px' }} />");
    }

    #[test]
    fn test_addition_keeps_single_line_layout() {
        let source = "<div style={{ color: \"red\" }} />";
        let out = first_element_edits(source, &[set("width", "10px")]).unwrap();
        assert_eq!(out, "<div style={{ color: \"red\", width: \"10px\" }} />");
    }

    #[test]
    fn test_multi_line_object_keeps_indentation() {
        let source = "<div\n  style={{\n    color: \"red\",\n    translate: \"1px 2px\",\n  }}\n/>";
        let out = first_element_edits(source, &[unset("translate"), set("height", "4px")]).unwrap();
        assert_eq!(
            out,
            "<div\n  style={{\n    color: \"red\",\n    height: \"4px\",\n  }}\n/>"
        );
    }

    #[test]
    fn test_removing_last_key_drops_attribute() {
        let source = "<div className=\"a\" style={{ translate: \"1px 2px\" }} />";
        let out = first_element_edits(source, &[unset("translate")]).unwrap();
        assert_eq!(out, "<div className=\"a\" />");
    }

    #[test]
    fn test_expression_style_is_wrapped() {
        let source = "<div style={base} />";
        let out = first_element_edits(source, &[set("translate", "3px 4px")]).unwrap();
        assert_eq!(out, "<div style={{ ...base, translate: \"3px 4px\" }} />");
    }

    #[test]
    fn test_string_style_is_rejected() {
        let source = "<div style=\"color: red\" />";
        assert_eq!(
            first_element_edits(source, &[set("width", "1px")]),
            Err(WriteError::StringStyle)
        );
        assert_eq!(first_element_edits(source, &[unset("width")]).unwrap(), source);
    }

    #[test]
    fn test_merge_keeps_comments() {
        let source = "<div\n  style={{\n    // brand color\n    color: \"red\",\n    /* sized by drag */\n    width: \"1px\",\n  }}\n/>";
        let out = first_element_edits(source, &[set("height", "4px")]).unwrap();
        assert_eq!(
            out,
            "<div\n  style={{\n    // brand color\n    color: \"red\",\n    /* sized by drag */\n    width: \"1px\",\n    height: \"4px\",\n  }}\n/>"
        );

        let out = first_element_edits(source, &[unset("color")]).unwrap();
        assert_eq!(
            out,
            "<div\n  style={{\n    // brand color\n    /* sized by drag */\n    width: \"1px\",\n  }}\n/>"
        );
    }

    #[test]
    fn test_duplicate_keys_collapse() {
        let source = "<div style={{ width: \"1px\", color: \"red\", width: \"2px\" }} />";
        let out = first_element_edits(source, &[set("width", "3px")]).unwrap();
        assert_eq!(out, "<div style={{ color: \"red\", width: \"3px\" }} />");

        let out = first_element_edits(source, &[unset("width")]).unwrap();
        assert_eq!(out, "<div style={{ color: \"red\" }} />");
    }

    #[test]
    fn test_kebab_keys_match() {
        let source = "<div style={{ \"font-size\": \"12px\" }} />";
        let out = first_element_edits(source, &[unset("fontSize")]).unwrap();
        assert_eq!(out, "<div />");
    }

    #[test]
    fn test_class_edits() {
        let source = "<div className=\"mx-auto  w-32 md:w-10\" />";
        let doc = snippet_parser::parse(source).unwrap();
        let element = collect_elements(&doc)[0];

        let remove = utility_filter(|utility| utility.starts_with("w-") || utility == "mx-auto");
        let edits = class_edits(source, element, &remove, &["mx-auto"]).unwrap();
        assert_eq!(
            apply_edits(source, &edits).unwrap(),
            "<div className=\"mx-auto md:w-10\" />"
        );

        // Nothing to change leaves the original spacing alone
        let edits = class_edits(source, element, |_| false, &["mx-auto"]).unwrap();
        assert!(edits.is_empty());
    }
}
