//! Property writes from the style panel. Each change lands in the inline
//! style and retires the unprefixed utilities that set the same property.

use serde::{Deserialize, Serialize};
use snippet_sourcemap::SourcePosition;

use crate::errors::WriteResult;
use crate::utilities::{sets_property, StyleProperty, StyleValue};
use crate::writer::{
    class_edits, finish, format_number, parse_target, resolve_target, style_edits, utility_filter,
    StyleLiteral, WriteOutcome,
};

/// Set (`Some`) or clear (`None`) one property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleChange {
    pub property: StyleProperty,
    #[serde(default)]
    pub value: Option<StyleValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleRequest {
    pub position: SourcePosition,
    pub changes: Vec<StyleChange>,
}

impl StyleRequest {
    pub fn new(position: SourcePosition) -> Self {
        Self {
            position,
            changes: Vec::new(),
        }
    }

    pub fn set(mut self, property: StyleProperty, value: impl Into<StyleValue>) -> Self {
        self.changes.push(StyleChange {
            property,
            value: Some(value.into()),
        });
        self
    }

    pub fn clear(mut self, property: StyleProperty) -> Self {
        self.changes.push(StyleChange {
            property,
            value: None,
        });
        self
    }
}

fn literal(value: &StyleValue) -> WriteResult<StyleLiteral> {
    Ok(match value {
        StyleValue::Number(number) => StyleLiteral::Number(format_number(*number)?),
        StyleValue::Text(text) => StyleLiteral::Text(text.clone()),
    })
}

/// Write property changes into the element at `request.position`
pub fn apply_style(source: &str, request: &StyleRequest) -> WriteResult<WriteOutcome> {
    let doc = parse_target(source)?;
    let element = resolve_target(&doc, source, request.position)?;

    let properties: Vec<StyleProperty> = request.changes.iter().map(|change| change.property).collect();
    let remove = utility_filter(|utility| {
        properties
            .iter()
            .any(|property| sets_property(utility, *property))
    });

    let updates: Vec<(String, Option<StyleLiteral>)> = request
        .changes
        .iter()
        .map(|change| {
            let value = change.value.as_ref().map(literal).transpose()?;
            Ok((change.property.style_key().to_string(), value))
        })
        .collect::<WriteResult<_>>()?;

    let mut edits = class_edits(source, element, remove, &[])?;
    edits.extend(style_edits(source, element, &updates)?);
    finish(source, edits)
}
