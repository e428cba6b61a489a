//! # Style State Reader
//!
//! Computes the canonical style snapshot of the element at a position from
//! its class list and its inline style object. Class tokens resolve through
//! the recognizer table with last-token-wins; inline entries override them.

use serde::{Deserialize, Serialize};
use snippet_parser::ast::*;
use snippet_sourcemap::SourcePosition;

use crate::attributes::{property_key, ClassAttribute, StyleAttribute};
use crate::inspect::{collect_elements, InspectIndex};
use crate::utilities::{normalize_value, parse_number, recognize, ClassToken, StyleProperty, StyleValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassNameKind {
    Static,
    Dynamic,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleKind {
    Object,
    Dynamic,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Class,
    Inline,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyState {
    pub present: bool,
    pub value: Option<StyleValue>,
    pub source: Option<ValueSource>,
}

impl PropertyState {
    fn set(&mut self, value: StyleValue, source: ValueSource) {
        self.present = true;
        self.value = Some(value);
        self.source = Some(source);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StylePropertySnapshot {
    pub background_color: PropertyState,
    pub border_color: PropertyState,
    pub border_width: PropertyState,
    pub border_radius: PropertyState,
    pub text_color: PropertyState,
    pub font_family: PropertyState,
    pub font_size: PropertyState,
    pub font_weight: PropertyState,
    pub font_style: PropertyState,
    pub line_height: PropertyState,
    pub letter_spacing: PropertyState,
    pub text_align: PropertyState,
    pub text_transform: PropertyState,
    pub text_decoration: PropertyState,
    pub padding: PropertyState,
    pub padding_top: PropertyState,
    pub padding_right: PropertyState,
    pub padding_bottom: PropertyState,
    pub padding_left: PropertyState,
}

impl StylePropertySnapshot {
    pub fn get(&self, property: StyleProperty) -> &PropertyState {
        match property {
            StyleProperty::BackgroundColor => &self.background_color,
            StyleProperty::BorderColor => &self.border_color,
            StyleProperty::BorderWidth => &self.border_width,
            StyleProperty::BorderRadius => &self.border_radius,
            StyleProperty::TextColor => &self.text_color,
            StyleProperty::FontFamily => &self.font_family,
            StyleProperty::FontSize => &self.font_size,
            StyleProperty::FontWeight => &self.font_weight,
            StyleProperty::FontStyle => &self.font_style,
            StyleProperty::LineHeight => &self.line_height,
            StyleProperty::LetterSpacing => &self.letter_spacing,
            StyleProperty::TextAlign => &self.text_align,
            StyleProperty::TextTransform => &self.text_transform,
            StyleProperty::TextDecoration => &self.text_decoration,
            StyleProperty::Padding => &self.padding,
            StyleProperty::PaddingTop => &self.padding_top,
            StyleProperty::PaddingRight => &self.padding_right,
            StyleProperty::PaddingBottom => &self.padding_bottom,
            StyleProperty::PaddingLeft => &self.padding_left,
        }
    }

    pub fn get_mut(&mut self, property: StyleProperty) -> &mut PropertyState {
        match property {
            StyleProperty::BackgroundColor => &mut self.background_color,
            StyleProperty::BorderColor => &mut self.border_color,
            StyleProperty::BorderWidth => &mut self.border_width,
            StyleProperty::BorderRadius => &mut self.border_radius,
            StyleProperty::TextColor => &mut self.text_color,
            StyleProperty::FontFamily => &mut self.font_family,
            StyleProperty::FontSize => &mut self.font_size,
            StyleProperty::FontWeight => &mut self.font_weight,
            StyleProperty::FontStyle => &mut self.font_style,
            StyleProperty::LineHeight => &mut self.line_height,
            StyleProperty::LetterSpacing => &mut self.letter_spacing,
            StyleProperty::TextAlign => &mut self.text_align,
            StyleProperty::TextTransform => &mut self.text_transform,
            StyleProperty::TextDecoration => &mut self.text_decoration,
            StyleProperty::Padding => &mut self.padding,
            StyleProperty::PaddingTop => &mut self.padding_top,
            StyleProperty::PaddingRight => &mut self.padding_right,
            StyleProperty::PaddingBottom => &mut self.padding_bottom,
            StyleProperty::PaddingLeft => &mut self.padding_left,
        }
    }

    /// Properties that are explicitly set
    pub fn present(&self) -> impl Iterator<Item = (StyleProperty, &PropertyState)> {
        StyleProperty::ALL
            .into_iter()
            .map(|property| (property, self.get(property)))
            .filter(|(_, state)| state.present)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleState {
    pub found: bool,
    /// Why the element was not found or cannot be edited
    pub reason: Option<String>,
    pub editable: bool,
    pub entry_id: Option<usize>,
    pub element_name: Option<String>,
    pub class_name_kind: ClassNameKind,
    pub class_names: Vec<String>,
    pub style_kind: StyleKind,
    pub properties: StylePropertySnapshot,
}

impl StyleState {
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self {
            found: false,
            reason: Some(reason.into()),
            editable: false,
            entry_id: None,
            element_name: None,
            class_name_kind: ClassNameKind::None,
            class_names: Vec::new(),
            style_kind: StyleKind::None,
            properties: StylePropertySnapshot::default(),
        }
    }
}

const NO_ELEMENT: &str = "no element at the selected position";

/// Read the style state of the innermost element at `position`
pub fn read_style_state(source: &str, position: SourcePosition) -> StyleState {
    let doc = match snippet_parser::parse(source) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::debug!(error = %err, "style read on unparsable buffer");
            return StyleState::not_found(NO_ELEMENT);
        }
    };

    let index = InspectIndex::from_document(&doc, source);
    let Some(entry) = index.find_match(position) else {
        return StyleState::not_found(NO_ELEMENT);
    };
    let elements = collect_elements(&doc);
    let Some(element) = elements.get(entry.id) else {
        return StyleState::not_found(NO_ELEMENT);
    };

    element_style_state(source, element, entry.id)
}

/// Style state of one parsed element
pub fn element_style_state(source: &str, element: &Element, entry_id: usize) -> StyleState {
    let mut state = StyleState {
        found: true,
        reason: None,
        editable: true,
        entry_id: Some(entry_id),
        element_name: element.name.clone(),
        class_name_kind: ClassNameKind::None,
        class_names: Vec::new(),
        style_kind: StyleKind::None,
        properties: StylePropertySnapshot::default(),
    };

    if element.kind == ElementKind::Fragment {
        state.editable = false;
        state.reason = Some("fragments cannot carry attributes".to_string());
        return state;
    }
    if !element.opening_complete {
        state.editable = false;
        state.reason = Some("the opening tag is incomplete".to_string());
    }

    let class = ClassAttribute::of(element);
    match class {
        ClassAttribute::Missing => {}
        ClassAttribute::Static { .. } => {
            state.class_name_kind = ClassNameKind::Static;
            let tokens = class.tokens(source);
            apply_class_tokens(&mut state.properties, &tokens);
            state.class_names = tokens.into_iter().map(str::to_string).collect();
        }
        ClassAttribute::Dynamic { .. } => {
            state.class_name_kind = ClassNameKind::Dynamic;
            state.editable = false;
            state.reason = Some("the class list is computed at runtime".to_string());
        }
    }

    match StyleAttribute::of(element) {
        StyleAttribute::Missing => {}
        StyleAttribute::Object { object, .. } => {
            state.style_kind = StyleKind::Object;
            apply_inline_style(&mut state.properties, source, object);
        }
        StyleAttribute::Expression { .. }
        | StyleAttribute::Empty { .. }
        | StyleAttribute::String { .. } => state.style_kind = StyleKind::Dynamic,
    }

    state
}

/// Resolve class tokens in document order; the last match per property wins
pub fn apply_class_tokens(properties: &mut StylePropertySnapshot, tokens: &[&str]) {
    for token in tokens {
        let utility = ClassToken::parse(token).utility;
        for (property, value) in recognize(utility) {
            properties.get_mut(property).set(value, ValueSource::Class);
        }
    }
}

/// Value of an inline style entry, for string and number literals
pub fn inline_value(source: &str, value: &Node) -> Option<StyleValue> {
    match value.unparenthesized() {
        Node::StringLiteral(literal) => Some(normalize_value(&literal.value)),
        Node::TemplateLiteral(template) if template.is_static() => {
            Some(normalize_value(template.content.slice(source)))
        }
        Node::NumberLiteral { raw, .. } => parse_number(raw).map(StyleValue::Number),
        // Negative numbers
        Node::Compound {
            kind: CompoundKind::Unary,
            span,
            ..
        } => parse_number(&span.slice(source).replace(char::is_whitespace, "")).map(StyleValue::Number),
        _ => None,
    }
}

fn apply_inline_style(properties: &mut StylePropertySnapshot, source: &str, object: &ObjectLiteral) {
    for property in &object.properties {
        let Property::KeyValue { value, .. } = property else {
            continue;
        };
        let Some(style_property) = property_key(property).and_then(StyleProperty::from_style_key) else {
            continue;
        };
        if let Some(value) = inline_value(source, value) {
            properties.get_mut(style_property).set(value, ValueSource::Inline);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(source: &str, line: u32, column: u32) -> StyleState {
        read_style_state(source, SourcePosition::new(line, column))
    }

    #[test]
    fn test_inline_wins_over_class() {
        let source = r##"<div className="bg-background p-4" style={{ backgroundColor: "#ff0000" }}>x</div>"##;
        let state = at(source, 1, 2);
        assert!(state.found);
        assert!(state.editable);
        assert_eq!(
            state.properties.background_color.value,
            Some(StyleValue::text("#ff0000"))
        );
        assert_eq!(state.properties.background_color.source, Some(ValueSource::Inline));
        assert_eq!(state.properties.padding.value, Some(StyleValue::Number(16.0)));
        assert_eq!(state.style_kind, StyleKind::Object);
    }

    #[test]
    fn test_last_token_wins() {
        let state = at(r#"<div className="bg-red-500 bg-blue-500" />"#, 1, 2);
        assert_eq!(
            state.properties.background_color.value,
            Some(StyleValue::text("blue-500"))
        );
        assert_eq!(state.class_names, vec!["bg-red-500", "bg-blue-500"]);
    }

    #[test]
    fn test_variants_and_important_are_stripped() {
        let state = at(r#"<p className="md:text-lg !font-bold hover:underline">a</p>"#, 1, 2);
        assert_eq!(state.properties.font_size.value, Some(StyleValue::Number(18.0)));
        assert_eq!(state.properties.font_weight.value, Some(StyleValue::Number(700.0)));
        assert_eq!(
            state.properties.text_decoration.value,
            Some(StyleValue::text("underline"))
        );
    }

    #[test]
    fn test_inline_only_counts_as_present() {
        let state = at(r#"<p style={{ "font-size": "12px", lineHeight: 1.5, marginTop: -4, letterSpacing: -1 }}>a</p>"#, 1, 2);
        assert!(state.properties.font_size.present);
        assert_eq!(state.properties.font_size.value, Some(StyleValue::Number(12.0)));
        assert_eq!(state.properties.line_height.value, Some(StyleValue::Number(1.5)));
        assert_eq!(state.properties.letter_spacing.value, Some(StyleValue::Number(-1.0)));
        assert_eq!(state.class_name_kind, ClassNameKind::None);
        assert!(!state.properties.padding.present);
        assert_eq!(state.properties.present().count(), 3);
    }

    #[test]
    fn test_dynamic_class_list_is_not_editable() {
        let state = at("<div className={cn('p-4', active && 'bg-red-500')} />", 1, 2);
        assert!(state.found);
        assert!(!state.editable);
        assert_eq!(state.class_name_kind, ClassNameKind::Dynamic);
        assert!(state.reason.is_some());
    }

    #[test]
    fn test_dynamic_style() {
        let state = at("<div style={styles.box} className=\"p-2\" />", 1, 2);
        assert_eq!(state.style_kind, StyleKind::Dynamic);
        assert!(state.editable);
        assert_eq!(state.properties.padding.value, Some(StyleValue::Number(8.0)));
    }

    #[test]
    fn test_not_found() {
        let state = at("const x = 1;", 1, 3);
        assert!(!state.found);
        assert_eq!(state.reason.as_deref(), Some(NO_ELEMENT));
        let state = at("((((", 1, 1);
        assert!(!state.found);
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let state = at(r#"<div className="text-center" />"#, 1, 2);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["classNameKind"], "static");
        assert_eq!(json["properties"]["textAlign"]["value"], "center");
        assert_eq!(json["properties"]["textAlign"]["source"], "class");
    }
}
