//! Layout writes: a drag or resize on the canvas becomes a translate offset,
//! pixel sizes and margin alignment classes on the selected element.

use serde::{Deserialize, Serialize};
use snippet_sourcemap::SourcePosition;

use crate::errors::WriteResult;
use crate::writer::{
    class_edits, finish, format_px, parse_target, resolve_target, round_value, style_edits,
    utility_filter, StyleLiteral, WriteOutcome,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Start,
    Center,
    End,
}

impl Alignment {
    fn horizontal_class(self) -> &'static str {
        match self {
            Alignment::Start => "mr-auto",
            Alignment::Center => "mx-auto",
            Alignment::End => "ml-auto",
        }
    }

    fn vertical_class(self) -> &'static str {
        match self {
            Alignment::Start => "mb-auto",
            Alignment::Center => "my-auto",
            Alignment::End => "mt-auto",
        }
    }
}

const HORIZONTAL_ALIGNMENT: [&str; 3] = ["mr-auto", "mx-auto", "ml-auto"];
const VERTICAL_ALIGNMENT: [&str; 3] = ["mb-auto", "my-auto", "mt-auto"];

const WIDTH_PREFIXES: [&str; 4] = ["w-", "min-w-", "max-w-", "size-"];
const HEIGHT_PREFIXES: [&str; 4] = ["h-", "min-h-", "max-h-", "size-"];

/// A drag or resize of one element, in canvas pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRequest {
    pub position: SourcePosition,
    #[serde(default)]
    pub translate_x: f64,
    #[serde(default)]
    pub translate_y: f64,
    #[serde(default)]
    pub align_x: Option<Alignment>,
    #[serde(default)]
    pub align_y: Option<Alignment>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

impl LayoutRequest {
    pub fn translate(position: SourcePosition, x: f64, y: f64) -> Self {
        Self {
            position,
            translate_x: x,
            translate_y: y,
            align_x: None,
            align_y: None,
            width: None,
            height: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutOptions {
    /// Offsets within this many pixels of zero count as zero when the axis
    /// snapped to an alignment
    pub snap_threshold: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self { snap_threshold: 0.5 }
    }
}

/// Rounded offset of one axis, and the alignment it snapped to
fn resolve_axis(
    offset: f64,
    alignment: Option<Alignment>,
    options: &LayoutOptions,
) -> (f64, Option<Alignment>) {
    let offset = round_value(offset);
    match alignment {
        Some(alignment) if offset.abs() <= options.snap_threshold => (0.0, Some(alignment)),
        _ => (offset, None),
    }
}

fn has_prefix(utility: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|prefix| utility.starts_with(prefix))
}

/// Write a layout change into the element at `request.position`
pub fn apply_layout(
    source: &str,
    request: &LayoutRequest,
    options: &LayoutOptions,
) -> WriteResult<WriteOutcome> {
    let doc = parse_target(source)?;
    let element = resolve_target(&doc, source, request.position)?;

    let (x, snapped_x) = resolve_axis(request.translate_x, request.align_x, options);
    let (y, snapped_y) = resolve_axis(request.translate_y, request.align_y, options);

    let mut add = Vec::new();
    if let Some(alignment) = snapped_x {
        add.push(alignment.horizontal_class());
    }
    if let Some(alignment) = snapped_y {
        add.push(alignment.vertical_class());
    }

    let remove = utility_filter(|utility| {
        (request.align_x.is_some() && HORIZONTAL_ALIGNMENT.contains(&utility))
            || (request.align_y.is_some() && VERTICAL_ALIGNMENT.contains(&utility))
            || utility.starts_with("translate-")
            || utility.starts_with("-translate-")
            || (request.width.is_some() && has_prefix(utility, &WIDTH_PREFIXES))
            || (request.height.is_some() && has_prefix(utility, &HEIGHT_PREFIXES))
    });

    let mut updates = Vec::new();
    let translate = if x == 0.0 && y == 0.0 {
        None
    } else {
        Some(StyleLiteral::Text(format!("{} {}", format_px(x)?, format_px(y)?)))
    };
    updates.push(("translate".to_string(), translate));
    if let Some(width) = request.width {
        updates.push(("width".to_string(), Some(StyleLiteral::Text(format_px(width)?))));
    }
    if let Some(height) = request.height {
        updates.push(("height".to_string(), Some(StyleLiteral::Text(format_px(height)?))));
    }

    let mut edits = class_edits(source, element, remove, &add)?;
    edits.extend(style_edits(source, element, &updates)?);

    tracing::debug!(
        element = element.name.as_deref().unwrap_or(""),
        edits = edits.len(),
        "layout write"
    );
    finish(source, edits)
}
