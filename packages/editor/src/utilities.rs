//! Utility-class recognizers.
//!
//! Each style property owns one or more `(property, recognizer)` rows in
//! `RECOGNIZERS`. A recognizer looks at a normalized utility (variant prefix
//! and `!` stripped) and returns the value it encodes. Adding a property or a
//! utility family is a new row, not new control flow.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StyleProperty {
    BackgroundColor,
    BorderColor,
    BorderWidth,
    BorderRadius,
    TextColor,
    FontFamily,
    FontSize,
    FontWeight,
    FontStyle,
    LineHeight,
    LetterSpacing,
    TextAlign,
    TextTransform,
    TextDecoration,
    Padding,
    PaddingTop,
    PaddingRight,
    PaddingBottom,
    PaddingLeft,
}

impl StyleProperty {
    pub const ALL: [StyleProperty; 19] = [
        StyleProperty::BackgroundColor,
        StyleProperty::BorderColor,
        StyleProperty::BorderWidth,
        StyleProperty::BorderRadius,
        StyleProperty::TextColor,
        StyleProperty::FontFamily,
        StyleProperty::FontSize,
        StyleProperty::FontWeight,
        StyleProperty::FontStyle,
        StyleProperty::LineHeight,
        StyleProperty::LetterSpacing,
        StyleProperty::TextAlign,
        StyleProperty::TextTransform,
        StyleProperty::TextDecoration,
        StyleProperty::Padding,
        StyleProperty::PaddingTop,
        StyleProperty::PaddingRight,
        StyleProperty::PaddingBottom,
        StyleProperty::PaddingLeft,
    ];

    /// camelCase key of the inline style object
    pub fn style_key(self) -> &'static str {
        match self {
            StyleProperty::BackgroundColor => "backgroundColor",
            StyleProperty::BorderColor => "borderColor",
            StyleProperty::BorderWidth => "borderWidth",
            StyleProperty::BorderRadius => "borderRadius",
            StyleProperty::TextColor => "color",
            StyleProperty::FontFamily => "fontFamily",
            StyleProperty::FontSize => "fontSize",
            StyleProperty::FontWeight => "fontWeight",
            StyleProperty::FontStyle => "fontStyle",
            StyleProperty::LineHeight => "lineHeight",
            StyleProperty::LetterSpacing => "letterSpacing",
            StyleProperty::TextAlign => "textAlign",
            StyleProperty::TextTransform => "textTransform",
            StyleProperty::TextDecoration => "textDecoration",
            StyleProperty::Padding => "padding",
            StyleProperty::PaddingTop => "paddingTop",
            StyleProperty::PaddingRight => "paddingRight",
            StyleProperty::PaddingBottom => "paddingBottom",
            StyleProperty::PaddingLeft => "paddingLeft",
        }
    }

    /// Accepts camelCase and kebab-case keys
    pub fn from_style_key(key: &str) -> Option<Self> {
        let camel = camel_case(key);
        Self::ALL
            .into_iter()
            .find(|property| property.style_key() == camel)
    }
}

pub(crate) fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for c in key.chars() {
        if c == '-' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// A resolved style value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    Number(f64),
    Text(String),
}

impl StyleValue {
    pub fn text(value: impl Into<String>) -> Self {
        StyleValue::Text(value.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            StyleValue::Number(n) => Some(*n),
            StyleValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            StyleValue::Text(text) => Some(text),
            StyleValue::Number(_) => None,
        }
    }
}

impl From<f64> for StyleValue {
    fn from(value: f64) -> Self {
        StyleValue::Number(value)
    }
}

impl From<&str> for StyleValue {
    fn from(value: &str) -> Self {
        StyleValue::Text(value.to_string())
    }
}

impl From<String> for StyleValue {
    fn from(value: String) -> Self {
        StyleValue::Text(value)
    }
}

/// A class token split into its parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassToken<'a> {
    /// Everything up to and including the last top-level `:`
    pub variant: &'a str,
    pub important: bool,
    pub utility: &'a str,
}

impl<'a> ClassToken<'a> {
    pub fn parse(token: &'a str) -> Self {
        let mut depth = 0i32;
        let mut split = 0;
        for (i, byte) in token.bytes().enumerate() {
            match byte {
                b'[' => depth += 1,
                b']' => depth -= 1,
                b':' if depth == 0 => split = i + 1,
                _ => {}
            }
        }

        let (variant, rest) = token.split_at(split);
        match rest.strip_prefix('!') {
            Some(utility) => Self {
                variant,
                important: true,
                utility,
            },
            None => Self {
                variant,
                important: false,
                utility: rest,
            },
        }
    }

    pub fn is_unprefixed(&self) -> bool {
        self.variant.is_empty()
    }
}

/// Utility of an unprefixed token, None for variant-prefixed tokens
pub fn unprefixed_utility(token: &str) -> Option<&str> {
    let parsed = ClassToken::parse(token);
    parsed.is_unprefixed().then_some(parsed.utility)
}

/// Strict decimal number; rejects `inf`, `NaN` and exponents
pub fn parse_number(text: &str) -> Option<f64> {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    if digits.is_empty()
        || !digits.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        || !digits.bytes().any(|b| b.is_ascii_digit())
    {
        return None;
    }
    text.parse().ok()
}

/// Normalize a raw value: brackets unwrap (underscores become spaces), a
/// `px` suffix or a bare number becomes a number
pub fn normalize_value(raw: &str) -> StyleValue {
    let trimmed = raw.trim();
    let unwrapped = match trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    {
        Some(inner) => inner.replace('_', " "),
        None => trimmed.to_string(),
    };

    let number = unwrapped
        .strip_suffix("px")
        .and_then(parse_number)
        .or_else(|| parse_number(&unwrapped));
    match number {
        Some(n) => StyleValue::Number(n),
        None => StyleValue::Text(unwrapped),
    }
}

fn bracketed(value: &str) -> Option<&str> {
    value.strip_prefix('[')?.strip_suffix(']')
}

const COLOR_FUNCTIONS: &[&str] = &[
    "rgb(", "rgba(", "hsl(", "hsla(", "hwb(", "lab(", "lch(", "oklab(", "oklch(", "color(",
    "color-mix(",
];

fn is_hex_color(value: &str) -> bool {
    value.strip_prefix('#').is_some_and(|hex| {
        matches!(hex.len(), 3 | 4 | 6 | 8) && hex.bytes().all(|b| b.is_ascii_hexdigit())
    })
}

fn bracket_is_color(inner: &str) -> bool {
    inner.starts_with("color:")
        || is_hex_color(inner)
        || COLOR_FUNCTIONS.iter().any(|f| inner.starts_with(f))
}

const COLOR_KEYWORDS: &[&str] = &["transparent", "current", "black", "white", "inherit"];

const THEME_COLORS: &[&str] = &[
    "background",
    "foreground",
    "primary",
    "secondary",
    "muted",
    "accent",
    "destructive",
    "card",
    "popover",
    "border",
    "input",
    "ring",
];

const PALETTES: &[&str] = &[
    "slate", "gray", "zinc", "neutral", "stone", "red", "orange", "amber", "yellow", "lime",
    "green", "emerald", "teal", "cyan", "sky", "blue", "indigo", "violet", "purple", "fuchsia",
    "pink", "rose",
];

const SHADES: &[&str] = &[
    "50", "100", "200", "300", "400", "500", "600", "700", "800", "900", "950",
];

fn is_palette_color(value: &str) -> bool {
    let (color, opacity) = match value.split_once('/') {
        Some((color, opacity)) => (color, Some(opacity)),
        None => (value, None),
    };
    let opacity_ok = match opacity {
        None => true,
        Some(opacity) => {
            bracketed(opacity).is_some_and(|inner| !inner.is_empty())
                || (!opacity.is_empty() && opacity.bytes().all(|b| b.is_ascii_digit()))
        }
    };
    opacity_ok
        && color
            .rsplit_once('-')
            .is_some_and(|(palette, shade)| PALETTES.contains(&palette) && SHADES.contains(&shade))
}

/// Value of a color suffix such as `red-500`, `#fff` or `[rgb(0_0_0)]`
fn color(suffix: &str) -> Option<StyleValue> {
    if let Some(inner) = bracketed(suffix) {
        return bracket_is_color(inner).then(|| StyleValue::Text(inner.replace('_', " ")));
    }
    let theme = suffix.strip_suffix("-foreground").unwrap_or(suffix);
    let known = is_hex_color(suffix)
        || COLOR_KEYWORDS.contains(&suffix)
        || THEME_COLORS.contains(&theme)
        || is_palette_color(suffix);
    known.then(|| StyleValue::text(suffix))
}

/// Bracketed value that is not a color
fn arbitrary(suffix: &str) -> Option<StyleValue> {
    let inner = bracketed(suffix)?;
    (!inner.is_empty() && !bracket_is_color(inner)).then(|| normalize_value(suffix))
}

/// Spacing scale: `n` is `n * 4` pixels, `px` is one pixel
fn spacing(value: &str) -> Option<StyleValue> {
    if value == "px" {
        return Some(StyleValue::Number(1.0));
    }
    if let Some(n) = parse_number(value).filter(|n| *n >= 0.0) {
        return Some(StyleValue::Number(n * 4.0));
    }
    arbitrary(value)
}

fn lookup(table: &[(&str, f64)], key: &str) -> Option<StyleValue> {
    table
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, value)| StyleValue::Number(*value))
}

fn keyword(table: &[(&str, &str)], key: &str) -> Option<StyleValue> {
    table
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, value)| StyleValue::text(*value))
}

fn background_color(utility: &str) -> Option<StyleValue> {
    color(utility.strip_prefix("bg-")?)
}

fn border_color(utility: &str) -> Option<StyleValue> {
    color(utility.strip_prefix("border-")?)
}

fn border_width(utility: &str) -> Option<StyleValue> {
    if utility == "border" {
        return Some(StyleValue::Number(1.0));
    }
    let suffix = utility.strip_prefix("border-")?;
    if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
        return parse_number(suffix).map(StyleValue::Number);
    }
    arbitrary(suffix)
}

const RADII: &[(&str, f64)] = &[
    ("none", 0.0),
    ("xs", 2.0),
    ("sm", 2.0),
    ("md", 6.0),
    ("lg", 8.0),
    ("xl", 12.0),
    ("2xl", 16.0),
    ("3xl", 24.0),
    ("4xl", 32.0),
    ("full", 9999.0),
];

fn border_radius(utility: &str) -> Option<StyleValue> {
    if utility == "rounded" {
        return Some(StyleValue::Number(4.0));
    }
    let suffix = utility.strip_prefix("rounded-")?;
    lookup(RADII, suffix).or_else(|| arbitrary(suffix))
}

fn text_color(utility: &str) -> Option<StyleValue> {
    color(utility.strip_prefix("text-")?)
}

const FONT_SIZES: &[(&str, f64)] = &[
    ("xs", 12.0),
    ("sm", 14.0),
    ("base", 16.0),
    ("lg", 18.0),
    ("xl", 20.0),
    ("2xl", 24.0),
    ("3xl", 30.0),
    ("4xl", 36.0),
    ("5xl", 48.0),
    ("6xl", 60.0),
    ("7xl", 72.0),
    ("8xl", 96.0),
    ("9xl", 128.0),
];

fn font_size(utility: &str) -> Option<StyleValue> {
    let suffix = utility.strip_prefix("text-")?;
    lookup(FONT_SIZES, suffix).or_else(|| arbitrary(suffix))
}

fn font_family(utility: &str) -> Option<StyleValue> {
    let suffix = utility.strip_prefix("font-")?;
    if matches!(suffix, "sans" | "serif" | "mono") {
        return Some(StyleValue::text(suffix));
    }
    match arbitrary(suffix)? {
        StyleValue::Text(family) => Some(StyleValue::Text(family)),
        StyleValue::Number(_) => None,
    }
}

const FONT_WEIGHTS: &[(&str, f64)] = &[
    ("thin", 100.0),
    ("extralight", 200.0),
    ("light", 300.0),
    ("normal", 400.0),
    ("medium", 500.0),
    ("semibold", 600.0),
    ("bold", 700.0),
    ("extrabold", 800.0),
    ("black", 900.0),
];

fn font_weight(utility: &str) -> Option<StyleValue> {
    let suffix = utility.strip_prefix("font-")?;
    lookup(FONT_WEIGHTS, suffix).or_else(|| match arbitrary(suffix)? {
        StyleValue::Number(weight) => Some(StyleValue::Number(weight)),
        StyleValue::Text(_) => None,
    })
}

fn font_style(utility: &str) -> Option<StyleValue> {
    keyword(&[("italic", "italic"), ("not-italic", "normal")], utility)
}

const LEADINGS: &[(&str, f64)] = &[
    ("none", 1.0),
    ("tight", 1.25),
    ("snug", 1.375),
    ("normal", 1.5),
    ("relaxed", 1.625),
    ("loose", 2.0),
];

fn line_height(utility: &str) -> Option<StyleValue> {
    let suffix = utility.strip_prefix("leading-")?;
    lookup(LEADINGS, suffix).or_else(|| spacing(suffix))
}

const TRACKINGS: &[(&str, &str)] = &[
    ("tighter", "-0.05em"),
    ("tight", "-0.025em"),
    ("normal", "0em"),
    ("wide", "0.025em"),
    ("wider", "0.05em"),
    ("widest", "0.1em"),
];

fn letter_spacing(utility: &str) -> Option<StyleValue> {
    let suffix = utility.strip_prefix("tracking-")?;
    keyword(TRACKINGS, suffix).or_else(|| arbitrary(suffix))
}

fn text_align(utility: &str) -> Option<StyleValue> {
    let suffix = utility.strip_prefix("text-")?;
    matches!(suffix, "left" | "center" | "right" | "justify" | "start" | "end")
        .then(|| StyleValue::text(suffix))
}

fn text_transform(utility: &str) -> Option<StyleValue> {
    keyword(
        &[
            ("uppercase", "uppercase"),
            ("lowercase", "lowercase"),
            ("capitalize", "capitalize"),
            ("normal-case", "none"),
        ],
        utility,
    )
}

fn text_decoration(utility: &str) -> Option<StyleValue> {
    keyword(
        &[
            ("underline", "underline"),
            ("overline", "overline"),
            ("line-through", "line-through"),
            ("no-underline", "none"),
        ],
        utility,
    )
}

fn padding(utility: &str) -> Option<StyleValue> {
    spacing(utility.strip_prefix("p-")?)
}

fn padding_top(utility: &str) -> Option<StyleValue> {
    spacing(utility.strip_prefix("pt-")?)
}

fn padding_right(utility: &str) -> Option<StyleValue> {
    spacing(utility.strip_prefix("pr-")?)
}

fn padding_bottom(utility: &str) -> Option<StyleValue> {
    spacing(utility.strip_prefix("pb-")?)
}

fn padding_left(utility: &str) -> Option<StyleValue> {
    spacing(utility.strip_prefix("pl-")?)
}

fn padding_x(utility: &str) -> Option<StyleValue> {
    spacing(utility.strip_prefix("px-")?)
}

fn padding_y(utility: &str) -> Option<StyleValue> {
    spacing(utility.strip_prefix("py-")?)
}

pub type Recognize = fn(&str) -> Option<StyleValue>;

pub const RECOGNIZERS: &[(StyleProperty, Recognize)] = &[
    (StyleProperty::BackgroundColor, background_color),
    (StyleProperty::BorderColor, border_color),
    (StyleProperty::BorderWidth, border_width),
    (StyleProperty::BorderRadius, border_radius),
    (StyleProperty::TextColor, text_color),
    (StyleProperty::FontFamily, font_family),
    (StyleProperty::FontSize, font_size),
    (StyleProperty::FontWeight, font_weight),
    (StyleProperty::FontStyle, font_style),
    (StyleProperty::LineHeight, line_height),
    (StyleProperty::LetterSpacing, letter_spacing),
    (StyleProperty::TextAlign, text_align),
    (StyleProperty::TextTransform, text_transform),
    (StyleProperty::TextDecoration, text_decoration),
    (StyleProperty::Padding, padding),
    (StyleProperty::PaddingTop, padding_top),
    (StyleProperty::PaddingTop, padding_y),
    (StyleProperty::PaddingRight, padding_right),
    (StyleProperty::PaddingRight, padding_x),
    (StyleProperty::PaddingBottom, padding_bottom),
    (StyleProperty::PaddingBottom, padding_y),
    (StyleProperty::PaddingLeft, padding_left),
    (StyleProperty::PaddingLeft, padding_x),
];

/// Every `(property, value)` a normalized utility encodes
pub fn recognize(utility: &str) -> impl Iterator<Item = (StyleProperty, StyleValue)> + '_ {
    RECOGNIZERS
        .iter()
        .filter_map(move |(property, recognize)| recognize(utility).map(|value| (*property, value)))
}

/// Whether a normalized utility sets `property`
pub fn sets_property(utility: &str, property: StyleProperty) -> bool {
    RECOGNIZERS
        .iter()
        .any(|(owner, recognize)| *owner == property && recognize(utility).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(utility: &str) -> Vec<(StyleProperty, StyleValue)> {
        recognize(utility).collect()
    }

    #[test]
    fn test_token_parts() {
        let token = ClassToken::parse("md:hover:!bg-red-500");
        assert_eq!(token.variant, "md:hover:");
        assert!(token.important);
        assert_eq!(token.utility, "bg-red-500");

        // Colons inside brackets are part of the value
        let token = ClassToken::parse("bg-[color:var(--x)]");
        assert!(token.is_unprefixed());
        assert_eq!(token.utility, "bg-[color:var(--x)]");

        assert_eq!(unprefixed_utility("!w-32"), Some("w-32"));
        assert_eq!(unprefixed_utility("lg:w-32"), None);
    }

    #[test]
    fn test_colors() {
        assert_eq!(
            single("bg-red-500"),
            vec![(StyleProperty::BackgroundColor, StyleValue::text("red-500"))]
        );
        assert_eq!(
            single("bg-[#ff0000]"),
            vec![(StyleProperty::BackgroundColor, StyleValue::text("#ff0000"))]
        );
        assert_eq!(
            single("text-primary-foreground"),
            vec![(StyleProperty::TextColor, StyleValue::text("primary-foreground"))]
        );
        assert_eq!(
            single("border-sky-300/50"),
            vec![(StyleProperty::BorderColor, StyleValue::text("sky-300/50"))]
        );
        assert_eq!(
            single("bg-[rgb(0_0_0)]"),
            vec![(StyleProperty::BackgroundColor, StyleValue::text("rgb(0 0 0)"))]
        );
        assert!(single("bg-gradient-to-r").is_empty());
        assert!(single("bg-red-550").is_empty());
    }

    #[test]
    fn test_text_family_split() {
        assert_eq!(
            single("text-lg"),
            vec![(StyleProperty::FontSize, StyleValue::Number(18.0))]
        );
        assert_eq!(
            single("text-[14px]"),
            vec![(StyleProperty::FontSize, StyleValue::Number(14.0))]
        );
        assert_eq!(
            single("text-[#333]"),
            vec![(StyleProperty::TextColor, StyleValue::text("#333"))]
        );
        assert_eq!(
            single("text-center"),
            vec![(StyleProperty::TextAlign, StyleValue::text("center"))]
        );
    }

    #[test]
    fn test_borders_and_radius() {
        assert_eq!(
            single("border"),
            vec![(StyleProperty::BorderWidth, StyleValue::Number(1.0))]
        );
        assert_eq!(
            single("border-2"),
            vec![(StyleProperty::BorderWidth, StyleValue::Number(2.0))]
        );
        assert_eq!(
            single("border-[3px]"),
            vec![(StyleProperty::BorderWidth, StyleValue::Number(3.0))]
        );
        assert_eq!(
            single("border-border"),
            vec![(StyleProperty::BorderColor, StyleValue::text("border"))]
        );
        assert_eq!(
            single("rounded-lg"),
            vec![(StyleProperty::BorderRadius, StyleValue::Number(8.0))]
        );
        assert_eq!(
            single("rounded-[0.5rem]"),
            vec![(StyleProperty::BorderRadius, StyleValue::text("0.5rem"))]
        );
    }

    #[test]
    fn test_fonts() {
        assert_eq!(
            single("font-semibold"),
            vec![(StyleProperty::FontWeight, StyleValue::Number(600.0))]
        );
        assert_eq!(
            single("font-[550]"),
            vec![(StyleProperty::FontWeight, StyleValue::Number(550.0))]
        );
        assert_eq!(
            single("font-[Open_Sans]"),
            vec![(StyleProperty::FontFamily, StyleValue::text("Open Sans"))]
        );
        assert_eq!(
            single("not-italic"),
            vec![(StyleProperty::FontStyle, StyleValue::text("normal"))]
        );
        assert_eq!(
            single("leading-6"),
            vec![(StyleProperty::LineHeight, StyleValue::Number(24.0))]
        );
        assert_eq!(
            single("tracking-wide"),
            vec![(StyleProperty::LetterSpacing, StyleValue::text("0.025em"))]
        );
    }

    #[test]
    fn test_padding_axes() {
        assert_eq!(
            single("px-2"),
            vec![
                (StyleProperty::PaddingRight, StyleValue::Number(8.0)),
                (StyleProperty::PaddingLeft, StyleValue::Number(8.0)),
            ]
        );
        assert_eq!(
            single("p-px"),
            vec![(StyleProperty::Padding, StyleValue::Number(1.0))]
        );
        assert_eq!(
            single("pt-0.5"),
            vec![(StyleProperty::PaddingTop, StyleValue::Number(2.0))]
        );
        assert!(sets_property("py-4", StyleProperty::PaddingBottom));
        assert!(!sets_property("py-4", StyleProperty::PaddingLeft));
    }

    #[test]
    fn test_normalize_value() {
        assert_eq!(normalize_value("12px"), StyleValue::Number(12.0));
        assert_eq!(normalize_value(" 1.5 "), StyleValue::Number(1.5));
        assert_eq!(normalize_value("[2rem]"), StyleValue::text("2rem"));
        assert_eq!(normalize_value("[10px]"), StyleValue::Number(10.0));
        assert_eq!(normalize_value("1em"), StyleValue::text("1em"));
        assert_eq!(normalize_value("inf"), StyleValue::text("inf"));
        assert_eq!(normalize_value("8px 16px"), StyleValue::text("8px 16px"));
    }

    #[test]
    fn test_style_keys() {
        assert_eq!(
            StyleProperty::from_style_key("background-color"),
            Some(StyleProperty::BackgroundColor)
        );
        assert_eq!(
            StyleProperty::from_style_key("paddingLeft"),
            Some(StyleProperty::PaddingLeft)
        );
        assert_eq!(
            StyleProperty::from_style_key("color"),
            Some(StyleProperty::TextColor)
        );
        assert_eq!(StyleProperty::from_style_key("translate"), None);
    }
}
