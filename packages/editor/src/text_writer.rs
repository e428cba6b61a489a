//! Inline text edits: replace the literal text under the cursor.

use serde::{Deserialize, Serialize};
use snippet_sourcemap::{LineIndex, SourcePosition};

use crate::edits::SourceEdit;
use crate::errors::{WriteError, WriteResult};
use crate::inspect::InspectIndex;
use crate::writer::{finish, WriteOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRequest {
    pub position: SourcePosition,
    pub text: String,
}

/// Escape for a string or template literal delimited by `quote`
fn escape_literal(text: &str, quote: char) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' if quote != '`' => out.push_str("\\n"),
            '\r' if quote != '`' => out.push_str("\\r"),
            '$' if quote == '`' && chars.peek() == Some(&'{') => out.push_str("\\$"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Escape for markup text children
fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            c => out.push(c),
        }
    }
    out
}

/// Replace the text range at `request.position` with `request.text`
pub fn apply_text(source: &str, request: &TextRequest) -> WriteResult<WriteOutcome> {
    let index = InspectIndex::build(source);
    let (_, range) = index
        .find_text(request.position)
        .ok_or(WriteError::TextNotFound)?;

    let lines = LineIndex::new(source);
    let (Some(start), Some(end)) = (lines.offset(range.start()), lines.offset(range.end())) else {
        tracing::error!(?range, "text range outside the buffer it was indexed from");
        return Err(WriteError::TargetNotFound);
    };

    let quote = source[..start]
        .chars()
        .next_back()
        .filter(|c| matches!(c, '"' | '\'' | '`'));
    let replacement = match quote {
        Some(quote) => escape_literal(&request.text, quote),
        None => escape_markup(&request.text),
    };

    finish(source, vec![SourceEdit::new(start, end, replacement)])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(source: &str, line: u32, column: u32, text: &str) -> WriteResult<WriteOutcome> {
        apply_text(
            source,
            &TextRequest {
                position: SourcePosition::new(line, column),
                text: text.to_string(),
            },
        )
    }

    #[test]
    fn test_markup_text() {
        let source = "<h1>  Hello world </h1>";
        let outcome = write(source, 1, 8, "Hi <there>").unwrap();
        assert_eq!(outcome.source, "<h1>  Hi &lt;there&gt; </h1>");
    }

    #[test]
    fn test_string_literal_text() {
        let source = "<h1>{\"Hello\"}</h1>";
        let outcome = write(source, 1, 8, "Say \"hi\"").unwrap();
        assert_eq!(outcome.source, "<h1>{\"Say \\\"hi\\\"\"}</h1>");
    }

    #[test]
    fn test_same_text_is_unchanged() {
        let source = "<p>Same</p>";
        let outcome = write(source, 1, 5, "Same").unwrap();
        assert!(!outcome.changed);
        assert_eq!(outcome.source, source);
    }

    #[test]
    fn test_missing_text() {
        assert_eq!(write("<p>x</p>", 1, 2, "y"), Err(WriteError::TextNotFound));
    }

    #[test]
    fn test_template_escape() {
        assert_eq!(escape_literal("a${b}`", '`'), "a\\${b}\\`");
        assert_eq!(escape_markup("{x}"), "&#123;x&#125;");
    }
}
