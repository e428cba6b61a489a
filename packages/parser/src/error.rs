use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token at {pos}: expected {expected}, found {found}")]
    UnexpectedToken {
        pos: usize,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of file at {pos}")]
    UnexpectedEof { pos: usize },

    #[error("Invalid syntax at {pos}: {message}")]
    InvalidSyntax { pos: usize, message: String },

    #[error("Lexer error at {pos}")]
    LexerError { pos: usize },

    #[error("Unclosed element <{name}> opened at {pos}")]
    UnclosedElement { pos: usize, name: String },

    #[error("Nesting at {pos} goes deeper than {limit} levels")]
    NestingTooDeep { pos: usize, limit: usize },

    /// Nothing in the buffer could be recovered into a tree
    #[error("Source could not be parsed ({errors} errors)")]
    Unparsable { errors: usize },
}

impl ParseError {
    pub fn unexpected_token(pos: usize, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnexpectedToken {
            pos,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unexpected_eof(pos: usize) -> Self {
        Self::UnexpectedEof { pos }
    }

    pub fn invalid_syntax(pos: usize, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            pos,
            message: message.into(),
        }
    }

    pub fn lexer_error(pos: usize) -> Self {
        Self::LexerError { pos }
    }

    pub fn nesting_too_deep(pos: usize, limit: usize) -> Self {
        Self::NestingTooDeep { pos, limit }
    }

    pub fn unclosed_element(pos: usize, name: impl Into<String>) -> Self {
        Self::UnclosedElement {
            pos,
            name: name.into(),
        }
    }

    /// Byte offset the error points at, if any
    pub fn pos(&self) -> Option<usize> {
        match self {
            Self::UnexpectedToken { pos, .. }
            | Self::UnexpectedEof { pos }
            | Self::InvalidSyntax { pos, .. }
            | Self::LexerError { pos }
            | Self::UnclosedElement { pos, .. }
            | Self::NestingTooDeep { pos, .. } => Some(*pos),
            Self::Unparsable { .. } => None,
        }
    }
}

/// Render errors against their source with ariadne
#[cfg(feature = "pretty-errors")]
pub fn format_errors(source: &str, source_name: &str, errors: &[ParseError]) -> String {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let mut out = Vec::new();
    for error in errors {
        let pos = error.pos().unwrap_or(0).min(source.len());
        let end = source
            .get(pos..)
            .and_then(|rest| rest.chars().next())
            .map(|c| pos + c.len_utf8())
            .unwrap_or(pos);
        let report = Report::build(ReportKind::Error, source_name, pos)
            .with_message(error.to_string())
            .with_label(
                Label::new((source_name, pos..end))
                    .with_message("here")
                    .with_color(Color::Red),
            )
            .finish();
        if report
            .write((source_name, Source::from(source)), &mut out)
            .is_err()
        {
            out.extend_from_slice(error.to_string().as_bytes());
            out.push(b'\n');
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions() {
        assert_eq!(ParseError::unexpected_eof(4).pos(), Some(4));
        assert_eq!(ParseError::nesting_too_deep(9, 64).pos(), Some(9));
        assert_eq!(ParseError::Unparsable { errors: 2 }.pos(), None);
    }

    #[cfg(feature = "pretty-errors")]
    #[test]
    fn test_format_errors_mentions_message() {
        let rendered = format_errors(
            "const = 1",
            "main.tsx",
            &[ParseError::invalid_syntax(6, "expected binding name")],
        );
        assert!(rendered.contains("expected binding name"));
    }
}
