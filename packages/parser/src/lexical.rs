//! Where comments, literal text and markup text sit in a buffer.
//!
//! The facts come from a full parse, so a quote inside markup text stays
//! text and a string inside a template interpolation is a string. Bytes the
//! parser never classified count as code, including everything after the
//! point where a too-deep buffer stopped parsing.

use crate::ast::Span;
use crate::parser::Parser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    Comment,
    /// Body of a quoted string or attribute string
    String,
    /// One quasi of a template literal
    Template,
    /// Markup text between tags
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexicalPiece {
    pub kind: PieceKind,
    pub span: Span,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LexicalScan {
    /// Sorted by start
    pub pieces: Vec<LexicalPiece>,
}

impl LexicalScan {
    /// Quoted string bodies and template quasis, in document order
    pub fn string_contents(&self) -> impl Iterator<Item = Span> + '_ {
        self.pieces
            .iter()
            .filter(|piece| matches!(piece.kind, PieceKind::String | PieceKind::Template))
            .map(|piece| piece.span)
    }

    /// The buffer with every piece blanked byte for byte.
    ///
    /// Newlines, quotes and backticks survive, so offsets and line numbers
    /// in the mask match the source.
    pub fn code_mask(&self, source: &str) -> String {
        let mut bytes = source.as_bytes().to_vec();
        for piece in &self.pieces {
            for byte in &mut bytes[piece.span.start..piece.span.end] {
                if *byte != b'\n' {
                    *byte = b' ';
                }
            }
        }
        String::from_utf8(bytes)
            .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
    }
}

pub fn scan(source: &str) -> LexicalScan {
    let mut parser = Parser::new(source);
    parser.parse_document();
    LexicalScan {
        pieces: parser.into_pieces(),
    }
}

/// The buffer with comments, literal bodies and markup text blanked
pub fn code_mask(source: &str) -> String {
    scan(source).code_mask(source)
}

/// Quoted string bodies and template quasis of a buffer
pub fn string_contents(source: &str) -> Vec<Span> {
    scan(source).string_contents().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<(PieceKind, &str)> {
        scan(source)
            .pieces
            .iter()
            .map(|piece| (piece.kind, piece.span.slice(source)))
            .collect()
    }

    #[test]
    fn test_pieces_in_order() {
        let source = "a / b // c\n/* d */ \"e\" + 'f' + `g${h}i`";
        assert_eq!(
            kinds(source),
            vec![
                (PieceKind::Comment, "// c"),
                (PieceKind::Comment, "/* d */"),
                (PieceKind::String, "e"),
                (PieceKind::String, "f"),
                (PieceKind::Template, "g"),
                (PieceKind::Template, "i"),
            ]
        );
    }

    #[test]
    fn test_unterminated_string_is_code() {
        assert!(scan("'abc\nnext").pieces.is_empty());
    }

    #[test]
    fn test_escaped_quote() {
        let contents = string_contents(r#"x = "a\"b" + 'c'"#);
        assert_eq!(contents, vec![Span::new(5, 9), Span::new(14, 15)]);
    }

    #[test]
    fn test_strings_inside_interpolations() {
        let source = "`px-2 ${cond ? \"a\" : {b}} py-1`";
        let contents: Vec<&str> = string_contents(source)
            .iter()
            .map(|span| span.slice(source))
            .collect();
        assert_eq!(contents, vec!["px-2 ", "a", " py-1"]);
    }

    #[test]
    fn test_code_mask_keeps_interpolations() {
        let source = "eval(\"x\") // eval(\n`${eval(1)}`";
        let mask = code_mask(source);
        assert_eq!(mask.len(), source.len());
        assert_eq!(mask, "eval(\" \")         \n`${eval(1)}`");
    }

    #[test]
    fn test_markup_text_is_not_code() {
        let source = "export default () => <p>Don't {eval(\"x\")}</p>;";
        let mask = code_mask(source);
        assert_eq!(mask, "export default () => <p>      {eval(\" \")}</p>;");
    }

    #[test]
    fn test_tag_comments_and_attribute_strings() {
        let source = "<div /* a */ id=\"x\">t</div>";
        assert_eq!(
            kinds(source),
            vec![
                (PieceKind::Comment, "/* a */"),
                (PieceKind::String, "x"),
                (PieceKind::Text, "t"),
            ]
        );
    }

    #[test]
    fn test_code_mask_multibyte() {
        let source = "a /* é */ b";
        let mask = code_mask(source);
        assert_eq!(mask.len(), source.len());
        assert!(mask.ends_with(" b"));
        assert!(mask.starts_with("a "));
    }

    #[test]
    fn test_unterminated_block_comment() {
        assert_eq!(kinds("x /* never"), vec![(PieceKind::Comment, "/* never")]);
    }
}
