//! Error-tolerant parser for snippet component sources.
//!
//! Produces just enough structure to locate markup elements, their
//! attributes and literal content, with byte spans on every node.

pub mod ast;
pub mod error;
pub mod lexical;
pub mod parser;
pub mod tokenizer;
pub mod visitor;

pub use ast::*;
pub use error::{ParseError, ParseResult};
#[cfg(feature = "pretty-errors")]
pub use error::format_errors;
pub use lexical::{code_mask, string_contents, LexicalPiece, LexicalScan, PieceKind};
pub use parser::{parse, Parser, MAX_ELEMENT_DEPTH, MAX_NESTING};
pub use tokenizer::{tokenize, Token};
pub use visitor::Visitor;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenizer_basic() {
        let source = "const Button = () => <button />";
        let tokens = tokenize(source);
        assert_eq!(tokens.len(), 10);
    }
}
