use logos::{FilterResult, Logos};
use std::fmt;

/// Token types for snippet script regions.
///
/// Markup regions are scanned character-wise by the parser, so this lexer
/// only has to cover the script side of a snippet.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\n\r\f\u{feff}]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token<'src> {
    /// Block comments are skipped by the callback and never emitted
    #[token("/*", block_comment)]
    BlockComment,

    // Keywords the statement parser dispatches on
    #[token("function")]
    Function,

    #[token("return")]
    Return,

    #[token("const")]
    Const,

    #[token("let")]
    Let,

    #[token("var")]
    Var,

    #[token("if")]
    If,

    #[token("else")]
    Else,

    #[token("import")]
    Import,

    #[token("export")]
    Export,

    #[token("default")]
    Default,

    #[token("async")]
    Async,

    #[token("class")]
    Class,

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice())]
    Ident(&'src str),

    #[regex(r"[0-9][0-9_]*(\.[0-9_]*)?([eE][+-]?[0-9]+)?n?", |lex| lex.slice())]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    #[regex(r"0[xXoObB][0-9a-fA-F_]+n?", |lex| lex.slice())]
    Number(&'src str),

    /// Quoted string, quotes included
    #[regex(r#""([^"\\\n]|\\[\s\S])*""#, |lex| lex.slice())]
    #[regex(r"'([^'\\\n]|\\[\s\S])*'", |lex| lex.slice())]
    Str(&'src str),

    #[token("`")]
    Backtick,

    // Punctuation
    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(";")]
    Semi,

    #[token(",")]
    Comma,

    #[token(".")]
    Dot,

    #[token("...")]
    Ellipsis,

    #[token("?")]
    Question,

    #[token("?.")]
    OptionalChain,

    #[token("??")]
    Nullish,

    #[token(":")]
    Colon,

    #[token("=>")]
    Arrow,

    #[token("=")]
    Assign,

    #[regex(r"(\+|-|\*\*?|/|%|&&?|\|\|?|\^|\?\?|<<|>>>?)=", |lex| lex.slice())]
    AssignOp(&'src str),

    #[regex(r"[=!]==?", |lex| lex.slice())]
    Equality(&'src str),

    #[token("<")]
    Lt,

    #[token(">")]
    Gt,

    #[token("<=")]
    Le,

    #[token(">=")]
    Ge,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("**")]
    StarStar,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("!")]
    Bang,

    #[token("~")]
    Tilde,

    #[token("&")]
    Amp,

    #[token("&&")]
    AndAnd,

    #[token("|")]
    Pipe,

    #[token("||")]
    OrOr,

    #[token("^")]
    Caret,

    #[token("++")]
    PlusPlus,

    #[token("--")]
    MinusMinus,

    #[token("@")]
    At,

    #[token("#")]
    Hash,
}

impl<'src> Token<'src> {
    /// Word-like text for tokens usable as property names (`a.default`, `{ class: 1 }`)
    pub fn word(&self) -> Option<&'src str> {
        match self {
            Token::Ident(name) => Some(name),
            Token::Function => Some("function"),
            Token::Return => Some("return"),
            Token::Const => Some("const"),
            Token::Let => Some("let"),
            Token::Var => Some("var"),
            Token::If => Some("if"),
            Token::Else => Some("else"),
            Token::Import => Some("import"),
            Token::Export => Some("export"),
            Token::Default => Some("default"),
            Token::Async => Some("async"),
            Token::Class => Some("class"),
            _ => None,
        }
    }

    pub fn is_opener(&self) -> bool {
        matches!(self, Token::LBrace | Token::LParen | Token::LBracket)
    }

    pub fn is_closer(&self) -> bool {
        matches!(self, Token::RBrace | Token::RParen | Token::RBracket)
    }
}

impl<'src> fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "identifier '{}'", name),
            Token::Number(raw) => write!(f, "number {}", raw),
            Token::Str(raw) => write!(f, "string {}", raw),
            Token::Backtick => write!(f, "'`'"),
            Token::LBrace => write!(f, "'{{'"),
            Token::RBrace => write!(f, "'}}'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::LBracket => write!(f, "'['"),
            Token::RBracket => write!(f, "']'"),
            Token::Semi => write!(f, "';'"),
            Token::Comma => write!(f, "','"),
            Token::Colon => write!(f, "':'"),
            Token::Arrow => write!(f, "'=>'"),
            Token::Lt => write!(f, "'<'"),
            Token::Gt => write!(f, "'>'"),
            other => match other.word() {
                Some(word) => write!(f, "keyword '{}'", word),
                None => write!(f, "{:?}", other),
            },
        }
    }
}

/// Skip to the closing `*/`; an unclosed comment swallows the rest as an error
fn block_comment<'src>(lex: &mut logos::Lexer<'src, Token<'src>>) -> FilterResult<(), ()> {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            FilterResult::Skip
        }
        None => {
            lex.bump(lex.remainder().len());
            FilterResult::Error(())
        }
    }
}

/// Tokenize a whole script buffer. Unknown characters are dropped.
pub fn tokenize(source: &str) -> Vec<(Token<'_>, std::ops::Range<usize>)> {
    Token::lexer(source)
        .spanned()
        .filter_map(|(result, span)| result.ok().map(|token| (token, span)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_and_identifiers() {
        let tokens = tokenize("const iffy = function() { return x }");
        let kinds: Vec<_> = tokens.iter().map(|(t, _)| *t).collect();
        assert_eq!(kinds[0], Token::Const);
        assert_eq!(kinds[1], Token::Ident("iffy"));
        assert_eq!(kinds[2], Token::Assign);
        assert_eq!(kinds[3], Token::Function);
        assert_eq!(kinds[7], Token::Return);
    }

    #[test]
    fn test_strings_keep_quotes() {
        let tokens = tokenize(r#"'a\'b' "c""#);
        assert_eq!(tokens[0].0, Token::Str(r"'a\'b'"));
        assert_eq!(tokens[1].0, Token::Str("\"c\""));
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = tokenize("a // line\n/* block */ b");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].1, 22..23);
    }

    #[test]
    fn test_block_comments_with_stars() {
        let tokens = tokenize("a /** doc * more **/ b /* x */");
        let kinds: Vec<_> = tokens.iter().map(|(t, _)| *t).collect();
        assert_eq!(kinds, vec![Token::Ident("a"), Token::Ident("b")]);
    }

    #[test]
    fn test_unclosed_block_comment_is_an_error() {
        let mut lexer = Token::lexer("a /* never closed");
        assert_eq!(lexer.next(), Some(Ok(Token::Ident("a"))));
        assert_eq!(lexer.next(), Some(Err(())));
        assert_eq!(lexer.next(), None);
    }

    #[test]
    fn test_operators() {
        let tokens = tokenize("a ?? b?.c => d !== e += 1");
        let kinds: Vec<_> = tokens.iter().map(|(t, _)| *t).collect();
        assert!(kinds.contains(&Token::Nullish));
        assert!(kinds.contains(&Token::OptionalChain));
        assert!(kinds.contains(&Token::Arrow));
        assert!(kinds.contains(&Token::Equality("!==")));
        assert!(kinds.contains(&Token::AssignOp("+=")));
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("1 2.5 .5 0xff 1e3");
        assert_eq!(tokens.len(), 5);
        assert!(tokens.iter().all(|(t, _)| matches!(t, Token::Number(_))));
    }
}
