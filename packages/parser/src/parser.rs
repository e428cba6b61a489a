use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::lexical::{LexicalPiece, PieceKind};
use crate::tokenizer::Token;
use logos::Logos;

mod jsx;

pub use jsx::MAX_ELEMENT_DEPTH;

/// Nested statements, expressions and types before a buffer is given up on
pub const MAX_NESTING: usize = 512;

/// A token lexed at the cursor, with the trivia before it accounted for
#[derive(Debug, Clone, Copy)]
struct Lexed<'src> {
    token: Option<Token<'src>>,
    span: Span,
    newline_before: bool,
}

#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    pos: usize,
    prev_end: usize,
    errors: usize,
    pieces: usize,
}

/// Error-tolerant recursive descent parser for snippet sources.
///
/// Script regions are lexed on demand from a byte cursor so that markup can
/// be scanned character-wise from the same position. Comments, literal text
/// and markup text are noted as they are passed over.
pub struct Parser<'src> {
    source: &'src str,
    pos: usize,
    prev_end: usize,
    lookahead: Option<Lexed<'src>>,
    errors: Vec<ParseError>,
    pieces: Vec<LexicalPiece>,
    depth: usize,
    element_depth: usize,
    /// Set once nesting passes a limit; parsing then unwinds
    too_deep: Option<ParseError>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            prev_end: 0,
            lookahead: None,
            errors: Vec::new(),
            pieces: Vec::new(),
            depth: 0,
            element_depth: 0,
            too_deep: None,
        }
    }

    /// The nesting error that stopped the parse, if any
    pub fn too_deep(&self) -> Option<&ParseError> {
        self.too_deep.as_ref()
    }

    /// Comments, literal text and markup text passed over, sorted by start
    pub fn into_pieces(self) -> Vec<LexicalPiece> {
        let mut pieces = self.pieces;
        pieces.sort_by_key(|piece| (piece.span.start, piece.span.end));
        pieces.dedup();
        pieces
    }

    /// Parse a complete buffer, recording errors instead of stopping at them
    pub fn parse_document(&mut self) -> Document {
        let mut body = Vec::new();

        while self.too_deep.is_none() && self.peek().is_some() {
            let before = self.pos;
            match self.parse_statement() {
                Ok(Some(node)) => body.push(node),
                Ok(None) => {}
                Err(err) => self.errors.push(err),
            }
            if self.pos == before {
                self.advance();
            }
        }

        Document {
            body,
            errors: std::mem::take(&mut self.errors),
            span: Span::new(0, self.source.len()),
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_statement(&mut self) -> ParseResult<Option<Node>> {
        self.nested(Self::statement)
    }

    fn statement(&mut self) -> ParseResult<Option<Node>> {
        let Some(token) = self.peek() else {
            return Err(ParseError::unexpected_eof(self.source.len()));
        };

        match token {
            Token::Semi => {
                self.advance();
                Ok(None)
            }
            Token::LBrace => {
                let (body, span) = self.parse_block()?;
                Ok(Some(Node::compound(CompoundKind::Block, body, span)))
            }
            Token::Import => match self.peek_after() {
                Some(Token::LParen) | Some(Token::Dot) => self.parse_expression_statement(),
                _ => {
                    self.skip_module_clause();
                    Ok(None)
                }
            },
            Token::Export => self.parse_export(),
            Token::Const | Token::Let | Token::Var => self.parse_declaration().map(Some),
            Token::Function => self
                .parse_function(FunctionKind::Declaration)
                .map(|f| Some(Node::Function(f))),
            Token::Async if self.peek_after() == Some(Token::Function) => self
                .parse_function(FunctionKind::Declaration)
                .map(|f| Some(Node::Function(f))),
            Token::Class => self.parse_class().map(Some),
            Token::Return => self.parse_return().map(Some),
            Token::If => self.parse_if().map(Some),
            Token::Default => {
                // `default:` label inside a switch body
                self.advance();
                self.match_token(Token::Colon);
                Ok(None)
            }
            Token::Ident(word) => self.parse_word_statement(word),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_word_statement(&mut self, word: &'src str) -> ParseResult<Option<Node>> {
        let start = self.peek_span().start;
        match word {
            "for" | "while" | "switch" | "with" => {
                self.advance();
                if self.check_ident("await") {
                    self.advance();
                }
                if self.check(Token::LParen) {
                    self.skip_balanced()?;
                }
                let body = self.parse_statement()?;
                Ok(Some(Node::compound(
                    CompoundKind::Statement,
                    body.into_iter().collect(),
                    Span::new(start, self.prev_end),
                )))
            }
            "do" => {
                self.advance();
                let body = self.parse_statement()?;
                if self.check_ident("while") {
                    self.advance();
                    if self.check(Token::LParen) {
                        self.skip_balanced()?;
                    }
                }
                self.match_token(Token::Semi);
                Ok(Some(Node::compound(
                    CompoundKind::Statement,
                    body.into_iter().collect(),
                    Span::new(start, self.prev_end),
                )))
            }
            "try" => {
                self.advance();
                let mut children = Vec::new();
                let (body, span) = self.parse_block()?;
                children.push(Node::compound(CompoundKind::Block, body, span));
                if self.check_ident("catch") {
                    self.advance();
                    if self.check(Token::LParen) {
                        self.skip_balanced()?;
                    }
                    let (body, span) = self.parse_block()?;
                    children.push(Node::compound(CompoundKind::Block, body, span));
                }
                if self.check_ident("finally") {
                    self.advance();
                    let (body, span) = self.parse_block()?;
                    children.push(Node::compound(CompoundKind::Block, body, span));
                }
                Ok(Some(Node::compound(
                    CompoundKind::Statement,
                    children,
                    Span::new(start, self.prev_end),
                )))
            }
            "case" => {
                self.advance();
                let test = self.parse_expression()?;
                self.expect(Token::Colon)?;
                Ok(Some(test))
            }
            "throw" => {
                self.advance();
                let argument = self.parse_expression()?;
                self.match_token(Token::Semi);
                Ok(Some(Node::compound(
                    CompoundKind::Statement,
                    vec![argument],
                    Span::new(start, self.prev_end),
                )))
            }
            "break" | "continue" => {
                self.advance();
                if let Some(lexed) = self.peek_lexed() {
                    if matches!(lexed.token, Some(Token::Ident(_))) && !lexed.newline_before {
                        self.advance();
                    }
                }
                self.match_token(Token::Semi);
                Ok(None)
            }
            "type" if self.next_is_word_on_same_line() => {
                self.advance();
                self.advance();
                if self.check(Token::Lt) {
                    self.skip_angle();
                }
                if self.match_token(Token::Assign) {
                    self.skip_type();
                }
                self.match_token(Token::Semi);
                Ok(None)
            }
            "interface" | "enum" | "namespace" | "module" if self.next_is_word_on_same_line() => {
                while let Some(token) = self.peek() {
                    if token == Token::LBrace {
                        self.skip_balanced()?;
                        break;
                    }
                    if token == Token::Semi {
                        break;
                    }
                    self.advance();
                }
                Ok(None)
            }
            "declare" | "abstract" if self.next_is_word_on_same_line() => {
                self.advance();
                self.parse_statement()
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_expression_statement(&mut self) -> ParseResult<Option<Node>> {
        let expr = self.parse_expression()?;
        self.match_token(Token::Semi);
        Ok(Some(expr))
    }

    /// `{ statements }`, recovering from statement-level errors inside
    fn parse_block(&mut self) -> ParseResult<(Vec<Node>, Span)> {
        let open = self.expect(Token::LBrace)?;
        let mut body = Vec::new();

        while self.too_deep.is_none() {
            match self.peek() {
                None => {
                    self.errors
                        .push(ParseError::unexpected_eof(self.source.len()));
                    break;
                }
                Some(Token::RBrace) => {
                    self.advance();
                    break;
                }
                Some(_) => {
                    let before = self.pos;
                    match self.parse_statement() {
                        Ok(Some(node)) => body.push(node),
                        Ok(None) => {}
                        Err(err) => self.errors.push(err),
                    }
                    if self.pos == before {
                        self.advance();
                    }
                }
            }
        }

        Ok((body, Span::new(open.start, self.prev_end)))
    }

    /// Skip an import or re-export clause up to its module specifier
    fn skip_module_clause(&mut self) {
        while let Some(token) = self.peek() {
            match token {
                Token::Str(_) => {
                    self.advance();
                    break;
                }
                Token::Semi => break,
                _ => {
                    self.advance();
                }
            }
        }
        self.match_token(Token::Semi);
    }

    fn parse_export(&mut self) -> ParseResult<Option<Node>> {
        self.advance();

        if self.match_token(Token::Default) {
            return match self.peek() {
                Some(Token::Function) => self
                    .parse_function(FunctionKind::Declaration)
                    .map(|f| Some(Node::Function(f))),
                Some(Token::Async) if self.peek_after() == Some(Token::Function) => self
                    .parse_function(FunctionKind::Declaration)
                    .map(|f| Some(Node::Function(f))),
                Some(Token::Class) => self.parse_class().map(Some),
                _ => self.parse_expression_statement(),
            };
        }

        match self.peek() {
            Some(Token::LBrace) => {
                self.skip_balanced()?;
                if self.check_ident("from") {
                    self.skip_module_clause();
                } else {
                    self.match_token(Token::Semi);
                }
                Ok(None)
            }
            Some(Token::Star) => {
                self.skip_module_clause();
                Ok(None)
            }
            Some(Token::Ident("type")) if self.peek_after() == Some(Token::LBrace) => {
                self.skip_module_clause();
                Ok(None)
            }
            _ => self.parse_statement(),
        }
    }

    fn parse_declaration(&mut self) -> ParseResult<Node> {
        let start = self.peek_span().start;
        self.advance();

        let mut children = Vec::new();
        loop {
            match self.peek() {
                Some(Token::LBrace) | Some(Token::LBracket) => {
                    self.skip_balanced()?;
                }
                Some(token) if token.word().is_some() => {
                    self.advance();
                }
                _ => {
                    return Err(ParseError::unexpected_token(
                        self.peek_span().start,
                        "binding name",
                        self.describe_peek(),
                    ))
                }
            }
            self.match_token(Token::Bang);
            if self.match_token(Token::Colon) {
                self.skip_type();
            }
            if self.match_token(Token::Assign) {
                children.push(self.parse_assignment()?);
            }
            if !self.match_token(Token::Comma) {
                break;
            }
        }
        self.match_token(Token::Semi);

        Ok(Node::compound(
            CompoundKind::Declaration,
            children,
            Span::new(start, self.prev_end),
        ))
    }

    fn parse_return(&mut self) -> ParseResult<Node> {
        let start = self.peek_span().start;
        self.advance();

        let mut children = Vec::new();
        if let Some(lexed) = self.peek_lexed() {
            let ends_statement = matches!(
                lexed.token,
                Some(Token::Semi) | Some(Token::RBrace) | None
            );
            if !ends_statement && !lexed.newline_before {
                children.push(self.parse_expression()?);
            }
        }
        self.match_token(Token::Semi);

        Ok(Node::compound(
            CompoundKind::Return,
            children,
            Span::new(start, self.prev_end),
        ))
    }

    fn parse_if(&mut self) -> ParseResult<Node> {
        let start = self.peek_span().start;
        self.advance();

        self.expect(Token::LParen)?;
        let mut children = vec![self.parse_expression()?];
        self.expect(Token::RParen)?;
        children.extend(self.parse_statement()?);
        if self.match_token(Token::Else) {
            children.extend(self.parse_statement()?);
        }

        Ok(Node::compound(
            CompoundKind::If,
            children,
            Span::new(start, self.prev_end),
        ))
    }

    /// `[async] function [*] [name] [<T>] (params) [: T] { body }`
    fn parse_function(&mut self, kind: FunctionKind) -> ParseResult<Function> {
        let start = self.peek_span().start;
        self.match_token(Token::Async);
        self.expect(Token::Function)?;
        self.match_token(Token::Star);

        let name = match self.peek() {
            Some(Token::Ident(name)) => {
                self.advance();
                Some(name.to_string())
            }
            _ => None,
        };

        let body = self.parse_callable_rest()?;
        Ok(Function {
            name,
            kind,
            body,
            span: Span::new(start, self.prev_end),
        })
    }

    /// Generics, parameter list, return type and block body of a callable
    fn parse_callable_rest(&mut self) -> ParseResult<Vec<Node>> {
        if self.check(Token::Lt) {
            self.skip_angle();
        }
        if !self.check(Token::LParen) {
            return Err(ParseError::unexpected_token(
                self.peek_span().start,
                "'('",
                self.describe_peek(),
            ));
        }
        self.skip_balanced()?;
        if self.match_token(Token::Colon) {
            self.skip_type();
        }
        let (body, _) = self.parse_block()?;
        Ok(body)
    }

    fn parse_class(&mut self) -> ParseResult<Node> {
        let start = self.peek_span().start;
        self.expect(Token::Class)?;

        let mut children = Vec::new();
        while let Some(token) = self.peek() {
            match token {
                Token::LBrace => break,
                Token::Ident("extends") => {
                    self.advance();
                    children.push(self.parse_postfix()?);
                }
                Token::Lt => {
                    self.skip_angle();
                }
                _ => {
                    self.advance();
                }
            }
        }

        self.expect(Token::LBrace)?;
        while self.too_deep.is_none() {
            match self.peek() {
                None => {
                    self.errors
                        .push(ParseError::unexpected_eof(self.source.len()));
                    break;
                }
                Some(Token::RBrace) => {
                    self.advance();
                    break;
                }
                Some(Token::Semi) => {
                    self.advance();
                }
                Some(_) => {
                    let before = self.pos;
                    match self.parse_class_member() {
                        Ok(Some(node)) => children.push(node),
                        Ok(None) => {}
                        Err(err) => self.errors.push(err),
                    }
                    if self.pos == before {
                        self.advance();
                    }
                }
            }
        }

        Ok(Node::compound(
            CompoundKind::Class,
            children,
            Span::new(start, self.prev_end),
        ))
    }

    fn parse_class_member(&mut self) -> ParseResult<Option<Node>> {
        let start = self.peek_span().start;

        while self.match_token(Token::At) {
            self.parse_postfix()?;
        }

        // Modifiers only count as such when another key follows them
        loop {
            let is_modifier = matches!(
                self.peek(),
                Some(Token::Ident(
                    "static"
                        | "public"
                        | "private"
                        | "protected"
                        | "readonly"
                        | "abstract"
                        | "override"
                        | "declare"
                        | "get"
                        | "set"
                )) | Some(Token::Async)
            );
            if !is_modifier {
                break;
            }
            match self.peek_after() {
                Some(token)
                    if token.word().is_some()
                        || matches!(
                            token,
                            Token::LBracket | Token::Str(_) | Token::Hash | Token::Star | Token::LBrace
                        ) =>
                {
                    self.advance();
                }
                _ => break,
            }
        }

        if self.check(Token::LBrace) {
            // static initialization block
            let (body, span) = self.parse_block()?;
            return Ok(Some(Node::compound(CompoundKind::Block, body, span)));
        }

        self.match_token(Token::Star);
        let key = self.parse_property_key()?;
        self.match_token(Token::Question);
        self.match_token(Token::Bang);

        if self.check(Token::LParen) || self.check(Token::Lt) {
            if self.check(Token::Lt) {
                self.skip_angle();
            }
            self.skip_balanced()?;
            if self.match_token(Token::Colon) {
                self.skip_type();
            }
            if !self.check(Token::LBrace) {
                // overload signature
                self.match_token(Token::Semi);
                return Ok(None);
            }
            let (body, _) = self.parse_block()?;
            return Ok(Some(Node::Function(Function {
                name: Some(key.name),
                kind: FunctionKind::Method,
                body,
                span: Span::new(start, self.prev_end),
            })));
        }

        if self.match_token(Token::Colon) {
            self.skip_type();
        }
        let initializer = if self.match_token(Token::Assign) {
            Some(self.parse_assignment()?)
        } else {
            None
        };
        self.match_token(Token::Semi);
        Ok(initializer)
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Comma-separated expression
    pub(crate) fn parse_expression(&mut self) -> ParseResult<Node> {
        let first = self.parse_assignment()?;
        if !self.check(Token::Comma) {
            return Ok(first);
        }

        let start = first.span().start;
        let mut expressions = vec![first];
        while self.match_token(Token::Comma) {
            expressions.push(self.parse_assignment()?);
        }
        Ok(Node::Sequence {
            expressions,
            span: Span::new(start, self.prev_end),
        })
    }

    fn parse_assignment(&mut self) -> ParseResult<Node> {
        self.nested(Self::assignment)
    }

    fn assignment(&mut self) -> ParseResult<Node> {
        if let Some(arrow) = self.try_parse_arrow()? {
            return Ok(arrow);
        }

        if self.check_ident("yield") {
            let start = self.peek_span().start;
            self.advance();
            self.match_token(Token::Star);
            let mut children = Vec::new();
            if let Some(lexed) = self.peek_lexed() {
                let ends = matches!(
                    lexed.token,
                    Some(
                        Token::Semi
                            | Token::RBrace
                            | Token::RParen
                            | Token::RBracket
                            | Token::Comma
                            | Token::Colon
                    ) | None
                );
                if !ends && !lexed.newline_before {
                    children.push(self.parse_assignment()?);
                }
            }
            return Ok(Node::compound(
                CompoundKind::Unary,
                children,
                Span::new(start, self.prev_end),
            ));
        }

        let target = self.parse_conditional()?;
        match self.peek() {
            Some(Token::Assign) | Some(Token::AssignOp(_)) => {
                self.advance();
                let value = self.parse_assignment()?;
                let span = Span::new(target.span().start, self.prev_end);
                Ok(Node::compound(
                    CompoundKind::Assignment,
                    vec![target, value],
                    span,
                ))
            }
            _ => Ok(target),
        }
    }

    /// Arrow functions need lookahead past the parameter list
    fn try_parse_arrow(&mut self) -> ParseResult<Option<Node>> {
        let checkpoint = self.checkpoint();
        let start = self.peek_span().start;

        if self.check(Token::Async) {
            match self.peek_after() {
                Some(Token::Ident(_)) | Some(Token::LParen) | Some(Token::Lt) => {
                    self.advance();
                }
                _ => return Ok(None),
            }
        }

        match self.peek() {
            Some(Token::Ident(_)) => {
                self.advance();
            }
            Some(Token::LParen) | Some(Token::Lt) => {
                if self.check(Token::Lt) && !self.skip_angle() {
                    self.restore(checkpoint);
                    return Ok(None);
                }
                if !self.check(Token::LParen) || self.skip_balanced().is_err() {
                    self.restore(checkpoint);
                    return Ok(None);
                }
                if self.check(Token::Colon) {
                    self.advance();
                    self.skip_type();
                }
            }
            _ => return Ok(None),
        }

        match self.peek_lexed() {
            Some(Lexed {
                token: Some(Token::Arrow),
                newline_before: false,
                ..
            }) => {}
            _ => {
                self.restore(checkpoint);
                return Ok(None);
            }
        }
        self.advance();

        let body = if self.check(Token::LBrace) {
            self.parse_block()?.0
        } else {
            vec![self.parse_assignment()?]
        };

        Ok(Some(Node::Function(Function {
            name: None,
            kind: FunctionKind::Arrow,
            body,
            span: Span::new(start, self.prev_end),
        })))
    }

    fn parse_conditional(&mut self) -> ParseResult<Node> {
        let test = self.parse_binary(0)?;
        if !self.match_token(Token::Question) {
            return Ok(test);
        }

        let consequent = self.parse_assignment()?;
        self.expect(Token::Colon)?;
        let alternate = self.parse_assignment()?;
        let span = Span::new(test.span().start, self.prev_end);
        Ok(Node::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
            span,
        })
    }

    /// Precedence climbing over binary and logical operators
    fn parse_binary(&mut self, min_precedence: u8) -> ParseResult<Node> {
        let mut left = self.parse_unary()?;

        loop {
            let Some(lexed) = self.peek_lexed() else {
                break;
            };
            let Some(token) = lexed.token else {
                break;
            };

            if matches!(token, Token::Ident("as") | Token::Ident("satisfies")) && !lexed.newline_before {
                self.advance();
                self.skip_type();
                continue;
            }

            let Some(precedence) = binary_precedence(token) else {
                break;
            };
            if precedence < min_precedence {
                break;
            }
            self.advance();

            let right = if token == Token::StarStar {
                self.parse_binary(precedence)?
            } else {
                self.parse_binary(precedence + 1)?
            };
            let span = Span::new(left.span().start, self.prev_end);

            left = match logical_operator(token) {
                Some(operator) => Node::Logical {
                    operator,
                    left: Box::new(left),
                    right: Box::new(right),
                    span,
                },
                None => Node::compound(CompoundKind::Binary, vec![left, right], span),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Node> {
        self.nested(Self::unary)
    }

    fn unary(&mut self) -> ParseResult<Node> {
        let start = self.peek_span().start;
        let kind = match self.peek() {
            Some(Token::Bang | Token::Minus | Token::Plus | Token::Tilde) => CompoundKind::Unary,
            Some(Token::Ident("typeof" | "void" | "delete" | "await")) => CompoundKind::Unary,
            Some(Token::PlusPlus | Token::MinusMinus) => CompoundKind::Update,
            Some(Token::Ident("new")) => {
                if self.peek_after() == Some(Token::Dot) {
                    return self.parse_postfix();
                }
                CompoundKind::New
            }
            _ => return self.parse_postfix(),
        };

        self.advance();
        let operand = self.parse_unary()?;
        Ok(Node::compound(
            kind,
            vec![operand],
            Span::new(start, self.prev_end),
        ))
    }

    /// Member access, calls, tagged templates and postfix operators
    fn parse_postfix(&mut self) -> ParseResult<Node> {
        let mut node = self.parse_primary()?;
        let start = node.span().start;

        loop {
            let Some(lexed) = self.peek_lexed() else {
                break;
            };
            let Some(token) = lexed.token else {
                break;
            };

            node = match token {
                Token::Dot => {
                    self.advance();
                    self.match_token(Token::Hash);
                    self.expect_word("property name")?;
                    Node::compound(CompoundKind::Member, vec![node], Span::new(start, self.prev_end))
                }
                Token::OptionalChain => {
                    self.advance();
                    match self.peek() {
                        Some(Token::LParen) => {
                            let mut children = vec![node];
                            children.extend(self.parse_arguments()?);
                            Node::compound(CompoundKind::Call, children, Span::new(start, self.prev_end))
                        }
                        Some(Token::LBracket) => {
                            self.advance();
                            let index = self.parse_expression()?;
                            self.expect(Token::RBracket)?;
                            Node::compound(
                                CompoundKind::Member,
                                vec![node, index],
                                Span::new(start, self.prev_end),
                            )
                        }
                        _ => {
                            self.expect_word("property name")?;
                            Node::compound(CompoundKind::Member, vec![node], Span::new(start, self.prev_end))
                        }
                    }
                }
                Token::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(Token::RBracket)?;
                    Node::compound(
                        CompoundKind::Member,
                        vec![node, index],
                        Span::new(start, self.prev_end),
                    )
                }
                Token::LParen => {
                    let mut children = vec![node];
                    children.extend(self.parse_arguments()?);
                    Node::compound(CompoundKind::Call, children, Span::new(start, self.prev_end))
                }
                Token::Backtick => {
                    let template = self.parse_template()?;
                    Node::compound(
                        CompoundKind::TaggedTemplate,
                        vec![node, Node::TemplateLiteral(template)],
                        Span::new(start, self.prev_end),
                    )
                }
                // non-null assertion
                Token::Bang if !lexed.newline_before => {
                    self.advance();
                    node
                }
                Token::PlusPlus | Token::MinusMinus if !lexed.newline_before => {
                    self.advance();
                    Node::compound(CompoundKind::Update, vec![node], Span::new(start, self.prev_end))
                }
                // explicit type arguments on a call: `useState<number>(0)`
                Token::Lt => {
                    let checkpoint = self.checkpoint();
                    if self.skip_type_arguments() && self.check(Token::LParen) {
                        continue;
                    }
                    self.restore(checkpoint);
                    break;
                }
                _ => break,
            };
        }

        Ok(node)
    }

    fn parse_arguments(&mut self) -> ParseResult<Vec<Node>> {
        self.expect(Token::LParen)?;
        let mut arguments = Vec::new();

        loop {
            if self.match_token(Token::RParen) {
                break;
            }
            if self.peek().is_none() {
                self.errors
                    .push(ParseError::unexpected_eof(self.source.len()));
                break;
            }
            if self.check(Token::Ellipsis) {
                arguments.push(self.parse_spread()?);
            } else {
                arguments.push(self.parse_assignment()?);
            }
            if !self.match_token(Token::Comma) {
                self.expect(Token::RParen)?;
                break;
            }
        }

        Ok(arguments)
    }

    fn parse_spread(&mut self) -> ParseResult<Node> {
        let start = self.expect(Token::Ellipsis)?.start;
        let argument = self.parse_assignment()?;
        Ok(Node::Spread {
            argument: Box::new(argument),
            span: Span::new(start, self.prev_end),
        })
    }

    fn parse_primary(&mut self) -> ParseResult<Node> {
        let Some(lexed) = self.peek_lexed() else {
            return Err(ParseError::unexpected_eof(self.source.len()));
        };
        let span = lexed.span;
        let Some(token) = lexed.token else {
            return Err(ParseError::unexpected_eof(self.source.len()));
        };

        match token {
            Token::Ident(name) => {
                self.advance();
                Ok(Node::Identifier {
                    name: name.to_string(),
                    span,
                })
            }
            Token::Function => self
                .parse_function(FunctionKind::Expression)
                .map(Node::Function),
            Token::Async if self.peek_after() == Some(Token::Function) => self
                .parse_function(FunctionKind::Expression)
                .map(Node::Function),
            Token::Class => self.parse_class(),
            Token::Async | Token::Import | Token::Default | Token::Let => {
                self.advance();
                Ok(Node::Identifier {
                    name: token.word().unwrap_or_default().to_string(),
                    span,
                })
            }
            Token::Number(raw) => {
                self.advance();
                Ok(Node::NumberLiteral {
                    raw: raw.to_string(),
                    span,
                })
            }
            Token::Str(raw) => {
                self.advance();
                Ok(Node::StringLiteral(string_literal(raw, span)))
            }
            Token::Backtick => self.parse_template().map(Node::TemplateLiteral),
            Token::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                // Keep what was parsed when the group is cut off mid-edit
                if let Err(err) = self.expect(Token::RParen) {
                    self.errors.push(err);
                }
                Ok(Node::compound(
                    CompoundKind::Parenthesized,
                    vec![inner],
                    Span::new(span.start, self.prev_end),
                ))
            }
            Token::LBracket => self.parse_array(),
            Token::LBrace => self.parse_object().map(Node::Object),
            Token::Slash | Token::AssignOp("/=") => self.parse_regex(span.start),
            Token::Hash => {
                self.advance();
                let name = self.expect_word("private name")?;
                Ok(Node::Identifier {
                    name: format!("#{}", name),
                    span: Span::new(span.start, self.prev_end),
                })
            }
            Token::Lt if self.is_markup_start(span.start) => {
                self.parse_element(span.start).map(Node::Element)
            }
            other => Err(ParseError::unexpected_token(
                span.start,
                "expression",
                other.to_string(),
            )),
        }
    }

    fn parse_array(&mut self) -> ParseResult<Node> {
        let start = self.expect(Token::LBracket)?.start;
        let mut elements = Vec::new();

        loop {
            match self.peek() {
                Some(Token::RBracket) => {
                    self.advance();
                    break;
                }
                Some(Token::Comma) => {
                    // hole
                    self.advance();
                    continue;
                }
                Some(Token::Ellipsis) => elements.push(self.parse_spread()?),
                _ => elements.push(self.parse_assignment()?),
            }
            if !self.match_token(Token::Comma) {
                self.expect(Token::RBracket)?;
                break;
            }
        }

        Ok(Node::Array {
            elements,
            span: Span::new(start, self.prev_end),
        })
    }

    fn parse_object(&mut self) -> ParseResult<ObjectLiteral> {
        let start = self.expect(Token::LBrace)?.start;
        let mut properties = Vec::new();

        loop {
            if self.match_token(Token::RBrace) {
                break;
            }
            properties.push(self.parse_property()?);
            if !self.match_token(Token::Comma) {
                self.expect(Token::RBrace)?;
                break;
            }
        }

        Ok(ObjectLiteral {
            properties,
            span: Span::new(start, self.prev_end),
        })
    }

    fn parse_property(&mut self) -> ParseResult<Property> {
        let start = self.peek_span().start;

        if self.check(Token::Ellipsis) {
            self.advance();
            let argument = self.parse_assignment()?;
            return Ok(Property::Spread {
                argument: Box::new(argument),
                span: Span::new(start, self.prev_end),
            });
        }

        let has_modifier = matches!(
            self.peek(),
            Some(Token::Ident("get" | "set")) | Some(Token::Async)
        ) && matches!(
            self.peek_after(),
            Some(token) if token.word().is_some()
                || matches!(token, Token::Str(_) | Token::Number(_) | Token::LBracket | Token::Star)
        );
        if has_modifier {
            self.advance();
        }
        let generator = self.match_token(Token::Star);

        let key = self.parse_property_key()?;

        if has_modifier || generator || self.check(Token::LParen) || self.check(Token::Lt) {
            let body = self.parse_callable_rest()?;
            let span = Span::new(start, self.prev_end);
            return Ok(Property::Method {
                function: Function {
                    name: Some(key.name.clone()),
                    kind: FunctionKind::Method,
                    body,
                    span,
                },
                key,
                span,
            });
        }

        if self.match_token(Token::Colon) {
            let value = self.parse_assignment()?;
            return Ok(Property::KeyValue {
                key,
                value: Box::new(value),
                span: Span::new(start, self.prev_end),
            });
        }

        // shorthand, possibly with a default in a destructuring pattern
        if self.match_token(Token::Assign) {
            self.parse_assignment()?;
        }
        Ok(Property::Shorthand {
            key,
            span: Span::new(start, self.prev_end),
        })
    }

    fn parse_property_key(&mut self) -> ParseResult<PropertyKey> {
        let Some(lexed) = self.peek_lexed() else {
            return Err(ParseError::unexpected_eof(self.source.len()));
        };
        let span = lexed.span;

        match lexed.token {
            Some(Token::Str(raw)) => {
                self.advance();
                Ok(PropertyKey {
                    name: string_literal(raw, span).value,
                    span,
                    kind: KeyKind::String,
                })
            }
            Some(Token::Number(raw)) => {
                self.advance();
                Ok(PropertyKey {
                    name: raw.to_string(),
                    span,
                    kind: KeyKind::Number,
                })
            }
            Some(Token::LBracket) => {
                self.advance();
                self.parse_assignment()?;
                self.expect(Token::RBracket)?;
                let span = Span::new(span.start, self.prev_end);
                Ok(PropertyKey {
                    name: span.slice(self.source).to_string(),
                    span,
                    kind: KeyKind::Computed,
                })
            }
            Some(Token::Hash) => {
                self.advance();
                let name = self.expect_word("private name")?;
                Ok(PropertyKey {
                    name: format!("#{}", name),
                    span: Span::new(span.start, self.prev_end),
                    kind: KeyKind::Identifier,
                })
            }
            Some(token) => match token.word() {
                Some(word) => {
                    self.advance();
                    Ok(PropertyKey {
                        name: word.to_string(),
                        span,
                        kind: KeyKind::Identifier,
                    })
                }
                None => Err(ParseError::unexpected_token(
                    span.start,
                    "property key",
                    token.to_string(),
                )),
            },
            None => Err(ParseError::unexpected_eof(self.source.len())),
        }
    }

    /// Template literal, scanned byte-wise with `${}` parsed as expressions
    fn parse_template(&mut self) -> ParseResult<TemplateLiteral> {
        let open = self.expect(Token::Backtick)?;
        let source = self.source;
        let bytes = source.as_bytes();
        let len = bytes.len();

        let mut quasis = Vec::new();
        let mut expressions = Vec::new();
        let mut quasi_start = open.end;
        let mut i = open.end;

        let end = loop {
            if i >= len {
                self.errors.push(ParseError::invalid_syntax(
                    open.start,
                    "unterminated template literal",
                ));
                quasis.push(self.quasi(quasi_start, len));
                break len;
            }
            match bytes[i] {
                b'\\' => i = (i + 2).min(len),
                b'`' => {
                    quasis.push(self.quasi(quasi_start, i));
                    break i + 1;
                }
                b'$' if bytes.get(i + 1) == Some(&b'{') => {
                    quasis.push(self.quasi(quasi_start, i));
                    self.set_pos(i + 2);
                    expressions.push(self.parse_expression()?);
                    let close = self.expect(Token::RBrace)?;
                    i = close.end;
                    quasi_start = i;
                }
                _ => i += 1,
            }
        };

        self.set_pos(end);
        let content_end = if end > open.end && bytes.get(end - 1) == Some(&b'`') {
            end - 1
        } else {
            end
        };
        Ok(TemplateLiteral {
            quasis,
            expressions,
            span: Span::new(open.start, end),
            content: Span::new(open.end, content_end),
        })
    }

    fn quasi(&mut self, start: usize, end: usize) -> TemplateQuasi {
        let span = Span::new(start, end);
        self.record(PieceKind::Template, span);
        TemplateQuasi {
            raw: span.slice(self.source).to_string(),
            span,
        }
    }

    fn parse_regex(&mut self, start: usize) -> ParseResult<Node> {
        let source = self.source;
        let bytes = source.as_bytes();
        let mut i = start + 1;
        let mut in_class = false;

        loop {
            match bytes.get(i) {
                None | Some(b'\n') => {
                    return Err(ParseError::invalid_syntax(start, "unterminated regular expression"));
                }
                Some(b'\\') => i += 2,
                Some(b'[') => {
                    in_class = true;
                    i += 1;
                }
                Some(b']') => {
                    in_class = false;
                    i += 1;
                }
                Some(b'/') if !in_class => {
                    i += 1;
                    break;
                }
                Some(_) => i += 1,
            }
        }
        while bytes.get(i).is_some_and(|b| b.is_ascii_alphabetic()) {
            i += 1;
        }

        self.set_pos(i);
        self.prev_end = i;
        Ok(Node::compound(CompoundKind::Other, Vec::new(), Span::new(start, i)))
    }

    // ------------------------------------------------------------------
    // Skipping: types and balanced groups
    // ------------------------------------------------------------------

    /// Skip a TypeScript type expression
    fn skip_type(&mut self) {
        let _ = self.nested(|parser| {
            parser.type_expression();
            Ok(())
        });
    }

    fn type_expression(&mut self) {
        if matches!(self.peek(), Some(Token::Pipe | Token::Amp)) {
            self.advance();
        }
        loop {
            self.skip_type_atom();
            match self.peek() {
                Some(Token::Pipe | Token::Amp) => {
                    self.advance();
                }
                Some(Token::Ident("extends")) => {
                    // conditional type
                    self.advance();
                    self.skip_type_atom();
                    if self.match_token(Token::Question) {
                        self.skip_type();
                        if self.match_token(Token::Colon) {
                            self.skip_type();
                        }
                    }
                    break;
                }
                _ => break,
            }
        }
    }

    fn skip_type_atom(&mut self) {
        while matches!(
            self.peek(),
            Some(Token::Ident("keyof" | "typeof" | "readonly" | "unique" | "infer" | "new"))
        ) {
            self.advance();
        }

        match self.peek() {
            Some(Token::LBrace | Token::LBracket) => {
                let _ = self.skip_balanced();
            }
            Some(Token::LParen) => {
                let _ = self.skip_balanced();
                if self.match_token(Token::Arrow) {
                    self.skip_type();
                }
            }
            Some(Token::Lt) => {
                self.skip_angle();
                if self.check(Token::LParen) {
                    let _ = self.skip_balanced();
                }
                if self.match_token(Token::Arrow) {
                    self.skip_type();
                }
            }
            Some(Token::Backtick) => {
                let _ = self.parse_template();
            }
            Some(Token::Str(_) | Token::Number(_)) => {
                self.advance();
            }
            Some(Token::Minus) => {
                self.advance();
                self.match_token(Token::Number(""));
            }
            Some(token) if token.word().is_some() => {
                self.advance();
                while self.check(Token::Dot) {
                    self.advance();
                    if self.expect_word("type name").is_err() {
                        break;
                    }
                }
            }
            _ => return,
        }

        loop {
            match self.peek_lexed() {
                Some(Lexed {
                    token: Some(Token::Lt),
                    newline_before: false,
                    ..
                }) => {
                    self.skip_angle();
                }
                Some(Lexed {
                    token: Some(Token::LBracket),
                    newline_before: false,
                    ..
                }) => {
                    let _ = self.skip_balanced();
                }
                _ => break,
            }
        }
    }

    /// Skip `<...>`; false when the group never closes
    fn skip_angle(&mut self) -> bool {
        if !self.match_token(Token::Lt) {
            return false;
        }
        let mut depth = 1usize;
        while let Some(token) = self.peek() {
            match token {
                Token::Lt => {
                    self.advance();
                    depth += 1;
                }
                Token::Gt => {
                    self.advance();
                    depth -= 1;
                    if depth == 0 {
                        return true;
                    }
                }
                Token::Ge => {
                    // `>=` closing a generic followed by a default
                    self.advance();
                    depth -= 1;
                    if depth == 0 {
                        return true;
                    }
                }
                Token::LParen | Token::LBracket | Token::LBrace => {
                    if self.skip_balanced().is_err() {
                        return false;
                    }
                }
                Token::Semi | Token::RParen | Token::RBracket | Token::RBrace => return false,
                _ => {
                    self.advance();
                }
            }
        }
        false
    }

    /// Type arguments made only of type-like tokens, so `a < b && c > d`
    /// is never mistaken for a generic call
    fn skip_type_arguments(&mut self) -> bool {
        if !self.match_token(Token::Lt) {
            return false;
        }
        let mut depth = 1usize;
        while let Some(token) = self.peek() {
            match token {
                Token::Lt => depth += 1,
                Token::Gt => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return true;
                    }
                }
                Token::Comma
                | Token::Dot
                | Token::LBracket
                | Token::RBracket
                | Token::Pipe
                | Token::Amp
                | Token::Str(_)
                | Token::Number(_) => {}
                other if other.word().is_some() => {}
                _ => return false,
            }
            self.advance();
        }
        false
    }

    /// Skip from an opening bracket through its matching closer
    fn skip_balanced(&mut self) -> ParseResult<Span> {
        let Some(lexed) = self.peek_lexed() else {
            return Err(ParseError::unexpected_eof(self.source.len()));
        };
        match lexed.token {
            Some(token) if token.is_opener() => {}
            _ => {
                return Err(ParseError::unexpected_token(
                    lexed.span.start,
                    "opening bracket",
                    self.describe_peek(),
                ))
            }
        }
        self.advance();

        let mut depth = 1usize;
        loop {
            match self.peek() {
                None => return Err(ParseError::unexpected_eof(self.source.len())),
                Some(Token::Backtick) => {
                    self.parse_template()?;
                }
                Some(token) if token.is_opener() => {
                    self.advance();
                    depth += 1;
                }
                Some(token) if token.is_closer() => {
                    self.advance();
                    depth -= 1;
                    if depth == 0 {
                        return Ok(Span::new(lexed.span.start, self.prev_end));
                    }
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Cursor helpers
    // ------------------------------------------------------------------

    fn lex_at_cursor(&mut self) -> Lexed<'src> {
        let source = self.source;
        let rest = &source[self.pos..];
        let mut lexer = Token::lexer(rest);

        loop {
            match lexer.next() {
                None => {
                    self.record_comments(self.pos, rest);
                    return Lexed {
                        token: None,
                        span: Span::empty(self.source.len()),
                        newline_before: rest.contains('\n'),
                    };
                }
                Some(Ok(token)) => {
                    let range = lexer.span();
                    self.record_comments(self.pos, &rest[..range.start]);
                    if let Token::Str(_) = token {
                        let content = Span::new(self.pos + range.start + 1, self.pos + range.end - 1);
                        self.record(PieceKind::String, content);
                    }
                    return Lexed {
                        token: Some(token),
                        span: Span::new(self.pos + range.start, self.pos + range.end),
                        newline_before: rest[..range.start].contains('\n'),
                    };
                }
                Some(Err(_)) => {
                    let at = self.pos + lexer.span().start;
                    let error = ParseError::lexer_error(at);
                    if !self.errors.contains(&error) {
                        self.errors.push(error);
                    }
                }
            }
        }
    }

    fn record(&mut self, kind: PieceKind, span: Span) {
        if !span.is_empty() {
            self.pieces.push(LexicalPiece { kind, span });
        }
    }

    /// Note the comments inside a run of skipped trivia starting at `base`
    fn record_comments(&mut self, base: usize, trivia: &str) {
        let mut offset = base;
        let mut rest = trivia;
        while let Some(at) = rest.find('/') {
            let after = &rest[at..];
            let len = if after.starts_with("//") {
                after.find('\n').unwrap_or(after.len())
            } else if after.starts_with("/*") {
                after[2..].find("*/").map(|end| end + 4).unwrap_or(after.len())
            } else {
                1
            };
            if len > 1 {
                self.record(PieceKind::Comment, Span::new(offset + at, offset + at + len));
            }
            offset += at + len;
            rest = &rest[at + len..];
        }
    }

    /// Run `parse` one level deeper, failing once nesting passes the limit
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(self.nesting_error(self.pos, MAX_NESTING));
        }
        if let Some(error) = &self.too_deep {
            return Err(error.clone());
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn nesting_error(&mut self, pos: usize, limit: usize) -> ParseError {
        self.too_deep
            .get_or_insert_with(|| ParseError::nesting_too_deep(pos, limit))
            .clone()
    }

    fn peek_lexed(&mut self) -> Option<Lexed<'src>> {
        let lexed = match self.lookahead {
            Some(lexed) => lexed,
            None => {
                let lexed = self.lex_at_cursor();
                self.lookahead = Some(lexed);
                lexed
            }
        };
        lexed.token.map(|_| lexed)
    }

    fn peek(&mut self) -> Option<Token<'src>> {
        self.peek_lexed().and_then(|lexed| lexed.token)
    }

    fn peek_span(&mut self) -> Span {
        self.peek_lexed()
            .map(|lexed| lexed.span)
            .unwrap_or_else(|| Span::empty(self.source.len()))
    }

    /// Token after the next one
    fn peek_after(&mut self) -> Option<Token<'src>> {
        let checkpoint = self.checkpoint();
        self.advance();
        let token = self.peek();
        self.restore(checkpoint);
        token
    }

    fn next_is_word_on_same_line(&mut self) -> bool {
        let checkpoint = self.checkpoint();
        self.advance();
        let result = matches!(
            self.peek_lexed(),
            Some(Lexed { token: Some(token), newline_before: false, .. }) if token.word().is_some()
        );
        self.restore(checkpoint);
        result
    }

    fn advance(&mut self) -> Option<(Token<'src>, Span)> {
        let lexed = self.peek_lexed()?;
        self.pos = lexed.span.end;
        self.prev_end = lexed.span.end;
        self.lookahead = None;
        lexed.token.map(|token| (token, lexed.span))
    }

    fn check(&mut self, token: Token) -> bool {
        match self.peek() {
            Some(t) => std::mem::discriminant(&t) == std::mem::discriminant(&token),
            None => false,
        }
    }

    fn check_ident(&mut self, word: &str) -> bool {
        self.peek() == Some(Token::Ident(word))
    }

    fn match_token(&mut self, token: Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> ParseResult<Span> {
        if self.check(token) {
            let span = self.peek_span();
            self.advance();
            Ok(span)
        } else {
            let pos = self.peek_span().start;
            Err(ParseError::unexpected_token(
                pos,
                token.to_string(),
                self.describe_peek(),
            ))
        }
    }

    fn expect_word(&mut self, expected: &str) -> ParseResult<&'src str> {
        match self.peek().and_then(|token| token.word()) {
            Some(word) => {
                self.advance();
                Ok(word)
            }
            None => {
                let pos = self.peek_span().start;
                Err(ParseError::unexpected_token(pos, expected, self.describe_peek()))
            }
        }
    }

    fn describe_peek(&mut self) -> String {
        match self.peek() {
            Some(token) => token.to_string(),
            None => "end of file".to_string(),
        }
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            prev_end: self.prev_end,
            errors: self.errors.len(),
            pieces: self.pieces.len(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.pos;
        self.prev_end = checkpoint.prev_end;
        self.errors.truncate(checkpoint.errors);
        self.pieces.truncate(checkpoint.pieces);
        self.lookahead = None;
    }

    /// Move the cursor to a byte offset reached by a manual scan
    fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.source.len());
        self.lookahead = None;
    }

    fn is_markup_start(&self, offset: usize) -> bool {
        let source = self.source;
        let bytes = source.as_bytes();
        bytes.get(offset) == Some(&b'<')
            && matches!(
                bytes.get(offset + 1),
                Some(b) if b.is_ascii_alphabetic() || *b == b'_' || *b == b'$' || *b == b'>'
            )
    }
}

fn binary_precedence(token: Token) -> Option<u8> {
    let precedence = match token {
        Token::Nullish => 1,
        Token::OrOr => 2,
        Token::AndAnd => 3,
        Token::Pipe => 4,
        Token::Caret => 5,
        Token::Amp => 6,
        Token::Equality(_) => 7,
        Token::Lt | Token::Gt | Token::Le | Token::Ge => 8,
        Token::Ident("instanceof" | "in") => 8,
        Token::Plus | Token::Minus => 10,
        Token::Star | Token::Slash | Token::Percent => 11,
        Token::StarStar => 12,
        _ => return None,
    };
    Some(precedence)
}

fn logical_operator(token: Token) -> Option<LogicalOperator> {
    match token {
        Token::AndAnd => Some(LogicalOperator::And),
        Token::OrOr => Some(LogicalOperator::Or),
        Token::Nullish => Some(LogicalOperator::Nullish),
        _ => None,
    }
}

/// Build a string literal node from a quoted token
fn string_literal(raw: &str, span: Span) -> StringLiteral {
    let quote = raw.chars().next().unwrap_or('"');
    let inner = raw.get(1..raw.len().saturating_sub(1)).unwrap_or("");
    StringLiteral {
        value: unescape(inner),
        quote,
        span,
        content: Span::new(span.start + 1, span.end.saturating_sub(1).max(span.start + 1)),
    }
}

/// Markup attribute strings carry no escapes; the value is the raw content
fn string_literal_span(source: &str, span: Span, content: Span, quote: char) -> StringLiteral {
    StringLiteral {
        value: content.slice(source).to_string(),
        quote,
        span,
        content,
    }
}

/// Resolve escape sequences in a script string body
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('0') => out.push('\0'),
            Some('\n') => {}
            Some('\r') => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => out.push_str(&hex),
                }
            }
            Some('u') => {
                let hex: String = if chars.peek() == Some(&'{') {
                    chars.next();
                    chars.by_ref().take_while(|c| *c != '}').collect()
                } else {
                    chars.by_ref().take(4).collect()
                };
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => out.push_str(&hex),
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}

/// Parse a snippet buffer.
///
/// Errors inside the buffer are recovered and kept on the document. A buffer
/// that nests deeper than [`MAX_NESTING`] or [`MAX_ELEMENT_DEPTH`] fails, as
/// does one with content from which nothing at all could be recovered.
pub fn parse(source: &str) -> ParseResult<Document> {
    let mut parser = Parser::new(source);
    let document = parser.parse_document();
    if let Some(error) = parser.too_deep.take() {
        return Err(error);
    }

    if document.body.is_empty() && document.has_errors() && !source.trim().is_empty() {
        return Err(ParseError::Unparsable {
            errors: document.errors.len(),
        });
    }

    Ok(document)
}
