//! Markup scanning. Tags, attributes and text are read byte-wise; embedded
//! expressions go back through the token parser.

use super::{string_literal_span, Parser};
use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::lexical::PieceKind;
use crate::tokenizer::Token;

/// Open elements before a buffer is given up on
pub const MAX_ELEMENT_DEPTH: usize = 64;

fn is_name_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_' || byte == b'$'
}

fn is_name_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'$' | b'.' | b':' | b'-')
}

impl<'src> Parser<'src> {
    /// Parse an element or fragment whose `<` sits at `start`
    pub(super) fn parse_element(&mut self, start: usize) -> ParseResult<Element> {
        if self.element_depth >= MAX_ELEMENT_DEPTH {
            return Err(self.nesting_error(start, MAX_ELEMENT_DEPTH));
        }
        self.element_depth += 1;
        let result = self.nested(|parser| parser.element(start));
        self.element_depth -= 1;
        result
    }

    fn element(&mut self, start: usize) -> ParseResult<Element> {
        let source = self.source;
        let bytes = source.as_bytes();
        let len = bytes.len();

        let name_start = start + 1;
        let mut i = name_start;
        while i < len && is_name_byte(bytes[i]) {
            i += 1;
        }
        let name_span = Span::new(name_start, i);
        let name = (!name_span.is_empty()).then(|| name_span.slice(source).to_string());
        let kind = if name.is_some() {
            ElementKind::Element
        } else {
            ElementKind::Fragment
        };
        let display_name = name.clone().unwrap_or_default();

        let mut attributes = Vec::new();
        let mut self_closing = false;

        let opening_end = loop {
            i = self.skip_tag_trivia(i);
            if i >= len {
                self.errors
                    .push(ParseError::unclosed_element(start, display_name.as_str()));
                self.set_pos(len);
                self.prev_end = len;
                return Ok(Element {
                    kind,
                    name,
                    name_span,
                    attributes,
                    children: Vec::new(),
                    opening: Span::new(start, len),
                    opening_complete: false,
                    closing: None,
                    self_closing: false,
                    span: Span::new(start, len),
                });
            }

            match bytes[i] {
                b'/' if bytes.get(i + 1) == Some(&b'>') => {
                    self_closing = true;
                    break i + 2;
                }
                b'>' => break i + 1,
                b'{' => {
                    let (attribute, end) = self.parse_spread_attribute(i);
                    attributes.extend(attribute);
                    i = end;
                }
                byte if is_name_start(byte) => {
                    let (attribute, end) = self.parse_named_attribute(i)?;
                    attributes.push(attribute);
                    i = end;
                }
                _ => {
                    self.errors.push(ParseError::invalid_syntax(
                        i,
                        format!("unexpected character in <{}> tag", display_name),
                    ));
                    i += source[i..].chars().next().map(char::len_utf8).unwrap_or(1);
                }
            }
        };

        let opening = Span::new(start, opening_end);
        if self_closing {
            self.set_pos(opening_end);
            self.prev_end = opening_end;
            return Ok(Element {
                kind,
                name,
                name_span,
                attributes,
                children: Vec::new(),
                opening,
                opening_complete: true,
                closing: None,
                self_closing: true,
                span: opening,
            });
        }

        let mut children = Vec::new();
        let mut i = opening_end;
        let (closing, end) = loop {
            if i >= len {
                self.errors
                    .push(ParseError::unclosed_element(start, display_name.as_str()));
                break (None, len);
            }

            match bytes[i] {
                b'<' if bytes.get(i + 1) == Some(&b'/') => {
                    // Any closing tag closes the innermost open element
                    let close_end = source[i..]
                        .find('>')
                        .map(|offset| i + offset + 1)
                        .unwrap_or(len);
                    break (Some(Span::new(i, close_end)), close_end);
                }
                b'<' if self.is_markup_start(i) => {
                    let child = self.parse_element(i)?;
                    i = child.span.end;
                    children.push(Child::Element(child));
                }
                b'{' => {
                    let container = self.parse_container(i);
                    i = container.span.end;
                    children.push(Child::Expression(container));
                }
                _ => {
                    let text_start = i;
                    i += 1;
                    while i < len && bytes[i] != b'<' && bytes[i] != b'{' {
                        i += 1;
                    }
                    // Stop only at char boundaries; `<` and `{` are ASCII
                    let span = Span::new(text_start, i);
                    self.record(PieceKind::Text, span);
                    children.push(Child::Text {
                        raw: span.slice(source).to_string(),
                        span,
                    });
                }
            }
        };

        self.set_pos(end);
        self.prev_end = end;
        Ok(Element {
            kind,
            name,
            name_span,
            attributes,
            children,
            opening,
            opening_complete: true,
            closing,
            self_closing: false,
            span: Span::new(start, end),
        })
    }

    /// `name`, `name="text"`, `name={expr}` or `name=<Element />`
    fn parse_named_attribute(&mut self, start: usize) -> ParseResult<(Attribute, usize)> {
        let source = self.source;
        let bytes = source.as_bytes();
        let len = bytes.len();

        let mut i = start;
        while i < len && is_name_byte(bytes[i]) {
            i += 1;
        }
        let name_span = Span::new(start, i);
        let name = name_span.slice(source).to_string();

        let after_name = self.skip_tag_trivia(i);
        if bytes.get(after_name) != Some(&b'=') {
            return Ok((
                Attribute::Named {
                    name,
                    name_span,
                    value: None,
                    span: name_span,
                },
                i,
            ));
        }

        let value_start = self.skip_tag_trivia(after_name + 1);
        let (value, end) = match bytes.get(value_start) {
            Some(&quote) if quote == b'"' || quote == b'\'' => {
                let content_start = value_start + 1;
                let (content_end, end) = match source[content_start..].find(quote as char) {
                    Some(offset) => (content_start + offset, content_start + offset + 1),
                    None => {
                        self.errors.push(ParseError::invalid_syntax(
                            value_start,
                            "unterminated attribute string",
                        ));
                        (len, len)
                    }
                };
                let content = Span::new(content_start, content_end);
                self.record(PieceKind::String, content);
                let literal =
                    string_literal_span(source, Span::new(value_start, end), content, quote as char);
                (Some(AttributeValue::String(literal)), end)
            }
            Some(b'{') => {
                let container = self.parse_container(value_start);
                let end = container.span.end;
                (Some(AttributeValue::Expression(container)), end)
            }
            Some(b'<') if self.is_markup_start(value_start) => {
                let element = self.parse_element(value_start)?;
                let end = element.span.end;
                (Some(AttributeValue::Element(Box::new(element))), end)
            }
            _ => {
                self.errors.push(ParseError::invalid_syntax(
                    value_start,
                    format!("expected a value for attribute '{}'", name),
                ));
                (None, value_start)
            }
        };

        Ok((
            Attribute::Named {
                name,
                name_span,
                value,
                span: Span::new(start, end),
            },
            end,
        ))
    }

    /// `{...expr}` inside an opening tag
    fn parse_spread_attribute(&mut self, open: usize) -> (Option<Attribute>, usize) {
        self.set_pos(open + 1);
        let result = self.expect(Token::Ellipsis).and_then(|_| {
            let argument = self.parse_assignment()?;
            self.expect(Token::RBrace)?;
            Ok(argument)
        });

        match result {
            Ok(argument) => {
                let end = self.prev_end;
                (
                    Some(Attribute::Spread {
                        argument: Box::new(argument),
                        span: Span::new(open, end),
                    }),
                    end,
                )
            }
            Err(err) => {
                self.errors.push(err);
                (None, self.matching_brace_end(open))
            }
        }
    }

    /// `{ expression }`; a broken expression is skipped to its closing brace
    pub(super) fn parse_container(&mut self, open: usize) -> ExpressionContainer {
        self.set_pos(open + 1);

        if self.check(Token::RBrace) {
            let close = self.peek_span();
            self.advance();
            return ExpressionContainer {
                expression: None,
                span: Span::new(open, close.end),
            };
        }
        if self.peek().is_none() {
            self.errors
                .push(ParseError::unexpected_eof(self.source.len()));
            self.set_pos(self.source.len());
            return ExpressionContainer {
                expression: None,
                span: Span::new(open, self.source.len()),
            };
        }

        let result = self.parse_expression().and_then(|expr| {
            self.expect(Token::RBrace)?;
            Ok(expr)
        });
        match result {
            Ok(expr) => ExpressionContainer {
                expression: Some(Box::new(expr)),
                span: Span::new(open, self.prev_end),
            },
            Err(err) => {
                self.errors.push(err);
                let end = self.matching_brace_end(open);
                self.set_pos(end);
                self.prev_end = end;
                ExpressionContainer {
                    expression: None,
                    span: Span::new(open, end),
                }
            }
        }
    }

    /// Whitespace and comments between tag parts
    fn skip_tag_trivia(&mut self, from: usize) -> usize {
        let source = self.source;
        let bytes = source.as_bytes();
        let len = bytes.len();
        let mut i = from;

        while i < len {
            match bytes[i] {
                b' ' | b'\t' | b'\n' | b'\r' => i += 1,
                b'/' if bytes.get(i + 1) == Some(&b'/') => {
                    while i < len && bytes[i] != b'\n' {
                        i += 1;
                    }
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    i = match self.source[i + 2..].find("*/") {
                        Some(offset) => i + 2 + offset + 2,
                        None => len,
                    };
                }
                _ => break,
            }
        }
        self.record_comments(from, &source[from..i]);
        i
    }

    /// Offset just past the brace matching the one at `open`, or EOF.
    /// Quotes, templates and comments are stepped over.
    fn matching_brace_end(&self, open: usize) -> usize {
        let bytes = self.source.as_bytes();
        let len = bytes.len();
        let mut depth = 0usize;
        let mut i = open;

        while i < len {
            match bytes[i] {
                b'{' => depth += 1,
                b'}' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return i + 1;
                    }
                }
                quote @ (b'"' | b'\'') => {
                    i += 1;
                    while i < len && bytes[i] != quote && bytes[i] != b'\n' {
                        if bytes[i] == b'\\' {
                            i += 1;
                        }
                        i += 1;
                    }
                }
                b'`' => {
                    i += 1;
                    while i < len && bytes[i] != b'`' {
                        if bytes[i] == b'\\' {
                            i += 1;
                        }
                        i += 1;
                    }
                }
                b'/' if bytes.get(i + 1) == Some(&b'/') => {
                    while i < len && bytes[i] != b'\n' {
                        i += 1;
                    }
                    continue;
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    i = match self.source[i + 2..].find("*/") {
                        Some(offset) => i + 2 + offset + 1,
                        None => len,
                    };
                }
                _ => {}
            }
            i += 1;
        }
        len
    }
}
