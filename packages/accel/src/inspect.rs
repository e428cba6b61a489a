//! Element index and lexical layout built in one forward pass.
//!
//! Script regions are scanned with a one-token memory: `<` opens markup
//! only where an expression may start and no arrow signature follows, and
//! `/` opens a regular expression under the same condition. Function
//! bodies act as barriers: markup inside them is indexed but its text
//! belongs to no outer element. A concise arrow body ends at a `,` or `;`,
//! at the `:` of a conditional it sits in, or at a closing bracket.
//!
//! The same pass records where comments, literal bodies and markup text
//! sit, so [`Scan::code_mask`] agrees with the element index about what is
//! code.

use crate::lines::Lines;
use crate::protocol::{RecordWriter, NONE_FIELD, TAG_ENTRY, TAG_TEXT};

pub const MAX_TEXT_RANGES: usize = 120;
/// Open elements before a buffer is given up on
pub const MAX_ELEMENT_DEPTH: usize = 64;
/// Nested script, template and element scans before a buffer is given up on
const MAX_NESTING: usize = 256;

/// Words after which an expression may start
const EXPRESSION_KEYWORDS: &[&[u8]] = &[
    b"return", b"yield", b"await", b"case", b"default", b"else", b"in", b"of", b"typeof",
    b"void", b"delete",
];

/// Byte range, end exclusive
pub type Range = (usize, usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub parent: Option<usize>,
    pub fragment: bool,
    pub name: Option<Range>,
    pub start: usize,
    pub end: usize,
    /// Element whose rendered text includes this one's
    text_parent: Option<usize>,
    pub texts: Vec<Range>,
}

/// Everything one pass learns about a buffer
#[derive(Debug, Clone, Default)]
pub struct Scan {
    /// Empty when the buffer nests deeper than the scanner follows
    pub entries: Vec<Entry>,
    /// String bodies and template quasis, by start
    pub pieces: Vec<Range>,
    /// Comments, literal bodies and markup text
    pub hidden: Vec<Range>,
    pub too_deep: bool,
}

impl Scan {
    /// The buffer with hidden bytes blanked; newlines survive so offsets and
    /// line numbers line up with the original
    pub fn code_mask(&self, source: &str) -> String {
        let mut mask = source.as_bytes().to_vec();
        for &(start, end) in &self.hidden {
            for byte in &mut mask[start..end] {
                if *byte != b'\n' {
                    *byte = b' ';
                }
            }
        }
        String::from_utf8(mask)
            .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BarrierKind {
    /// `function` seen, body brace not yet
    Pending,
    Block,
    /// Concise arrow body
    Expr,
}

#[derive(Debug, Clone, Copy)]
struct Barrier {
    kind: BarrierKind,
    depth: usize,
    /// Conditionals opened inside a concise body whose `:` is still ahead
    questions: usize,
}

impl Barrier {
    fn new(kind: BarrierKind, depth: usize) -> Self {
        Self {
            kind,
            depth,
            questions: 0,
        }
    }
}

fn is_name_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_' || byte == b'$'
}

fn is_name_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'$' | b'.' | b':' | b'-')
}

fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$' || byte >= 0x80
}

struct Scanner<'s> {
    source: &'s str,
    bytes: &'s [u8],
    entries: Vec<Entry>,
    open: Vec<usize>,
    pieces: Vec<Range>,
    hidden: Vec<Range>,
    nesting: usize,
    too_deep: bool,
}

impl<'s> Scanner<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            entries: Vec::new(),
            open: Vec::new(),
            pieces: Vec::new(),
            hidden: Vec::new(),
            nesting: 0,
            too_deep: false,
        }
    }

    fn len(&self) -> usize {
        self.bytes.len()
    }

    fn at(&self, i: usize) -> Option<u8> {
        self.bytes.get(i).copied()
    }

    fn enter(&mut self) -> bool {
        if self.too_deep || self.nesting >= MAX_NESTING {
            self.too_deep = true;
            return false;
        }
        self.nesting += 1;
        true
    }

    fn leave(&mut self) {
        self.nesting -= 1;
    }

    fn is_markup_start(&self, i: usize) -> bool {
        self.at(i) == Some(b'<')
            && self
                .at(i + 1)
                .is_some_and(|b| b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b == b'>')
    }

    fn is_comment_start(&self, i: usize) -> bool {
        self.at(i) == Some(b'/') && matches!(self.at(i + 1), Some(b'/' | b'*'))
    }

    fn find(&self, from: usize, needle: &[u8]) -> Option<usize> {
        self.bytes
            .get(from..)?
            .windows(needle.len())
            .position(|window| window == needle)
            .map(|at| from + at)
    }

    fn char_len(&self, i: usize) -> usize {
        self.source
            .get(i..)
            .and_then(|rest| rest.chars().next())
            .map(char::len_utf8)
            .unwrap_or(1)
    }

    fn piece(&mut self, range: Range) {
        if range.1 > range.0 {
            self.pieces.push(range);
            self.hidden.push(range);
        }
    }

    /// Record the comments in a run of trivia
    fn hide_comments(&mut self, from: usize, to: usize) {
        let mut i = from;
        while i + 1 < to {
            match (self.bytes[i], self.bytes[i + 1]) {
                (b'/', b'/') => {
                    let end = self.find(i, b"\n").unwrap_or(to).min(to);
                    self.hidden.push((i, end));
                    i = end;
                }
                (b'/', b'*') => {
                    let end = self.find(i + 2, b"*/").map(|at| at + 2).unwrap_or(to).min(to);
                    self.hidden.push((i, end));
                    i = end;
                }
                _ => i += 1,
            }
        }
    }

    /// Whitespace and comments inside a tag
    fn skip_tag_trivia(&self, mut i: usize) -> usize {
        let len = self.len();
        while i < len {
            match self.bytes[i] {
                b' ' | b'\t' | b'\n' | b'\r' => i += 1,
                b'/' if self.at(i + 1) == Some(b'/') => {
                    i = self.find(i, b"\n").unwrap_or(len);
                }
                b'/' if self.at(i + 1) == Some(b'*') => {
                    i = self.find(i + 2, b"*/").map(|at| at + 2).unwrap_or(len);
                }
                _ => break,
            }
        }
        i
    }

    fn tag_trivia(&mut self, i: usize) -> usize {
        let end = self.skip_tag_trivia(i);
        self.hide_comments(i, end);
        end
    }

    /// Whitespace and comments between script tokens
    fn skip_script_trivia(&self, mut i: usize) -> usize {
        let len = self.len();
        while i < len {
            match self.bytes[i] {
                b' ' | b'\t' | b'\n' | b'\r' | 0x0c => i += 1,
                0xEF if self.bytes[i..].starts_with("\u{feff}".as_bytes()) => i += 3,
                b'/' if self.at(i + 1) == Some(b'/') => {
                    i = self.find(i, b"\n").unwrap_or(len);
                }
                b'/' if self.at(i + 1) == Some(b'*') => {
                    i = self.find(i + 2, b"*/").map(|at| at + 2).unwrap_or(len);
                }
                _ => break,
            }
        }
        i
    }

    /// A quoted string that closes on its own line, as `(content, end)`
    fn closed_string(&self, i: usize) -> Option<(Range, usize)> {
        let quote = self.bytes[i];
        let len = self.len();
        let mut j = i + 1;
        while j < len {
            match self.bytes[j] {
                b'\\' => j += 2,
                b'\n' => return None,
                b if b == quote => return Some(((i + 1, j), j + 1)),
                _ => j += 1,
            }
        }
        None
    }

    /// A template without interpolations, as `(content, end)`
    fn static_template(&self, i: usize) -> Option<(Range, usize)> {
        let len = self.len();
        let mut j = i + 1;
        while j < len {
            match self.bytes[j] {
                b'\\' => j += 2,
                b'`' => return Some(((i + 1, j), j + 1)),
                b'$' if self.at(j + 1) == Some(b'{') => return None,
                _ => j += 1,
            }
        }
        None
    }

    /// End of the template at `i`; interpolations are skipped by brace count
    fn template_end(&self, i: usize) -> Option<usize> {
        let len = self.len();
        let mut j = i + 1;
        while j < len {
            match self.bytes[j] {
                b'\\' => j += 2,
                b'`' => return Some(j + 1),
                b'$' if self.at(j + 1) == Some(b'{') => {
                    let mut depth = 0usize;
                    j += 1;
                    while j < len {
                        match self.bytes[j] {
                            b'{' => depth += 1,
                            b'}' => {
                                depth -= 1;
                                if depth == 0 {
                                    break;
                                }
                            }
                            _ => {}
                        }
                        j += 1;
                    }
                    j += 1;
                }
                _ => j += 1,
            }
        }
        None
    }

    /// End of the bracketed group opening at `open`
    fn bracket_group_end(&self, open: usize) -> Option<usize> {
        let len = self.len();
        let mut depth = 0usize;
        let mut j = open;
        while j < len {
            match self.bytes[j] {
                b'(' | b'[' | b'{' => {
                    depth += 1;
                    j += 1;
                }
                b')' | b']' | b'}' => {
                    depth -= 1;
                    j += 1;
                    if depth == 0 {
                        return Some(j);
                    }
                }
                b'"' | b'\'' => j = self.closed_string(j).map_or(j + 1, |(_, end)| end),
                b'`' => j = self.template_end(j)?,
                _ if self.is_comment_start(j) => j = self.skip_script_trivia(j),
                _ => j += 1,
            }
        }
        None
    }

    /// End of the `<...>` group at `i`, counting `=>` as a unit
    fn angle_group_end(&self, i: usize) -> Option<usize> {
        let len = self.len();
        let mut depth = 0usize;
        let mut j = i;
        while j < len {
            match self.bytes[j] {
                b'=' if self.at(j + 1) == Some(b'>') => j += 2,
                b'<' => {
                    depth += 1;
                    j += 1;
                }
                b'>' => {
                    depth = depth.saturating_sub(1);
                    j += 1;
                    if depth == 0 {
                        return Some(j);
                    }
                }
                b'(' | b'[' | b'{' => j = self.bracket_group_end(j)?,
                b';' | b')' | b']' | b'}' => return None,
                b'"' | b'\'' => j = self.closed_string(j)?.1,
                b'`' => j = self.template_end(j)?,
                _ if self.is_comment_start(j) => j = self.skip_script_trivia(j),
                _ => j += 1,
            }
        }
        None
    }

    /// A return type annotation from `from`, as the end of the type and the
    /// offset of the `=>` after it
    fn return_type_arrow(&self, from: usize) -> Option<(usize, usize)> {
        let len = self.len();
        let mut angle = 0usize;
        let mut j = from;
        let mut last = from;
        while j < len {
            match self.bytes[j] {
                b' ' | b'\t' | b'\n' | b'\r' => {
                    j += 1;
                    continue;
                }
                _ if self.is_comment_start(j) => {
                    j = self.skip_script_trivia(j);
                    continue;
                }
                b'=' if self.at(j + 1) == Some(b'>') => {
                    if angle == 0 {
                        return Some((last, j));
                    }
                    j += 2;
                }
                b'<' => {
                    angle += 1;
                    j += 1;
                }
                b'>' => {
                    angle = angle.saturating_sub(1);
                    j += 1;
                }
                b'(' | b'[' | b'{' => j = self.bracket_group_end(j)?,
                b';' | b',' | b')' | b']' | b'}' if angle == 0 => return None,
                b'"' | b'\'' => j = self.closed_string(j)?.1,
                b'`' => j = self.template_end(j)?,
                _ => j += 1,
            }
            last = j;
        }
        None
    }

    /// `<T,>(x: T) => ...` at `i`: type parameters of an arrow function
    fn arrow_signature(&self, i: usize) -> bool {
        let Some(after_angle) = self.angle_group_end(i) else {
            return false;
        };
        let open = self.skip_script_trivia(after_angle);
        if self.at(open) != Some(b'(') {
            return false;
        }
        let Some(close) = self.bracket_group_end(open) else {
            return false;
        };

        let mut before_arrow = close;
        let mut arrow = self.skip_script_trivia(close);
        if self.at(arrow) == Some(b':') {
            match self.return_type_arrow(arrow + 1) {
                Some((type_end, at)) => {
                    before_arrow = type_end;
                    arrow = at;
                }
                None => return false,
            }
        }
        self.at(arrow) == Some(b'=')
            && self.at(arrow + 1) == Some(b'>')
            && !self.bytes[before_arrow..arrow].contains(&b'\n')
    }

    /// The last non-whitespace byte before `i`
    fn previous_significant(&self, i: usize) -> Option<u8> {
        self.bytes[..i]
            .iter()
            .rev()
            .copied()
            .find(|byte| !byte.is_ascii_whitespace())
    }

    fn regex_end(&self, i: usize) -> Option<usize> {
        let mut j = i + 1;
        let mut in_class = false;
        loop {
            match self.at(j)? {
                b'\n' => return None,
                b'\\' => j += 2,
                b'[' => {
                    in_class = true;
                    j += 1;
                }
                b']' => {
                    in_class = false;
                    j += 1;
                }
                b'/' if !in_class => break,
                _ => j += 1,
            }
        }
        j += 1;
        while self.at(j).is_some_and(|b| b.is_ascii_alphabetic()) {
            j += 1;
        }
        Some(j)
    }

    fn push_text(&mut self, owner: usize, range: Range) {
        let mut current = Some(owner);
        while let Some(id) = current {
            let entry = &mut self.entries[id];
            if entry.texts.len() < MAX_TEXT_RANGES {
                entry.texts.push(range);
            }
            current = entry.text_parent;
        }
    }

    fn push_trimmed_text(&mut self, owner: usize, start: usize, end: usize) {
        let raw = &self.source[start..end];
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let from = start + (raw.len() - raw.trim_start().len());
            self.push_text(owner, (from, from + trimmed.len()));
        }
    }

    /// Template body after the backtick at `i`; interpolations are script
    fn scan_template(&mut self, i: usize, owner: Option<usize>) -> usize {
        let len = self.len();
        if !self.enter() {
            return len;
        }
        let mut quasi = i + 1;
        let mut j = i + 1;
        let end = loop {
            if self.too_deep {
                break len;
            }
            if j >= len {
                self.piece((quasi, len));
                break len;
            }
            match self.bytes[j] {
                b'\\' => j += 2,
                b'`' => {
                    self.piece((quasi, j));
                    break j + 1;
                }
                b'$' if self.at(j + 1) == Some(b'{') => {
                    self.piece((quasi, j));
                    j = self.scan_script(j + 2, owner, true);
                    quasi = j;
                }
                _ => j += 1,
            }
        };
        self.leave();
        end
    }

    /// Scan script from `i`. With `braced`, stop after the `}` closing the
    /// enclosing brace; otherwise run to EOF.
    fn scan_script(&mut self, i: usize, owner: Option<usize>, braced: bool) -> usize {
        if !self.enter() {
            return self.len();
        }
        let end = self.script_body(i, owner, braced);
        self.leave();
        end
    }

    fn script_body(&mut self, mut i: usize, owner: Option<usize>, braced: bool) -> usize {
        let len = self.len();
        let mut depth = 0usize;
        let mut barriers: Vec<Barrier> = Vec::new();
        let mut expression_start = true;

        while i < len {
            if self.too_deep {
                return len;
            }
            let byte = self.bytes[i];
            match byte {
                b' ' | b'\t' | b'\n' | b'\r' => i += 1,
                b'/' if self.is_comment_start(i) => {
                    let end = self.skip_script_trivia(i);
                    self.hide_comments(i, end);
                    i = end;
                }
                b'"' | b'\'' => {
                    match self.closed_string(i) {
                        Some((content, end)) => {
                            self.piece(content);
                            i = end;
                        }
                        None => i += 1,
                    }
                    expression_start = false;
                }
                b'`' => {
                    let inner = if barriers.is_empty() { owner } else { None };
                    i = self.scan_template(i, inner);
                    expression_start = false;
                }
                b'/' if expression_start => match self.regex_end(i) {
                    Some(end) => {
                        i = end;
                        expression_start = false;
                    }
                    None => i += 1,
                },
                b'<' if expression_start && self.is_markup_start(i) && !self.arrow_signature(i) => {
                    let inner = if barriers.is_empty() { owner } else { None };
                    i = self.scan_element(i, inner);
                    expression_start = false;
                }
                b'=' if self.at(i + 1) == Some(b'>') => {
                    i += 2;
                    let next = self.skip_script_trivia(i);
                    let kind = if self.at(next) == Some(b'{') {
                        BarrierKind::Pending
                    } else {
                        BarrierKind::Expr
                    };
                    barriers.push(Barrier::new(kind, depth));
                    expression_start = true;
                }
                b'?' => {
                    match self.at(i + 1) {
                        Some(b'?') => {
                            i += 2;
                            expression_start = true;
                        }
                        Some(b'.') if !self.at(i + 2).is_some_and(|b| b.is_ascii_digit()) => {
                            i += 2;
                            expression_start = false;
                        }
                        _ => {
                            if let Some(barrier) = barriers.last_mut() {
                                if barrier.kind == BarrierKind::Expr && barrier.depth == depth {
                                    barrier.questions += 1;
                                }
                            }
                            i += 1;
                            expression_start = true;
                        }
                    }
                }
                b':' => {
                    while let Some(barrier) = barriers.last_mut() {
                        if barrier.kind != BarrierKind::Expr || barrier.depth != depth {
                            break;
                        }
                        if barrier.questions > 0 {
                            barrier.questions -= 1;
                            break;
                        }
                        barriers.pop();
                    }
                    i += 1;
                    expression_start = true;
                }
                b'(' | b'[' => {
                    depth += 1;
                    i += 1;
                    expression_start = true;
                }
                b'{' => {
                    let opens_body = match barriers.last_mut() {
                        Some(barrier)
                            if barrier.kind == BarrierKind::Pending && barrier.depth == depth =>
                        {
                            barrier.kind = BarrierKind::Block;
                            true
                        }
                        _ => false,
                    };
                    // Method bodies: `name(args) {`
                    if !opens_body && self.previous_significant(i) == Some(b')') {
                        barriers.push(Barrier::new(BarrierKind::Block, depth));
                    }
                    depth += 1;
                    i += 1;
                    expression_start = true;
                }
                b')' | b']' | b'}' => {
                    i += 1;
                    if depth == 0 {
                        if braced && byte == b'}' {
                            return i;
                        }
                        continue;
                    }
                    depth -= 1;
                    while let Some(barrier) = barriers.last() {
                        let done = match barrier.kind {
                            BarrierKind::Block => barrier.depth == depth,
                            BarrierKind::Expr | BarrierKind::Pending => depth < barrier.depth,
                        };
                        if !done {
                            break;
                        }
                        barriers.pop();
                    }
                    expression_start = byte == b'}';
                }
                b',' | b';' => {
                    while barriers
                        .last()
                        .is_some_and(|b| b.kind == BarrierKind::Expr && b.depth == depth)
                    {
                        barriers.pop();
                    }
                    i += 1;
                    expression_start = true;
                }
                b if is_word_byte(b) => {
                    let start = i;
                    while i < len && is_word_byte(self.bytes[i]) {
                        i += 1;
                    }
                    let word = &self.bytes[start..i];
                    if word == b"function" {
                        barriers.push(Barrier::new(BarrierKind::Pending, depth));
                    }
                    expression_start = EXPRESSION_KEYWORDS.contains(&word);
                }
                _ => {
                    expression_start = matches!(byte, b'=' | b'!' | b'&' | b'|');
                    i += 1;
                }
            }
        }
        len
    }

    /// `{ "literal" }` or a static template alone in a child container, as
    /// `(content, literal, end)`
    fn literal_container(&self, open: usize) -> Option<(Range, Range, usize)> {
        let start = self.skip_script_trivia(open + 1);
        let (content, end) = match self.at(start)? {
            b'"' | b'\'' => self.closed_string(start)?,
            b'`' => self.static_template(start)?,
            _ => return None,
        };
        let close = self.skip_script_trivia(end);
        (self.at(close) == Some(b'}')).then_some((content, (start, end), close + 1))
    }

    /// Element or fragment whose `<` sits at `start`; returns its end
    fn scan_element(&mut self, start: usize, text_parent: Option<usize>) -> usize {
        let len = self.len();
        if self.open.len() >= MAX_ELEMENT_DEPTH {
            self.too_deep = true;
            return len;
        }
        if !self.enter() {
            return len;
        }
        let id = self.entries.len();

        let name_start = start + 1;
        let mut i = name_start;
        while i < len && is_name_byte(self.bytes[i]) {
            i += 1;
        }
        self.entries.push(Entry {
            parent: self.open.last().copied(),
            fragment: i == name_start,
            name: (i > name_start).then_some((name_start, i)),
            start,
            end: len,
            text_parent,
            texts: Vec::new(),
        });
        self.open.push(id);

        let end = self.scan_tag(id, i);
        self.entries[id].end = end;
        self.open.pop();
        self.leave();
        end
    }

    fn scan_tag(&mut self, id: usize, mut i: usize) -> usize {
        let len = self.len();

        loop {
            if self.too_deep {
                return len;
            }
            i = self.tag_trivia(i);
            let Some(byte) = self.at(i) else {
                return len;
            };
            match byte {
                b'/' if self.at(i + 1) == Some(b'>') => return i + 2,
                b'>' => {
                    i += 1;
                    break;
                }
                b'{' => i = self.scan_script(i + 1, None, true),
                b if is_name_start(b) => i = self.scan_attribute(i),
                _ => i += self.char_len(i),
            }
        }

        loop {
            if self.too_deep {
                return len;
            }
            let Some(byte) = self.at(i) else {
                return len;
            };
            match byte {
                b'<' if self.at(i + 1) == Some(b'/') => {
                    return self.find(i, b">").map(|at| at + 1).unwrap_or(len);
                }
                b'<' if self.is_markup_start(i) => i = self.scan_element(i, Some(id)),
                b'{' => match self.literal_container(i) {
                    Some(((from, to), (literal_start, literal_end), end)) => {
                        if !self.source[from..to].trim().is_empty() {
                            self.push_text(id, (from, to));
                        }
                        self.hide_comments(i + 1, literal_start);
                        self.piece((from, to));
                        self.hide_comments(literal_end, end - 1);
                        i = end;
                    }
                    None => i = self.scan_script(i + 1, Some(id), true),
                },
                _ => {
                    let start = i;
                    i += 1;
                    while i < len && self.bytes[i] != b'<' && self.bytes[i] != b'{' {
                        i += 1;
                    }
                    self.hidden.push((start, i));
                    self.push_trimmed_text(id, start, i);
                }
            }
        }
    }

    /// Named attribute at `start`; returns where the tag scan resumes
    fn scan_attribute(&mut self, start: usize) -> usize {
        let len = self.len();
        let mut i = start;
        while i < len && is_name_byte(self.bytes[i]) {
            i += 1;
        }
        let after_name = self.skip_tag_trivia(i);
        if self.at(after_name) != Some(b'=') {
            return i;
        }
        self.hide_comments(i, after_name);

        let value = self.tag_trivia(after_name + 1);
        match self.at(value) {
            Some(quote @ (b'"' | b'\'')) => {
                let close = self.find(value + 1, &[quote]);
                self.piece((value + 1, close.unwrap_or(len)));
                close.map(|at| at + 1).unwrap_or(len)
            }
            Some(b'{') => self.scan_script(value + 1, None, true),
            Some(b'<') if self.is_markup_start(value) => self.scan_element(value, None),
            _ => value,
        }
    }
}

/// Scan `source` once for its element index and lexical layout
pub fn scan(source: &str) -> Scan {
    let mut scanner = Scanner::new(source);
    scanner.scan_script(0, None, false);
    let Scanner {
        mut entries,
        mut pieces,
        mut hidden,
        too_deep,
        ..
    } = scanner;
    if too_deep {
        entries.clear();
    }
    pieces.sort_unstable();
    hidden.sort_unstable();
    Scan {
        entries,
        pieces,
        hidden,
        too_deep,
    }
}

pub fn build(source: &str) -> Vec<Entry> {
    scan(source).entries
}

pub fn encode(source: &str, entries: &[Entry]) -> Vec<u8> {
    let lines = Lines::new(source);
    let mut out = RecordWriter::new();

    for (id, entry) in entries.iter().enumerate() {
        let parent = entry
            .parent
            .map(|parent| parent.to_string())
            .unwrap_or_else(|| NONE_FIELD.to_string());
        let kind = if entry.fragment { "f" } else { "e" };
        let name = entry
            .name
            .map(|(start, end)| &source[start..end])
            .unwrap_or(NONE_FIELD);
        let (start_line, start_column) = lines.position(entry.start);
        let (end_line, end_column) = lines.position(entry.end);
        out.record(
            TAG_ENTRY,
            &[&id, &parent, &kind, &name, &start_line, &start_column, &end_line, &end_column],
        );

        for &(start, end) in &entry.texts {
            let (start_line, start_column) = lines.position(start);
            let (end_line, end_column) = lines.position(end);
            out.record(
                TAG_TEXT,
                &[&id, &start_line, &start_column, &end_line, &end_column],
            );
        }
    }

    out.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names<'a>(source: &'a str, entries: &[Entry]) -> Vec<&'a str> {
        entries
            .iter()
            .map(|entry| entry.name.map(|(s, e)| &source[s..e]).unwrap_or("<>"))
            .collect()
    }

    fn texts<'a>(source: &'a str, entry: &Entry) -> Vec<&'a str> {
        entry.texts.iter().map(|&(s, e)| &source[s..e]).collect()
    }

    #[test]
    fn test_nesting_and_text() {
        let source = "const C = () => (\n  <section>\n    <h1>Title</h1>\n    <p>Up to {\"50%\"} off</p>\n  </section>\n);";
        let entries = build(source);
        assert_eq!(names(source, &entries), vec!["section", "h1", "p"]);
        assert_eq!(entries[0].parent, None);
        assert_eq!(entries[2].parent, Some(0));
        assert_eq!(texts(source, &entries[2]), vec!["Up to", "50%", "off"]);
        assert_eq!(texts(source, &entries[0]), vec!["Title", "Up to", "50%", "off"]);
    }

    #[test]
    fn test_comparisons_are_not_markup() {
        let source = "if (a < b && c<d) { x = <i>y</i>; }";
        let entries = build(source);
        assert_eq!(names(source, &entries), vec!["i"]);
    }

    #[test]
    fn test_function_barriers() {
        let source = "<ul>{items.map((item) => <li key={item}>{item}</li>)}<b>{function () { return <i>z</i>; }}</b></ul>";
        let entries = build(source);
        assert_eq!(names(source, &entries), vec!["ul", "li", "b", "i"]);
        assert_eq!(entries[1].parent, Some(0));
        assert_eq!(entries[3].parent, Some(2));
        assert!(entries[0].texts.is_empty());
        assert_eq!(texts(source, &entries[3]), vec!["z"]);
    }

    #[test]
    fn test_text_through_expressions() {
        let source = "<p>{open ? <b>Yes</b> : `No way`}{' '}{`Hi ${name}`}</p>";
        let entries = build(source);
        assert_eq!(texts(source, &entries[0]), vec!["Yes"]);
    }

    #[test]
    fn test_attribute_markup_has_no_text_owner() {
        let source = "<Tip content={<span>Tip</span>} label=<em>x</em>>Body</Tip>";
        let entries = build(source);
        assert_eq!(names(source, &entries), vec!["Tip", "span", "em"]);
        assert_eq!(texts(source, &entries[0]), vec!["Body"]);
        assert_eq!(entries[1].parent, Some(0));
    }

    #[test]
    fn test_unclosed_opening_tag() {
        let source = "x = <div className=\"a\"";
        let entries = build(source);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].end, source.len());
    }

    #[test]
    fn test_arrow_type_parameters_are_not_markup() {
        let source = "const id = <T,>(x: T) => x;\nconst first = <T>(xs: T[]): T => xs[0];\nexport default () => <p>{id(\"a\")}</p>;";
        let entries = build(source);
        assert_eq!(names(source, &entries), vec!["p"]);
        assert_eq!(texts(source, &entries[0]), Vec::<&str>::new());
    }

    #[test]
    fn test_method_bodies_are_barriers() {
        let source = "<p>{({ label() { return <b>x</b>; } }).label()}</p>";
        let entries = build(source);
        assert_eq!(names(source, &entries), vec!["p", "b"]);
        assert!(entries[0].texts.is_empty());
        assert_eq!(entries[1].parent, Some(0));
    }

    #[test]
    fn test_conditional_ends_concise_arrow() {
        let source = "<p>{ok ? (x) => x : <b>None</b>}{f(a => a ? <i>Y</i> : <i>N</i>)}</p>";
        let entries = build(source);
        assert_eq!(names(source, &entries), vec!["p", "b", "i", "i"]);
        assert_eq!(texts(source, &entries[0]), vec!["None"]);
    }

    #[test]
    fn test_element_depth_limit() {
        let nested = |depth: usize| format!("{}x{}", "<a>".repeat(depth), "</a>".repeat(depth));
        let source = nested(MAX_ELEMENT_DEPTH);
        assert_eq!(build(&source).len(), MAX_ELEMENT_DEPTH);

        for depth in [MAX_ELEMENT_DEPTH + 1, 5000] {
            let scan = scan(&nested(depth));
            assert!(scan.too_deep);
            assert!(scan.entries.is_empty());
        }
    }

    #[test]
    fn test_markup_text_is_hidden() {
        let source = "<p>Don't {eval(\"x\")} /* a */</p>";
        let mask = scan(source).code_mask(source);
        assert_eq!(mask, "<p>      {eval(\" \")}        </p>");
    }

    #[test]
    fn test_records() {
        let source = "<>\n<i>a</i></>";
        let out = String::from_utf8(encode(source, &build(source))).unwrap();
        assert_eq!(
            out,
            "E\t0\t-\tf\t-\t1\t1\t2\t12\nT\t0\t2\t4\t2\t5\nE\t1\t0\te\ti\t2\t1\t2\t9\nT\t1\t2\t4\t2\t5\n"
        );
    }
}
