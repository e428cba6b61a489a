use serde::{Deserialize, Serialize};

/// 1-based editor position; columns count Unicode scalar values
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourcePosition {
    pub line: u32,
    pub column: u32,
}

impl SourcePosition {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Half-open range between two positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRange {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl TextRange {
    pub fn new(start: SourcePosition, end: SourcePosition) -> Self {
        Self {
            start_line: start.line,
            start_column: start.column,
            end_line: end.line,
            end_column: end.column,
        }
    }

    pub fn start(&self) -> SourcePosition {
        SourcePosition::new(self.start_line, self.start_column)
    }

    pub fn end(&self) -> SourcePosition {
        SourcePosition::new(self.end_line, self.end_column)
    }

    pub fn contains(&self, position: SourcePosition) -> bool {
        self.start() <= position && position < self.end()
    }

    pub fn is_single_line(&self) -> bool {
        self.start_line == self.end_line
    }

    /// Lines touched by the range
    pub fn line_span(&self) -> u32 {
        self.end_line - self.start_line + 1
    }

    pub fn column_width(&self) -> u32 {
        self.end_column.saturating_sub(self.start_column)
    }
}

/// Line start offsets of a buffer, for repeated offset/position conversions
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, byte)| *byte == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            source,
            line_starts,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Number of lines, counting a trailing empty line after a final newline
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Position of a byte offset; offsets past the end clamp to the end
    pub fn position(&self, offset: usize) -> SourcePosition {
        let offset = offset.min(self.source.len());
        let line = self.line_starts.partition_point(|start| *start <= offset) - 1;
        let line_start = self.line_starts[line];
        let column = self.source[line_start..]
            .char_indices()
            .take_while(|(i, _)| line_start + i < offset)
            .count();
        SourcePosition::new(line as u32 + 1, column as u32 + 1)
    }

    /// Byte offset of a position, None when it lies outside the buffer
    pub fn offset(&self, position: SourcePosition) -> Option<usize> {
        if position.line == 0 || position.column == 0 {
            return None;
        }
        let line_start = *self.line_starts.get(position.line as usize - 1)?;
        let line_end = self
            .line_starts
            .get(position.line as usize)
            .map(|next| next - 1)
            .unwrap_or(self.source.len());
        let line = &self.source[line_start..line_end];

        let target = position.column as usize - 1;
        match line.char_indices().nth(target) {
            Some((i, _)) => Some(line_start + i),
            None if line.chars().count() == target => Some(line_end),
            None => None,
        }
    }

    pub fn range(&self, start: usize, end: usize) -> TextRange {
        TextRange::new(self.position(start), self.position(end))
    }
}

/// One-off conversion of a byte offset to a position
pub fn position_at(source: &str, offset: usize) -> SourcePosition {
    LineIndex::new(source).position(offset)
}

/// One-off conversion of a position to a byte offset
pub fn offset_at(source: &str, position: SourcePosition) -> Option<usize> {
    LineIndex::new(source).offset(position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_at() {
        let source = "line 1\nline 2\nline 3";

        // Start of file
        assert_eq!(position_at(source, 0), SourcePosition::new(1, 1));

        // Start of second line
        assert_eq!(position_at(source, 7), SourcePosition::new(2, 1));

        // Middle of second line
        assert_eq!(position_at(source, 10), SourcePosition::new(2, 4));

        // End of file
        assert_eq!(position_at(source, source.len()), SourcePosition::new(3, 7));
    }

    #[test]
    fn test_offset_at() {
        let source = "line 1\nline 2\nline 3";
        assert_eq!(offset_at(source, SourcePosition::new(1, 1)), Some(0));
        assert_eq!(offset_at(source, SourcePosition::new(2, 1)), Some(7));
        assert_eq!(offset_at(source, SourcePosition::new(2, 4)), Some(10));
        // Just past the last character of a line
        assert_eq!(offset_at(source, SourcePosition::new(1, 7)), Some(6));
        assert_eq!(offset_at(source, SourcePosition::new(1, 9)), None);
        assert_eq!(offset_at(source, SourcePosition::new(9, 1)), None);
    }

    #[test]
    fn test_roundtrip() {
        let source = "export const A = () => (\n  <div>é ok</div>\n);";
        let index = LineIndex::new(source);
        for (offset, _) in source.char_indices() {
            let position = index.position(offset);
            assert_eq!(index.offset(position), Some(offset));
        }
    }

    #[test]
    fn test_unicode_columns() {
        let source = "日本語\ntext";
        assert_eq!(position_at(source, 9), SourcePosition::new(1, 4));
        assert_eq!(position_at(source, 10), SourcePosition::new(2, 1));
    }

    #[test]
    fn test_range_contains_is_half_open() {
        let range = TextRange::new(SourcePosition::new(2, 3), SourcePosition::new(2, 8));
        assert!(range.contains(SourcePosition::new(2, 3)));
        assert!(range.contains(SourcePosition::new(2, 7)));
        assert!(!range.contains(SourcePosition::new(2, 8)));
        assert!(!range.contains(SourcePosition::new(1, 5)));
        assert!(range.is_single_line());
        assert_eq!(range.column_width(), 5);
    }

    #[test]
    fn test_range_serializes_camel_case() {
        let range = TextRange::new(SourcePosition::new(1, 2), SourcePosition::new(3, 4));
        let json = serde_json::to_string(&range).unwrap();
        assert_eq!(
            json,
            r#"{"startLine":1,"startColumn":2,"endLine":3,"endColumn":4}"#
        );
    }
}
