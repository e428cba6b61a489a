//! Byte-range replacements over a buffer.
//!
//! Every write is a list of non-overlapping `SourceEdit`s computed from node
//! offsets of one parse. They are applied back to front so earlier offsets
//! stay valid; nothing is ever re-printed from the tree.

use serde::{Deserialize, Serialize};

use crate::errors::EditError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEdit {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

impl SourceEdit {
    pub fn new(start: usize, end: usize, replacement: impl Into<String>) -> Self {
        Self {
            start,
            end,
            replacement: replacement.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::new(at, at, text)
    }

    pub fn delete(start: usize, end: usize) -> Self {
        Self::new(start, end, "")
    }

    /// True when applying the edit would leave `source` unchanged
    pub fn is_noop(&self, source: &str) -> bool {
        source.get(self.start..self.end) == Some(self.replacement.as_str())
    }
}

/// Check bounds, char boundaries and overlaps
pub fn validate_edits(source: &str, edits: &[SourceEdit]) -> Result<(), EditError> {
    for edit in edits {
        if edit.start > edit.end
            || edit.end > source.len()
            || !source.is_char_boundary(edit.start)
            || !source.is_char_boundary(edit.end)
        {
            return Err(EditError::OutOfBounds {
                start: edit.start,
                end: edit.end,
                len: source.len(),
            });
        }
    }

    let mut sorted: Vec<&SourceEdit> = edits.iter().collect();
    sorted.sort_by_key(|edit| (edit.start, edit.end));
    for pair in sorted.windows(2) {
        let (first, second) = (pair[0], pair[1]);
        let touches_inside = first.end > second.start;
        // Two edits replacing the same non-empty range
        let same_range = first.start == second.start && first.end == second.end && first.start != first.end;
        if touches_inside || same_range {
            return Err(EditError::Overlap {
                first_start: first.start,
                first_end: first.end,
                second_start: second.start,
                second_end: second.end,
            });
        }
    }
    Ok(())
}

/// Apply `edits` to `source`.
///
/// Insertions at the same offset land in list order.
pub fn apply_edits(source: &str, edits: &[SourceEdit]) -> Result<String, EditError> {
    validate_edits(source, edits)?;

    let mut order: Vec<usize> = (0..edits.len()).collect();
    order.sort_by(|a, b| {
        edits[*b]
            .start
            .cmp(&edits[*a].start)
            .then(edits[*b].end.cmp(&edits[*a].end))
            .then(b.cmp(a))
    });

    let mut out = source.to_string();
    for index in order {
        let edit = &edits[index];
        out.replace_range(edit.start..edit.end, &edit.replacement);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_back_to_front() {
        let source = "<div className=\"a\" />";
        let edits = vec![
            SourceEdit::new(16, 17, "a mx-auto"),
            SourceEdit::insert(18, " style={{ width: \"10px\" }}"),
        ];
        assert_eq!(
            apply_edits(source, &edits).unwrap(),
            "<div className=\"a mx-auto\" style={{ width: \"10px\" }} />"
        );
    }

    #[test]
    fn test_inserts_at_same_offset_keep_order() {
        let edits = vec![SourceEdit::insert(4, " a"), SourceEdit::insert(4, " b")];
        assert_eq!(apply_edits("<div>", &edits).unwrap(), "<div a b>");
    }

    #[test]
    fn test_delete_then_insert_at_boundary() {
        let edits = vec![SourceEdit::delete(4, 11), SourceEdit::insert(11, " x")];
        assert_eq!(apply_edits("<div hidden>", &edits).unwrap(), "<div x>");
    }

    #[test]
    fn test_overlap_is_rejected() {
        let edits = vec![SourceEdit::new(0, 5, "x"), SourceEdit::new(3, 8, "y")];
        assert_eq!(
            apply_edits("0123456789", &edits),
            Err(EditError::Overlap {
                first_start: 0,
                first_end: 5,
                second_start: 3,
                second_end: 8,
            })
        );
        let same = vec![SourceEdit::new(1, 2, "x"), SourceEdit::new(1, 2, "y")];
        assert!(matches!(
            apply_edits("0123", &same),
            Err(EditError::Overlap { .. })
        ));
    }

    #[test]
    fn test_out_of_bounds() {
        assert!(matches!(
            apply_edits("abc", &[SourceEdit::new(2, 9, "")]),
            Err(EditError::OutOfBounds { .. })
        ));
        // Inside a multi-byte character
        assert!(matches!(
            apply_edits("é", &[SourceEdit::insert(1, "x")]),
            Err(EditError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_noop_detection() {
        assert!(SourceEdit::new(0, 3, "abc").is_noop("abcdef"));
        assert!(!SourceEdit::new(0, 3, "abd").is_noop("abcdef"));
    }
}
