//! # Snippet Editor
//!
//! Reads and writes styling on the elements of a component buffer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ parser: buffer text → Document              │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ inspect: element ranges + text ranges       │
//! └─────────────────────────────────────────────┘
//!           ↓                         ↓
//! ┌──────────────────────┐  ┌──────────────────────┐
//! │ style_state: read    │  │ layout / style_writer│
//! │  classes + inline    │  │ / text_writer: emit  │
//! │  into a snapshot     │  │  SourceEdits         │
//! └──────────────────────┘  └──────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Text is the source of truth**: indexes are derived per buffer version
//! 2. **Byte-range edits**: writes never re-print the tree, so formatting,
//!    comments and unrelated code survive untouched
//! 3. **Inline style wins**: the reader resolves classes first, then inline
//!    keys, matching what renders
//!
//! ## Usage
//!
//! ```rust,ignore
//! use snippet_editor::{apply_layout, read_style_state, LayoutOptions, LayoutRequest};
//! use snippet_sourcemap::SourcePosition;
//!
//! let source = r#"<div className="p-4">Hi</div>"#;
//! let at = SourcePosition::new(1, 2);
//!
//! let state = read_style_state(source, at);
//! assert!(state.editable);
//!
//! let outcome = apply_layout(source, &LayoutRequest::translate(at, 12.0, 0.0), &LayoutOptions::default())?;
//! assert!(outcome.changed);
//! ```

pub mod attributes;
pub mod class_candidates;
pub mod edits;
pub mod errors;
pub mod inspect;
pub mod layout;
pub mod style_state;
pub mod style_writer;
pub mod text_writer;
pub mod utilities;
mod writer;

pub use class_candidates::{is_candidate, scan_class_candidates};
pub use edits::{apply_edits, validate_edits, SourceEdit};
pub use errors::{EditError, WriteError, WriteResult};
pub use inspect::{EntryKind, InspectIndex, InspectIndexEntry, MAX_TEXT_RANGES};
pub use layout::{apply_layout, Alignment, LayoutOptions, LayoutRequest};
pub use style_state::{
    element_style_state, read_style_state, ClassNameKind, PropertyState, StyleKind, StylePropertySnapshot,
    StyleState, ValueSource,
};
pub use style_writer::{apply_style, StyleChange, StyleRequest};
pub use text_writer::{apply_text, TextRequest};
pub use utilities::{StyleProperty, StyleValue};
pub use writer::{format_number, format_px, quote_string, round_value, WriteOutcome};
