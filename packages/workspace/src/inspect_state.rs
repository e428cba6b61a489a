//! Hover and selection over the rendered preview.
//!
//! Preview positions are in the expanded document. Both queries resolve the
//! position to its buffer through the line map and then ask that buffer's
//! inspect index for the smallest enclosing element.

use serde::{Deserialize, Serialize};
use snippet_engine::Engine;
use snippet_sourcemap::{SourcePosition, TextRange};

use crate::cache::DerivedCache;

/// Element under a preview position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectTarget {
    /// None for the main buffer
    pub file: Option<String>,
    pub entry_id: usize,
    pub name: Option<String>,
    pub range: TextRange,
}

/// One version of a session's persisted multi-file text
#[derive(Debug, Clone, Copy)]
pub struct DocumentView<'a> {
    pub session: &'a str,
    pub version: u64,
    pub source: &'a str,
}

impl DocumentView<'_> {
    fn buffer_id(&self, file: Option<&str>) -> String {
        format!("{}:{}", self.session, file.unwrap_or(snippet_bundle::MAIN_FILE))
    }

    /// Element under the expanded-document position, if any
    pub fn resolve(
        &self,
        engine: &Engine,
        cache: &DerivedCache,
        expanded_line: u32,
        column: u32,
    ) -> Option<InspectTarget> {
        let layout = cache.layout(engine, self.session, self.version, self.source);
        let resolved = layout.line_map.resolve(expanded_line, column)?;
        let file = resolved.file.as_deref();
        let buffer = layout.buffer(file)?;

        let index = cache.inspect_index(engine, &self.buffer_id(file), self.version, buffer);
        let entry = index.find_match(SourcePosition::new(resolved.line, resolved.column))?;
        Some(InspectTarget {
            file: resolved.file.clone(),
            entry_id: entry.id,
            name: entry.name.clone(),
            range: entry.range,
        })
    }
}

/// Hover, selection and the buffer open in the code editor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InspectState {
    active_file: Option<String>,
    hover: Option<InspectTarget>,
    selection: Option<InspectTarget>,
}

impl InspectState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer open in the code editor; None for the main buffer
    pub fn active_file(&self) -> Option<&str> {
        self.active_file.as_deref()
    }

    pub fn hovered(&self) -> Option<&InspectTarget> {
        self.hover.as_ref()
    }

    pub fn selected(&self) -> Option<&InspectTarget> {
        self.selection.as_ref()
    }

    pub fn hover(
        &mut self,
        engine: &Engine,
        cache: &DerivedCache,
        document: DocumentView<'_>,
        expanded_line: u32,
        column: u32,
    ) -> Option<&InspectTarget> {
        self.hover = document.resolve(engine, cache, expanded_line, column);
        self.hover.as_ref()
    }

    pub fn clear_hover(&mut self) {
        self.hover = None;
    }

    /// Select the element under the position. Opens its buffer when it lives
    /// in another file and always clears hover.
    pub fn select(
        &mut self,
        engine: &Engine,
        cache: &DerivedCache,
        document: DocumentView<'_>,
        expanded_line: u32,
        column: u32,
    ) -> Option<&InspectTarget> {
        self.hover = None;
        self.selection = document.resolve(engine, cache, expanded_line, column);

        if let Some(target) = &self.selection {
            if target.file != self.active_file {
                tracing::debug!(
                    from = self.active_file.as_deref().unwrap_or(snippet_bundle::MAIN_FILE),
                    to = target.file.as_deref().unwrap_or(snippet_bundle::MAIN_FILE),
                    "selection moved to another buffer"
                );
                self.active_file = target.file.clone();
            }
        }
        self.selection.as_ref()
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }
}
