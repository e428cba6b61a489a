//! # SnippetBundle - Multi-file Snippet Source
//!
//! One persisted text blob encodes a snippet's main buffer plus any number of
//! named files. The bundle owns the parsed form and keeps the auto-managed
//! import block in sync with its file set.
//!
//! ## Usage
//!
//! ```rust
//! use snippet_bundle::SnippetBundle;
//!
//! let mut bundle = SnippetBundle::new("export default () => <Card />;");
//! bundle.add_file("card.tsx", "export const Card = () => <div />;").unwrap();
//!
//! let text = bundle.serialize();
//! assert_eq!(SnippetBundle::parse(&text), bundle);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use snippet_sourcemap::LineMap;

use crate::directives::{
    render_import_block, strip_import_block, validate_file_name, FILE_END, FILE_START,
};
use crate::error::{BundleError, BundleResult};
use crate::scan::{expand, scan_file_blocks};

/// Main buffer and named files of one snippet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetBundle {
    /// User-visible main buffer, import block stripped
    main_source: String,
    files: BTreeMap<String, String>,
}

/// Flattened document of a bundle with its line map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedDocument {
    pub source: String,
    pub line_map: LineMap,
}

impl SnippetBundle {
    pub fn new(main_source: impl Into<String>) -> Self {
        Self {
            main_source: main_source.into(),
            files: BTreeMap::new(),
        }
    }

    /// Build a bundle from parts, validating every file name
    pub fn from_parts<I, N, C>(main_source: impl Into<String>, files: I) -> BundleResult<Self>
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<String>,
    {
        let mut bundle = Self::new(main_source);
        for (name, content) in files {
            bundle.add_file(name, content)?;
        }
        Ok(bundle)
    }

    /// Decode the persisted multi-file text. Never fails: malformed
    /// directives degrade to main-buffer text or dangling sections.
    pub fn parse(source: &str) -> Self {
        let scan = scan_file_blocks(source);
        Self {
            main_source: strip_import_block(&scan.main_source).to_string(),
            files: scan.files.into_iter().collect(),
        }
    }

    /// Encode the bundle as persisted multi-file text
    pub fn serialize(&self) -> String {
        if self.files.is_empty() {
            return self.main_source.clone();
        }

        let mut out = render_import_block(self.file_names());
        for (name, content) in &self.files {
            out.push_str(FILE_START);
            out.push(' ');
            out.push_str(name);
            out.push('\n');
            if !content.is_empty() {
                out.push_str(content);
                // A content `\r` must not read back as half of a CRLF terminator
                out.push_str(if content.ends_with('\r') { "\r\n" } else { "\n" });
            }
            out.push_str(FILE_END);
            out.push('\n');
        }
        out.push_str(&self.main_source);
        out
    }

    pub fn main_source(&self) -> &str {
        &self.main_source
    }

    /// Replace the main buffer. A pasted import block is dropped; the bundle
    /// renders its own.
    pub fn set_main_source(&mut self, source: &str) {
        self.main_source = strip_import_block(source).to_string();
    }

    /// Main buffer as the editor shows it, with the import block rendered
    /// for the current file set
    pub fn main_buffer(&self) -> String {
        let mut buffer = render_import_block(self.file_names());
        buffer.push_str(&self.main_source);
        buffer
    }

    pub fn files(&self) -> &BTreeMap<String, String> {
        &self.files
    }

    pub fn file(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }

    /// File names in sorted order
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }

    pub fn add_file(
        &mut self,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> BundleResult<()> {
        let name = name.into();
        validate_file_name(&name)?;
        if self.files.contains_key(&name) {
            return Err(BundleError::DuplicateFile { name });
        }
        self.files.insert(name, content.into());
        Ok(())
    }

    /// Insert or replace a file's content
    pub fn set_file(
        &mut self,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> BundleResult<()> {
        let name = name.into();
        validate_file_name(&name)?;
        self.files.insert(name, content.into());
        Ok(())
    }

    pub fn remove_file(&mut self, name: &str) -> BundleResult<String> {
        self.files
            .remove(name)
            .ok_or_else(|| BundleError::FileNotFound {
                name: name.to_string(),
            })
    }

    pub fn rename_file(&mut self, from: &str, to: impl Into<String>) -> BundleResult<()> {
        let to = to.into();
        if from == to {
            return if self.files.contains_key(from) {
                Ok(())
            } else {
                Err(BundleError::FileNotFound {
                    name: from.to_string(),
                })
            };
        }

        validate_file_name(&to)?;
        if self.files.contains_key(&to) {
            return Err(BundleError::DuplicateFile { name: to });
        }
        let content = self.remove_file(from)?;
        self.files.insert(to, content);
        Ok(())
    }

    /// Flatten the bundle for rendering
    pub fn expand(&self) -> ExpandedDocument {
        let main = self.main_buffer();
        let (source, line_map) = expand(
            &main,
            self.files
                .iter()
                .map(|(name, content)| (name.as_str(), content.as_str())),
        );
        ExpandedDocument { source, line_map }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::import_names;

    fn sample() -> SnippetBundle {
        SnippetBundle::from_parts(
            "export default () => <Card />;\n",
            [
                ("card.tsx", "export const Card = () => <div />;"),
                ("button.tsx", "export const Button = () => (\n  <button />\n);"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_serialize_layout() {
        let bundle = SnippetBundle::from_parts("main();", [("b.ts", "b"), ("a.ts", "")]).unwrap();
        assert_eq!(
            bundle.serialize(),
            "// @snippet-imports (auto-managed)\n// @import a.ts\n// @import b.ts\n\n// @snippet-file a.ts\n// @snippet-file-end\n// @snippet-file b.ts\nb\n// @snippet-file-end\nmain();"
        );
    }

    #[test]
    fn test_serialize_without_files_is_main_only() {
        let bundle = SnippetBundle::new("export default 1;");
        assert_eq!(bundle.serialize(), "export default 1;");
        assert_eq!(bundle.main_buffer(), "export default 1;");
    }

    #[test]
    fn test_round_trip() {
        let bundle = sample();
        assert_eq!(SnippetBundle::parse(&bundle.serialize()), bundle);
    }

    #[test]
    fn test_file_set_errors() {
        let mut bundle = sample();
        assert_eq!(
            bundle.add_file("card.tsx", ""),
            Err(BundleError::DuplicateFile {
                name: "card.tsx".to_string()
            })
        );
        assert!(matches!(
            bundle.add_file("main", ""),
            Err(BundleError::ReservedName { .. })
        ));
        assert!(matches!(
            bundle.remove_file("missing.tsx"),
            Err(BundleError::FileNotFound { .. })
        ));
        assert!(matches!(
            bundle.rename_file("card.tsx", "button.tsx"),
            Err(BundleError::DuplicateFile { .. })
        ));
        assert!(matches!(
            bundle.rename_file("card.tsx", "bad name"),
            Err(BundleError::InvalidName { .. })
        ));
        // Failed operations leave the file set untouched
        assert_eq!(bundle, sample());
    }

    #[test]
    fn test_import_block_tracks_file_set() {
        let mut bundle = sample();
        assert_eq!(
            import_names(&bundle.main_buffer()),
            vec!["button.tsx", "card.tsx"]
        );

        bundle.rename_file("card.tsx", "a-card.tsx").unwrap();
        bundle.add_file("z.ts", "export {}").unwrap();
        bundle.remove_file("button.tsx").unwrap();
        assert_eq!(import_names(&bundle.main_buffer()), vec!["a-card.tsx", "z.ts"]);

        bundle.remove_file("a-card.tsx").unwrap();
        bundle.remove_file("z.ts").unwrap();
        assert!(import_names(&bundle.main_buffer()).is_empty());
        assert_eq!(bundle.main_buffer(), bundle.main_source());
    }

    #[test]
    fn test_set_main_source_drops_pasted_block() {
        let mut bundle = sample();
        bundle.set_main_source("// @import stale.tsx\n\nexport default 2;");
        assert_eq!(bundle.main_source(), "export default 2;");
    }

    #[test]
    fn test_expand_resolves_to_visible_lines() {
        let bundle = sample();
        let expanded = bundle.expand();
        let map = &expanded.line_map;

        assert!(map.is_contiguous());
        assert_eq!(map.total_lines() as usize, expanded.source.lines().count());

        // header, two imports, blank
        assert_eq!(map.import_block_lines(), 4);
        let main = map.resolve(5, 16).unwrap();
        assert_eq!((main.file, main.line, main.column), (None, 1, 16));

        let button = map.resolve(7, 3).unwrap();
        assert_eq!(button.file.as_deref(), Some("button.tsx"));
        assert_eq!(button.line, 2);
    }

    #[test]
    fn test_serde_shape() {
        let bundle = SnippetBundle::from_parts("x", [("a.ts", "1")]).unwrap();
        let json = serde_json::to_string(&bundle).unwrap();
        assert_eq!(json, r#"{"mainSource":"x","files":{"a.ts":"1"}}"#);
    }
}
