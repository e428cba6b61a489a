use std::sync::Arc;

use snippet_bundle::FileBlockScan;
use snippet_editor::{
    apply_layout, apply_style, apply_text, read_style_state, InspectIndex, LayoutRequest, StyleRequest,
    StyleState, TextRequest, WriteOutcome, WriteResult,
};
use snippet_linter::SecurityIssue;
use snippet_sourcemap::SourcePosition;

use crate::config::EngineConfig;
use crate::error::{AccelError, ProtocolError};
use crate::loader::{AcceleratorSlot, ModuleLoader, NativeLoader};
use crate::module::Operation;
use crate::protocol;

/// Which implementation answered a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanBackend {
    Accelerator,
    Reference,
}

/// Entry point for every engine operation.
///
/// Scans go to the accelerator when it is available and fall back to the
/// reference implementation for that call on any failure. With
/// `verify_parity` set, every accelerated answer is checked against the
/// reference and the reference answer wins on a mismatch. Reads and writes
/// of styling always run on the reference implementation.
pub struct Engine {
    config: EngineConfig,
    slot: AcceleratorSlot,
}

impl Engine {
    /// Engine backed by the linked native accelerator
    pub fn new(config: EngineConfig) -> Self {
        Self::with_loader(config, Arc::new(NativeLoader))
    }

    pub fn with_loader(config: EngineConfig, loader: Arc<dyn ModuleLoader>) -> Self {
        let slot = AcceleratorSlot::new(loader, config.accelerator.clone());
        Self { config, slot }
    }

    /// Engine that never touches the accelerator
    pub fn reference(mut config: EngineConfig) -> Self {
        config.accelerator.enabled = false;
        Self::new(config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn accelerator(&self) -> &AcceleratorSlot {
        &self.slot
    }

    /// Accelerated answer when available, else the reference answer
    fn scan_with<T: PartialEq>(
        &self,
        operation: Operation,
        source: &str,
        decode: impl FnOnce(&[u8]) -> Result<T, ProtocolError>,
        reference: impl FnOnce(&str) -> T,
    ) -> (T, ScanBackend) {
        let Some(value) = self.accelerated(operation, source, decode) else {
            return (reference(source), ScanBackend::Reference);
        };
        if !self.config.accelerator.verify_parity {
            return (value, ScanBackend::Accelerator);
        }

        let expected = reference(source);
        if value == expected {
            (value, ScanBackend::Accelerator)
        } else {
            tracing::warn!(
                export = operation.export_name(),
                bytes = source.len(),
                "accelerator answer differs from the reference; using the reference"
            );
            (expected, ScanBackend::Reference)
        }
    }

    fn accelerated<T>(
        &self,
        operation: Operation,
        source: &str,
        decode: impl FnOnce(&[u8]) -> Result<T, ProtocolError>,
    ) -> Option<T> {
        let export = operation.export_name();
        let module = match self.slot.module() {
            Ok(module) => module,
            Err(AccelError::Disabled) => return None,
            Err(error) => {
                tracing::debug!(export, error = %error, "accelerator unavailable");
                return None;
            }
        };

        if !module.has_export(export) {
            tracing::warn!(export, module = module.name(), "accelerator lacks export; falling back");
            return None;
        }

        let output = match module.call(operation, source) {
            Ok(output) => output,
            Err(error) => {
                tracing::warn!(export, error = %error, "accelerator call failed; falling back");
                return None;
            }
        };

        match decode(&output) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(export, error = %error, "malformed accelerator output; falling back");
                None
            }
        }
    }

    pub fn scan_file_blocks_with_backend(&self, source: &str) -> (FileBlockScan, ScanBackend) {
        self.scan_with(
            Operation::FileBlocks,
            source,
            protocol::decode_file_blocks,
            snippet_bundle::scan_file_blocks,
        )
    }

    pub fn scan_file_blocks(&self, source: &str) -> FileBlockScan {
        self.scan_file_blocks_with_backend(source).0
    }

    pub fn scan_class_candidates(&self, source: &str) -> Vec<String> {
        self.scan_with(
            Operation::ClassCandidates,
            source,
            protocol::decode_candidates,
            snippet_editor::scan_class_candidates,
        )
        .0
    }

    pub fn scan_security(&self, source: &str) -> Vec<SecurityIssue> {
        self.scan_with(
            Operation::Security,
            source,
            protocol::decode_security,
            snippet_linter::scan,
        )
        .0
    }

    pub fn build_inspect_index(&self, source: &str) -> InspectIndex {
        self.scan_with(
            Operation::InspectIndex,
            source,
            protocol::decode_inspect_index,
            InspectIndex::build,
        )
        .0
    }

    pub fn read_style_state(&self, source: &str, position: SourcePosition) -> StyleState {
        read_style_state(source, position)
    }

    /// Layout write with the configured snap threshold
    pub fn apply_layout(&self, source: &str, request: &LayoutRequest) -> WriteResult<WriteOutcome> {
        apply_layout(source, request, &self.config.layout.options())
    }

    pub fn apply_style(&self, source: &str, request: &StyleRequest) -> WriteResult<WriteOutcome> {
        apply_style(source, request)
    }

    pub fn apply_text(&self, source: &str, request: &TextRequest) -> WriteResult<WriteOutcome> {
        apply_text(source, request)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("accelerator", &self.slot)
            .finish()
    }
}
