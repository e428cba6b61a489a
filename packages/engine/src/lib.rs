//! # Snippet Engine
//!
//! The parity boundary between the byte-level accelerator and the
//! parser-backed reference scans.
//!
//! ```text
//! Engine::scan_*  ──►  AcceleratorSlot ──► ModuleLoader (timeout, cooldown)
//!      │                    │
//!      │                    ▼
//!      │            AcceleratorModule::call ──► protocol::decode_*
//!      │                    │ any failure
//!      ▼                    ▼
//!  reference implementation (bundle, editor, linter)
//! ```
//!
//! Both paths produce the same data model, so callers never learn which one
//! answered unless they ask for the backend.

pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod module;
pub mod protocol;

pub use config::{AcceleratorConfig, EngineConfig, LayoutConfig, ReadConfig};
pub use engine::{Engine, ScanBackend};
pub use error::{AccelError, ConfigError, EngineError, EngineResult, ProtocolError};
pub use loader::{AcceleratorSlot, ModuleLoader, NativeLoader};
pub use module::{AcceleratorModule, NativeModule, Operation};
