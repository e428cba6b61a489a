//! # Snippet Workspace
//!
//! Runs the engine for an editing session:
//!
//! - [`EngineWorker`] / [`WorkerClient`]: request/response boundary for
//!   heavier scans and writes
//! - [`LayoutQueue`]: writes from continuous input, serialized per session
//! - [`LatestRequest`]: debounced reads where the last request wins
//! - [`DerivedCache`]: line maps and inspect indexes per buffer version
//! - [`InspectState`]: hover and selection over the preview

pub mod cache;
pub mod error;
pub mod inspect_state;
pub mod latest;
pub mod messages;
pub mod queue;
pub mod worker;

pub use cache::{BufferLayout, CacheStats, DerivedCache};
pub use error::{WorkspaceError, WorkspaceResult};
pub use inspect_state::{DocumentView, InspectState, InspectTarget};
pub use latest::{LatestRequest, Ticket};
pub use messages::{EngineRequest, EngineResponse, RequestPayload, ResponsePayload};
pub use queue::LayoutQueue;
pub use worker::{EngineWorker, WorkerClient};
