//! Per-session serialization of layout writes.
//!
//! Each write is a link in an append-only chain of shared futures: it awaits
//! the buffer produced by the link before it, so a drag that emits writes
//! faster than they complete never applies one to a stale snapshot.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use snippet_editor::{LayoutRequest, StyleRequest, TextRequest, WriteOutcome, WriteResult};
use snippet_engine::Engine;
use tokio::sync::oneshot;

use crate::error::{WorkspaceError, WorkspaceResult};

type BufferFuture = Shared<BoxFuture<'static, String>>;

pub struct LayoutQueue {
    session: String,
    tail: Mutex<BufferFuture>,
}

impl LayoutQueue {
    pub fn new(session: impl Into<String>, buffer: impl Into<String>) -> Self {
        let buffer = buffer.into();
        Self {
            session: session.into(),
            tail: Mutex::new(futures::future::ready(buffer).boxed().shared()),
        }
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    /// Buffer after every write enqueued so far has completed
    pub async fn current(&self) -> String {
        let tail = self.tail.lock().unwrap_or_else(PoisonError::into_inner).clone();
        tail.await
    }

    /// Append `write` to the chain. It receives the buffer left by the
    /// previous write and returns the next one. The link is driven on its own
    /// task, so it runs whether or not the returned future is awaited; must be
    /// called from within a tokio runtime.
    pub fn enqueue<F, Fut>(&self, write: F) -> impl Future<Output = String> + Send + 'static
    where
        F: FnOnce(String) -> Fut + Send + 'static,
        Fut: Future<Output = String> + Send + 'static,
    {
        let mut tail = self.tail.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = tail.clone();
        let next = async move { write(previous.await).await }.boxed().shared();
        *tail = next.clone();
        drop(tail);

        tokio::spawn(next.clone());
        next
    }

    fn apply(
        &self,
        engine: Arc<Engine>,
        run: impl FnOnce(&Engine, &str) -> WriteResult<WriteOutcome> + Send + 'static,
    ) -> impl Future<Output = WorkspaceResult<WriteOutcome>> + Send + 'static {
        let (tx, rx) = oneshot::channel();
        let session = self.session.clone();

        let _ = self.enqueue(move |buffer| async move {
            match run(&engine, &buffer) {
                Ok(outcome) => {
                    let next = outcome.source.clone();
                    let _ = tx.send(Ok(outcome));
                    next
                }
                Err(error) => {
                    tracing::debug!(session = %session, error = %error, "queued write refused; buffer unchanged");
                    let _ = tx.send(Err(error));
                    buffer
                }
            }
        });

        let session = self.session.clone();
        async move {
            match rx.await {
                Ok(result) => result.map_err(WorkspaceError::from),
                Err(_) => Err(WorkspaceError::WriteDropped { session }),
            }
        }
    }

    /// Queue a layout write; a refused write leaves the buffer unchanged
    pub fn apply_layout(
        &self,
        engine: Arc<Engine>,
        request: LayoutRequest,
    ) -> impl Future<Output = WorkspaceResult<WriteOutcome>> + Send + 'static {
        self.apply(engine, move |engine, buffer| engine.apply_layout(buffer, &request))
    }

    pub fn apply_style(
        &self,
        engine: Arc<Engine>,
        request: StyleRequest,
    ) -> impl Future<Output = WorkspaceResult<WriteOutcome>> + Send + 'static {
        self.apply(engine, move |engine, buffer| engine.apply_style(buffer, &request))
    }

    pub fn apply_text(
        &self,
        engine: Arc<Engine>,
        request: TextRequest,
    ) -> impl Future<Output = WorkspaceResult<WriteOutcome>> + Send + 'static {
        self.apply(engine, move |engine, buffer| engine.apply_text(buffer, &request))
    }
}

impl std::fmt::Debug for LayoutQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutQueue")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
