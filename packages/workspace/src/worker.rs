//! Request/response boundary around the engine.
//!
//! `EngineWorker` owns an [`Engine`] and answers [`EngineRequest`]s in arrival
//! order. `WorkerClient` hands out request ids, parks a oneshot per pending
//! request and routes each [`EngineResponse`] back to its caller by id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use snippet_bundle::FileBlockScan;
use snippet_editor::{InspectIndex, LayoutRequest, StyleRequest, StyleState, TextRequest, WriteOutcome};
use snippet_engine::Engine;
use snippet_linter::SecurityIssue;
use snippet_sourcemap::SourcePosition;
use tokio::sync::{mpsc, oneshot};

use crate::error::{WorkspaceError, WorkspaceResult};
use crate::messages::{EngineRequest, EngineResponse, RequestPayload, ResponsePayload};

const CHANNEL_CAPACITY: usize = 64;

pub struct EngineWorker {
    engine: Arc<Engine>,
    requests: mpsc::Receiver<EngineRequest>,
    responses: mpsc::Sender<EngineResponse>,
}

impl EngineWorker {
    pub fn new(
        engine: Arc<Engine>,
        requests: mpsc::Receiver<EngineRequest>,
        responses: mpsc::Sender<EngineResponse>,
    ) -> Self {
        Self {
            engine,
            requests,
            responses,
        }
    }

    /// Start a worker task and return a client connected to it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(engine: Arc<Engine>) -> WorkerClient {
        let (request_tx, request_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (response_tx, response_rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(EngineWorker::new(engine, request_rx, response_tx).run());
        WorkerClient::connect(request_tx, response_rx)
    }

    pub async fn run(mut self) {
        while let Some(EngineRequest { id, payload }) = self.requests.recv().await {
            let kind = payload.kind();
            let engine = self.engine.clone();
            let result = match tokio::task::spawn_blocking(move || handle(&engine, payload)).await {
                Ok(result) => result.map_err(|err| format!("{err:#}")),
                Err(join_error) => {
                    tracing::error!(id, kind, error = %join_error, "engine request panicked");
                    Err(format!("{kind} panicked: {join_error}"))
                }
            };

            if self.responses.send(EngineResponse { id, result }).await.is_err() {
                tracing::debug!("worker client dropped; stopping");
                break;
            }
        }
    }
}

fn handle(engine: &Engine, payload: RequestPayload) -> anyhow::Result<ResponsePayload> {
    let response = match payload {
        RequestPayload::ScanFileBlocks { source } => {
            ResponsePayload::FileBlocks(engine.scan_file_blocks(&source))
        }
        RequestPayload::ScanClassCandidates { source } => {
            ResponsePayload::ClassCandidates(engine.scan_class_candidates(&source))
        }
        RequestPayload::ScanSecurity { source } => ResponsePayload::Security(engine.scan_security(&source)),
        RequestPayload::BuildInspectIndex { source } => {
            ResponsePayload::InspectIndex(engine.build_inspect_index(&source))
        }
        RequestPayload::ReadStyleState { source, position } => {
            ResponsePayload::StyleState(engine.read_style_state(&source, position))
        }
        RequestPayload::ApplyLayout { source, request } => ResponsePayload::Write(
            engine
                .apply_layout(&source, &request)
                .context("layout write failed")?,
        ),
        RequestPayload::ApplyStyle { source, request } => ResponsePayload::Write(
            engine
                .apply_style(&source, &request)
                .context("style write failed")?,
        ),
        RequestPayload::ApplyText { source, request } => ResponsePayload::Write(
            engine
                .apply_text(&source, &request)
                .context("text write failed")?,
        ),
    };
    Ok(response)
}

type Pending = HashMap<u64, oneshot::Sender<Result<ResponsePayload, String>>>;

fn lock(pending: &Mutex<Pending>) -> MutexGuard<'_, Pending> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cloneable handle for sending requests to an [`EngineWorker`]
#[derive(Clone)]
pub struct WorkerClient {
    requests: mpsc::Sender<EngineRequest>,
    pending: Arc<Mutex<Pending>>,
    next_id: Arc<AtomicU64>,
}

impl WorkerClient {
    /// Attach to a worker's channels. Spawns the task that routes responses,
    /// so it must be called from within a tokio runtime.
    pub fn connect(
        requests: mpsc::Sender<EngineRequest>,
        mut responses: mpsc::Receiver<EngineResponse>,
    ) -> Self {
        let pending: Arc<Mutex<Pending>> = Arc::default();
        let table = pending.clone();

        tokio::spawn(async move {
            while let Some(EngineResponse { id, result }) = responses.recv().await {
                let waiter = lock(&table).remove(&id);
                match waiter {
                    Some(waiter) => {
                        // The caller may have given up on the request
                        let _ = waiter.send(result);
                    }
                    None => tracing::warn!(id, "response for unknown request; ignoring"),
                }
            }
            // Dropping the senders wakes every waiter with `WorkerClosed`
            lock(&table).clear();
        });

        Self {
            requests,
            pending,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Requests sent but not yet answered
    pub fn pending(&self) -> usize {
        lock(&self.pending).len()
    }

    async fn exchange(&self, payload: RequestPayload) -> WorkspaceResult<(u64, ResponsePayload)> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(id, tx);

        if self.requests.send(EngineRequest { id, payload }).await.is_err() {
            lock(&self.pending).remove(&id);
            return Err(WorkspaceError::WorkerClosed);
        }

        match rx.await {
            Ok(Ok(payload)) => Ok((id, payload)),
            Ok(Err(message)) => Err(WorkspaceError::Request { id, message }),
            Err(_) => Err(WorkspaceError::WorkerClosed),
        }
    }

    pub async fn request(&self, payload: RequestPayload) -> WorkspaceResult<ResponsePayload> {
        self.exchange(payload).await.map(|(_, payload)| payload)
    }

    pub async fn scan_file_blocks(&self, source: impl Into<String>) -> WorkspaceResult<FileBlockScan> {
        match self
            .exchange(RequestPayload::ScanFileBlocks {
                source: source.into(),
            })
            .await?
        {
            (_, ResponsePayload::FileBlocks(scan)) => Ok(scan),
            (id, other) => Err(unexpected(id, "fileBlocks", &other)),
        }
    }

    pub async fn scan_class_candidates(&self, source: impl Into<String>) -> WorkspaceResult<Vec<String>> {
        match self
            .exchange(RequestPayload::ScanClassCandidates {
                source: source.into(),
            })
            .await?
        {
            (_, ResponsePayload::ClassCandidates(candidates)) => Ok(candidates),
            (id, other) => Err(unexpected(id, "classCandidates", &other)),
        }
    }

    pub async fn scan_security(&self, source: impl Into<String>) -> WorkspaceResult<Vec<SecurityIssue>> {
        match self
            .exchange(RequestPayload::ScanSecurity {
                source: source.into(),
            })
            .await?
        {
            (_, ResponsePayload::Security(issues)) => Ok(issues),
            (id, other) => Err(unexpected(id, "security", &other)),
        }
    }

    pub async fn build_inspect_index(&self, source: impl Into<String>) -> WorkspaceResult<InspectIndex> {
        match self
            .exchange(RequestPayload::BuildInspectIndex {
                source: source.into(),
            })
            .await?
        {
            (_, ResponsePayload::InspectIndex(index)) => Ok(index),
            (id, other) => Err(unexpected(id, "inspectIndex", &other)),
        }
    }

    pub async fn read_style_state(
        &self,
        source: impl Into<String>,
        position: SourcePosition,
    ) -> WorkspaceResult<StyleState> {
        match self
            .exchange(RequestPayload::ReadStyleState {
                source: source.into(),
                position,
            })
            .await?
        {
            (_, ResponsePayload::StyleState(state)) => Ok(state),
            (id, other) => Err(unexpected(id, "styleState", &other)),
        }
    }

    pub async fn apply_layout(
        &self,
        source: impl Into<String>,
        request: LayoutRequest,
    ) -> WorkspaceResult<WriteOutcome> {
        self.write(RequestPayload::ApplyLayout {
            source: source.into(),
            request,
        })
        .await
    }

    pub async fn apply_style(
        &self,
        source: impl Into<String>,
        request: StyleRequest,
    ) -> WorkspaceResult<WriteOutcome> {
        self.write(RequestPayload::ApplyStyle {
            source: source.into(),
            request,
        })
        .await
    }

    pub async fn apply_text(
        &self,
        source: impl Into<String>,
        request: TextRequest,
    ) -> WorkspaceResult<WriteOutcome> {
        self.write(RequestPayload::ApplyText {
            source: source.into(),
            request,
        })
        .await
    }

    async fn write(&self, payload: RequestPayload) -> WorkspaceResult<WriteOutcome> {
        match self.exchange(payload).await? {
            (_, ResponsePayload::Write(outcome)) => Ok(outcome),
            (id, other) => Err(unexpected(id, "write", &other)),
        }
    }
}

fn unexpected(id: u64, expected: &'static str, actual: &ResponsePayload) -> WorkspaceError {
    let actual = actual.kind();
    tracing::error!(id, expected, actual, "worker answered with the wrong response kind");
    WorkspaceError::UnexpectedResponse {
        id,
        expected,
        actual,
    }
}

impl std::fmt::Debug for WorkerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerClient")
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snippet_engine::EngineConfig;

    const CARD: &str = "<div className=\"p-4 flex\">{localStorage.x}</div>";

    fn client() -> WorkerClient {
        EngineWorker::spawn(Arc::new(Engine::new(EngineConfig::default())))
    }

    #[tokio::test]
    async fn test_scans_through_worker() {
        let client = client();
        assert_eq!(client.scan_class_candidates(CARD).await.unwrap(), vec!["p-4", "flex"]);
        let issues = client.scan_security(CARD).await.unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule, "no-storage-access");
        assert_eq!(client.build_inspect_index(CARD).await.unwrap().len(), 1);
        assert_eq!(client.pending(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_requests_get_their_own_answers() {
        let client = client();
        let sources: Vec<String> = (1..=8)
            .map(|i| format!("<b className=\"p-{i}\">x</b>"))
            .collect();
        let answers = futures::future::join_all(
            sources.iter().map(|source| client.scan_class_candidates(source.clone())),
        )
        .await;
        for (i, answer) in answers.into_iter().enumerate() {
            assert_eq!(answer.unwrap(), vec![format!("p-{}", i + 1)]);
        }
    }

    #[tokio::test]
    async fn test_write_error_becomes_message() {
        let client = client();
        let request = TextRequest {
            position: SourcePosition::new(1, 1),
            text: "hi".to_string(),
        };
        match client.apply_text("const x = 1;", request).await {
            Err(WorkspaceError::Request { message, .. }) => {
                assert!(message.starts_with("text write failed: "), "{message}");
            }
            other => panic!("expected a request error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unmatched_response_ids_are_ignored() {
        let (request_tx, mut request_rx) = mpsc::channel::<EngineRequest>(4);
        let (response_tx, response_rx) = mpsc::channel(4);
        let client = WorkerClient::connect(request_tx, response_rx);

        tokio::spawn(async move {
            while let Some(request) = request_rx.recv().await {
                let stray = EngineResponse {
                    id: request.id + 100,
                    result: Ok(ResponsePayload::ClassCandidates(vec!["stray".to_string()])),
                };
                let answer = EngineResponse {
                    id: request.id,
                    result: Ok(ResponsePayload::ClassCandidates(vec!["real".to_string()])),
                };
                response_tx.send(stray).await.unwrap();
                response_tx.send(answer).await.unwrap();
            }
        });

        assert_eq!(client.scan_class_candidates("x").await.unwrap(), vec!["real"]);
    }

    #[tokio::test]
    async fn test_wrong_response_kind() {
        let (request_tx, mut request_rx) = mpsc::channel::<EngineRequest>(4);
        let (response_tx, response_rx) = mpsc::channel(4);
        let client = WorkerClient::connect(request_tx, response_rx);

        tokio::spawn(async move {
            if let Some(request) = request_rx.recv().await {
                let answer = EngineResponse {
                    id: request.id,
                    result: Ok(ResponsePayload::Security(Vec::new())),
                };
                response_tx.send(answer).await.unwrap();
            }
        });

        assert!(matches!(
            client.scan_class_candidates("x").await,
            Err(WorkspaceError::UnexpectedResponse {
                expected: "classCandidates",
                actual: "security",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_closed_worker() {
        let (request_tx, request_rx) = mpsc::channel::<EngineRequest>(4);
        let (_response_tx, response_rx) = mpsc::channel(4);
        let client = WorkerClient::connect(request_tx, response_rx);
        drop(request_rx);
        assert!(matches!(
            client.scan_security("x").await,
            Err(WorkspaceError::WorkerClosed)
        ));
        assert_eq!(client.pending(), 0);
    }
}
