use snippet_editor::WriteError;

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("engine worker has shut down")]
    WorkerClosed,

    /// The worker answered the request with an error message
    #[error("engine request {id} failed: {message}")]
    Request { id: u64, message: String },

    #[error("engine request {id} expected a {expected} response, got {actual}")]
    UnexpectedResponse {
        id: u64,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("layout write for session {session} was dropped before completing")]
    WriteDropped { session: String },

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("unknown file in bundle: {0}")]
    UnknownFile(String),
}

pub type WorkspaceResult<T> = Result<T, WorkspaceError>;
