use std::time::Duration;

use thiserror::Error;

use cellsync_shared::{
    CellError, ConnectionError, ErrCode, ReqError, ReqId, RequestError, SchemaError,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CellSyncClientError {
    /// No transport has been connected, or the session already ended
    #[error("Client is not connected")]
    NotConnected,

    /// `login` was called while a login is pending or accepted
    #[error("Client has already started a login")]
    AlreadyLoggedIn,

    #[error("Transport or framing failed: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Definitions were refused: {0}")]
    Schema(#[from] SchemaError),

    #[error("Request bookkeeping failed: {0}")]
    Request(#[from] RequestError),

    /// A local write or a host operation failed validation
    #[error("Request {req_id} refused the operation: {source}")]
    Cell {
        req_id: ReqId,
        #[source]
        source: CellError,
    },

    /// The host closed a request with an error. `retry_after` is set when the
    /// error is transient and the retry budget is not spent.
    #[error("Request {req_id} failed: {error}")]
    RequestFailed {
        req_id: ReqId,
        error: ReqError,
        retry_after: Option<Duration>,
    },

    /// A queued message could not be framed; its request was closed
    #[error("Request {req_id} lost a message that fits no frame: {error}")]
    Unframeable { req_id: ReqId, error: ReqError },

    /// The host refused one operation and kept the request open
    #[error("Host rejected an operation on request {req_id}: {error}")]
    Rejected { req_id: ReqId, error: ReqError },

    /// The host ended the session with an error
    #[error("Host closed the session: {error}")]
    SessionClosed { error: ReqError },

    #[error("Login failed with {code}")]
    LoginFailed { code: ErrCode },

    /// The host sent something only a host can receive
    #[error("Host sent unexpected {op} on request {req_id}")]
    UnexpectedOp { req_id: ReqId, op: &'static str },

    /// `repin` was asked for a request that has nothing left to retry
    #[error("Request {req_id} cannot be retried")]
    NoRetry { req_id: ReqId },
}

impl CellSyncClientError {
    pub fn code(&self) -> ErrCode {
        match self {
            CellSyncClientError::NotConnected => ErrCode::NotConnected,
            CellSyncClientError::AlreadyLoggedIn => ErrCode::InvalidReq,
            CellSyncClientError::Connection(inner) => inner.code(),
            CellSyncClientError::Schema(inner) => inner.code(),
            CellSyncClientError::Request(inner) => inner.code(),
            CellSyncClientError::Cell { source, .. } => source.code(),
            CellSyncClientError::RequestFailed { error, .. }
            | CellSyncClientError::Rejected { error, .. }
            | CellSyncClientError::Unframeable { error, .. }
            | CellSyncClientError::SessionClosed { error } => error.code,
            CellSyncClientError::LoginFailed { code } => *code,
            CellSyncClientError::UnexpectedOp { .. } => ErrCode::InvalidReq,
            CellSyncClientError::NoRetry { .. } => ErrCode::ReqNotFound,
        }
    }

    /// How long to wait before retrying, for transient request failures
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            CellSyncClientError::RequestFailed { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}
