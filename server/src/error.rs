use thiserror::Error;

use cellsync_shared::{CellError, ConnectionError, ErrCode, IdError, RecvError, ReqError, ReqId};

use crate::session::SessionKey;

/// Errors surfaced by the host, either returned from `Server` methods or
/// delivered as `ErrorEvent`s
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CellSyncServerError {
    /// No session is connected under the given key
    #[error("Session {session} is not connected")]
    SessionNotFound { session: SessionKey },

    /// An operation on a pin context failed validation
    #[error("Request {req_id} on {session} refused the operation: {source}")]
    Cell {
        session: SessionKey,
        req_id: ReqId,
        #[source]
        source: CellError,
    },

    /// The session's transport or framing failed; the session was dropped
    #[error("Connection of {session} failed: {source}")]
    Connection {
        session: SessionKey,
        #[source]
        source: ConnectionError,
    },

    /// A queued message could not be framed; its request was closed
    #[error("Request {req_id} on {session} lost a message that fits no frame: {error}")]
    Unframeable {
        session: SessionKey,
        req_id: ReqId,
        error: ReqError,
    },

    /// The client refused one of our operations
    #[error("Client on {session} rejected an operation on request {req_id}: {error}")]
    Rejected {
        session: SessionKey,
        req_id: ReqId,
        error: ReqError,
    },

    /// The client closed the whole session with an error
    #[error("Client closed {session}: {error}")]
    SessionClosed { session: SessionKey, error: ReqError },

    /// Login was refused
    #[error("Login of user '{user_uid}' on {session} failed with {code}")]
    LoginFailed {
        session: SessionKey,
        user_uid: String,
        code: ErrCode,
    },

    /// A commit TID could not be minted
    #[error("Cannot mint a commit TID: {0}")]
    Tid(#[from] IdError),

    /// The listening socket stopped delivering sessions
    #[error("Listening socket failed: {0}")]
    Accept(#[from] RecvError),
}

impl CellSyncServerError {
    pub fn code(&self) -> ErrCode {
        match self {
            CellSyncServerError::SessionNotFound { .. } => ErrCode::NotConnected,
            CellSyncServerError::Cell { source, .. } => source.code(),
            CellSyncServerError::Connection { source, .. } => source.code(),
            CellSyncServerError::Rejected { error, .. }
            | CellSyncServerError::Unframeable { error, .. }
            | CellSyncServerError::SessionClosed { error, .. } => error.code,
            CellSyncServerError::LoginFailed { code, .. } => *code,
            CellSyncServerError::Tid(inner) => inner.code(),
            CellSyncServerError::Accept(_) => ErrCode::NotConnected,
        }
    }
}
