use thiserror::Error;

use crate::{messages::ErrCode, types::ReqId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("request {req_id} is not open")]
    ReqNotFound { req_id: ReqId },
    #[error("request {req_id} was closed earlier")]
    Stale { req_id: ReqId },
    #[error("request {req_id} does not increase past {last}")]
    NotIncreasing { req_id: ReqId, last: ReqId },
    #[error("request {req_id} is outside the peer's id range")]
    ForeignId { req_id: ReqId },
    #[error("{op} must travel on the bootstrap request, not {req_id}")]
    NotBootstrap { req_id: ReqId, op: &'static str },
    #[error("{op} cannot travel on the bootstrap request")]
    NotSessionOp { op: &'static str },
    #[error("{op} cannot open a request")]
    NotAnOpener { op: &'static str },
    #[error("request id space exhausted")]
    Exhausted,
}

impl RequestError {
    pub fn code(&self) -> ErrCode {
        match self {
            RequestError::ReqNotFound { .. } | RequestError::Stale { .. } => ErrCode::ReqNotFound,
            RequestError::Exhausted => ErrCode::SessionExpired,
            _ => ErrCode::InvalidReq,
        }
    }
}
