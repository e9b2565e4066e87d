use thiserror::Error;

use crate::{
    identifier::CellId,
    messages::{ErrCode, SeriesIndex, ValueType},
    schema::SchemaError,
    types::{AttrId, ReqId},
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CellError {
    #[error("request {req_id} already has an open pin context")]
    AlreadyPinned { req_id: ReqId },
    #[error("request {req_id} has no open pin context")]
    NotPinned { req_id: ReqId },
    #[error("parent request {parent_req} is not open")]
    ParentNotOpen { parent_req: ReqId },
    #[error("{op} is not a cell operation")]
    NotACellOp { op: &'static str },
    #[error("request {req_id} has no root cell yet")]
    NoRoot { req_id: ReqId },
    #[error("pin targets cell {expected} but root was declared as {actual}")]
    RootMismatch { expected: CellId, actual: CellId },
    #[error("cell {cell_id} was never declared in this request")]
    UndeclaredCell { cell_id: CellId },
    #[error("parent cell {parent} of {cell_id} is not declared in this request")]
    UndeclaredParent { cell_id: CellId, parent: CellId },
    #[error("cell {cell_id} is already declared in this request")]
    AlreadyDeclared { cell_id: CellId },
    #[error("cell {cell_id} cannot be its own ancestor")]
    CyclicParent { cell_id: CellId },
    #[error("attribute {attr_id} of cell {cell_id} expects {expected:?}, got {actual:?}")]
    TypeMismatch {
        cell_id: CellId,
        attr_id: AttrId,
        expected: ValueType,
        actual: ValueType,
    },
    #[error("attribute {attr_id} is not a series, index {series_index} must be 0")]
    NotASeries {
        attr_id: AttrId,
        series_index: SeriesIndex,
    },
    #[error("series index {series_index} of attribute {attr_id} names no registered symbol")]
    UnknownIndexSymbol {
        attr_id: AttrId,
        series_index: SeriesIndex,
    },
    #[error("operation needs a {size}-byte frame, frames are limited to {max} bytes")]
    TooLarge { size: u64, max: usize },
    #[error("nothing to commit in request {req_id}")]
    NothingToCommit { req_id: ReqId },
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl CellError {
    pub fn code(&self) -> ErrCode {
        match self {
            CellError::NotPinned { .. } | CellError::ParentNotOpen { .. } => ErrCode::ReqNotFound,
            CellError::RootMismatch { .. } => ErrCode::PinFailed,
            CellError::AlreadyDeclared { .. } | CellError::CyclicParent { .. } => {
                ErrCode::MalformedTx
            }
            CellError::TypeMismatch { .. }
            | CellError::NotASeries { .. }
            | CellError::TooLarge { .. } => ErrCode::BadValue,
            CellError::NothingToCommit { .. } => ErrCode::NothingToCommit,
            CellError::UnknownIndexSymbol { .. } => ErrCode::DefNotFound,
            CellError::Schema(inner) => inner.code(),
            CellError::AlreadyPinned { .. }
            | CellError::NotACellOp { .. }
            | CellError::NoRoot { .. }
            | CellError::UndeclaredCell { .. }
            | CellError::UndeclaredParent { .. } => ErrCode::InvalidReq,
        }
    }
}
