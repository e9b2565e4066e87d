use thiserror::Error;

use crate::{messages::ErrCode, types::SymbolId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SymbolError {
    #[error("symbol id {id} is below the client-issuable floor {floor}")]
    ReservedId { id: SymbolId, floor: SymbolId },
    #[error("symbol id {id} is already bound to '{existing}', cannot bind it to '{requested}'")]
    DuplicateId {
        id: SymbolId,
        existing: String,
        requested: String,
    },
    #[error("symbol name '{name}' is already bound to id {existing}, cannot bind it to id {requested}")]
    DuplicateName {
        name: String,
        existing: SymbolId,
        requested: SymbolId,
    },
    #[error("symbol name must not be empty (id {id})")]
    EmptyName { id: SymbolId },
    #[error("no symbol with id {id}")]
    IdNotFound { id: SymbolId },
    #[error("no symbol named '{name}'")]
    NameNotFound { name: String },
}

impl SymbolError {
    pub fn code(&self) -> ErrCode {
        match self {
            SymbolError::ReservedId { .. } | SymbolError::EmptyName { .. } => ErrCode::InvalidReq,
            SymbolError::DuplicateId { .. } | SymbolError::DuplicateName { .. } => {
                ErrCode::DuplicateSymbol
            }
            SymbolError::IdNotFound { .. } | SymbolError::NameNotFound { .. } => {
                ErrCode::DefNotFound
            }
        }
    }
}
