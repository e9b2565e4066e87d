use thiserror::Error;

use crate::{
    messages::ErrCode,
    symbols::SymbolError,
    types::{AttrId, DefId, SchemaId, SymbolId},
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("schema {schema_id} has no cell data model uri")]
    MissingDataModel { schema_id: SchemaId },
    #[error("schema {schema_id} declares attribute {attr_id} more than once")]
    DuplicateAttr { schema_id: SchemaId, attr_id: AttrId },
    #[error("schema {schema_id} attribute {attr_id} references unknown element type {elem_type}")]
    UnknownElemType {
        schema_id: SchemaId,
        attr_id: AttrId,
        elem_type: SymbolId,
    },
    #[error("schema {schema_id} attribute {attr_id} series references unknown symbol {symbol}")]
    UnknownSeriesSymbol {
        schema_id: SchemaId,
        attr_id: AttrId,
        symbol: SymbolId,
    },
    #[error("schema {schema_id} is already published with a different attribute set")]
    ViolatesAppendOnly { schema_id: SchemaId },
    #[error("schema {schema_id} is not registered")]
    SchemaNotFound { schema_id: SchemaId },
    #[error("schema {schema_id} has no attribute {attr_id}")]
    AttrNotFound { schema_id: SchemaId, attr_id: AttrId },
    #[error("schema {schema_id} has no attribute for definition {def_id}")]
    DefNotInSchema { schema_id: SchemaId, def_id: DefId },
    #[error(transparent)]
    Symbol(#[from] SymbolError),
}

impl SchemaError {
    pub fn code(&self) -> ErrCode {
        match self {
            SchemaError::MissingDataModel { .. }
            | SchemaError::DuplicateAttr { .. }
            | SchemaError::UnknownElemType { .. }
            | SchemaError::UnknownSeriesSymbol { .. } => ErrCode::BadSchema,
            SchemaError::ViolatesAppendOnly { .. } => ErrCode::ViolatesAppendOnly,
            SchemaError::SchemaNotFound { .. } => ErrCode::TypeNotRegistered,
            SchemaError::AttrNotFound { .. } | SchemaError::DefNotInSchema { .. } => {
                ErrCode::DefNotFound
            }
            SchemaError::Symbol(inner) => inner.code(),
        }
    }
}
