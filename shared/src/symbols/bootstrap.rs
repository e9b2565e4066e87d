use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::types::SymbolId;

/// Lowest symbol id a client may issue. Everything below is reserved for the
/// bootstrap table.
pub const ISSUER_INITS_AT: SymbolId = 256;

/// Well-known symbols present in every session before any registration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinSymbol {
    Err,
    RegisterDefs,
    HandleUri,
    PinRequest,
    Login,
    LoginChallenge,
    LoginResponse,

    // builtin element types
    Int,
    Float,
    Bool,
    Text,
    Bytes,
    Tid,
    CellId,
}

impl BuiltinSymbol {
    pub const ALL: [BuiltinSymbol; 14] = [
        BuiltinSymbol::Err,
        BuiltinSymbol::RegisterDefs,
        BuiltinSymbol::HandleUri,
        BuiltinSymbol::PinRequest,
        BuiltinSymbol::Login,
        BuiltinSymbol::LoginChallenge,
        BuiltinSymbol::LoginResponse,
        BuiltinSymbol::Int,
        BuiltinSymbol::Float,
        BuiltinSymbol::Bool,
        BuiltinSymbol::Text,
        BuiltinSymbol::Bytes,
        BuiltinSymbol::Tid,
        BuiltinSymbol::CellId,
    ];

    pub fn id(&self) -> SymbolId {
        match self {
            BuiltinSymbol::Err => 1,
            BuiltinSymbol::RegisterDefs => 2,
            BuiltinSymbol::HandleUri => 3,
            BuiltinSymbol::PinRequest => 4,
            BuiltinSymbol::Login => 5,
            BuiltinSymbol::LoginChallenge => 6,
            BuiltinSymbol::LoginResponse => 7,
            BuiltinSymbol::Int => 16,
            BuiltinSymbol::Float => 17,
            BuiltinSymbol::Bool => 18,
            BuiltinSymbol::Text => 19,
            BuiltinSymbol::Bytes => 20,
            BuiltinSymbol::Tid => 21,
            BuiltinSymbol::CellId => 22,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinSymbol::Err => "cellsync.err",
            BuiltinSymbol::RegisterDefs => "cellsync.register-defs",
            BuiltinSymbol::HandleUri => "cellsync.handle-uri",
            BuiltinSymbol::PinRequest => "cellsync.pin-request",
            BuiltinSymbol::Login => "cellsync.login",
            BuiltinSymbol::LoginChallenge => "cellsync.login-challenge",
            BuiltinSymbol::LoginResponse => "cellsync.login-response",
            BuiltinSymbol::Int => "i64",
            BuiltinSymbol::Float => "f64",
            BuiltinSymbol::Bool => "bool",
            BuiltinSymbol::Text => "text",
            BuiltinSymbol::Bytes => "bytes",
            BuiltinSymbol::Tid => "tid",
            BuiltinSymbol::CellId => "cell_id",
        }
    }

    pub fn is_elem_type(&self) -> bool {
        self.id() >= 16
    }

    pub fn from_id(id: SymbolId) -> Option<Self> {
        bootstrap_table().by_id.get(&id).copied()
    }
}

/// Fixed, versioned set of reserved symbols. Built once per process and
/// shared read-only by every session.
pub struct BootstrapTable {
    version: u16,
    by_id: HashMap<SymbolId, BuiltinSymbol>,
    by_name: HashMap<&'static str, BuiltinSymbol>,
}

impl BootstrapTable {
    pub const VERSION: u16 = 1;

    fn build() -> Self {
        let mut by_id = HashMap::new();
        let mut by_name = HashMap::new();
        for builtin in BuiltinSymbol::ALL {
            debug_assert!(builtin.id() < ISSUER_INITS_AT);
            by_id.insert(builtin.id(), builtin);
            by_name.insert(builtin.name(), builtin);
        }
        Self {
            version: Self::VERSION,
            by_id,
            by_name,
        }
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn name_of(&self, id: SymbolId) -> Option<&'static str> {
        self.by_id.get(&id).map(BuiltinSymbol::name)
    }

    pub fn id_of(&self, name: &str) -> Option<SymbolId> {
        self.by_name.get(name).map(BuiltinSymbol::id)
    }

    pub fn iter(&self) -> impl Iterator<Item = BuiltinSymbol> + '_ {
        BuiltinSymbol::ALL.into_iter()
    }
}

static BOOTSTRAP_V1: Lazy<BootstrapTable> = Lazy::new(BootstrapTable::build);

pub fn bootstrap_table() -> &'static BootstrapTable {
    &BOOTSTRAP_V1
}
