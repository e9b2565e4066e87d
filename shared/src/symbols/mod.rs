mod bootstrap;
mod error;
mod symbol;
mod symbol_table;

pub use bootstrap::{bootstrap_table, BootstrapTable, BuiltinSymbol, ISSUER_INITS_AT};
pub use error::SymbolError;
pub use symbol::Symbol;
pub use symbol_table::SymbolTable;
