use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::info;

use super::{
    attr_spec::AttrSchema,
    error::SchemaError,
    schema_registry::{CompositeKey, SchemaRegistry},
};
use crate::{
    symbols::{Symbol, SymbolTable},
    types::{DefId, SchemaId},
};

/// Symbol table and schema registry of one session
#[derive(Clone, Default)]
pub struct Defs {
    pub symbols: SymbolTable,
    pub schemas: SchemaRegistry,
}

/// Counts of what a registration added
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DefsUpdate {
    pub new_symbols: usize,
    pub schemas: usize,
}

/// Read-mostly definitions shared by every pin context of a session.
/// Registration is staged on a copy and swapped in, so readers never
/// observe a partially applied batch.
#[derive(Clone, Default)]
pub struct SessionDefs {
    inner: Arc<RwLock<Defs>>,
}

impl SessionDefs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        symbols: &[Symbol],
        schemas: &[AttrSchema],
    ) -> Result<DefsUpdate, SchemaError> {
        let mut guard = self.write();
        let mut staged = guard.clone();

        let new_symbols = staged.symbols.register(symbols)?;
        let mut schema_ids: Vec<SchemaId> = Vec::with_capacity(schemas.len());
        for schema in schemas {
            let Defs { symbols, schemas } = &mut staged;
            schema_ids.push(schemas.register_schema(schema.clone(), symbols)?);
        }

        *guard = staged;
        if new_symbols > 0 || !schema_ids.is_empty() {
            info!(
                "registered {} symbols and {} schemas",
                new_symbols,
                schema_ids.len()
            );
        }
        Ok(DefsUpdate {
            new_symbols,
            schemas: schema_ids.len(),
        })
    }

    pub fn lookup_by_composite(&self, key: CompositeKey) -> DefId {
        self.write().schemas.lookup_by_composite(key)
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Defs> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Defs> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
