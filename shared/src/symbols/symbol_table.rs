use std::collections::HashMap;

use log::trace;

use super::{bootstrap::bootstrap_table, error::SymbolError, symbol::Symbol, ISSUER_INITS_AT};
use crate::types::SymbolId;

/// Session-scoped, append-only interning of names to ids. Bootstrap symbols
/// resolve without ever being registered.
#[derive(Clone, Default)]
pub struct SymbolTable {
    by_id: HashMap<SymbolId, String>,
    by_name: HashMap<String, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a batch of client-issued symbols. Either every symbol is
    /// accepted or none is. Returns how many symbols were new.
    pub fn register(&mut self, symbols: &[Symbol]) -> Result<usize, SymbolError> {
        let mut staged_ids: HashMap<SymbolId, &str> = HashMap::new();
        let mut staged_names: HashMap<&str, SymbolId> = HashMap::new();

        for symbol in symbols {
            self.check(symbol)?;

            if let Some(name) = staged_ids.get(&symbol.id) {
                if *name != symbol.name {
                    return Err(SymbolError::DuplicateId {
                        id: symbol.id,
                        existing: name.to_string(),
                        requested: symbol.name.clone(),
                    });
                }
            }
            if let Some(id) = staged_names.get(symbol.name.as_str()) {
                if *id != symbol.id {
                    return Err(SymbolError::DuplicateName {
                        name: symbol.name.clone(),
                        existing: *id,
                        requested: symbol.id,
                    });
                }
            }
            staged_ids.insert(symbol.id, &symbol.name);
            staged_names.insert(&symbol.name, symbol.id);
        }

        let mut added = 0;
        for (id, name) in staged_ids {
            if self.by_id.contains_key(&id) {
                continue;
            }
            trace!("registered symbol {} = '{}'", id, name);
            self.by_id.insert(id, name.to_string());
            self.by_name.insert(name.to_string(), id);
            added += 1;
        }
        Ok(added)
    }

    fn check(&self, symbol: &Symbol) -> Result<(), SymbolError> {
        if symbol.id < ISSUER_INITS_AT {
            return Err(SymbolError::ReservedId {
                id: symbol.id,
                floor: ISSUER_INITS_AT,
            });
        }
        if symbol.name.is_empty() {
            return Err(SymbolError::EmptyName { id: symbol.id });
        }
        if let Some(existing) = self.by_id.get(&symbol.id) {
            if *existing != symbol.name {
                return Err(SymbolError::DuplicateId {
                    id: symbol.id,
                    existing: existing.clone(),
                    requested: symbol.name.clone(),
                });
            }
        }
        let existing_id = self
            .by_name
            .get(&symbol.name)
            .copied()
            .or_else(|| bootstrap_table().id_of(&symbol.name));
        if let Some(existing) = existing_id {
            if existing != symbol.id {
                return Err(SymbolError::DuplicateName {
                    name: symbol.name.clone(),
                    existing,
                    requested: symbol.id,
                });
            }
        }
        Ok(())
    }

    pub fn resolve(&self, id: SymbolId) -> Result<&str, SymbolError> {
        if let Some(name) = bootstrap_table().name_of(id) {
            return Ok(name);
        }
        self.by_id
            .get(&id)
            .map(String::as_str)
            .ok_or(SymbolError::IdNotFound { id })
    }

    pub fn resolve_name(&self, name: &str) -> Result<SymbolId, SymbolError> {
        if let Some(id) = bootstrap_table().id_of(name) {
            return Ok(id);
        }
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| SymbolError::NameNotFound {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, id: SymbolId) -> bool {
        self.resolve(id).is_ok()
    }

    /// Number of client-registered symbols
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
