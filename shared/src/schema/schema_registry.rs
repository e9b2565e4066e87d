use std::collections::{HashMap, HashSet};

use log::debug;

use super::{
    attr_spec::{AttrSchema, AttrSpec, SeriesSpec},
    error::SchemaError,
};
use crate::{
    symbols::SymbolTable,
    types::{AttrId, DefId, SchemaId},
};

/// Series interpretation as part of a composite key, with symbol references
/// resolved to names so the key does not depend on client numbering.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SeriesKey {
    None,
    Literal,
    TimeIndex,
    NameRef(String),
}

/// Session-stable identity of an attribute: `(elem type, series, attr name)`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CompositeKey {
    pub elem_type: String,
    pub series: SeriesKey,
    pub attr_name: String,
}

impl CompositeKey {
    pub fn new(elem_type: impl Into<String>, series: SeriesKey, attr_name: impl Into<String>) -> Self {
        Self {
            elem_type: elem_type.into(),
            series,
            attr_name: attr_name.into(),
        }
    }

    fn for_spec(spec: &AttrSpec, symbols: &SymbolTable) -> Result<Self, SchemaError> {
        let elem_type = symbols.resolve(spec.elem_type)?.to_string();
        let series = match spec.series_spec {
            SeriesSpec::None => SeriesKey::None,
            SeriesSpec::Literal => SeriesKey::Literal,
            SeriesSpec::TimeIndex => SeriesKey::TimeIndex,
            SeriesSpec::NameRef(symbol) => SeriesKey::NameRef(symbols.resolve(symbol)?.to_string()),
        };
        Ok(Self {
            elem_type,
            series,
            attr_name: spec.attr_name.clone(),
        })
    }
}

/// Published schemas for one session plus the native definition numbering
#[derive(Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<SchemaId, AttrSchema>,
    defs: HashMap<CompositeKey, DefId>,
    next_def: DefId,
    attr_to_def: HashMap<(SchemaId, AttrId), DefId>,
    def_to_attr: HashMap<(SchemaId, DefId), AttrId>,
    by_model: HashMap<String, SchemaId>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self {
            schemas: HashMap::new(),
            defs: HashMap::new(),
            next_def: 1,
            attr_to_def: HashMap::new(),
            def_to_attr: HashMap::new(),
            by_model: HashMap::new(),
        }
    }
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a schema. Re-publishing an identical schema is a no-op, a
    /// different definition under a published id is refused.
    pub fn register_schema(
        &mut self,
        schema: AttrSchema,
        symbols: &SymbolTable,
    ) -> Result<SchemaId, SchemaError> {
        let schema_id = schema.schema_id;
        if let Some(existing) = self.schemas.get(&schema_id) {
            if *existing == schema {
                return Ok(schema_id);
            }
            return Err(SchemaError::ViolatesAppendOnly { schema_id });
        }

        Self::validate(&schema, symbols)?;

        for spec in &schema.attrs {
            let key = CompositeKey::for_spec(spec, symbols)?;
            let def_id = self.def_for(key);
            self.attr_to_def.insert((schema_id, spec.attr_id), def_id);
            self.def_to_attr.insert((schema_id, def_id), spec.attr_id);
        }
        debug!(
            "published schema {} ({}) with {} attributes",
            schema_id,
            schema.cell_data_model,
            schema.attrs.len()
        );
        self.by_model
            .entry(schema.cell_data_model.clone())
            .or_insert(schema_id);
        self.schemas.insert(schema_id, schema);
        Ok(schema_id)
    }

    fn validate(schema: &AttrSchema, symbols: &SymbolTable) -> Result<(), SchemaError> {
        let schema_id = schema.schema_id;
        if schema.cell_data_model.is_empty() {
            return Err(SchemaError::MissingDataModel { schema_id });
        }
        let mut seen = HashSet::new();
        for spec in &schema.attrs {
            if !seen.insert(spec.attr_id) {
                return Err(SchemaError::DuplicateAttr {
                    schema_id,
                    attr_id: spec.attr_id,
                });
            }
            if !symbols.contains(spec.elem_type) {
                return Err(SchemaError::UnknownElemType {
                    schema_id,
                    attr_id: spec.attr_id,
                    elem_type: spec.elem_type,
                });
            }
            if let SeriesSpec::NameRef(symbol) = spec.series_spec {
                if !symbols.contains(symbol) {
                    return Err(SchemaError::UnknownSeriesSymbol {
                        schema_id,
                        attr_id: spec.attr_id,
                        symbol,
                    });
                }
            }
        }
        Ok(())
    }

    fn def_for(&mut self, key: CompositeKey) -> DefId {
        if let Some(def_id) = self.defs.get(&key) {
            return *def_id;
        }
        let def_id = self.next_def;
        self.next_def = self.next_def.wrapping_add(1);
        self.defs.insert(key, def_id);
        def_id
    }

    pub fn schema(&self, schema_id: SchemaId) -> Result<&AttrSchema, SchemaError> {
        self.schemas
            .get(&schema_id)
            .ok_or(SchemaError::SchemaNotFound { schema_id })
    }

    pub fn resolve_attr(&self, schema_id: SchemaId, attr_id: AttrId) -> Result<&AttrSpec, SchemaError> {
        self.schema(schema_id)?
            .attr(attr_id)
            .ok_or(SchemaError::AttrNotFound { schema_id, attr_id })
    }

    /// Native id for a composite attribute identity. The first lookup assigns
    /// it and every later lookup in the session returns the same id.
    pub fn lookup_by_composite(&mut self, key: CompositeKey) -> DefId {
        self.def_for(key)
    }

    pub fn def_of(&self, schema_id: SchemaId, attr_id: AttrId) -> Result<DefId, SchemaError> {
        self.attr_to_def
            .get(&(schema_id, attr_id))
            .copied()
            .ok_or(SchemaError::AttrNotFound { schema_id, attr_id })
    }

    /// Client attribute id the native definition maps to within a schema
    pub fn attr_of(&self, schema_id: SchemaId, def_id: DefId) -> Result<AttrId, SchemaError> {
        self.def_to_attr
            .get(&(schema_id, def_id))
            .copied()
            .ok_or(SchemaError::DefNotInSchema { schema_id, def_id })
    }

    /// First schema published for a cell data model uri
    pub fn schema_for_model(&self, cell_data_model: &str) -> Option<SchemaId> {
        self.by_model.get(cell_data_model).copied()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
