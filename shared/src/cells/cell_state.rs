use std::collections::BTreeMap;

use crate::{
    identifier::CellId,
    messages::{AttrValue, CellDecl, SeriesIndex},
    types::{AttrId, SchemaId},
};

/// Attribute state of one declared cell. Values are keyed by client
/// attribute id, then series index.
#[derive(Clone, Debug, PartialEq)]
pub struct CellState {
    cell_id: CellId,
    schema_id: SchemaId,
    parent: Option<CellId>,
    label: Option<String>,
    visible: bool,
    attrs: BTreeMap<AttrId, BTreeMap<SeriesIndex, AttrValue>>,
}

impl CellState {
    pub(crate) fn new(decl: &CellDecl, parent: Option<CellId>, visible: bool) -> Self {
        Self {
            cell_id: decl.cell_id,
            schema_id: decl.schema_id,
            parent,
            label: decl.label.clone(),
            visible,
            attrs: BTreeMap::new(),
        }
    }

    /// Re-attaches an existing cell. Attribute values survive only if the
    /// schema is unchanged.
    pub(crate) fn redeclare(&mut self, decl: &CellDecl, parent: Option<CellId>, visible: bool) {
        if self.schema_id != decl.schema_id {
            self.attrs.clear();
        }
        self.schema_id = decl.schema_id;
        self.parent = parent;
        self.visible = visible;
        if decl.label.is_some() {
            self.label = decl.label.clone();
        }
    }

    pub fn cell_id(&self) -> CellId {
        self.cell_id
    }

    pub fn schema_id(&self) -> SchemaId {
        self.schema_id
    }

    pub fn parent(&self) -> Option<CellId> {
        self.parent
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// False when the child selector of the pin filtered this cell out
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Sets a value. Nil clears the entry.
    pub(crate) fn set(&mut self, attr_id: AttrId, series_index: SeriesIndex, value: AttrValue) {
        if value == AttrValue::Nil {
            if let Some(series) = self.attrs.get_mut(&attr_id) {
                series.remove(&series_index);
                if series.is_empty() {
                    self.attrs.remove(&attr_id);
                }
            }
            return;
        }
        self.attrs
            .entry(attr_id)
            .or_default()
            .insert(series_index, value);
    }

    pub fn get(&self, attr_id: AttrId, series_index: SeriesIndex) -> Option<&AttrValue> {
        self.attrs.get(&attr_id)?.get(&series_index)
    }

    /// Value at series index 0
    pub fn value(&self, attr_id: AttrId) -> Option<&AttrValue> {
        self.get(attr_id, SeriesIndex::ZERO)
    }

    /// Entry with the greatest series index
    pub fn latest(&self, attr_id: AttrId) -> Option<(SeriesIndex, &AttrValue)> {
        self.attrs
            .get(&attr_id)?
            .iter()
            .next_back()
            .map(|(index, value)| (*index, value))
    }

    /// All values of a series ordered newest to oldest
    pub fn series_newest_first(&self, attr_id: AttrId) -> Vec<(SeriesIndex, &AttrValue)> {
        match self.attrs.get(&attr_id) {
            Some(series) => series
                .iter()
                .rev()
                .map(|(index, value)| (*index, value))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Values whose index falls within `[from, to]`, newest first
    pub fn range(
        &self,
        attr_id: AttrId,
        from: SeriesIndex,
        to: SeriesIndex,
    ) -> Vec<(SeriesIndex, &AttrValue)> {
        if from > to {
            return Vec::new();
        }
        match self.attrs.get(&attr_id) {
            Some(series) => series
                .range(from..=to)
                .rev()
                .map(|(index, value)| (*index, value))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn attr_ids(&self) -> impl Iterator<Item = AttrId> + '_ {
        self.attrs.keys().copied()
    }
}
