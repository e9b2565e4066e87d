use std::collections::HashMap;

use super::{cell_state::CellState, error::CellError};
use crate::{
    identifier::{CellId, Tid},
    messages::{CellDecl, ItemRef, PinFlags, PinRequest, PinTarget},
    types::ReqId,
};

/// Live state of one subscription: the pinned cell tree and its options
#[derive(Clone, Debug)]
pub struct PinContext {
    req_id: ReqId,
    request: PinRequest,
    root: Option<CellId>,
    cells: HashMap<CellId, CellState>,
    last_commit: Option<Tid>,
}

impl PinContext {
    pub fn new(req_id: ReqId, request: PinRequest) -> Self {
        Self {
            req_id,
            request,
            root: None,
            cells: HashMap::new(),
            last_commit: None,
        }
    }

    pub fn req_id(&self) -> ReqId {
        self.req_id
    }

    pub fn request(&self) -> &PinRequest {
        &self.request
    }

    pub fn target(&self) -> &PinTarget {
        &self.request.target
    }

    pub fn flags(&self) -> PinFlags {
        self.request.flags
    }

    pub fn uses_native_symbols(&self) -> bool {
        self.request.flags.contains(PinFlags::USE_NATIVE_SYMBOLS)
    }

    pub fn closes_on_sync(&self) -> bool {
        self.request.flags.contains(PinFlags::CLOSE_ON_SYNC)
    }

    pub fn is_no_sync(&self) -> bool {
        self.request.flags.contains(PinFlags::NO_SYNC)
    }

    pub fn root(&self) -> Option<CellId> {
        self.root
    }

    pub fn cell(&self, cell_id: &CellId) -> Option<&CellState> {
        self.cells.get(cell_id)
    }

    pub fn contains(&self, cell_id: &CellId) -> bool {
        self.cells.contains_key(cell_id)
    }

    pub fn cells(&self) -> impl Iterator<Item = &CellState> {
        self.cells.values()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Direct children of a cell, sorted by id
    pub fn children_of(&self, cell_id: &CellId) -> Vec<CellId> {
        let mut children: Vec<CellId> = self
            .cells
            .values()
            .filter(|cell| cell.parent() == Some(*cell_id))
            .map(CellState::cell_id)
            .collect();
        children.sort_unstable();
        children
    }

    pub fn last_commit(&self) -> Option<Tid> {
        self.last_commit
    }

    // Mutation, driven by the engine

    pub(crate) fn cell_mut(&mut self, cell_id: &CellId) -> Option<&mut CellState> {
        self.cells.get_mut(cell_id)
    }

    pub(crate) fn set_last_commit(&mut self, tid: Tid) {
        self.last_commit = Some(tid);
    }

    /// Whether the child selector admits a cell of this schema under `parent`
    pub(crate) fn admits_child(&self, parent: &CellId, decl: &CellDecl) -> bool {
        let parent_visible = self.cells.get(parent).is_some_and(CellState::is_visible);
        let admitted = match &self.request.child_selector {
            Some(selector) => selector.admits(ItemRef::Schema(decl.schema_id)),
            None => true,
        };
        parent_visible && admitted
    }

    /// Resolves the parent a non-root cell attaches to, defaulting to root
    pub(crate) fn resolve_parent(&self, decl: &CellDecl) -> Result<CellId, CellError> {
        let root = self.root.ok_or(CellError::NoRoot {
            req_id: self.req_id,
        })?;
        let parent = decl.parent.unwrap_or(root);
        if !self.cells.contains_key(&parent) {
            return Err(CellError::UndeclaredParent {
                cell_id: decl.cell_id,
                parent,
            });
        }
        if self.is_ancestor_or_self(&decl.cell_id, &parent) {
            return Err(CellError::CyclicParent {
                cell_id: decl.cell_id,
            });
        }
        Ok(parent)
    }

    fn is_ancestor_or_self(&self, ancestor: &CellId, cell_id: &CellId) -> bool {
        let mut current = Some(*cell_id);
        while let Some(id) = current {
            if id == *ancestor {
                return true;
            }
            current = self.cells.get(&id).and_then(CellState::parent);
        }
        false
    }

    pub(crate) fn declare_root(&mut self, decl: &CellDecl) {
        match self.cells.get_mut(&decl.cell_id) {
            Some(cell) => cell.redeclare(decl, None, true),
            None => {
                self.cells
                    .insert(decl.cell_id, CellState::new(decl, None, true));
            }
        }
        self.root = Some(decl.cell_id);
    }

    pub(crate) fn declare_child(&mut self, decl: &CellDecl, parent: CellId, visible: bool) {
        match self.cells.get_mut(&decl.cell_id) {
            Some(cell) => cell.redeclare(decl, Some(parent), visible),
            None => {
                self.cells
                    .insert(decl.cell_id, CellState::new(decl, Some(parent), visible));
            }
        }
        self.refresh_visibility(&decl.cell_id);
    }

    fn refresh_visibility(&mut self, cell_id: &CellId) {
        let mut stack = self.children_of(cell_id);
        while let Some(child) = stack.pop() {
            let Some(state) = self.cells.get(&child) else {
                continue;
            };
            let Some(parent) = state.parent() else {
                continue;
            };
            let decl = CellDecl::new(child, state.schema_id());
            let visible = self.admits_child(&parent, &decl);
            if let Some(state) = self.cells.get_mut(&child) {
                state.set_visible(visible);
            }
            stack.extend(self.children_of(&child));
        }
    }

    /// Detaches a cell and its whole subtree, returning the removed ids
    pub(crate) fn remove_subtree(&mut self, cell_id: &CellId) -> Vec<CellId> {
        let mut removed = Vec::new();
        let mut stack = vec![*cell_id];
        while let Some(id) = stack.pop() {
            stack.extend(self.children_of(&id));
            if self.cells.remove(&id).is_some() {
                removed.push(id);
            }
        }
        if self.root == Some(*cell_id) {
            self.root = None;
        }
        removed
    }
}
