use std::collections::HashMap;

use log::{debug, trace};

use super::{
    cell_op::{AttrRef, CellOp},
    cell_state::CellState,
    error::CellError,
    pin_context::PinContext,
};
use crate::{
    identifier::{CellId, Tid},
    messages::{
        AttrPush, AttrValue, CellDecl, ItemRef, MsgOp, PinRequest, PinTarget, SeriesIndex,
        ValueType,
    },
    schema::{Defs, SeriesSpec},
    types::{AttrId, ReqId},
};

/// Result of applying one operation to a pin context
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Applied {
    /// Operation to mirror to the peer, after selectors and `NoSync`
    pub emit: Option<MsgOp>,
    /// Cell state changed, so the request is syncing again
    pub changed: bool,
    /// A commit covered the pinned root
    pub covers_root: bool,
}

/// Applies cell transactions to the pin contexts of one session. Operations
/// for one request are applied in the order they are handed in; contexts of
/// different requests share nothing.
pub struct CellSyncEngine {
    contexts: HashMap<ReqId, PinContext>,
}

impl Default for CellSyncEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CellSyncEngine {
    pub fn new() -> Self {
        Self {
            contexts: HashMap::new(),
        }
    }

    pub fn open(&mut self, req_id: ReqId, request: PinRequest) -> Result<&PinContext, CellError> {
        if self.contexts.contains_key(&req_id) {
            return Err(CellError::AlreadyPinned { req_id });
        }
        if let Some(parent_req) = request.parent_req {
            if !self.contexts.contains_key(&parent_req) {
                return Err(CellError::ParentNotOpen { parent_req });
            }
        }
        debug!("opened pin context {} on {:?}", req_id, request.target);
        Ok(self
            .contexts
            .entry(req_id)
            .or_insert_with(|| PinContext::new(req_id, request)))
    }

    pub fn close(&mut self, req_id: ReqId) -> Option<PinContext> {
        let context = self.contexts.remove(&req_id);
        if context.is_some() {
            debug!("discarded pin context {}", req_id);
        }
        context
    }

    pub fn context(&self, req_id: ReqId) -> Option<&PinContext> {
        self.contexts.get(&req_id)
    }

    pub fn is_pinned(&self, req_id: ReqId) -> bool {
        self.contexts.contains_key(&req_id)
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Applies a cell operation received on the wire
    pub fn apply_wire(&mut self, req_id: ReqId, op: &MsgOp, defs: &Defs) -> Result<Applied, CellError> {
        let native = self
            .contexts
            .get(&req_id)
            .ok_or(CellError::NotPinned { req_id })?
            .uses_native_symbols();
        let cell_op = CellOp::from_wire(op, native).ok_or(CellError::NotACellOp { op: op.name() })?;
        self.apply(req_id, cell_op, defs)
    }

    /// Applies one operation. A failed operation leaves the context
    /// untouched.
    pub fn apply(&mut self, req_id: ReqId, op: CellOp, defs: &Defs) -> Result<Applied, CellError> {
        let context = self
            .contexts
            .get_mut(&req_id)
            .ok_or(CellError::NotPinned { req_id })?;
        trace!("request {} applying {}", req_id, op.name());

        match op {
            CellOp::Upsert(decl) => upsert(context, decl, defs),
            CellOp::Insert(decl) => insert(context, decl, defs),
            CellOp::Push {
                cell_id,
                attr,
                series_index,
                value,
            } => push(context, cell_id, attr, series_index, value, defs),
            CellOp::Commit { cell, tid } => commit(context, cell, tid),
            CellOp::Remove(cell_id) => remove(context, cell_id),
        }
    }
}

fn upsert(context: &mut PinContext, decl: CellDecl, defs: &Defs) -> Result<Applied, CellError> {
    defs.schemas.schema(decl.schema_id)?;

    let is_root = match context.root() {
        None => true,
        Some(root) => root == decl.cell_id,
    };

    if is_root {
        if let Some(parent) = decl.parent {
            return Err(CellError::UndeclaredParent {
                cell_id: decl.cell_id,
                parent,
            });
        }
        if let PinTarget::Cell(expected) = context.target() {
            if *expected != decl.cell_id {
                return Err(CellError::RootMismatch {
                    expected: *expected,
                    actual: decl.cell_id,
                });
            }
        }
        context.declare_root(&decl);
        return Ok(emit_unless_no_sync(context, MsgOp::UpsertCell(decl)));
    }

    // re-attaching without a parent keeps the current one
    let existing_parent = context.cell(&decl.cell_id).and_then(CellState::parent);
    let decl = match (decl.parent, existing_parent) {
        (None, Some(parent)) => CellDecl {
            parent: Some(parent),
            ..decl
        },
        _ => decl,
    };
    let parent = context.resolve_parent(&decl)?;
    let decl = CellDecl {
        parent: Some(parent),
        ..decl
    };
    let visible = context.admits_child(&parent, &decl);
    context.declare_child(&decl, parent, visible);

    if !visible {
        return Ok(changed_only());
    }
    Ok(emit_unless_no_sync(context, MsgOp::UpsertCell(decl)))
}

fn insert(context: &mut PinContext, decl: CellDecl, defs: &Defs) -> Result<Applied, CellError> {
    if context.root().is_none() {
        return Err(CellError::NoRoot {
            req_id: context.req_id(),
        });
    }
    if context.contains(&decl.cell_id) {
        return Err(CellError::AlreadyDeclared {
            cell_id: decl.cell_id,
        });
    }
    defs.schemas.schema(decl.schema_id)?;

    let parent = context.resolve_parent(&decl)?;
    let decl = CellDecl {
        parent: Some(parent),
        ..decl
    };
    let visible = context.admits_child(&parent, &decl);
    context.declare_child(&decl, parent, visible);

    if !visible {
        return Ok(changed_only());
    }
    Ok(emit_unless_no_sync(context, MsgOp::InsertChildCell(decl)))
}

fn push(
    context: &mut PinContext,
    cell_id: CellId,
    attr: AttrRef,
    series_index: SeriesIndex,
    value: AttrValue,
    defs: &Defs,
) -> Result<Applied, CellError> {
    let native = context.uses_native_symbols();
    let cell = context
        .cell(&cell_id)
        .ok_or(CellError::UndeclaredCell { cell_id })?;
    let schema_id = cell.schema_id();
    let visible = cell.is_visible();

    let attr_id: AttrId = match attr {
        AttrRef::Client(attr_id) => attr_id,
        AttrRef::Native(def_id) => defs.schemas.attr_of(schema_id, def_id)?,
    };
    let spec = defs.schemas.resolve_attr(schema_id, attr_id)?;

    if spec.series_spec == SeriesSpec::None && series_index != SeriesIndex::ZERO {
        return Err(CellError::NotASeries {
            attr_id,
            series_index,
        });
    }
    if let SeriesSpec::NameRef(_) = spec.series_spec {
        let known = u32::try_from(series_index.get()).map(|symbol| defs.symbols.contains(symbol));
        if known != Ok(true) {
            return Err(CellError::UnknownIndexSymbol {
                attr_id,
                series_index,
            });
        }
    }
    if let Some(builtin) = spec.builtin_elem() {
        if !value.conforms_to(builtin) {
            return Err(CellError::TypeMismatch {
                cell_id,
                attr_id,
                expected: ValueType::for_builtin(builtin).unwrap_or(ValueType::Nil),
                actual: value.value_type(),
            });
        }
    }

    // the id this context speaks on the wire
    let wire_attr_id = if native {
        defs.schemas.def_of(schema_id, attr_id)? as AttrId
    } else {
        attr_id
    };

    if let Some(cell) = context.cell_mut(&cell_id) {
        cell.set(attr_id, series_index, value.clone());
    }

    let admitted = match &context.request().attr_selector {
        Some(selector) => selector.admits(ItemRef::Attr(wire_attr_id)),
        None => true,
    };
    if !visible || !admitted {
        return Ok(changed_only());
    }
    let msg = AttrPush {
        cell_id,
        attr_id: wire_attr_id,
        series_index,
        value,
    };
    Ok(emit_unless_no_sync(context, MsgOp::PushAttr(msg)))
}

fn commit(context: &mut PinContext, cell: Option<CellId>, tid: Option<Tid>) -> Result<Applied, CellError> {
    let root = context.root().ok_or(CellError::NothingToCommit {
        req_id: context.req_id(),
    })?;
    let visible = match cell {
        Some(cell_id) => context
            .cell(&cell_id)
            .ok_or(CellError::UndeclaredCell { cell_id })?
            .is_visible(),
        None => true,
    };
    if let Some(tid) = tid {
        context.set_last_commit(tid);
    }
    let covers_root = cell.is_none() || cell == Some(root);
    Ok(Applied {
        emit: visible.then_some(MsgOp::Commit { cell, tid }),
        changed: false,
        covers_root,
    })
}

fn remove(context: &mut PinContext, cell_id: CellId) -> Result<Applied, CellError> {
    let visible = context
        .cell(&cell_id)
        .ok_or(CellError::UndeclaredCell { cell_id })?
        .is_visible();
    let removed = context.remove_subtree(&cell_id);
    trace!("removed {} cells under {}", removed.len(), cell_id);

    if !visible {
        return Ok(changed_only());
    }
    Ok(emit_unless_no_sync(context, MsgOp::RemoveCell { cell_id }))
}

fn changed_only() -> Applied {
    Applied {
        emit: None,
        changed: true,
        covers_root: false,
    }
}

fn emit_unless_no_sync(context: &PinContext, op: MsgOp) -> Applied {
    Applied {
        emit: (!context.is_no_sync()).then_some(op),
        changed: true,
        covers_root: false,
    }
}
