use crate::{
    identifier::{CellId, Tid},
    messages::{AttrPush, AttrValue, CellDecl, MsgOp, SeriesIndex},
    types::{AttrId, DefId},
};

/// How an attribute is addressed by the side applying a push
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttrRef {
    /// Schema-local id issued by the client
    Client(AttrId),
    /// Host-native definition id
    Native(DefId),
}

/// A cell transaction operation applied to one pin context
#[derive(Clone, Debug, PartialEq)]
pub enum CellOp {
    Upsert(CellDecl),
    Insert(CellDecl),
    Push {
        cell_id: CellId,
        attr: AttrRef,
        series_index: SeriesIndex,
        value: AttrValue,
    },
    Commit {
        cell: Option<CellId>,
        tid: Option<Tid>,
    },
    Remove(CellId),
}

impl CellOp {
    /// Interprets a wire operation. Attribute ids are native definition ids
    /// when the context uses native symbols. Returns `None` for operations
    /// that are not cell transactions.
    pub fn from_wire(op: &MsgOp, native_symbols: bool) -> Option<CellOp> {
        let cell_op = match op {
            MsgOp::UpsertCell(decl) => CellOp::Upsert(decl.clone()),
            MsgOp::InsertChildCell(decl) => CellOp::Insert(decl.clone()),
            MsgOp::PushAttr(push) => {
                let attr = if native_symbols {
                    // negative ids cannot name a definition and fail lookup
                    AttrRef::Native(DefId::try_from(push.attr_id).unwrap_or(DefId::MAX))
                } else {
                    AttrRef::Client(push.attr_id)
                };
                CellOp::Push {
                    cell_id: push.cell_id,
                    attr,
                    series_index: push.series_index,
                    value: push.value.clone(),
                }
            }
            MsgOp::Commit { cell, tid } => CellOp::Commit {
                cell: *cell,
                tid: *tid,
            },
            MsgOp::RemoveCell { cell_id } => CellOp::Remove(*cell_id),
            _ => return None,
        };
        Some(cell_op)
    }

    /// The wire form of this operation, attribute ids as given
    pub fn to_wire(&self) -> MsgOp {
        match self {
            CellOp::Upsert(decl) => MsgOp::UpsertCell(decl.clone()),
            CellOp::Insert(decl) => MsgOp::InsertChildCell(decl.clone()),
            CellOp::Push {
                cell_id,
                attr,
                series_index,
                value,
            } => {
                let attr_id = match attr {
                    AttrRef::Client(attr_id) => *attr_id,
                    AttrRef::Native(def_id) => *def_id as AttrId,
                };
                MsgOp::PushAttr(AttrPush {
                    cell_id: *cell_id,
                    attr_id,
                    series_index: *series_index,
                    value: value.clone(),
                })
            }
            CellOp::Commit { cell, tid } => MsgOp::Commit {
                cell: *cell,
                tid: *tid,
            },
            CellOp::Remove(cell_id) => MsgOp::RemoveCell { cell_id: *cell_id },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CellOp::Upsert(_) => "Upsert",
            CellOp::Insert(_) => "Insert",
            CellOp::Push { .. } => "Push",
            CellOp::Commit { .. } => "Commit",
            CellOp::Remove(_) => "Remove",
        }
    }
}
