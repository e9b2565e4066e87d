use crate::{
    identifier::{CellId, Tid},
    messages::{err_code::ReqError, pin_request::PinRequest, value::AttrValue, SeriesIndex},
    schema::AttrSchema,
    symbols::Symbol,
    types::{AttrId, ReqId, SchemaId},
};

/// Envelope flags. Only bits below `VALUE_SHARED` ever reach the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MsgFlags(u32);

impl MsgFlags {
    pub const NONE: MsgFlags = MsgFlags(0);
    /// The value buffer is shared and read-only until the message is released
    pub const VALUE_SHARED: MsgFlags = MsgFlags(1 << 31);

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Bits as they are written to the wire
    pub fn wire_bits(&self) -> u32 {
        self.0 & !Self::VALUE_SHARED.0
    }

    pub fn contains(&self, other: MsgFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: MsgFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: MsgFlags) {
        self.0 &= !other.0;
    }
}

/// Declaration of a cell under the current pin
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellDecl {
    pub cell_id: CellId,
    pub schema_id: SchemaId,
    pub parent: Option<CellId>,
    pub label: Option<String>,
}

impl CellDecl {
    pub fn new(cell_id: CellId, schema_id: SchemaId) -> Self {
        Self {
            cell_id,
            schema_id,
            parent: None,
            label: None,
        }
    }

    pub fn under(mut self, parent: CellId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AttrPush {
    pub cell_id: CellId,
    pub attr_id: AttrId,
    pub series_index: SeriesIndex,
    pub value: AttrValue,
}

impl AttrPush {
    pub fn new(
        cell_id: CellId,
        attr_id: AttrId,
        series_index: impl Into<SeriesIndex>,
        value: impl Into<AttrValue>,
    ) -> Self {
        Self {
            cell_id,
            attr_id,
            series_index: series_index.into(),
            value: value.into(),
        }
    }
}

/// Every operation kind carried by a `Msg`
#[derive(Clone, Debug, PartialEq)]
pub enum MsgOp {
    Login {
        user_uid: String,
        device_uid: String,
    },
    LoginChallenge {
        hash: Vec<u8>,
    },
    LoginResponse {
        hash_resp: Vec<u8>,
    },
    LoginAccepted,
    RegisterDefs {
        symbols: Vec<Symbol>,
        schemas: Vec<AttrSchema>,
    },
    PinCell(PinRequest),
    UpsertCell(CellDecl),
    InsertChildCell(CellDecl),
    PushAttr(AttrPush),
    Commit {
        cell: Option<CellId>,
        tid: Option<Tid>,
    },
    RemoveCell {
        cell_id: CellId,
    },
    CloseReq {
        error: Option<ReqError>,
    },
    Reject {
        error: ReqError,
    },
}

impl MsgOp {
    pub fn code(&self) -> u8 {
        match self {
            MsgOp::Login { .. } => 1,
            MsgOp::LoginChallenge { .. } => 2,
            MsgOp::LoginResponse { .. } => 3,
            MsgOp::LoginAccepted => 4,
            MsgOp::RegisterDefs { .. } => 10,
            MsgOp::PinCell(_) => 11,
            MsgOp::UpsertCell(_) => 20,
            MsgOp::InsertChildCell(_) => 21,
            MsgOp::PushAttr(_) => 22,
            MsgOp::Commit { .. } => 23,
            MsgOp::RemoveCell { .. } => 24,
            MsgOp::CloseReq { .. } => 30,
            MsgOp::Reject { .. } => 31,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MsgOp::Login { .. } => "Login",
            MsgOp::LoginChallenge { .. } => "LoginChallenge",
            MsgOp::LoginResponse { .. } => "LoginResponse",
            MsgOp::LoginAccepted => "LoginAccepted",
            MsgOp::RegisterDefs { .. } => "RegisterDefs",
            MsgOp::PinCell(_) => "PinCell",
            MsgOp::UpsertCell(_) => "UpsertCell",
            MsgOp::InsertChildCell(_) => "InsertChildCell",
            MsgOp::PushAttr(_) => "PushAttr",
            MsgOp::Commit { .. } => "Commit",
            MsgOp::RemoveCell { .. } => "RemoveCell",
            MsgOp::CloseReq { .. } => "CloseReq",
            MsgOp::Reject { .. } => "Reject",
        }
    }

    /// Operations exchanged before any pin, on the bootstrap request id
    pub fn is_session_op(&self) -> bool {
        matches!(
            self,
            MsgOp::Login { .. }
                | MsgOp::LoginChallenge { .. }
                | MsgOp::LoginResponse { .. }
                | MsgOp::LoginAccepted
                | MsgOp::RegisterDefs { .. }
        )
    }

    /// Operations that mutate cell state inside an open pin context
    pub fn is_cell_op(&self) -> bool {
        matches!(
            self,
            MsgOp::UpsertCell(_)
                | MsgOp::InsertChildCell(_)
                | MsgOp::PushAttr(_)
                | MsgOp::Commit { .. }
                | MsgOp::RemoveCell { .. }
        )
    }

    /// A close or reject. An unroutable one is never answered, so two peers
    /// cannot keep refusing each other.
    pub fn is_refusal(&self) -> bool {
        matches!(self, MsgOp::CloseReq { .. } | MsgOp::Reject { .. })
    }
}

/// One logical update addressed to a request
#[derive(Clone, Debug, PartialEq)]
pub struct Msg {
    pub req_id: ReqId,
    pub flags: MsgFlags,
    pub op: MsgOp,
}

impl Msg {
    pub fn new(req_id: ReqId, op: MsgOp) -> Self {
        Self {
            req_id,
            flags: MsgFlags::NONE,
            op,
        }
    }

    pub fn is_shared(&self) -> bool {
        self.flags.contains(MsgFlags::VALUE_SHARED)
    }

    /// Marks the value buffer read-only while other holders reference it
    pub fn share(mut self) -> Self {
        self.flags.insert(MsgFlags::VALUE_SHARED);
        self
    }

    /// A private copy with the shared marker cleared, ready to send again
    pub fn for_retransmit(&self) -> Self {
        let mut copy = self.clone();
        copy.flags.remove(MsgFlags::VALUE_SHARED);
        copy
    }
}

/// Ordered sequence of messages carried by one transaction frame
pub type MsgBatch = Vec<Msg>;
