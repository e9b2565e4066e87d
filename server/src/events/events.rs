use std::{mem, vec::IntoIter};

use cellsync_shared::{DefsUpdate, MsgOp, PinRequest, ReqError, ReqId};

use crate::{session::SessionKey, CellSyncServerError};

/// Everything that happened since the last call to `Server::receive`
pub struct Events {
    connections: Vec<SessionKey>,
    logins: Vec<(SessionKey, String, String)>,
    defs: Vec<(SessionKey, DefsUpdate)>,
    pins: Vec<(SessionKey, ReqId, PinRequest)>,
    cell_writes: Vec<(SessionKey, ReqId, MsgOp)>,
    closes: Vec<(SessionKey, ReqId, Option<ReqError>)>,
    errors: Vec<CellSyncServerError>,
    disconnections: Vec<SessionKey>,

    empty: bool,
}

impl Default for Events {
    fn default() -> Self {
        Self::new()
    }
}

impl Events {
    pub(crate) fn new() -> Self {
        Self {
            connections: Vec::new(),
            logins: Vec::new(),
            defs: Vec::new(),
            pins: Vec::new(),
            cell_writes: Vec::new(),
            closes: Vec::new(),
            errors: Vec::new(),
            disconnections: Vec::new(),

            empty: true,
        }
    }

    // Public

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: Event>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: Event>(&self) -> bool {
        V::has(self)
    }

    // Crate-public

    pub(crate) fn push_connection(&mut self, session: SessionKey) {
        self.connections.push(session);
        self.empty = false;
    }

    pub(crate) fn push_login(&mut self, session: SessionKey, user_uid: &str, device_uid: &str) {
        self.logins
            .push((session, user_uid.to_string(), device_uid.to_string()));
        self.empty = false;
    }

    pub(crate) fn push_defs(&mut self, session: SessionKey, update: DefsUpdate) {
        self.defs.push((session, update));
        self.empty = false;
    }

    pub(crate) fn push_pin(&mut self, session: SessionKey, req_id: ReqId, request: PinRequest) {
        self.pins.push((session, req_id, request));
        self.empty = false;
    }

    pub(crate) fn push_cell_write(&mut self, session: SessionKey, req_id: ReqId, op: MsgOp) {
        self.cell_writes.push((session, req_id, op));
        self.empty = false;
    }

    pub(crate) fn push_close(&mut self, session: SessionKey, req_id: ReqId, error: Option<ReqError>) {
        self.closes.push((session, req_id, error));
        self.empty = false;
    }

    pub(crate) fn push_error(&mut self, error: CellSyncServerError) {
        self.errors.push(error);
        self.empty = false;
    }

    pub(crate) fn push_disconnection(&mut self, session: SessionKey) {
        self.disconnections.push(session);
        self.empty = false;
    }
}

// Event Trait
pub trait Event {
    type Iter;

    fn iter(events: &mut Events) -> Self::Iter;

    fn has(events: &Events) -> bool;
}

// ConnectEvent
pub struct ConnectEvent;
impl Event for ConnectEvent {
    type Iter = IntoIter<SessionKey>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.connections).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.connections.is_empty()
    }
}

// LoginEvent
/// A session completed login: `(session, user uid, device uid)`
pub struct LoginEvent;
impl Event for LoginEvent {
    type Iter = IntoIter<(SessionKey, String, String)>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.logins).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.logins.is_empty()
    }
}

// DefsEvent
pub struct DefsEvent;
impl Event for DefsEvent {
    type Iter = IntoIter<(SessionKey, DefsUpdate)>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.defs).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.defs.is_empty()
    }
}

// PinEvent
/// A client opened a pin context. The application resolves the target and
/// answers through the `Server` push API, or refuses with `Server::fail_pin`.
pub struct PinEvent;
impl Event for PinEvent {
    type Iter = IntoIter<(SessionKey, ReqId, PinRequest)>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.pins).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.pins.is_empty()
    }
}

// CellWriteEvent
/// A client write that was validated and applied to its pin context
pub struct CellWriteEvent;
impl Event for CellWriteEvent {
    type Iter = IntoIter<(SessionKey, ReqId, MsgOp)>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.cell_writes).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.cell_writes.is_empty()
    }
}

// CloseEvent
/// A request closed by the client, or by the session ending
pub struct CloseEvent;
impl Event for CloseEvent {
    type Iter = IntoIter<(SessionKey, ReqId, Option<ReqError>)>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.closes).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.closes.is_empty()
    }
}

// ErrorEvent
pub struct ErrorEvent;
impl Event for ErrorEvent {
    type Iter = IntoIter<CellSyncServerError>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.errors).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.errors.is_empty()
    }
}

// DisconnectEvent
pub struct DisconnectEvent;
impl Event for DisconnectEvent {
    type Iter = IntoIter<SessionKey>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.disconnections).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.disconnections.is_empty()
    }
}
