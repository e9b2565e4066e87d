use std::{mem, vec::IntoIter};

use cellsync_shared::{MsgOp, ReqError, ReqId};

use crate::CellSyncClientError;

/// Everything that happened since the last call to `Client::receive`
pub struct Events {
    logins: Vec<String>,
    syncs: Vec<(ReqId, MsgOp)>,
    synced: Vec<ReqId>,
    closes: Vec<(ReqId, Option<ReqError>)>,
    errors: Vec<CellSyncClientError>,
    disconnections: Vec<()>,

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
            logins: Vec::new(),
            syncs: Vec::new(),
            synced: Vec::new(),
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

    pub(crate) fn push_login(&mut self, user_uid: &str) {
        self.logins.push(user_uid.to_string());
        self.empty = false;
    }

    pub(crate) fn push_sync(&mut self, req_id: ReqId, op: MsgOp) {
        self.syncs.push((req_id, op));
        self.empty = false;
    }

    pub(crate) fn push_synced(&mut self, req_id: ReqId) {
        self.synced.push(req_id);
        self.empty = false;
    }

    pub(crate) fn push_close(&mut self, req_id: ReqId, error: Option<ReqError>) {
        self.closes.push((req_id, error));
        self.empty = false;
    }

    pub(crate) fn push_error(&mut self, error: CellSyncClientError) {
        self.errors.push(error);
        self.empty = false;
    }

    pub(crate) fn push_disconnection(&mut self) {
        self.disconnections.push(());
        self.empty = false;
    }
}

// Event Trait
pub trait Event {
    type Iter;

    fn iter(events: &mut Events) -> Self::Iter;

    fn has(events: &Events) -> bool;
}

// LoginEvent
/// The host accepted our login
pub struct LoginEvent;
impl Event for LoginEvent {
    type Iter = IntoIter<String>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.logins).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.logins.is_empty()
    }
}

// SyncEvent
/// A host operation applied to one of our mirrored pin contexts
pub struct SyncEvent;
impl Event for SyncEvent {
    type Iter = IntoIter<(ReqId, MsgOp)>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.syncs).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.syncs.is_empty()
    }
}

// SyncedEvent
/// A commit covered the root of the request; its state is safe to render
pub struct SyncedEvent;
impl Event for SyncedEvent {
    type Iter = IntoIter<ReqId>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.synced).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.synced.is_empty()
    }
}

// CloseEvent
pub struct CloseEvent;
impl Event for CloseEvent {
    type Iter = IntoIter<(ReqId, Option<ReqError>)>;

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
    type Iter = IntoIter<CellSyncClientError>;

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
    type Iter = IntoIter<()>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.disconnections).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.disconnections.is_empty()
    }
}
