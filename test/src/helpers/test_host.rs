use std::mem;

use cellsync_server::{
    CellSyncServerError, CellWriteEvent, CloseEvent, ConnectEvent, DefsEvent, DisconnectEvent,
    ErrorEvent, LoginEvent, PinEvent, Server, ServerConfig, SessionKey,
};
use cellsync_shared::{
    AttrRef, CellDecl, CellId, DefsUpdate, MsgOp, PinRequest, ReqError, ReqId, Tid,
};

use super::test_client::ALICE_SECRET;
use crate::test_defs::{GALLERY_SCHEMA, TITLE_ATTR};

fn test_secrets(user_uid: &str, _device_uid: &str) -> Option<Vec<u8>> {
    (user_uid == "alice").then(|| ALICE_SECRET.to_vec())
}

/// A `Server` that keeps every event it received, by kind, until a test
/// takes them
pub struct TestHost {
    pub server: Server,
    pub connects: Vec<SessionKey>,
    pub logins: Vec<(SessionKey, String, String)>,
    pub defs: Vec<(SessionKey, DefsUpdate)>,
    pub pins: Vec<(SessionKey, ReqId, PinRequest)>,
    pub writes: Vec<(SessionKey, ReqId, MsgOp)>,
    pub closes: Vec<(SessionKey, ReqId, Option<ReqError>)>,
    pub errors: Vec<CellSyncServerError>,
    pub disconnects: Vec<SessionKey>,
}

impl TestHost {
    /// A host that knows one user, "alice"
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        let mut server = Server::new(config);
        server.set_login_verifier(test_secrets);
        Self {
            server,
            connects: Vec::new(),
            logins: Vec::new(),
            defs: Vec::new(),
            pins: Vec::new(),
            writes: Vec::new(),
            closes: Vec::new(),
            errors: Vec::new(),
            disconnects: Vec::new(),
        }
    }

    pub fn receive(&mut self) {
        let mut events = self.server.receive();
        self.connects.extend(events.read::<ConnectEvent>());
        self.logins.extend(events.read::<LoginEvent>());
        self.defs.extend(events.read::<DefsEvent>());
        self.pins.extend(events.read::<PinEvent>());
        self.writes.extend(events.read::<CellWriteEvent>());
        self.closes.extend(events.read::<CloseEvent>());
        self.errors.extend(events.read::<ErrorEvent>());
        self.disconnects.extend(events.read::<DisconnectEvent>());
    }

    pub fn send(&mut self) {
        self.server.send_all_frames();
    }

    /// Answers a pin with a titled gallery root and commits it
    pub fn serve_gallery(
        &mut self,
        session: SessionKey,
        req_id: ReqId,
        root: CellId,
        title: &str,
    ) -> Result<Tid, CellSyncServerError> {
        self.server
            .upsert_cell(session, req_id, CellDecl::new(root, GALLERY_SCHEMA))?;
        self.server.push_attr(
            session,
            req_id,
            root,
            AttrRef::Client(TITLE_ATTR),
            0i64,
            title,
        )?;
        self.server.commit(session, req_id, Some(root))
    }

    pub fn take_pins(&mut self) -> Vec<(SessionKey, ReqId, PinRequest)> {
        mem::take(&mut self.pins)
    }

    pub fn take_errors(&mut self) -> Vec<CellSyncServerError> {
        mem::take(&mut self.errors)
    }
}

impl Default for TestHost {
    fn default() -> Self {
        Self::new()
    }
}
