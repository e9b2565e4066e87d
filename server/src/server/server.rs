use std::{collections::BTreeMap, mem};

use log::{info, warn};

use cellsync_shared::{
    Applied, AttrRef, AttrValue, CellDecl, CellId, CellOp, ErrCode, FrameReceiver,
    FrameSender, PinContext, ReqError, ReqId, ReqStatus, SeriesIndex, SessionDefs, Tid, TidMinter,
    BOOTSTRAP_REQ_ID,
};

use crate::{
    session::{LoginVerifier, Session, SessionContext, SessionKey},
    transport::{SessionAcceptor, Socket},
    CellSyncServerError, Events, ServerConfig,
};

/// The data authority of the protocol. Accepts client sessions, runs their
/// login exchange, and lets the application answer pins with cell
/// declarations, attribute pushes and commits.
pub struct Server {
    config: ServerConfig,
    verifier: Option<Box<dyn LoginVerifier>>,
    acceptor: Option<Box<dyn SessionAcceptor>>,
    sessions: BTreeMap<SessionKey, Session>,
    next_session: u64,
    minter: TidMinter,
    incoming_events: Events,
}

impl Server {
    /// Create a new Server
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            verifier: None,
            acceptor: None,
            sessions: BTreeMap::new(),
            next_session: 0,
            minter: TidMinter::new(),
            incoming_events: Events::new(),
        }
    }

    /// Sets where login secrets come from. Without a verifier every
    /// challenged login fails with `AuthFailed`.
    pub fn set_login_verifier<V: LoginVerifier + 'static>(&mut self, verifier: V) {
        self.verifier = Some(Box::new(verifier));
    }

    /// Listen for sessions on the given socket
    pub fn listen<S: Into<Box<dyn Socket>>>(&mut self, socket: S) {
        let socket: Box<dyn Socket> = socket.into();
        self.acceptor = Some(socket.listen());
    }

    /// Returns whether the Server has a listening socket
    pub fn is_listening(&self) -> bool {
        self.acceptor.is_some()
    }

    /// Starts a session over a stream that is already connected
    pub fn accept_transport(
        &mut self,
        sender: Box<dyn FrameSender>,
        receiver: Box<dyn FrameReceiver>,
    ) -> SessionKey {
        let key = SessionKey::new(self.next_session);
        self.next_session += 1;
        self.sessions
            .insert(key, Session::new(key, &self.config, sender, receiver));
        info!("{} connected", key);
        self.incoming_events.push_connection(key);
        key
    }

    /// Must be called regularly. Accepts new sessions, reads every frame the
    /// clients sent and returns what happened.
    pub fn receive(&mut self) -> Events {
        self.accept_sessions();

        let Self {
            config,
            verifier,
            sessions,
            incoming_events,
            ..
        } = self;
        for session in sessions.values_mut() {
            let mut ctx = SessionContext {
                config: &*config,
                verifier: verifier.as_deref(),
                events: &mut *incoming_events,
            };
            session.receive(&mut ctx);
        }

        self.reap_closed();
        mem::replace(&mut self.incoming_events, Events::new())
    }

    fn accept_sessions(&mut self) {
        loop {
            let Some(acceptor) = self.acceptor.as_mut() else {
                return;
            };
            match acceptor.accept() {
                Ok(Some((sender, receiver))) => {
                    self.accept_transport(sender, receiver);
                }
                Ok(None) => return,
                Err(error) => {
                    warn!("listening socket failed, no further sessions will be accepted");
                    self.acceptor = None;
                    self.incoming_events.push_error(error.into());
                    return;
                }
            }
        }
    }

    /// Flushes every session's queued messages to its transport
    pub fn send_all_frames(&mut self) {
        let mut lost = Vec::new();
        for (key, session) in self.sessions.iter_mut() {
            let sent = session.base.send_all_frames();
            for (req_id, error) in session.base.take_unframeable() {
                if req_id != BOOTSTRAP_REQ_ID {
                    self.incoming_events.push_close(*key, req_id, Some(error.clone()));
                }
                self.incoming_events.push_error(CellSyncServerError::Unframeable {
                    session: *key,
                    req_id,
                    error,
                });
            }
            if let Err(error) = sent {
                warn!("cannot send to {}: {}", key, error);
                self.incoming_events.push_error(CellSyncServerError::Connection {
                    session: *key,
                    source: error,
                });
                lost.push(*key);
            }
        }
        for key in lost {
            self.drop_session(key);
        }
    }

    /// Closes every open request on every session with `ShuttingDown`,
    /// then ends each stream
    pub fn shutdown(&mut self) {
        info!("shutting down {} sessions", self.sessions.len());
        let error = ReqError::new(ErrCode::ShuttingDown, "host is shutting down");
        for session in self.sessions.values_mut() {
            session.terminate(error.clone(), &mut self.incoming_events);
        }
        self.reap_closed();
        self.acceptor = None;
    }

    /// Ends one session, closing its requests with `error`
    pub fn close_session(
        &mut self,
        session: SessionKey,
        error: ReqError,
    ) -> Result<(), CellSyncServerError> {
        self.session_mut(session)?;
        if let Some(session_ref) = self.sessions.get_mut(&session) {
            session_ref.terminate(error, &mut self.incoming_events);
        }
        self.reap_closed();
        Ok(())
    }

    fn reap_closed(&mut self) {
        let closed: Vec<SessionKey> = self
            .sessions
            .values()
            .filter(|session| session.is_closing())
            .map(Session::key)
            .collect();
        for key in closed {
            if let Some(mut session) = self.sessions.remove(&key) {
                // a transport that already failed has nothing left to flush
                let _ = session.base.send_all_frames();
            }
            info!("{} disconnected", key);
            self.incoming_events.push_disconnection(key);
        }
    }

    fn drop_session(&mut self, key: SessionKey) {
        if let Some(session) = self.sessions.remove(&key) {
            for req_id in session.base.requests.open_requests() {
                self.incoming_events.push_close(key, req_id, None);
            }
            info!("{} dropped", key);
            self.incoming_events.push_disconnection(key);
        }
    }

    // Cells

    /// Declares a cell in a pin context, creating it or re-attaching it.
    /// The first cell declared in a context becomes its root.
    pub fn upsert_cell(
        &mut self,
        session: SessionKey,
        req_id: ReqId,
        decl: CellDecl,
    ) -> Result<(), CellSyncServerError> {
        self.apply(session, req_id, CellOp::Upsert(decl)).map(|_| ())
    }

    /// Declares a new child cell. Fails if the cell is already declared.
    pub fn insert_child_cell(
        &mut self,
        session: SessionKey,
        req_id: ReqId,
        decl: CellDecl,
    ) -> Result<(), CellSyncServerError> {
        self.apply(session, req_id, CellOp::Insert(decl)).map(|_| ())
    }

    /// Sets one attribute value of a declared cell. `attr` names the
    /// attribute by the client's id or by this session's native definition
    /// id; the client receives it in whichever numbering its pin asked for.
    pub fn push_attr(
        &mut self,
        session: SessionKey,
        req_id: ReqId,
        cell_id: CellId,
        attr: AttrRef,
        series_index: impl Into<SeriesIndex>,
        value: impl Into<AttrValue>,
    ) -> Result<(), CellSyncServerError> {
        let op = CellOp::Push {
            cell_id,
            attr,
            series_index: series_index.into(),
            value: value.into(),
        };
        self.apply(session, req_id, op).map(|_| ())
    }

    /// Seals the pushed state of `cell` (or of the whole request) under a
    /// fresh TID. A commit covering the root of a close-on-sync pin closes
    /// the request.
    pub fn commit(
        &mut self,
        session: SessionKey,
        req_id: ReqId,
        cell: Option<CellId>,
    ) -> Result<Tid, CellSyncServerError> {
        self.session_mut(session)?;
        let tid = self.minter.seal(&commit_payload(session, req_id, cell))?;
        let applied = self.apply(session, req_id, CellOp::Commit { cell, tid: Some(tid) })?;

        let session_ref = self.session_mut(session)?;
        let closes_on_sync = session_ref
            .base
            .engine
            .context(req_id)
            .is_some_and(PinContext::closes_on_sync);
        if applied.covers_root && closes_on_sync {
            info!("request {} on {} is synced, closing", req_id, session);
            session_ref.base.close_request(req_id, None);
        }
        Ok(tid)
    }

    /// Detaches a cell and its subtree from a pin context
    pub fn remove_cell(
        &mut self,
        session: SessionKey,
        req_id: ReqId,
        cell_id: CellId,
    ) -> Result<(), CellSyncServerError> {
        self.apply(session, req_id, CellOp::Remove(cell_id)).map(|_| ())
    }

    fn apply(
        &mut self,
        session: SessionKey,
        req_id: ReqId,
        op: CellOp,
    ) -> Result<Applied, CellSyncServerError> {
        self.session_mut(session)?
            .apply_host(req_id, op)
            .map_err(|source| CellSyncServerError::Cell {
                session,
                req_id,
                source,
            })
    }

    // Requests

    /// Closes a request, telling the client. Returns false if it was not open.
    pub fn close_request(
        &mut self,
        session: SessionKey,
        req_id: ReqId,
        error: Option<ReqError>,
    ) -> Result<bool, CellSyncServerError> {
        Ok(self.session_mut(session)?.base.close_request(req_id, error))
    }

    /// Refuses a pin the application cannot serve, e.g. with `CellNotFound`,
    /// `PinFailed` or `InsufficientPermissions`
    pub fn fail_pin(
        &mut self,
        session: SessionKey,
        req_id: ReqId,
        code: ErrCode,
        msg: impl Into<String>,
    ) -> Result<bool, CellSyncServerError> {
        let error = ReqError::new(code, msg);
        info!("failing pin {} on {}: {}", req_id, session, error);
        self.close_request(session, req_id, Some(error))
    }

    pub fn request_status(&self, session: SessionKey, req_id: ReqId) -> Option<ReqStatus> {
        self.sessions.get(&session)?.base.request_status(req_id)
    }

    pub fn open_requests(&self, session: SessionKey) -> Vec<ReqId> {
        self.sessions
            .get(&session)
            .map(|session| session.base.requests.open_requests())
            .unwrap_or_default()
    }

    /// The host's view of an open pin context
    pub fn pin_context(&self, session: SessionKey, req_id: ReqId) -> Option<&PinContext> {
        self.sessions.get(&session)?.base.engine.context(req_id)
    }

    // Sessions

    pub fn session_keys(&self) -> Vec<SessionKey> {
        self.sessions.keys().copied().collect()
    }

    pub fn sessions_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn session_exists(&self, session: SessionKey) -> bool {
        self.sessions.contains_key(&session)
    }

    pub fn is_logged_in(&self, session: SessionKey) -> bool {
        self.sessions
            .get(&session)
            .is_some_and(Session::is_logged_in)
    }

    pub fn user_uid(&self, session: SessionKey) -> Option<&str> {
        self.sessions.get(&session)?.user_uid()
    }

    /// Symbols and schemas the session's client registered
    pub fn session_defs(&self, session: SessionKey) -> Option<SessionDefs> {
        self.sessions
            .get(&session)
            .map(|session| session.base.defs.clone())
    }

    fn session_mut(&mut self, session: SessionKey) -> Result<&mut Session, CellSyncServerError> {
        self.sessions
            .get_mut(&session)
            .ok_or(CellSyncServerError::SessionNotFound { session })
    }
}

fn commit_payload(session: SessionKey, req_id: ReqId, cell: Option<CellId>) -> Vec<u8> {
    let mut payload = Vec::with_capacity(32);
    payload.extend_from_slice(&session.to_u64().to_be_bytes());
    payload.extend_from_slice(&req_id.to_be_bytes());
    if let Some(cell) = cell {
        payload.extend_from_slice(&cell.to_bytes());
    }
    payload
}
