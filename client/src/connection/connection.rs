use std::{collections::HashMap, mem};

use log::{debug, info, warn};

use cellsync_shared::{
    login_digest, AttrSchema, BaseConnection, CellError, ConnectionConfig, ConnectionError,
    DefsUpdate, ErrCode, FrameError, FrameReceiver, FrameSender, HostType, Msg, MsgOp,
    PinContext, PinRequest, ReqError, ReqId, RequestError, Route, SessionDefs, Symbol,
    BOOTSTRAP_REQ_ID,
};

use crate::{client_config::RetryConfig, events::Events, CellSyncClientError};

enum LoginState {
    Idle,
    Pending { user_uid: String, secret: Vec<u8> },
    Accepted { user_uid: String },
}

/// A pin we sent, kept so a transient failure can be retried
struct PinRecord {
    request: PinRequest,
    attempt: u32,
}

/// The client's side of one session
pub struct Connection {
    pub base: BaseConnection,
    login: LoginState,
    /// Messages held back until the host accepts our login
    deferred: Vec<Msg>,
    pins: HashMap<ReqId, PinRecord>,
    retryable: HashMap<ReqId, PinRecord>,
    ended: bool,
}

impl Connection {
    pub fn new(
        connection_config: &ConnectionConfig,
        sender: Box<dyn FrameSender>,
        receiver: Box<dyn FrameReceiver>,
    ) -> Self {
        Self {
            base: BaseConnection::new(
                HostType::Client,
                connection_config,
                SessionDefs::new(),
                sender,
                receiver,
            ),
            login: LoginState::Idle,
            deferred: Vec::new(),
            pins: HashMap::new(),
            retryable: HashMap::new(),
            ended: false,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.login, LoginState::Accepted { .. })
    }

    pub fn user_uid(&self) -> Option<&str> {
        match &self.login {
            LoginState::Accepted { user_uid } => Some(user_uid),
            _ => None,
        }
    }

    /// The host ended the stream, or it failed
    pub fn has_ended(&self) -> bool {
        self.ended
    }

    // Outgoing

    pub fn login(
        &mut self,
        user_uid: &str,
        device_uid: &str,
        secret: Vec<u8>,
    ) -> Result<(), CellSyncClientError> {
        if !matches!(self.login, LoginState::Idle) {
            return Err(CellSyncClientError::AlreadyLoggedIn);
        }
        info!("logging in as '{}' on device '{}'", user_uid, device_uid);
        self.base.queue_op(
            BOOTSTRAP_REQ_ID,
            MsgOp::Login {
                user_uid: user_uid.to_string(),
                device_uid: device_uid.to_string(),
            },
        );
        self.login = LoginState::Pending {
            user_uid: user_uid.to_string(),
            secret,
        };
        Ok(())
    }

    /// Registers the definitions locally, then sends them. A batch the local
    /// registry refuses, or that no frame can hold, is never sent.
    pub fn register_defs(
        &mut self,
        symbols: Vec<Symbol>,
        schemas: Vec<AttrSchema>,
    ) -> Result<DefsUpdate, CellSyncClientError> {
        let msg = Msg::new(
            BOOTSTRAP_REQ_ID,
            MsgOp::RegisterDefs {
                symbols: symbols.clone(),
                schemas: schemas.clone(),
            },
        );
        self.base.check_fits(&msg).map_err(ConnectionError::from)?;
        let update = self.base.defs.register(&symbols, &schemas)?;
        self.queue_or_defer(msg);
        Ok(update)
    }

    pub fn pin(&mut self, request: PinRequest, attempt: u32) -> Result<ReqId, CellSyncClientError> {
        let req_id = self.base.requests.allocate()?;
        if let Err(source) = self.base.engine.open(req_id, request.clone()) {
            self.base.requests.close(req_id);
            return Err(CellSyncClientError::Cell { req_id, source });
        }
        debug!("pinning {:?} as request {}", request.target, req_id);
        self.pins.insert(
            req_id,
            PinRecord {
                request: request.clone(),
                attempt,
            },
        );
        self.queue_or_defer(Msg::new(req_id, MsgOp::PinCell(request)));
        Ok(req_id)
    }

    /// Sends the pin of a request that failed transiently again, under a
    /// new request id
    pub fn repin(&mut self, req_id: ReqId) -> Result<ReqId, CellSyncClientError> {
        let record = self
            .retryable
            .remove(&req_id)
            .ok_or(CellSyncClientError::NoRetry { req_id })?;
        info!("retrying request {} (attempt {})", req_id, record.attempt + 1);
        self.pin(record.request, record.attempt + 1)
    }

    /// Writes into one of our open pin contexts. The operation is validated
    /// exactly as the host will validate it, and is sent even when the
    /// context does not mirror.
    pub fn write(&mut self, req_id: ReqId, op: MsgOp) -> Result<(), CellSyncClientError> {
        let msg = Msg::new(req_id, op);
        if let Err(FrameError::FrameTooLarge { size, max }) = self.base.check_fits(&msg) {
            return Err(CellSyncClientError::Cell {
                req_id,
                source: CellError::TooLarge { size, max },
            });
        }
        self.base
            .apply_remote(req_id, &msg.op)
            .map_err(|source| CellSyncClientError::Cell { req_id, source })?;
        self.queue_or_defer(msg);
        Ok(())
    }

    pub fn close_request(&mut self, req_id: ReqId) -> bool {
        self.pins.remove(&req_id);
        self.retryable.remove(&req_id);
        let was_deferred = self.deferred.iter().any(|msg| msg.req_id == req_id);
        if was_deferred {
            // the host never heard of it
            self.deferred.retain(|msg| msg.req_id != req_id);
            self.base.forget_request(req_id);
            return true;
        }
        self.base.close_request(req_id, None)
    }

    /// Closes every request and ends our half of the stream
    pub fn disconnect(&mut self) -> Result<(), CellSyncClientError> {
        for req_id in self.base.requests.open_requests() {
            self.close_request(req_id);
        }
        self.deferred.clear();
        self.base.send_end_of_stream()?;
        Ok(())
    }

    fn queue_or_defer(&mut self, msg: Msg) {
        if self.is_logged_in() {
            self.base.queue(msg);
        } else {
            self.deferred.push(msg);
        }
    }

    // Incoming

    pub fn receive(&mut self, retry: &RetryConfig, events: &mut Events) {
        if self.ended {
            return;
        }
        let msgs = match self.base.receive_msgs() {
            Ok(msgs) => msgs,
            Err(error) => {
                warn!("connection to host failed: {}", error);
                events.push_error(error.into());
                self.end(events);
                return;
            }
        };

        for msg in msgs {
            let req_id = msg.req_id;
            match self.base.requests.dispatch(&msg) {
                Ok(Route::Session) => self.handle_session_op(msg.op, events),
                Ok(Route::Request(req_id)) => self.handle_request_op(req_id, msg.op, retry, events),
                Ok(Route::Open(req_id)) => {
                    warn!("host tried to pin request {} on the client", req_id);
                    self.base.close_request(
                        req_id,
                        Some(ReqError::new(ErrCode::InvalidReq, "clients do not serve pins")),
                    );
                }
                Err(RequestError::Stale { .. }) => {}
                Err(error) => {
                    warn!("cannot route {} from host: {}", msg.op.name(), error);
                    if !msg.op.is_refusal() {
                        self.refuse_routing(req_id, &error);
                    }
                    events.push_error(error.into());
                }
            }
        }

        if self.base.received_end_of_stream() {
            self.end(events);
        }
    }

    /// Same answer the host gives: open requests and the bootstrap request
    /// get a reject, anything else is told it is closed
    fn refuse_routing(&mut self, req_id: ReqId, error: &RequestError) {
        let req_error = ReqError::new(error.code(), error.to_string());
        if req_id == BOOTSTRAP_REQ_ID || self.base.requests.is_open(req_id) {
            self.base.reject(req_id, req_error);
        } else {
            self.base
                .queue_op(req_id, MsgOp::CloseReq { error: Some(req_error) });
        }
    }

    fn handle_session_op(&mut self, op: MsgOp, events: &mut Events) {
        match op {
            MsgOp::LoginChallenge { hash } => {
                let LoginState::Pending { secret, .. } = &self.login else {
                    events.push_error(CellSyncClientError::UnexpectedOp {
                        req_id: BOOTSTRAP_REQ_ID,
                        op: "LoginChallenge",
                    });
                    return;
                };
                let hash_resp = login_digest(secret, &hash);
                self.base
                    .queue_op(BOOTSTRAP_REQ_ID, MsgOp::LoginResponse { hash_resp });
            }
            MsgOp::LoginAccepted => match mem::replace(&mut self.login, LoginState::Idle) {
                LoginState::Pending { user_uid, .. } => {
                    info!("host accepted login of '{}'", user_uid);
                    events.push_login(&user_uid);
                    self.login = LoginState::Accepted { user_uid };
                    for msg in mem::take(&mut self.deferred) {
                        self.base.queue(msg);
                    }
                }
                other => {
                    self.login = other;
                    events.push_error(CellSyncClientError::UnexpectedOp {
                        req_id: BOOTSTRAP_REQ_ID,
                        op: "LoginAccepted",
                    });
                }
            },
            MsgOp::CloseReq { error } => {
                if let Some(error) = error {
                    warn!("host closed the session: {}", error);
                    self.note_login_failure(&error, events);
                    events.push_error(CellSyncClientError::SessionClosed { error });
                }
            }
            MsgOp::Reject { error } => {
                self.note_login_failure(&error, events);
                events.push_error(CellSyncClientError::Rejected {
                    req_id: BOOTSTRAP_REQ_ID,
                    error,
                });
            }
            other => {
                events.push_error(CellSyncClientError::UnexpectedOp {
                    req_id: BOOTSTRAP_REQ_ID,
                    op: other.name(),
                });
            }
        }
    }

    fn note_login_failure(&mut self, error: &ReqError, events: &mut Events) {
        let auth_code = matches!(error.code, ErrCode::AuthFailed | ErrCode::LoginFailed);
        if auth_code && matches!(self.login, LoginState::Pending { .. }) {
            warn!("login refused with {}", error.code);
            self.login = LoginState::Idle;
            self.deferred.clear();
            events.push_error(CellSyncClientError::LoginFailed { code: error.code });
        }
    }

    fn handle_request_op(
        &mut self,
        req_id: ReqId,
        op: MsgOp,
        retry: &RetryConfig,
        events: &mut Events,
    ) {
        match op {
            MsgOp::CloseReq { error } => {
                let record = self.pins.remove(&req_id);
                self.base.forget_request(req_id);
                if let Some(error) = &error {
                    let retry_after = match &record {
                        Some(record) if error.code.is_transient() => retry.backoff(record.attempt),
                        _ => None,
                    };
                    if let (Some(record), Some(_)) = (record, retry_after) {
                        self.retryable.insert(req_id, record);
                    }
                    events.push_error(CellSyncClientError::RequestFailed {
                        req_id,
                        error: error.clone(),
                        retry_after,
                    });
                }
                debug!("host closed request {}", req_id);
                events.push_close(req_id, error);
            }
            MsgOp::Reject { error } => {
                warn!("host rejected an operation on request {}: {}", req_id, error);
                events.push_error(CellSyncClientError::Rejected { req_id, error });
            }
            MsgOp::Commit { cell, .. } if self.mirrors_nothing(req_id) => {
                // nothing was mirrored, only the commit boundary is tracked
                let root = self.base.engine.context(req_id).and_then(PinContext::root);
                let covers_root = cell.is_none() || root.is_none() || cell == root;
                events.push_sync(req_id, op);
                if covers_root {
                    self.base.requests.mark_synced(req_id);
                    events.push_synced(req_id);
                }
            }
            op if op.is_cell_op() => match self.base.apply_remote(req_id, &op) {
                Ok(applied) => {
                    events.push_sync(req_id, op);
                    if applied.covers_root {
                        events.push_synced(req_id);
                    }
                }
                Err(source) => {
                    self.base
                        .reject(req_id, ReqError::new(source.code(), source.to_string()));
                    events.push_error(CellSyncClientError::Cell { req_id, source });
                }
            },
            other => {
                self.base.reject(
                    req_id,
                    ReqError::new(ErrCode::InvalidReq, format!("{} is not valid here", other.name())),
                );
                events.push_error(CellSyncClientError::UnexpectedOp {
                    req_id,
                    op: other.name(),
                });
            }
        }
    }

    fn mirrors_nothing(&self, req_id: ReqId) -> bool {
        self.base
            .engine
            .context(req_id)
            .is_some_and(PinContext::is_no_sync)
    }

    fn end(&mut self, events: &mut Events) {
        for req_id in self.base.requests.open_requests() {
            self.pins.remove(&req_id);
            self.base.forget_request(req_id);
            events.push_close(req_id, None);
        }
        self.deferred.clear();
        if let Err(error) = self.base.send_end_of_stream() {
            debug!("could not end the stream cleanly: {}", error);
        }
        self.ended = true;
        info!("session with host ended");
        events.push_disconnection();
    }
}
