use std::mem;

use log::{debug, info, warn};

use cellsync_shared::{
    Applied, BaseConnection, CellError, CellOp, ConnectionError, ErrCode, FrameReceiver,
    FrameSender, HostType, MsgOp, PinTarget, ReqError, ReqId, RequestError, Route, SessionDefs,
    BOOTSTRAP_REQ_ID,
};

use super::{
    login::{check_response, generate_challenge, LoginCheck, LoginState, LoginVerifier},
    SessionKey,
};
use crate::{CellSyncServerError, Events, RejectPolicy, ServerConfig};

/// Borrowed server state a session needs while handling incoming messages
pub(crate) struct SessionContext<'a> {
    pub config: &'a ServerConfig,
    pub verifier: Option<&'a dyn LoginVerifier>,
    pub events: &'a mut Events,
}

/// One connected client: its connection, login progress and pin contexts
pub(crate) struct Session {
    key: SessionKey,
    pub base: BaseConnection,
    login: LoginState,
    closing: bool,
}

impl Session {
    pub fn new(
        key: SessionKey,
        config: &ServerConfig,
        sender: Box<dyn FrameSender>,
        receiver: Box<dyn FrameReceiver>,
    ) -> Self {
        Self {
            key,
            base: BaseConnection::new(
                HostType::Host,
                &config.connection,
                SessionDefs::new(),
                sender,
                receiver,
            ),
            login: LoginState::AwaitingLogin,
            closing: false,
        }
    }

    pub fn key(&self) -> SessionKey {
        self.key
    }

    pub fn is_logged_in(&self) -> bool {
        self.login.is_accepted()
    }

    pub fn user_uid(&self) -> Option<&str> {
        self.login.user_uid()
    }

    /// The session has ended and only waits for its last frames to be flushed
    pub fn is_closing(&self) -> bool {
        self.closing
    }

    // Incoming

    pub fn receive(&mut self, ctx: &mut SessionContext) {
        let msgs = match self.base.receive_msgs() {
            Ok(msgs) => msgs,
            Err(ConnectionError::Frame(error)) => {
                warn!("{} sent an undecodable frame: {}", self.key, error);
                let req_error = ReqError::new(error.code(), error.to_string());
                ctx.events.push_error(CellSyncServerError::Connection {
                    session: self.key,
                    source: ConnectionError::Frame(error),
                });
                self.terminate(req_error, ctx.events);
                return;
            }
            Err(error) => {
                warn!("{} lost its transport: {}", self.key, error);
                ctx.events.push_error(CellSyncServerError::Connection {
                    session: self.key,
                    source: error,
                });
                self.drop_requests(ctx.events);
                self.closing = true;
                return;
            }
        };

        for msg in msgs {
            if self.closing {
                break;
            }
            let req_id = msg.req_id;
            match self.base.requests.dispatch(&msg) {
                Ok(Route::Session) => self.handle_session_op(msg.op, ctx),
                Ok(Route::Open(req_id)) => self.handle_pin(req_id, msg.op, ctx),
                Ok(Route::Request(req_id)) => self.handle_request_op(req_id, msg.op, ctx),
                Err(RequestError::Stale { .. }) => {}
                Err(error) if msg.op.is_refusal() => {
                    debug!("{} sent an unroutable {}: {}", self.key, msg.op.name(), error);
                }
                Err(error) => self.refuse_routing(req_id, &error),
            }
        }

        if self.base.received_end_of_stream() && !self.closing {
            info!("{} ended its stream", self.key);
            self.drop_requests(ctx.events);
            if let Err(error) = self.base.send_end_of_stream() {
                debug!("{} could not send end of stream: {}", self.key, error);
            }
            self.closing = true;
        }
    }

    fn handle_session_op(&mut self, op: MsgOp, ctx: &mut SessionContext) {
        match op {
            MsgOp::Login {
                user_uid,
                device_uid,
            } => self.handle_login(user_uid, device_uid, ctx),
            MsgOp::LoginResponse { hash_resp } => self.handle_login_response(&hash_resp, ctx),
            MsgOp::RegisterDefs { symbols, schemas } => {
                if !self.is_logged_in() {
                    self.base.reject(
                        BOOTSTRAP_REQ_ID,
                        ReqError::new(ErrCode::NotConnected, "definitions sent before login"),
                    );
                    return;
                }
                match self.base.defs.register(&symbols, &schemas) {
                    Ok(update) => ctx.events.push_defs(self.key, update),
                    Err(error) => self.base.reject(
                        BOOTSTRAP_REQ_ID,
                        ReqError::new(error.code(), error.to_string()),
                    ),
                }
            }
            MsgOp::CloseReq { error } => {
                info!("{} closed the session", self.key);
                if let Some(error) = error {
                    ctx.events.push_error(CellSyncServerError::SessionClosed {
                        session: self.key,
                        error,
                    });
                }
                self.drop_requests(ctx.events);
                if let Err(error) = self.base.send_end_of_stream() {
                    debug!("{} could not send end of stream: {}", self.key, error);
                }
                self.closing = true;
            }
            MsgOp::Reject { error } => {
                ctx.events.push_error(CellSyncServerError::Rejected {
                    session: self.key,
                    req_id: BOOTSTRAP_REQ_ID,
                    error,
                });
            }
            other => self.base.reject(
                BOOTSTRAP_REQ_ID,
                ReqError::new(
                    ErrCode::InvalidReq,
                    format!("{} is only sent by the host", other.name()),
                ),
            ),
        }
    }

    fn handle_login(&mut self, user_uid: String, device_uid: String, ctx: &mut SessionContext) {
        if !matches!(self.login, LoginState::AwaitingLogin) {
            self.base.reject(
                BOOTSTRAP_REQ_ID,
                ReqError::new(ErrCode::InvalidReq, "login already in progress"),
            );
            return;
        }
        if !ctx.config.require_auth {
            info!("{} logged in as {} without a challenge", self.key, user_uid);
            self.accept_login(user_uid, &device_uid, ctx.events);
            return;
        }

        let Ok(challenge) = generate_challenge(ctx.config.challenge_len) else {
            warn!("{} cannot draw a login challenge", self.key);
            ctx.events.push_error(CellSyncServerError::LoginFailed {
                session: self.key,
                user_uid,
                code: ErrCode::AuthFailed,
            });
            self.terminate(
                ReqError::new(ErrCode::AuthFailed, "login challenge unavailable"),
                ctx.events,
            );
            return;
        };
        debug!("{} challenged user {}", self.key, user_uid);
        self.base.queue_op(
            BOOTSTRAP_REQ_ID,
            MsgOp::LoginChallenge {
                hash: challenge.clone(),
            },
        );
        self.login = LoginState::Challenged {
            user_uid,
            device_uid,
            challenge,
        };
    }

    fn handle_login_response(&mut self, hash_resp: &[u8], ctx: &mut SessionContext) {
        let (user_uid, device_uid, challenge) =
            match mem::replace(&mut self.login, LoginState::AwaitingLogin) {
                LoginState::Challenged {
                    user_uid,
                    device_uid,
                    challenge,
                } => (user_uid, device_uid, challenge),
                other => {
                    self.login = other;
                    self.base.reject(
                        BOOTSTRAP_REQ_ID,
                        ReqError::new(ErrCode::InvalidReq, "no login challenge is outstanding"),
                    );
                    return;
                }
            };

        let code = match check_response(ctx.verifier, &user_uid, &device_uid, &challenge, hash_resp)
        {
            LoginCheck::Accepted => {
                self.accept_login(user_uid, &device_uid, ctx.events);
                return;
            }
            LoginCheck::UnknownUser => ErrCode::AuthFailed,
            LoginCheck::BadResponse => ErrCode::LoginFailed,
        };
        ctx.events.push_error(CellSyncServerError::LoginFailed {
            session: self.key,
            user_uid,
            code,
        });
        self.terminate(ReqError::new(code, "login refused"), ctx.events);
    }

    fn accept_login(&mut self, user_uid: String, device_uid: &str, events: &mut Events) {
        self.base.queue_op(BOOTSTRAP_REQ_ID, MsgOp::LoginAccepted);
        events.push_login(self.key, &user_uid, device_uid);
        self.login = LoginState::Accepted { user_uid };
    }

    fn handle_pin(&mut self, req_id: ReqId, op: MsgOp, ctx: &mut SessionContext) {
        let MsgOp::PinCell(request) = op else {
            return;
        };
        if !self.is_logged_in() {
            self.base.close_request(
                req_id,
                Some(ReqError::new(ErrCode::NotConnected, "pin sent before login")),
            );
            return;
        }
        if let PinTarget::Url(url) = &request.target {
            if url.is_empty() {
                self.base.close_request(
                    req_id,
                    Some(ReqError::new(ErrCode::InvalidUri, "pin target url is empty")),
                );
                return;
            }
        }
        match self.base.engine.open(req_id, request.clone()) {
            Ok(_) => ctx.events.push_pin(self.key, req_id, request),
            Err(error) => {
                self.base
                    .close_request(req_id, Some(ReqError::new(error.code(), error.to_string())));
            }
        }
    }

    fn handle_request_op(&mut self, req_id: ReqId, op: MsgOp, ctx: &mut SessionContext) {
        match op {
            MsgOp::CloseReq { error } => {
                debug!("{} closed request {}", self.key, req_id);
                self.base.forget_request(req_id);
                ctx.events.push_close(self.key, req_id, error);
            }
            MsgOp::Reject { error } => {
                ctx.events.push_error(CellSyncServerError::Rejected {
                    session: self.key,
                    req_id,
                    error,
                });
            }
            op if op.is_cell_op() => match self.base.apply_remote(req_id, &op) {
                Ok(_) => ctx.events.push_cell_write(self.key, req_id, op),
                Err(error) => {
                    self.refuse(req_id, &error, ctx.config.reject_policy);
                    ctx.events.push_error(CellSyncServerError::Cell {
                        session: self.key,
                        req_id,
                        source: error,
                    });
                }
            },
            other => self.base.reject(
                req_id,
                ReqError::new(
                    ErrCode::InvalidReq,
                    format!("{} cannot be sent on an open request", other.name()),
                ),
            ),
        }
    }

    fn refuse(&mut self, req_id: ReqId, error: &CellError, policy: RejectPolicy) {
        let req_error = ReqError::new(error.code(), error.to_string());
        match policy {
            RejectPolicy::Report => self.base.reject(req_id, req_error),
            RejectPolicy::CloseRequest => {
                self.base.close_request(req_id, Some(req_error));
            }
        }
    }

    /// Answers a message the multiplexer could not route. Open requests and
    /// the bootstrap request stay open; anything else is told it is closed.
    fn refuse_routing(&mut self, req_id: ReqId, error: &RequestError) {
        let req_error = ReqError::new(error.code(), error.to_string());
        if req_id == BOOTSTRAP_REQ_ID || self.base.requests.is_open(req_id) {
            self.base.reject(req_id, req_error);
        } else {
            debug!("{} addressed unknown request {}: {}", self.key, req_id, error);
            self.base.queue_op(req_id, MsgOp::CloseReq { error: Some(req_error) });
        }
    }

    // Host-authored operations

    /// Applies an operation authored by the application and queues whatever
    /// the pin context lets through to the client
    pub fn apply_host(&mut self, req_id: ReqId, op: CellOp) -> Result<Applied, CellError> {
        let applied = self.base.apply_local(req_id, op)?;
        if let Some(emit) = &applied.emit {
            self.base.queue_op(req_id, emit.clone());
        }
        Ok(applied)
    }

    // Shutdown

    /// Closes every request with `error`, closes the session on the
    /// bootstrap request and ends the stream
    pub fn terminate(&mut self, error: ReqError, events: &mut Events) {
        if self.closing {
            return;
        }
        warn!("terminating {}: {}", self.key, error);
        for req_id in self.base.close_all(&error) {
            events.push_close(self.key, req_id, Some(error.clone()));
        }
        self.base.queue_op(BOOTSTRAP_REQ_ID, MsgOp::CloseReq { error: Some(error) });
        if let Err(send_error) = self.base.send_end_of_stream() {
            debug!("{} could not send end of stream: {}", self.key, send_error);
        }
        self.closing = true;
    }

    fn drop_requests(&mut self, events: &mut Events) {
        for req_id in self.base.requests.open_requests() {
            self.base.forget_request(req_id);
            events.push_close(self.key, req_id, None);
        }
    }
}
