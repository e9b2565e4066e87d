use std::mem;

use log::info;

use cellsync_shared::{
    AttrId, AttrPush, AttrSchema, AttrValue, CellDecl, CellId, DefsUpdate, FrameReceiver,
    FrameSender, MsgOp, PinContext, PinRequest, ReqId, ReqStatus, SeriesIndex, SessionDefs,
    Symbol, BOOTSTRAP_REQ_ID,
};

use crate::{
    connection::connection::Connection, transport::Socket, CellSyncClientError, ClientConfig,
    Events,
};

/// Client can connect to a host, log in, register its definitions, and pin
/// cells whose state the host then keeps in sync
pub struct Client {
    client_config: ClientConfig,
    connection: Option<Connection>,
    incoming_events: Events,
}

impl Client {
    /// Create a new Client
    pub fn new(client_config: ClientConfig) -> Self {
        Self {
            client_config,
            connection: None,
            incoming_events: Events::new(),
        }
    }

    /// Connect to the given host
    pub fn connect<S: Into<Box<dyn Socket>>>(&mut self, socket: S) {
        let socket: Box<dyn Socket> = socket.into();
        let (sender, receiver) = socket.connect();
        self.connect_transport(sender, receiver);
    }

    /// Starts a session over a stream that is already connected. Any
    /// previous session is dropped.
    pub fn connect_transport(&mut self, sender: Box<dyn FrameSender>, receiver: Box<dyn FrameReceiver>) {
        self.connection = Some(Connection::new(
            &self.client_config.connection,
            sender,
            receiver,
        ));
    }

    /// Returns whether a session is open
    pub fn is_connected(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|connection| !connection.has_ended())
    }

    pub fn is_logged_in(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(Connection::is_logged_in)
    }

    pub fn user_uid(&self) -> Option<&str> {
        self.connection.as_ref()?.user_uid()
    }

    /// Starts the login exchange. `secret` answers the host's challenge.
    /// Definitions and pins issued before the host accepts are held back
    /// and sent right after.
    pub fn login(
        &mut self,
        user_uid: &str,
        device_uid: &str,
        secret: impl Into<Vec<u8>>,
    ) -> Result<(), CellSyncClientError> {
        self.connection_mut()?
            .login(user_uid, device_uid, secret.into())
    }

    /// Registers symbols and schemas for the rest of the session
    pub fn register_defs(
        &mut self,
        symbols: Vec<Symbol>,
        schemas: Vec<AttrSchema>,
    ) -> Result<DefsUpdate, CellSyncClientError> {
        self.connection_mut()?.register_defs(symbols, schemas)
    }

    /// Opens a pin context under a new request id
    pub fn pin(&mut self, request: PinRequest) -> Result<ReqId, CellSyncClientError> {
        self.connection_mut()?.pin(request, 0)
    }

    /// Pins again a request the host closed with a transient error, once the
    /// `retry_after` of its `RequestFailed` has passed
    pub fn repin(&mut self, req_id: ReqId) -> Result<ReqId, CellSyncClientError> {
        self.connection_mut()?.repin(req_id)
    }

    /// Stops a pin. Returns false if the request was not open.
    pub fn close_request(&mut self, req_id: ReqId) -> Result<bool, CellSyncClientError> {
        Ok(self.connection_mut()?.close_request(req_id))
    }

    // Writes into our own pin contexts

    pub fn upsert_cell(&mut self, req_id: ReqId, decl: CellDecl) -> Result<(), CellSyncClientError> {
        self.connection_mut()?.write(req_id, MsgOp::UpsertCell(decl))
    }

    pub fn insert_child_cell(
        &mut self,
        req_id: ReqId,
        decl: CellDecl,
    ) -> Result<(), CellSyncClientError> {
        self.connection_mut()?
            .write(req_id, MsgOp::InsertChildCell(decl))
    }

    /// `attr_id` is in the numbering the pin context speaks: our own ids,
    /// or the host's when the pin used native symbols
    pub fn push_attr(
        &mut self,
        req_id: ReqId,
        cell_id: CellId,
        attr_id: AttrId,
        series_index: impl Into<SeriesIndex>,
        value: impl Into<AttrValue>,
    ) -> Result<(), CellSyncClientError> {
        let push = AttrPush::new(cell_id, attr_id, series_index, value);
        self.connection_mut()?.write(req_id, MsgOp::PushAttr(push))
    }

    pub fn commit(&mut self, req_id: ReqId, cell: Option<CellId>) -> Result<(), CellSyncClientError> {
        self.connection_mut()?
            .write(req_id, MsgOp::Commit { cell, tid: None })
    }

    pub fn remove_cell(&mut self, req_id: ReqId, cell_id: CellId) -> Result<(), CellSyncClientError> {
        self.connection_mut()?
            .write(req_id, MsgOp::RemoveCell { cell_id })
    }

    // Polling

    /// Must be called regularly. Reads every frame the host sent and
    /// returns what happened.
    pub fn receive(&mut self) -> Events {
        if let Some(connection) = self.connection.as_mut() {
            connection.receive(&self.client_config.retry, &mut self.incoming_events);
        }
        mem::replace(&mut self.incoming_events, Events::new())
    }

    /// Sends every queued message. Returns how many frames were written.
    pub fn send_all_frames(&mut self) -> Result<usize, CellSyncClientError> {
        let connection = self
            .connection
            .as_mut()
            .filter(|connection| !connection.has_ended())
            .ok_or(CellSyncClientError::NotConnected)?;
        let sent = connection.base.send_all_frames();
        for (req_id, error) in connection.base.take_unframeable() {
            if req_id != BOOTSTRAP_REQ_ID {
                self.incoming_events.push_close(req_id, Some(error.clone()));
            }
            self.incoming_events
                .push_error(CellSyncClientError::Unframeable { req_id, error });
        }
        Ok(sent?)
    }

    /// Closes every open request and ends the stream. The session is gone
    /// once `receive` reports a `DisconnectEvent`.
    pub fn disconnect(&mut self) -> Result<(), CellSyncClientError> {
        info!("disconnecting from host");
        self.connection_mut()?.disconnect()
    }

    // State

    /// The mirrored state of an open pin
    pub fn pin_context(&self, req_id: ReqId) -> Option<&PinContext> {
        self.connection.as_ref()?.base.engine.context(req_id)
    }

    pub fn request_status(&self, req_id: ReqId) -> Option<ReqStatus> {
        self.connection.as_ref()?.base.request_status(req_id)
    }

    pub fn open_requests(&self) -> Vec<ReqId> {
        self.connection
            .as_ref()
            .map(|connection| connection.base.requests.open_requests())
            .unwrap_or_default()
    }

    pub fn session_defs(&self) -> Option<SessionDefs> {
        self.connection
            .as_ref()
            .map(|connection| connection.base.defs.clone())
    }

    fn connection_mut(&mut self) -> Result<&mut Connection, CellSyncClientError> {
        match self.connection.as_mut() {
            Some(connection) if !connection.has_ended() => Ok(connection),
            _ => Err(CellSyncClientError::NotConnected),
        }
    }
}
