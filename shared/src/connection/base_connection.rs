use std::{collections::HashSet, mem, slice};

use log::{debug, trace, warn};

use super::{
    connection_config::ConnectionConfig,
    encoder::FrameEncoder,
    error::{ConnectionError, FrameError},
    frame::{encode_end_of_stream, encode_tx, Frame},
};
use crate::{
    cells::{Applied, CellError, CellOp, CellSyncEngine},
    messages::{ErrCode, Msg, MsgOp, ReqError},
    request::{ReqStatus, RequestMultiplexer},
    schema::SessionDefs,
    transport::{FrameReceiver, FrameSender},
    types::{HostType, ReqId, BOOTSTRAP_REQ_ID},
};

/// Represents a session with the remote side, and provides functionality to
/// manage its requests and the frames exchanged over it
pub struct BaseConnection {
    host_type: HostType,
    max_frame_size: usize,
    pub defs: SessionDefs,
    pub requests: RequestMultiplexer,
    pub engine: CellSyncEngine,
    encoder: FrameEncoder,
    outgoing: Vec<Msg>,
    unframeable: Vec<(ReqId, ReqError)>,
    sender: Box<dyn FrameSender>,
    receiver: Box<dyn FrameReceiver>,
    sent_end_of_stream: bool,
    received_end_of_stream: bool,
}

impl BaseConnection {
    pub fn new(
        host_type: HostType,
        connection_config: &ConnectionConfig,
        defs: SessionDefs,
        sender: Box<dyn FrameSender>,
        receiver: Box<dyn FrameReceiver>,
    ) -> Self {
        Self {
            host_type,
            max_frame_size: connection_config.max_frame_size,
            defs,
            requests: RequestMultiplexer::new(host_type),
            engine: CellSyncEngine::new(),
            encoder: FrameEncoder::new(connection_config),
            outgoing: Vec::new(),
            unframeable: Vec::new(),
            sender,
            receiver,
            sent_end_of_stream: false,
            received_end_of_stream: false,
        }
    }

    pub fn host_type(&self) -> HostType {
        self.host_type
    }

    // Outgoing

    pub fn queue(&mut self, msg: Msg) {
        self.requests.note_sent(msg.req_id);
        trace!("{} queued {} on {}", self.host_type.name(), msg.op.name(), msg.req_id);
        self.outgoing.push(msg);
    }

    pub fn queue_op(&mut self, req_id: ReqId, op: MsgOp) {
        self.queue(Msg::new(req_id, op));
    }

    pub fn has_outgoing(&self) -> bool {
        !self.outgoing.is_empty()
    }

    /// Fails if `msg` could not be sent in a frame of its own
    pub fn check_fits(&self, msg: &Msg) -> Result<(), FrameError> {
        encode_tx(slice::from_ref(msg), self.max_frame_size).map(|_| ())
    }

    /// Frames every queued message and hands the frames to the transport.
    /// Returns how many frames were sent.
    pub fn send_all_frames(&mut self) -> Result<usize, ConnectionError> {
        if self.outgoing.is_empty() {
            return Ok(0);
        }
        if self.sent_end_of_stream {
            self.outgoing.clear();
            return Err(ConnectionError::Closed);
        }
        let msgs = self.take_frameable();
        let frames = self.encoder.encode(&msgs)?;
        for frame in &frames {
            self.sender.send(frame)?;
        }
        Ok(frames.len())
    }

    /// Takes the outgoing queue, leaving out every message no frame can
    /// hold. The request of such a message is closed with `BadValue` and
    /// nothing queued after it for that request is sent.
    fn take_frameable(&mut self) -> Vec<Msg> {
        let queued = mem::take(&mut self.outgoing);
        let mut failed: HashSet<ReqId> = HashSet::new();
        let mut msgs = Vec::with_capacity(queued.len());
        for msg in queued {
            if failed.contains(&msg.req_id) {
                continue;
            }
            let Err(error) = self.check_fits(&msg) else {
                msgs.push(msg);
                continue;
            };
            warn!(
                "{} dropped {} on request {}: {}",
                self.host_type.name(),
                msg.op.name(),
                msg.req_id,
                error
            );
            let req_error = ReqError::new(ErrCode::BadValue, error.to_string());
            if msg.req_id != BOOTSTRAP_REQ_ID {
                failed.insert(msg.req_id);
                if !self.close_request(msg.req_id, Some(req_error.clone())) {
                    self.queue_op(
                        msg.req_id,
                        MsgOp::CloseReq {
                            error: Some(req_error.clone()),
                        },
                    );
                }
            }
            self.unframeable.push((msg.req_id, req_error));
        }
        msgs.append(&mut self.outgoing);
        msgs
    }

    /// Requests that lost a message at the last flush because it could not
    /// be framed, with the error they were closed with
    pub fn take_unframeable(&mut self) -> Vec<(ReqId, ReqError)> {
        mem::take(&mut self.unframeable)
    }

    /// Flushes pending messages, then tells the peer nothing else follows
    pub fn send_end_of_stream(&mut self) -> Result<(), ConnectionError> {
        if self.sent_end_of_stream {
            return Ok(());
        }
        self.send_all_frames()?;
        self.sender.send(&encode_end_of_stream())?;
        self.sent_end_of_stream = true;
        debug!("{} sent end of stream", self.host_type.name());
        Ok(())
    }

    pub fn sent_end_of_stream(&self) -> bool {
        self.sent_end_of_stream
    }

    // Incoming

    /// Reads every frame the transport has ready, in order. Stops at end of
    /// stream; anything after it is ignored.
    pub fn receive_msgs(&mut self) -> Result<Vec<Msg>, ConnectionError> {
        let mut msgs = Vec::new();
        while !self.received_end_of_stream {
            let Some(bytes) = self.receiver.receive()? else {
                break;
            };
            match Frame::decode(bytes, self.max_frame_size)? {
                Frame::Tx(batch) => msgs.extend(batch),
                Frame::EndOfStream => {
                    debug!("{} received end of stream", self.host_type.name());
                    self.received_end_of_stream = true;
                }
            }
        }
        Ok(msgs)
    }

    pub fn received_end_of_stream(&self) -> bool {
        self.received_end_of_stream
    }

    // Requests

    /// Closes an open request, telling the peer. Returns false if the
    /// request was not open.
    pub fn close_request(&mut self, req_id: ReqId, error: Option<ReqError>) -> bool {
        if !self.requests.is_open(req_id) {
            return false;
        }
        if let Some(error) = &error {
            debug!("closing request {} with {}", req_id, error);
        }
        self.queue_op(req_id, MsgOp::CloseReq { error });
        self.forget_request(req_id);
        true
    }

    /// Drops a request locally, after the peer closed it
    pub fn forget_request(&mut self, req_id: ReqId) {
        self.requests.close(req_id);
        self.engine.close(req_id);
    }

    /// Refuses one operation while leaving the request open
    pub fn reject(&mut self, req_id: ReqId, error: ReqError) {
        warn!("rejecting operation on request {}: {}", req_id, error);
        self.queue_op(req_id, MsgOp::Reject { error });
    }

    /// Closes every open request with the same error, in id order
    pub fn close_all(&mut self, error: &ReqError) -> Vec<ReqId> {
        let open = self.requests.open_requests();
        for req_id in &open {
            self.close_request(*req_id, Some(error.clone()));
        }
        open
    }

    pub fn request_status(&self, req_id: ReqId) -> Option<ReqStatus> {
        self.requests.status(req_id)
    }

    // Cells

    /// Applies a cell operation received from the peer
    pub fn apply_remote(&mut self, req_id: ReqId, op: &MsgOp) -> Result<Applied, CellError> {
        let applied = {
            let defs = self.defs.read();
            self.engine.apply_wire(req_id, op, &defs)?
        };
        self.track(req_id, &applied);
        Ok(applied)
    }

    /// Applies a cell operation authored on this side. The caller decides
    /// whether `Applied::emit` is sent.
    pub fn apply_local(&mut self, req_id: ReqId, op: CellOp) -> Result<Applied, CellError> {
        if let Err(FrameError::FrameTooLarge { size, max }) =
            self.check_fits(&Msg::new(req_id, op.to_wire()))
        {
            return Err(CellError::TooLarge { size, max });
        }
        let applied = {
            let defs = self.defs.read();
            self.engine.apply(req_id, op, &defs)?
        };
        self.track(req_id, &applied);
        Ok(applied)
    }

    fn track(&mut self, req_id: ReqId, applied: &Applied) {
        if applied.changed {
            self.requests.mark_changed(req_id);
        }
        if applied.covers_root {
            self.requests.mark_synced(req_id);
        }
    }
}
