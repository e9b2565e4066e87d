use std::collections::HashMap;

use log::{debug, trace};

use super::{error::RequestError, req_id_generator::ReqIdGenerator, request_status::ReqStatus};
use crate::{
    messages::{Msg, MsgOp},
    types::{HostType, ReqId, BOOTSTRAP_REQ_ID},
};

/// Where an inbound message belongs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// Login, registration, or session-wide errors on the bootstrap request
    Session,
    /// A pin that just opened the given request
    Open(ReqId),
    /// An operation on an already open request
    Request(ReqId),
}

/// Tracks every open request of one session and routes messages to them.
/// Ids issued by either side only grow, so any id at or below a side's
/// high-water mark that is no longer open must have been closed.
pub struct RequestMultiplexer {
    host_type: HostType,
    generator: ReqIdGenerator,
    open: HashMap<ReqId, ReqStatus>,
    remote_high_water: Option<ReqId>,
}

impl RequestMultiplexer {
    pub fn new(host_type: HostType) -> Self {
        Self {
            host_type,
            generator: ReqIdGenerator::new(host_type),
            open: HashMap::new(),
            remote_high_water: None,
        }
    }

    /// Opens a request originated by this side
    pub fn allocate(&mut self) -> Result<ReqId, RequestError> {
        let req_id = self.generator.allocate()?;
        self.open.insert(req_id, ReqStatus::NotStarted);
        trace!("{} opened request {}", self.host_type.name(), req_id);
        Ok(req_id)
    }

    /// Opens a request originated by the peer
    pub fn open_remote(&mut self, req_id: ReqId) -> Result<(), RequestError> {
        if ReqIdGenerator::owner_of(req_id) != Some(self.host_type.invert()) {
            return Err(RequestError::ForeignId { req_id });
        }
        if let Some(last) = self.remote_high_water {
            if req_id <= last {
                return Err(RequestError::NotIncreasing { req_id, last });
            }
        }
        self.remote_high_water = Some(req_id);
        self.open.insert(req_id, ReqStatus::Syncing);
        trace!("peer opened request {}", req_id);
        Ok(())
    }

    pub fn dispatch(&mut self, msg: &Msg) -> Result<Route, RequestError> {
        let req_id = msg.req_id;
        if req_id == BOOTSTRAP_REQ_ID {
            return match msg.op {
                MsgOp::CloseReq { .. } | MsgOp::Reject { .. } => Ok(Route::Session),
                ref op if op.is_session_op() => Ok(Route::Session),
                ref op => Err(RequestError::NotSessionOp { op: op.name() }),
            };
        }
        if msg.op.is_session_op() {
            return Err(RequestError::NotBootstrap {
                req_id,
                op: msg.op.name(),
            });
        }
        if let MsgOp::PinCell(_) = msg.op {
            self.open_remote(req_id)?;
            return Ok(Route::Open(req_id));
        }

        if let Some(status) = self.open.get_mut(&req_id) {
            *status = status.on_traffic();
            return Ok(Route::Request(req_id));
        }
        if self.was_closed(req_id) {
            debug!("ignoring {} for closed request {}", msg.op.name(), req_id);
            return Err(RequestError::Stale { req_id });
        }
        Err(RequestError::ReqNotFound { req_id })
    }

    fn was_closed(&self, req_id: ReqId) -> bool {
        let high_water = match ReqIdGenerator::owner_of(req_id) {
            Some(owner) if owner == self.host_type => self.generator.last_issued(),
            Some(_) => self.remote_high_water,
            None => None,
        };
        matches!(high_water, Some(last) if req_id <= last) && !self.open.contains_key(&req_id)
    }

    /// Records that this side sent something on the request
    pub fn note_sent(&mut self, req_id: ReqId) {
        if let Some(status) = self.open.get_mut(&req_id) {
            *status = status.on_traffic();
        }
    }

    pub fn mark_changed(&mut self, req_id: ReqId) -> Option<ReqStatus> {
        let status = self.open.get_mut(&req_id)?;
        *status = status.on_change();
        Some(*status)
    }

    pub fn mark_synced(&mut self, req_id: ReqId) -> Option<ReqStatus> {
        let status = self.open.get_mut(&req_id)?;
        *status = status.on_commit();
        Some(*status)
    }

    /// Closes a request. Returns false if it was not open.
    pub fn close(&mut self, req_id: ReqId) -> bool {
        let was_open = self.open.remove(&req_id).is_some();
        if was_open {
            trace!("closed request {}", req_id);
        }
        was_open
    }

    pub fn status(&self, req_id: ReqId) -> Option<ReqStatus> {
        if let Some(status) = self.open.get(&req_id) {
            return Some(*status);
        }
        if self.was_closed(req_id) {
            return Some(ReqStatus::Closed);
        }
        None
    }

    pub fn is_open(&self, req_id: ReqId) -> bool {
        self.open.contains_key(&req_id)
    }

    /// Open request ids in ascending order
    pub fn open_requests(&self) -> Vec<ReqId> {
        let mut ids: Vec<ReqId> = self.open.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}
