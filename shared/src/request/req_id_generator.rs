use super::error::RequestError;
use crate::types::{HostType, ReqId, BOOTSTRAP_REQ_ID};

/// First request id issued by a host. Client ids stay below it.
pub const HOST_REQ_ID_BASE: ReqId = 1 << 63;

/// Issues strictly increasing request ids from one side's half of the space
pub struct ReqIdGenerator {
    next: ReqId,
    end: ReqId,
    last: Option<ReqId>,
}

impl ReqIdGenerator {
    pub fn new(host_type: HostType) -> Self {
        let (next, end) = Self::range(host_type);
        Self {
            next,
            end,
            last: None,
        }
    }

    /// Inclusive start and exclusive end of a side's id range. The host
    /// range ends at `u64::MAX`, which is never issued.
    pub fn range(host_type: HostType) -> (ReqId, ReqId) {
        match host_type {
            HostType::Client => (BOOTSTRAP_REQ_ID + 1, HOST_REQ_ID_BASE),
            HostType::Host => (HOST_REQ_ID_BASE, ReqId::MAX),
        }
    }

    pub fn owner_of(req_id: ReqId) -> Option<HostType> {
        if req_id == BOOTSTRAP_REQ_ID {
            None
        } else if req_id >= HOST_REQ_ID_BASE {
            Some(HostType::Host)
        } else {
            Some(HostType::Client)
        }
    }

    pub fn allocate(&mut self) -> Result<ReqId, RequestError> {
        if self.next >= self.end {
            return Err(RequestError::Exhausted);
        }
        let req_id = self.next;
        self.next += 1;
        self.last = Some(req_id);
        Ok(req_id)
    }

    pub fn last_issued(&self) -> Option<ReqId> {
        self.last
    }
}
