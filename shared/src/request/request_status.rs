/// Lifecycle of one request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReqStatus {
    NotStarted,
    Syncing,
    Synced,
    Closed,
}

impl ReqStatus {
    pub fn is_open(&self) -> bool {
        !matches!(self, ReqStatus::Closed)
    }

    /// Status after a message for the request was sent or received
    pub fn on_traffic(self) -> ReqStatus {
        match self {
            ReqStatus::NotStarted => ReqStatus::Syncing,
            status => status,
        }
    }

    /// Status after new cell state was applied
    pub fn on_change(self) -> ReqStatus {
        match self {
            ReqStatus::NotStarted | ReqStatus::Synced => ReqStatus::Syncing,
            status => status,
        }
    }

    /// Status after a commit covering the root
    pub fn on_commit(self) -> ReqStatus {
        match self {
            ReqStatus::Closed => ReqStatus::Closed,
            _ => ReqStatus::Synced,
        }
    }
}
