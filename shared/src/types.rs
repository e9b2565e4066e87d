/// Client-issued (or host-issued, high bit set) request identifier
pub type ReqId = u64;
/// Attribute identifier as it appears on the wire
pub type AttrId = i32;
/// Interned symbol identifier
pub type SymbolId = u32;
/// Client-generated schema identifier
pub type SchemaId = u32;
/// Host-native attribute definition identifier, memoized per session
pub type DefId = u32;

/// Request id reserved for the login exchange, which precedes any request
pub const BOOTSTRAP_REQ_ID: ReqId = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostType {
    /// The data authority
    Host,
    /// The consumer that pins cells
    Client,
}

impl HostType {
    pub fn invert(self) -> Self {
        match self {
            HostType::Host => HostType::Client,
            HostType::Client => HostType::Host,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HostType::Host => "host",
            HostType::Client => "client",
        }
    }
}
