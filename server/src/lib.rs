//! # Cellsync Server
//! The host side of the cell sync protocol. Accepts client sessions over a
//! framed byte stream, verifies their logins, and answers pin requests with
//! cell declarations, attribute pushes and TID-stamped commits.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

#[macro_use]
extern crate cfg_if;

pub mod transport;
pub mod shared {
    pub use cellsync_shared::{
        AttrRef, AttrValue, CellDecl, CellId, ConnectionConfig, DefsUpdate, ErrCode, MsgOp,
        PinContext, PinFlags, PinRequest, PinTarget, ReqError, ReqId, ReqStatus, SeriesIndex,
        SessionDefs, Tid,
    };
}

mod error;
mod events;
mod server;
mod session;

pub use error::CellSyncServerError;
pub use events::{
    CellWriteEvent, CloseEvent, ConnectEvent, DefsEvent, DisconnectEvent, ErrorEvent, Event,
    Events, LoginEvent, PinEvent,
};
pub use server::{RejectPolicy, Server, ServerConfig};
pub use session::{LoginVerifier, SessionKey};
