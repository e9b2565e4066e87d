//! # Cellsync Client
//! The client side of the cell sync protocol. Logs in to a host, registers
//! symbols and schemas, pins cells and keeps a mirrored copy of every pinned
//! subtree up to date as the host pushes and commits.

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
        AttrId, AttrSchema, AttrSpec, AttrValue, CellDecl, CellId, CellState, ConnectionConfig,
        DefsUpdate, ErrCode, ItemRef, ItemSelector, MsgOp, PinContext, PinFlags, PinRequest,
        PinTarget, ReqError, ReqId, ReqStatus, SeriesIndex, SeriesKey, SeriesSpec, SessionDefs,
        Symbol, Tid,
    };
}

mod client;
mod client_config;
mod connection;
mod error;
mod events;

pub use client::Client;
pub use client_config::{ClientConfig, RetryConfig};
pub use error::CellSyncClientError;
pub use events::{
    CloseEvent, DisconnectEvent, ErrorEvent, Event, Events, LoginEvent, SyncEvent, SyncedEvent,
};
