//! # Cellsync Shared
//! Common functionality shared between cellsync-server & cellsync-client crates.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use cellsync_serde::{
    ByteReader, ByteWrite, ByteWriter, Serde, SerdeErr, SignedVariableInteger,
    UnsignedVariableInteger,
};

mod backends;
mod cells;
mod connection;
mod identifier;
mod messages;
mod request;
mod schema;
mod symbols;
mod transport;
mod types;

pub use backends::{TimeError, Timestamp};
pub use cells::{AttrRef, Applied, CellError, CellOp, CellState, CellSyncEngine, PinContext};
pub use connection::{
    base_connection::BaseConnection,
    connection_config::ConnectionConfig,
    decoder::FrameDecoder,
    encoder::FrameEncoder,
    error::{ConnectionError, FrameError},
    frame::{encode_end_of_stream, encode_tx, Frame},
    frame_header::{FrameHeader, FrameOp, FRAME_HEADER_LEN},
};
pub use identifier::{
    decode_base32, encode_base32, encoded_len, CellId, IdError, Tid, TidMinter, CELL_ID_LEN,
    CELL_ID_TEXT_LEN, GEOHASH_ALPHABET, MAX_TID_SECS, TID_LEN, TID_SUFFIX_LEN, TID_TEXT_LEN,
};
pub use messages::{
    decode_batch, decode_msg, encode_batch, encode_msg, login_digest, verify_login, AttrPush,
    AttrValue, CellDecl, ErrCode, ErrLevel, ItemRef, ItemSelector, Msg, MsgBatch, MsgCodecError,
    MsgFlags, MsgOp, PinFlags, PinRequest, PinTarget, ReqError, SeriesIndex, ValueType,
    LOGIN_DIGEST_LEN,
};
pub use request::{ReqIdGenerator, ReqStatus, RequestError, RequestMultiplexer, Route, HOST_REQ_ID_BASE};
pub use schema::{
    AttrSchema, AttrSpec, CompositeKey, Defs, DefsUpdate, SchemaError, SchemaRegistry, SeriesKey,
    SeriesSpec, SessionDefs,
};
pub use symbols::{
    bootstrap_table, BootstrapTable, BuiltinSymbol, Symbol, SymbolError, SymbolTable,
    ISSUER_INITS_AT,
};
pub use transport::{FrameReceiver, FrameSender, RecvError, SendError};
pub use types::{AttrId, DefId, HostType, ReqId, SchemaId, SymbolId, BOOTSTRAP_REQ_ID};
