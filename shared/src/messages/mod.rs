mod err_code;
mod error;
mod login;
mod msg;
mod msg_codec;
mod pin_request;
mod series_index;
mod value;

pub use err_code::{ErrCode, ErrLevel, ReqError};
pub use error::MsgCodecError;
pub use login::{login_digest, verify_login, LOGIN_DIGEST_LEN};
pub use msg::{AttrPush, CellDecl, Msg, MsgBatch, MsgFlags, MsgOp};
pub use msg_codec::{decode_batch, decode_msg, encode_batch, encode_msg};
pub use pin_request::{ItemRef, ItemSelector, PinFlags, PinRequest, PinTarget};
pub use series_index::SeriesIndex;
pub use value::{AttrValue, ValueType};
