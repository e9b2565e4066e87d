mod base32;
mod cell_id;
mod error;
mod tid;

pub use base32::{decode_base32, encode_base32, encoded_len, GEOHASH_ALPHABET};
pub use cell_id::{CellId, CELL_ID_LEN, CELL_ID_TEXT_LEN};
pub use error::IdError;
pub use tid::{Tid, TidMinter, MAX_TID_SECS, TID_LEN, TID_SUFFIX_LEN, TID_TEXT_LEN};
