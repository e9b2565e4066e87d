mod error;
mod req_id_generator;
mod request_multiplexer;
mod request_status;

pub use error::RequestError;
pub use req_id_generator::{ReqIdGenerator, HOST_REQ_ID_BASE};
pub use request_multiplexer::{RequestMultiplexer, Route};
pub use request_status::ReqStatus;
