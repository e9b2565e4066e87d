pub mod helpers;
pub mod local_transport;
pub mod test_defs;

pub use helpers::*;
pub use local_transport::LocalTransportPair;
pub use test_defs::{gallery_defs, GALLERY_SCHEMA, PHOTO_SCHEMA, SAMPLES_ATTR, TITLE_ATTR, VIEWS_ATTR};
