mod attr_spec;
mod error;
mod schema_registry;
mod session_defs;

pub use attr_spec::{AttrSchema, AttrSpec, SeriesSpec};
pub use error::SchemaError;
pub use schema_registry::{CompositeKey, SchemaRegistry, SeriesKey};
pub use session_defs::{Defs, DefsUpdate, SessionDefs};
