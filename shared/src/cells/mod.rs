mod cell_op;
mod cell_state;
mod cell_sync_engine;
mod error;
mod pin_context;

pub use cell_op::{AttrRef, CellOp};
pub use cell_state::CellState;
pub use cell_sync_engine::{Applied, CellSyncEngine};
pub use error::CellError;
pub use pin_context::PinContext;
