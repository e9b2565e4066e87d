mod login;
mod session;
mod session_key;

pub use login::LoginVerifier;
pub(crate) use session::{Session, SessionContext};
pub use session_key::SessionKey;
