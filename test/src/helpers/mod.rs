pub mod assertions;
pub mod frame_exchange;
pub mod raw_session;
pub mod test_host;

pub use frame_exchange::{
    connect_pair, exchange_frames, exchange_frames_n_times, logged_in_pair,
};
pub use raw_session::RawSession;
pub use test_client::{TestClient, ALICE_SECRET};
pub use test_host::TestHost;
