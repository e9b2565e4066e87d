use cellsync_server::SessionKey;

use super::{test_client::ALICE_SECRET, TestClient, TestHost};
use crate::{local_transport::LinkCut, test_defs::gallery_defs, LocalTransportPair};

/// Connects a client to the host over an in-memory stream
pub fn connect_pair(host: &mut TestHost, client: &mut TestClient) -> (SessionKey, LinkCut) {
    let pair = LocalTransportPair::new();
    let session = host
        .server
        .accept_transport(pair.server_sender, pair.server_receiver);
    client
        .client
        .connect_transport(pair.client_sender, pair.client_receiver);
    (session, pair.cut)
}

/// One round trip: clients flush, host reads and answers, clients read
pub fn exchange_frames(host: &mut TestHost, clients: &mut [&mut TestClient]) {
    for client in clients.iter_mut() {
        client.send();
    }
    host.receive();
    host.send();
    for client in clients.iter_mut() {
        client.receive();
    }
}

/// Several round trips, enough for multi-step exchanges such as login
pub fn exchange_frames_n_times(host: &mut TestHost, clients: &mut [&mut TestClient], n: usize) {
    for _ in 0..n {
        exchange_frames(host, clients);
    }
}

/// Connects, logs in as "alice" and registers the gallery definitions
pub fn logged_in_pair(host: &mut TestHost, client: &mut TestClient) -> SessionKey {
    let (session, _) = connect_pair(host, client);
    client
        .client
        .login("alice", "phone", ALICE_SECRET)
        .expect("client is connected");
    let (symbols, schemas) = gallery_defs();
    client
        .client
        .register_defs(symbols, schemas)
        .expect("gallery definitions are valid");
    // login, challenge response, definitions
    exchange_frames_n_times(host, &mut [client], 3);
    session
}
