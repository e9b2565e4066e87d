#![cfg(feature = "transport_tcp")]

use std::{
    net::{SocketAddr, TcpListener},
    thread,
    time::{Duration, Instant},
};

use cellsync_client::{transport::tcp as client_tcp, CellSyncClientError};
use cellsync_server::{transport::tcp as server_tcp, CellSyncServerError};
use cellsync_shared::{ConnectionConfig, ConnectionError};
use cellsync_test::{TestClient, TestHost, ALICE_SECRET};

const PATIENCE: Duration = Duration::from_secs(5);

/// A loopback address nothing is listening on yet
fn free_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Polls both sides until `done` holds or time runs out
fn pump_until(
    host: &mut TestHost,
    client: &mut TestClient,
    mut done: impl FnMut(&TestHost, &TestClient) -> bool,
) -> bool {
    let started = Instant::now();
    while started.elapsed() < PATIENCE {
        host.receive();
        host.send();
        client.receive();
        client.send();
        if done(host, client) {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

fn connected_pair() -> (TestHost, TestClient) {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = ConnectionConfig::default();
    let addr = free_addr();

    let mut host = TestHost::new();
    host.server.listen(server_tcp::Socket::new(addr, &config));
    assert!(host.server.is_listening());

    let mut client = TestClient::new();
    client.client.connect(client_tcp::Socket::new(addr, &config));
    client.client.login("alice", "laptop", ALICE_SECRET).unwrap();
    assert!(pump_until(&mut host, &mut client, |host, client| {
        host.logins.len() == 1 && client.logins.len() == 1
    }));
    (host, client)
}

#[test]
fn login_over_loopback() {
    let (host, client) = connected_pair();

    assert_eq!(host.connects.len(), 1);
    assert_eq!(host.logins[0].1, "alice");
    assert_eq!(client.logins, vec!["alice".to_string()]);
    assert!(host.errors.is_empty());
    assert!(client.errors.is_empty());
}

#[test]
fn host_going_away_surfaces_as_a_receive_error() {
    let (host, mut client) = connected_pair();
    drop(host);

    let started = Instant::now();
    while !client.disconnected && started.elapsed() < PATIENCE {
        client.receive();
        thread::sleep(Duration::from_millis(5));
    }
    assert!(client.disconnected);
    assert!(client.errors.iter().any(|error| matches!(
        error,
        CellSyncClientError::Connection(ConnectionError::Recv(_))
    )));
}

#[test]
fn client_going_away_ends_its_session() {
    let (mut host, client) = connected_pair();
    let session = host.connects[0];
    drop(client);

    let started = Instant::now();
    while host.disconnects.is_empty() && started.elapsed() < PATIENCE {
        host.receive();
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(host.disconnects, vec![session]);
    assert!(host.errors.iter().any(|error| matches!(
        error,
        CellSyncServerError::Connection {
            source: ConnectionError::Recv(_),
            ..
        }
    )));
}
