use std::time::Duration;

use cellsync_client::{CellSyncClientError, ClientConfig, RetryConfig};
use cellsync_server::CellSyncServerError;
use cellsync_shared::{ErrCode, PinRequest, ReqError, ReqStatus};
use cellsync_test::{
    assert_status, connect_pair, exchange_frames, exchange_frames_n_times, logged_in_pair,
    TestClient, TestHost, ALICE_SECRET,
};

fn failure_of(client: &mut TestClient) -> (ErrCode, Option<Duration>) {
    let errors = client.take_errors();
    match errors.as_slice() {
        [CellSyncClientError::RequestFailed {
            error, retry_after, ..
        }] => (error.code, *retry_after),
        other => panic!("expected one request failure, got {:?}", other),
    }
}

#[test]
fn shutdown_closes_every_request_as_retryable() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut host = TestHost::new();
    let mut client = TestClient::new();
    let session = logged_in_pair(&mut host, &mut client);

    let first = client.client.pin(PinRequest::url("app://gallery/a")).unwrap();
    let second = client.client.pin(PinRequest::url("app://gallery/b")).unwrap();
    exchange_frames(&mut host, &mut [&mut client]);

    host.server.shutdown();
    client.receive();

    let shutting_down = Some(ReqError::new(ErrCode::ShuttingDown, "host is shutting down"));
    assert_eq!(
        host.closes,
        vec![
            (session, first, shutting_down.clone()),
            (session, second, shutting_down.clone()),
        ]
    );
    assert_eq!(host.server.sessions_count(), 0);

    assert_eq!(
        client.closes,
        vec![(first, shutting_down.clone()), (second, shutting_down)]
    );
    let retries: Vec<Option<Duration>> = client
        .errors
        .iter()
        .filter_map(|error| match error {
            CellSyncClientError::RequestFailed { retry_after, .. } => Some(*retry_after),
            _ => None,
        })
        .collect();
    assert_eq!(retries, vec![Some(Duration::from_millis(250)); 2]);
    assert!(client
        .errors
        .iter()
        .any(|error| matches!(error, CellSyncClientError::SessionClosed { .. })));
    assert!(client.disconnected);

    // the session is gone, so is any retry
    assert_eq!(
        client.client.repin(first),
        Err(CellSyncClientError::NotConnected)
    );
}

#[test]
fn timed_out_pin_is_retried_under_a_new_request() {
    let mut host = TestHost::new();
    let mut client = TestClient::new();
    let session = logged_in_pair(&mut host, &mut client);

    let request = PinRequest::url("app://gallery/slow");
    let req_id = client.client.pin(request.clone()).unwrap();
    exchange_frames(&mut host, &mut [&mut client]);
    host.take_pins();

    host.server
        .close_request(session, req_id, Some(ReqError::new(ErrCode::Timeout, "too slow")))
        .unwrap();
    exchange_frames(&mut host, &mut [&mut client]);
    assert_eq!(
        failure_of(&mut client),
        (ErrCode::Timeout, Some(Duration::from_millis(250)))
    );
    assert_eq!(client.client.request_status(req_id), Some(ReqStatus::Closed));

    let retried = client.client.repin(req_id).unwrap();
    assert!(retried > req_id);
    exchange_frames(&mut host, &mut [&mut client]);

    let pins = host.take_pins();
    assert_eq!(pins, vec![(session, retried, request)]);
    assert_status!(host.server, session, retried, ReqStatus::Syncing);

    // a retry is only handed out once
    assert_eq!(
        client.client.repin(req_id),
        Err(CellSyncClientError::NoRetry { req_id })
    );
}

#[test]
fn permanent_failure_is_not_retried() {
    let mut host = TestHost::new();
    let mut client = TestClient::new();
    let session = logged_in_pair(&mut host, &mut client);

    let req_id = client.client.pin(PinRequest::url("app://gallery/gone")).unwrap();
    exchange_frames(&mut host, &mut [&mut client]);

    assert_eq!(
        host.server
            .fail_pin(session, req_id, ErrCode::CellNotFound, "no such gallery"),
        Ok(true)
    );
    exchange_frames(&mut host, &mut [&mut client]);

    assert_eq!(failure_of(&mut client), (ErrCode::CellNotFound, None));
    assert_eq!(
        client.client.repin(req_id),
        Err(CellSyncClientError::NoRetry { req_id })
    );
    assert_eq!(
        host.server.fail_pin(session, req_id, ErrCode::CellNotFound, "again"),
        Ok(false)
    );
}

#[test]
fn retries_stop_after_the_configured_attempts() {
    let mut host = TestHost::new();
    let mut client = TestClient::with_config(ClientConfig {
        retry: RetryConfig {
            max_attempts: 2,
            ..RetryConfig::default()
        },
        ..ClientConfig::default()
    });
    let session = logged_in_pair(&mut host, &mut client);
    let timeout = || Some(ReqError::new(ErrCode::Timeout, "too slow"));

    let mut req_id = client.client.pin(PinRequest::url("app://gallery/slow")).unwrap();
    let mut delays = Vec::new();
    for _ in 0..3 {
        exchange_frames(&mut host, &mut [&mut client]);
        host.server.close_request(session, req_id, timeout()).unwrap();
        exchange_frames(&mut host, &mut [&mut client]);
        let (_, retry_after) = failure_of(&mut client);
        delays.push(retry_after);
        match client.client.repin(req_id) {
            Ok(next) => req_id = next,
            Err(error) => {
                assert_eq!(error, CellSyncClientError::NoRetry { req_id });
                break;
            }
        }
    }
    assert_eq!(
        delays,
        vec![
            Some(Duration::from_millis(250)),
            Some(Duration::from_millis(500)),
            None
        ]
    );
}

#[test]
fn broken_link_drops_the_session_on_both_sides() {
    let mut host = TestHost::new();
    let mut client = TestClient::new();
    let (session, link) = connect_pair(&mut host, &mut client);
    client.client.login("alice", "phone", ALICE_SECRET).unwrap();
    exchange_frames_n_times(&mut host, &mut [&mut client], 2);
    assert!(host.server.is_logged_in(session));

    let req_id = client.client.pin(PinRequest::url("app://gallery/root")).unwrap();
    exchange_frames(&mut host, &mut [&mut client]);

    link.cut();
    exchange_frames(&mut host, &mut [&mut client]);

    assert!(matches!(
        host.take_errors().as_slice(),
        [CellSyncServerError::Connection { .. }]
    ));
    assert_eq!(host.closes, vec![(session, req_id, None)]);
    assert_eq!(host.disconnects, vec![session]);
    assert!(!host.server.session_exists(session));

    assert!(matches!(
        client.take_errors().as_slice(),
        [CellSyncClientError::Connection(_)]
    ));
    assert_eq!(client.closes, vec![(req_id, None)]);
    assert!(client.disconnected);
    assert!(!client.client.is_connected());
}
