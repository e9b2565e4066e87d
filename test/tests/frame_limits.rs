use cellsync_client::{CellSyncClientError, ClientConfig};
use cellsync_server::{CellSyncServerError, ServerConfig};
use cellsync_shared::{
    AttrRef, CellDecl, CellError, CellId, ConnectionConfig, ErrCode, PinRequest, ReqStatus,
};
use cellsync_test::{
    assert_no_errors, assert_status, exchange_frames, logged_in_pair, TestClient, TestHost,
    GALLERY_SCHEMA, TITLE_ATTR,
};

const MAX: usize = 4096;

fn small_frames() -> ConnectionConfig {
    ConnectionConfig::new(MAX, 256)
}

#[test]
fn oversized_push_is_refused_and_the_session_carries_on() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut host = TestHost::with_config(ServerConfig {
        connection: small_frames(),
        ..ServerConfig::default()
    });
    let mut client = TestClient::new();
    let session = logged_in_pair(&mut host, &mut client);

    let first = client.client.pin(PinRequest::url("app://gallery/a")).unwrap();
    let second = client.client.pin(PinRequest::url("app://gallery/b")).unwrap();
    exchange_frames(&mut host, &mut [&mut client]);

    let a = CellId::new(0, 1);
    let b = CellId::new(0, 2);
    host.serve_gallery(session, first, a, "A").unwrap();
    host.server
        .upsert_cell(session, second, CellDecl::new(b, GALLERY_SCHEMA))
        .unwrap();
    let refused = host.server.push_attr(
        session,
        second,
        b,
        AttrRef::Client(TITLE_ATTR),
        0i64,
        "b".repeat(10 * 1024),
    );
    let Err(CellSyncServerError::Cell { req_id, source, .. }) = refused else {
        panic!("expected the push to be refused, got {:?}", refused);
    };
    assert_eq!(req_id, second);
    assert!(matches!(source, CellError::TooLarge { max: MAX, .. }));
    assert_eq!(source.code(), ErrCode::BadValue);

    // nothing of the refused push was applied
    let hosted = host.server.pin_context(session, second).unwrap();
    assert_eq!(hosted.cell(&b).unwrap().value(TITLE_ATTR), None);

    host.server.commit(session, second, Some(b)).unwrap();
    exchange_frames(&mut host, &mut [&mut client]);

    assert!(host.server.session_exists(session));
    assert_status!(client.client, first, ReqStatus::Synced);
    assert_status!(client.client, second, ReqStatus::Synced);
    assert_eq!(client.synced, vec![first, second]);
    assert!(!client.disconnected);
    assert_no_errors!(client);
    assert_no_errors!(host);
}

#[test]
fn client_refuses_a_write_no_frame_can_hold() {
    let mut host = TestHost::new();
    let mut client = TestClient::with_config(ClientConfig {
        connection: small_frames(),
        ..ClientConfig::default()
    });
    let session = logged_in_pair(&mut host, &mut client);

    let req_id = client.client.pin(PinRequest::url("app://gallery/mine")).unwrap();
    exchange_frames(&mut host, &mut [&mut client]);
    let root = CellId::new(0, 5);
    client
        .client
        .upsert_cell(req_id, CellDecl::new(root, GALLERY_SCHEMA))
        .unwrap();

    let refused = client
        .client
        .push_attr(req_id, root, TITLE_ATTR, 0i64, "t".repeat(10 * 1024));
    assert!(matches!(
        refused,
        Err(CellSyncClientError::Cell {
            source: CellError::TooLarge { .. },
            ..
        })
    ));

    exchange_frames(&mut host, &mut [&mut client]);
    assert_eq!(host.writes.len(), 1);
    assert_status!(host.server, session, req_id, ReqStatus::Syncing);
    assert!(client.client.is_connected());
}
