use cellsync_client::CellSyncClientError;
use cellsync_server::{CellSyncServerError, ServerConfig};
use cellsync_shared::{login_digest, ErrCode, MsgOp, PinRequest, BOOTSTRAP_REQ_ID};
use cellsync_test::{
    assert_no_errors, connect_pair, exchange_frames, gallery_defs, RawSession, TestClient,
    TestHost, ALICE_SECRET,
};

#[test]
fn challenge_response_on_the_wire() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut host = TestHost::new();
    let mut raw = RawSession::connect(&mut host);

    raw.send_op(
        BOOTSTRAP_REQ_ID,
        MsgOp::Login {
            user_uid: "alice".to_string(),
            device_uid: "laptop".to_string(),
        },
    );
    let reply = raw.exchange(&mut host);
    assert_eq!(reply.len(), 1);
    assert_eq!(reply[0].req_id, BOOTSTRAP_REQ_ID);
    let MsgOp::LoginChallenge { hash } = &reply[0].op else {
        panic!("expected a challenge, got {:?}", reply[0].op);
    };
    assert_eq!(hash.len(), 32);
    assert!(!host.server.is_logged_in(raw.session));

    raw.send_op(
        BOOTSTRAP_REQ_ID,
        MsgOp::LoginResponse {
            hash_resp: login_digest(ALICE_SECRET, hash),
        },
    );
    let reply = raw.exchange(&mut host);
    assert_eq!(reply.len(), 1);
    assert_eq!(reply[0].op, MsgOp::LoginAccepted);
    assert!(host.server.is_logged_in(raw.session));
    assert_eq!(host.server.user_uid(raw.session), Some("alice"));
    assert_eq!(
        host.logins,
        vec![(raw.session, "alice".to_string(), "laptop".to_string())]
    );
}

#[test]
fn client_logs_in_then_sends_held_back_definitions() {
    let mut host = TestHost::new();
    let mut client = TestClient::new();
    let (session, _) = connect_pair(&mut host, &mut client);

    client.client.login("alice", "phone", ALICE_SECRET).unwrap();
    let (symbols, schemas) = gallery_defs();
    let update = client.client.register_defs(symbols, schemas).unwrap();
    assert_eq!(update.schemas, 2);

    // Login -> LoginChallenge
    exchange_frames(&mut host, &mut [&mut client]);
    assert!(!client.client.is_logged_in());
    assert!(host.defs.is_empty());

    // LoginResponse -> LoginAccepted
    exchange_frames(&mut host, &mut [&mut client]);
    assert!(client.client.is_logged_in());
    assert_eq!(client.logins, vec!["alice".to_string()]);

    // RegisterDefs
    exchange_frames(&mut host, &mut [&mut client]);
    assert_eq!(host.defs.len(), 1);
    assert_eq!(host.defs[0].0, session);
    assert_eq!(host.defs[0].1.schemas, 2);
    assert_no_errors!(host);
    assert_no_errors!(client);
}

#[test]
fn wrong_secret_ends_the_session() {
    let mut host = TestHost::new();
    let mut client = TestClient::new();
    let (session, _) = connect_pair(&mut host, &mut client);

    client.client.login("alice", "phone", b"guess".to_vec()).unwrap();
    exchange_frames(&mut host, &mut [&mut client]);
    exchange_frames(&mut host, &mut [&mut client]);

    assert_eq!(
        host.take_errors(),
        vec![CellSyncServerError::LoginFailed {
            session,
            user_uid: "alice".to_string(),
            code: ErrCode::LoginFailed,
        }]
    );
    assert_eq!(host.disconnects, vec![session]);
    assert!(!host.server.session_exists(session));

    let errors = client.take_errors();
    assert!(errors.contains(&CellSyncClientError::LoginFailed {
        code: ErrCode::LoginFailed
    }));
    assert!(client.disconnected);
    assert!(!client.client.is_connected());
    assert_eq!(
        client.client.pin(PinRequest::url("app://gallery/root")),
        Err(CellSyncClientError::NotConnected)
    );
}

#[test]
fn unknown_user_fails_with_auth_failed() {
    let mut host = TestHost::new();
    let mut client = TestClient::new();
    connect_pair(&mut host, &mut client);

    client.client.login("mallory", "phone", ALICE_SECRET).unwrap();
    exchange_frames(&mut host, &mut [&mut client]);
    exchange_frames(&mut host, &mut [&mut client]);

    assert_eq!(host.take_errors()[0].code(), ErrCode::AuthFailed);
    assert!(client.take_errors().contains(&CellSyncClientError::LoginFailed {
        code: ErrCode::AuthFailed
    }));
}

#[test]
fn login_without_auth_is_accepted_at_once() {
    let mut host = TestHost::with_config(ServerConfig {
        require_auth: false,
        ..ServerConfig::default()
    });
    let mut raw = RawSession::connect(&mut host);

    raw.send_op(
        BOOTSTRAP_REQ_ID,
        MsgOp::Login {
            user_uid: "bob".to_string(),
            device_uid: "tv".to_string(),
        },
    );
    assert_eq!(raw.exchange(&mut host)[0].op, MsgOp::LoginAccepted);
    assert!(host.server.is_logged_in(raw.session));
}

#[test]
fn pins_and_definitions_before_login_are_refused() {
    let mut host = TestHost::new();
    let mut raw = RawSession::connect(&mut host);
    let (symbols, schemas) = gallery_defs();

    raw.send_op(BOOTSTRAP_REQ_ID, MsgOp::RegisterDefs { symbols, schemas });
    raw.send_op(1, MsgOp::PinCell(PinRequest::url("app://gallery/root")));
    let reply = raw.exchange(&mut host);

    let codes: Vec<(u64, Option<ErrCode>)> = reply
        .iter()
        .map(|msg| match &msg.op {
            MsgOp::Reject { error } => (msg.req_id, Some(error.code)),
            MsgOp::CloseReq { error } => (msg.req_id, error.as_ref().map(|error| error.code)),
            other => panic!("unexpected {:?}", other),
        })
        .collect();
    assert_eq!(
        codes,
        vec![
            (BOOTSTRAP_REQ_ID, Some(ErrCode::NotConnected)),
            (1, Some(ErrCode::NotConnected)),
        ]
    );
    assert!(host.defs.is_empty());
    assert!(host.pins.is_empty());
}
