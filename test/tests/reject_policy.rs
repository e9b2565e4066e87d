use cellsync_client::{CellSyncClientError, Client, ClientConfig, ErrorEvent};
use cellsync_server::{CellSyncServerError, RejectPolicy, ServerConfig};
use cellsync_shared::{
    encode_end_of_stream, encode_tx, AttrPush, CellDecl, CellId, ErrCode, Frame, Msg, MsgOp,
    PinRequest, ReqError, ReqStatus, RequestError, BOOTSTRAP_REQ_ID,
};
use cellsync_test::{
    gallery_defs, local_transport::raw_pipe, RawSession, TestHost, GALLERY_SCHEMA, TITLE_ATTR,
};

fn open_host(policy: RejectPolicy) -> TestHost {
    TestHost::with_config(ServerConfig {
        require_auth: false,
        reject_policy: policy,
        ..ServerConfig::default()
    })
}

/// Logs in, registers the gallery and pins request 1
fn pinned_session(host: &mut TestHost) -> RawSession {
    let mut raw = RawSession::connect(host);
    let (symbols, schemas) = gallery_defs();
    raw.send(vec![
        Msg::new(
            BOOTSTRAP_REQ_ID,
            MsgOp::Login {
                user_uid: "bob".to_string(),
                device_uid: "tv".to_string(),
            },
        ),
        Msg::new(BOOTSTRAP_REQ_ID, MsgOp::RegisterDefs { symbols, schemas }),
        Msg::new(1, MsgOp::PinCell(PinRequest::url("app://gallery/root"))),
    ]);
    let reply = raw.exchange(host);
    assert_eq!(reply, vec![Msg::new(BOOTSTRAP_REQ_ID, MsgOp::LoginAccepted)]);
    assert_eq!(host.take_pins().len(), 1);
    raw
}

fn root() -> CellId {
    CellId::new(0, 1)
}

fn push_title(cell_id: CellId, title: &str) -> MsgOp {
    MsgOp::PushAttr(AttrPush::new(cell_id, TITLE_ATTR, 0i64, title))
}

#[test]
fn bad_push_is_reported_and_the_request_survives() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut host = open_host(RejectPolicy::Report);
    let mut raw = pinned_session(&mut host);

    raw.send_op(1, push_title(root(), "too early"));
    let reply = raw.exchange(&mut host);
    assert_eq!(reply.len(), 1);
    let MsgOp::Reject { error } = &reply[0].op else {
        panic!("expected a reject, got {:?}", reply[0].op);
    };
    assert_eq!(reply[0].req_id, 1);
    assert_eq!(error.code, ErrCode::InvalidReq);
    assert!(matches!(
        host.take_errors().as_slice(),
        [CellSyncServerError::Cell { req_id: 1, .. }]
    ));
    assert_eq!(
        host.server.request_status(raw.session, 1),
        Some(ReqStatus::Syncing)
    );

    // the same request still accepts valid writes, which are never echoed
    raw.send(vec![
        Msg::new(1, MsgOp::UpsertCell(CellDecl::new(root(), GALLERY_SCHEMA))),
        Msg::new(1, push_title(root(), "now valid")),
    ]);
    assert!(raw.exchange(&mut host).is_empty());
    assert_eq!(host.writes.len(), 2);
    assert!(host.errors.is_empty());
}

#[test]
fn close_request_policy_closes_on_a_bad_push() {
    let mut host = open_host(RejectPolicy::CloseRequest);
    let mut raw = pinned_session(&mut host);

    raw.send_op(1, push_title(root(), "too early"));
    let reply = raw.exchange(&mut host);
    assert_eq!(reply.len(), 1);
    let MsgOp::CloseReq { error: Some(error) } = &reply[0].op else {
        panic!("expected a close with an error, got {:?}", reply[0].op);
    };
    assert_eq!(error.code, ErrCode::InvalidReq);
    assert_eq!(
        host.server.request_status(raw.session, 1),
        Some(ReqStatus::Closed)
    );

    // in-flight messages for the closed request are ignored
    raw.send_op(1, push_title(root(), "ignored"));
    assert!(raw.exchange(&mut host).is_empty());
}

#[test]
fn unknown_request_is_told_it_is_closed() {
    let mut host = open_host(RejectPolicy::Report);
    let mut raw = pinned_session(&mut host);

    raw.send_op(
        7,
        MsgOp::RemoveCell {
            cell_id: CellId::new(0, 1),
        },
    );
    let reply = raw.exchange(&mut host);
    assert_eq!(reply.len(), 1);
    assert_eq!(reply[0].req_id, 7);
    let MsgOp::CloseReq { error: Some(error) } = &reply[0].op else {
        panic!("expected a close, got {:?}", reply[0].op);
    };
    assert_eq!(error.code, ErrCode::ReqNotFound);
}

#[test]
fn session_ops_on_a_request_are_rejected() {
    let mut host = open_host(RejectPolicy::Report);
    let mut raw = pinned_session(&mut host);

    raw.send_op(1, MsgOp::LoginAccepted);
    let reply = raw.exchange(&mut host);
    assert_eq!(reply.len(), 1);
    assert!(matches!(&reply[0].op, MsgOp::Reject { error } if error.code == ErrCode::InvalidReq));
    assert_eq!(
        host.server.request_status(raw.session, 1),
        Some(ReqStatus::Syncing)
    );
}

#[test]
fn undecodable_frame_terminates_the_session() {
    let mut host = open_host(RejectPolicy::Report);
    let mut raw = pinned_session(&mut host);

    // valid header, garbage batch
    let mut frame = vec![0, 0, 0, 0, 0, 0, 12, 1];
    frame.extend_from_slice(&[0xff, 0xff, 0xff, 0xff]);
    raw.send_bytes(&frame);
    let reply = raw.exchange(&mut host);

    let closes: Vec<(u64, ErrCode)> = reply
        .iter()
        .filter_map(|msg| match &msg.op {
            MsgOp::CloseReq { error: Some(error) } => Some((msg.req_id, error.code)),
            _ => None,
        })
        .collect();
    assert_eq!(
        closes,
        vec![(1, ErrCode::MalformedTx), (BOOTSTRAP_REQ_ID, ErrCode::MalformedTx)]
    );
    assert!(raw.ended);
    assert_eq!(host.disconnects, vec![raw.session]);
    assert_eq!(host.closes.len(), 1);
}

#[test]
fn client_end_of_stream_drops_its_requests() {
    let mut host = open_host(RejectPolicy::Report);
    let mut raw = pinned_session(&mut host);

    raw.send_bytes(&encode_end_of_stream());
    assert!(raw.exchange(&mut host).is_empty());
    assert!(raw.ended);
    assert_eq!(host.closes, vec![(raw.session, 1, None)]);
    assert_eq!(host.disconnects, vec![raw.session]);
}

#[test]
fn client_answers_host_messages_it_cannot_route() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (inbound, receiver, sender, outbox) = raw_pipe();
    let mut client = Client::new(ClientConfig::default());
    client.connect_transport(sender, receiver);

    let frame = encode_tx(
        &[
            Msg::new(99, push_title(root(), "nobody asked")),
            Msg::new(
                BOOTSTRAP_REQ_ID,
                MsgOp::Commit {
                    cell: None,
                    tid: None,
                },
            ),
        ],
        4096,
    )
    .unwrap();
    inbound.send(&frame);

    let mut events = client.receive();
    let errors: Vec<CellSyncClientError> = events.read::<ErrorEvent>().collect();
    assert!(matches!(
        errors.as_slice(),
        [
            CellSyncClientError::Request(RequestError::ReqNotFound { req_id: 99 }),
            CellSyncClientError::Request(RequestError::NotSessionOp { .. }),
        ]
    ));
    client.send_all_frames().unwrap();

    let mut replies = Vec::new();
    for bytes in outbox.drain() {
        if let Frame::Tx(batch) = Frame::decode(&bytes, 4096).unwrap() {
            replies.extend(batch);
        }
    }
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0].req_id, 99);
    let MsgOp::CloseReq { error: Some(error) } = &replies[0].op else {
        panic!("expected a close, got {:?}", replies[0].op);
    };
    assert_eq!(error.code, ErrCode::ReqNotFound);
    assert_eq!(replies[1].req_id, BOOTSTRAP_REQ_ID);
    assert!(matches!(&replies[1].op, MsgOp::Reject { error } if error.code == ErrCode::InvalidReq));
}

#[test]
fn client_does_not_answer_an_unroutable_close() {
    let (inbound, receiver, sender, outbox) = raw_pipe();
    let mut client = Client::new(ClientConfig::default());
    client.connect_transport(sender, receiver);

    let frame = encode_tx(
        &[Msg::new(
            42,
            MsgOp::CloseReq {
                error: Some(ReqError::new(ErrCode::ReqNotFound, "request 42 not found")),
            },
        )],
        4096,
    )
    .unwrap();
    inbound.send(&frame);

    let mut events = client.receive();
    assert_eq!(events.read::<ErrorEvent>().count(), 1);
    client.send_all_frames().unwrap();
    assert!(outbox.drain().is_empty());
}
