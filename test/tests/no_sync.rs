use cellsync_shared::{AttrValue, CellDecl, CellId, MsgOp, PinFlags, PinRequest, ReqStatus};
use cellsync_test::{
    assert_no_errors, assert_status, exchange_frames, logged_in_pair, TestClient, TestHost,
    GALLERY_SCHEMA, TITLE_ATTR,
};

fn root() -> CellId {
    CellId::new(0, 9)
}

fn no_sync_pin() -> PinRequest {
    PinRequest::url("app://gallery/drafts").with_flags(PinFlags::NO_SYNC)
}

#[test]
fn host_changes_stay_local_and_only_the_commit_crosses() {
    let mut host = TestHost::new();
    let mut client = TestClient::new();
    let session = logged_in_pair(&mut host, &mut client);

    let req_id = client.client.pin(no_sync_pin()).unwrap();
    exchange_frames(&mut host, &mut [&mut client]);
    assert_eq!(host.take_pins().len(), 1);

    let tid = host.serve_gallery(session, req_id, root(), "Drafts").unwrap();
    exchange_frames(&mut host, &mut [&mut client]);

    assert_eq!(client.synced_ops(req_id), vec!["Commit"]);
    assert_eq!(client.synced, vec![req_id]);
    assert_status!(client.client, req_id, ReqStatus::Synced);
    assert_status!(host.server, session, req_id, ReqStatus::Synced);

    // the mirror stays empty, the host keeps its own state
    assert_eq!(client.client.pin_context(req_id).unwrap().root(), None);
    let hosted = host.server.pin_context(session, req_id).unwrap();
    assert_eq!(hosted.root(), Some(root()));
    assert_eq!(hosted.last_commit(), Some(tid));
    assert_no_errors!(client);
}

#[test]
fn client_writes_still_reach_the_host() {
    let mut host = TestHost::new();
    let mut client = TestClient::new();
    let session = logged_in_pair(&mut host, &mut client);

    let req_id = client.client.pin(no_sync_pin()).unwrap();
    exchange_frames(&mut host, &mut [&mut client]);

    client
        .client
        .upsert_cell(req_id, CellDecl::new(root(), GALLERY_SCHEMA))
        .unwrap();
    client
        .client
        .push_attr(req_id, root(), TITLE_ATTR, 0i64, "from the phone")
        .unwrap();
    client.client.commit(req_id, Some(root())).unwrap();
    exchange_frames(&mut host, &mut [&mut client]);

    let ops: Vec<&str> = host
        .writes
        .iter()
        .filter(|(key, id, _)| *key == session && *id == req_id)
        .map(|(_, _, op)| op.name())
        .collect();
    assert_eq!(ops, vec!["UpsertCell", "PushAttr", "Commit"]);
    assert!(matches!(host.writes[2].2, MsgOp::Commit { tid: None, .. }));

    let hosted = host.server.pin_context(session, req_id).unwrap();
    assert_eq!(
        hosted.cell(&root()).unwrap().value(TITLE_ATTR),
        Some(&AttrValue::from("from the phone"))
    );
    assert_status!(host.server, session, req_id, ReqStatus::Synced);

    // nothing is echoed back
    assert!(client.syncs.is_empty());
    assert_no_errors!(host);
    assert_no_errors!(client);
}
