use cellsync_server::CellSyncServerError;
use cellsync_shared::{
    AttrRef, AttrValue, CellDecl, CellError, CellId, MsgOp, PinFlags, PinRequest, ReqStatus,
};
use cellsync_test::{
    assert_no_errors, assert_status, exchange_frames, logged_in_pair, TestClient, TestHost,
    GALLERY_SCHEMA, PHOTO_SCHEMA, TITLE_ATTR, VIEWS_ATTR,
};

fn root() -> CellId {
    CellId::new(0, 1)
}

#[test]
fn pin_upsert_push_commit_reaches_synced() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut host = TestHost::new();
    let mut client = TestClient::new();
    let session = logged_in_pair(&mut host, &mut client);

    let req_id = client
        .client
        .pin(PinRequest::url("app://gallery/root"))
        .unwrap();
    assert_eq!(req_id, 1);
    exchange_frames(&mut host, &mut [&mut client]);

    let pins = host.take_pins();
    assert_eq!(pins.len(), 1);
    assert_eq!(pins[0].0, session);
    assert_eq!(pins[0].1, req_id);
    assert_eq!(pins[0].2, PinRequest::url("app://gallery/root"));
    assert_status!(host.server, session, req_id, ReqStatus::Syncing);

    let tid = host.serve_gallery(session, req_id, root(), "Gallery").unwrap();
    exchange_frames(&mut host, &mut [&mut client]);

    assert_eq!(
        client.synced_ops(req_id),
        vec!["UpsertCell", "PushAttr", "Commit"]
    );
    assert_eq!(client.synced, vec![req_id]);
    assert_status!(client.client, req_id, ReqStatus::Synced);
    assert_status!(host.server, session, req_id, ReqStatus::Synced);

    let context = client.client.pin_context(req_id).unwrap();
    assert_eq!(context.root(), Some(root()));
    assert_eq!(context.last_commit(), Some(tid));
    assert_eq!(
        context.cell(&root()).unwrap().value(TITLE_ATTR),
        Some(&AttrValue::from("Gallery"))
    );
    assert_no_errors!(host);
    assert_no_errors!(client);
}

#[test]
fn continuous_pin_cycles_back_to_syncing() {
    let mut host = TestHost::new();
    let mut client = TestClient::new();
    let session = logged_in_pair(&mut host, &mut client);

    let req_id = client.client.pin(PinRequest::url("app://gallery/root")).unwrap();
    exchange_frames(&mut host, &mut [&mut client]);
    host.serve_gallery(session, req_id, root(), "Gallery").unwrap();
    exchange_frames(&mut host, &mut [&mut client]);
    assert_status!(client.client, req_id, ReqStatus::Synced);

    host.server
        .push_attr(session, req_id, root(), AttrRef::Client(VIEWS_ATTR), 0i64, 7i64)
        .unwrap();
    exchange_frames(&mut host, &mut [&mut client]);
    assert_status!(client.client, req_id, ReqStatus::Syncing);
    assert_status!(host.server, session, req_id, ReqStatus::Syncing);

    host.server.commit(session, req_id, None).unwrap();
    exchange_frames(&mut host, &mut [&mut client]);
    assert_status!(client.client, req_id, ReqStatus::Synced);
    assert_eq!(client.synced, vec![req_id, req_id]);
    assert!(client.closes.is_empty());
}

#[test]
fn close_on_sync_closes_after_the_root_commit() {
    let mut host = TestHost::new();
    let mut client = TestClient::new();
    let session = logged_in_pair(&mut host, &mut client);

    let req_id = client
        .client
        .pin(PinRequest::url("app://gallery/root").with_flags(PinFlags::CLOSE_ON_SYNC))
        .unwrap();
    exchange_frames(&mut host, &mut [&mut client]);

    // a child commit does not cover the root
    host.server
        .upsert_cell(session, req_id, CellDecl::new(root(), GALLERY_SCHEMA))
        .unwrap();
    let photo = CellId::new(0, 2);
    host.server
        .insert_child_cell(session, req_id, CellDecl::new(photo, PHOTO_SCHEMA))
        .unwrap();
    host.server.commit(session, req_id, Some(photo)).unwrap();
    exchange_frames(&mut host, &mut [&mut client]);
    assert_status!(client.client, req_id, ReqStatus::Syncing);

    host.server.commit(session, req_id, Some(root())).unwrap();
    exchange_frames(&mut host, &mut [&mut client]);

    assert_eq!(client.synced, vec![req_id]);
    assert_eq!(client.closes, vec![(req_id, None)]);
    assert_status!(client.client, req_id, ReqStatus::Closed);
    assert_status!(host.server, session, req_id, ReqStatus::Closed);

    // nothing more is emitted for a closed request
    let late = host
        .server
        .push_attr(session, req_id, root(), AttrRef::Client(TITLE_ATTR), 0i64, "late");
    assert_eq!(
        late,
        Err(CellSyncServerError::Cell {
            session,
            req_id,
            source: CellError::NotPinned { req_id },
        })
    );
    let before = client.syncs.len();
    exchange_frames(&mut host, &mut [&mut client]);
    assert_eq!(client.syncs.len(), before);
}

#[test]
fn concurrent_pins_do_not_share_state() {
    let mut host = TestHost::new();
    let mut client = TestClient::new();
    let session = logged_in_pair(&mut host, &mut client);

    let first = client.client.pin(PinRequest::url("app://gallery/a")).unwrap();
    let second = client.client.pin(PinRequest::url("app://gallery/b")).unwrap();
    assert!(second > first);
    exchange_frames(&mut host, &mut [&mut client]);

    let a = CellId::new(0, 10);
    let b = CellId::new(0, 20);
    host.serve_gallery(session, first, a, "A").unwrap();
    host.serve_gallery(session, second, b, "B").unwrap();
    exchange_frames(&mut host, &mut [&mut client]);

    let first_context = client.client.pin_context(first).unwrap();
    let second_context = client.client.pin_context(second).unwrap();
    assert!(first_context.contains(&a) && !first_context.contains(&b));
    assert!(second_context.contains(&b) && !second_context.contains(&a));

    // the host cannot address a cell of another pin
    assert!(host
        .server
        .push_attr(session, first, b, AttrRef::Client(TITLE_ATTR), 0i64, "x")
        .is_err());

    assert!(client.client.close_request(first).unwrap());
    exchange_frames(&mut host, &mut [&mut client]);
    assert_eq!(host.closes, vec![(session, first, None)]);
    assert_status!(host.server, session, first, ReqStatus::Closed);
    assert_status!(host.server, session, second, ReqStatus::Synced);
    assert_status!(client.client, second, ReqStatus::Synced);
}

#[test]
fn removing_a_cell_drops_its_subtree_from_the_mirror() {
    let mut host = TestHost::new();
    let mut client = TestClient::new();
    let session = logged_in_pair(&mut host, &mut client);

    let req_id = client.client.pin(PinRequest::url("app://gallery/root")).unwrap();
    exchange_frames(&mut host, &mut [&mut client]);

    let photo = CellId::new(0, 2);
    host.serve_gallery(session, req_id, root(), "Gallery").unwrap();
    host.server
        .insert_child_cell(session, req_id, CellDecl::new(photo, PHOTO_SCHEMA).labeled("cover"))
        .unwrap();
    exchange_frames(&mut host, &mut [&mut client]);
    let context = client.client.pin_context(req_id).unwrap();
    assert_eq!(context.children_of(&root()), vec![photo]);
    assert_eq!(context.cell(&photo).unwrap().label(), Some("cover"));

    host.server.remove_cell(session, req_id, photo).unwrap();
    exchange_frames(&mut host, &mut [&mut client]);
    let context = client.client.pin_context(req_id).unwrap();
    assert!(!context.contains(&photo));
    assert!(context.contains(&root()));
    assert_eq!(client.synced_ops(req_id).last(), Some(&"RemoveCell"));
}

#[test]
fn pin_by_cell_id_requires_that_root() {
    let mut host = TestHost::new();
    let mut client = TestClient::new();
    let session = logged_in_pair(&mut host, &mut client);

    let req_id = client.client.pin(PinRequest::cell(root())).unwrap();
    exchange_frames(&mut host, &mut [&mut client]);

    let wrong = host
        .server
        .upsert_cell(session, req_id, CellDecl::new(CellId::new(0, 99), GALLERY_SCHEMA));
    assert!(matches!(
        wrong,
        Err(CellSyncServerError::Cell {
            source: CellError::RootMismatch { .. },
            ..
        })
    ));
    host.serve_gallery(session, req_id, root(), "Gallery").unwrap();
    exchange_frames(&mut host, &mut [&mut client]);
    assert_status!(client.client, req_id, ReqStatus::Synced);
    assert!(matches!(
        client.syncs.first(),
        Some((_, MsgOp::UpsertCell(decl))) if decl.cell_id == root()
    ));
}
