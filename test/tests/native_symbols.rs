use cellsync_server::SessionKey;
use cellsync_shared::{
    AttrId, AttrRef, AttrValue, CellDecl, CellId, DefId, MsgOp, PinFlags, PinRequest, SchemaId,
};
use cellsync_test::{
    assert_no_errors, exchange_frames, logged_in_pair, TestClient, TestHost, GALLERY_SCHEMA,
    PHOTO_SCHEMA, TITLE_ATTR, VIEWS_ATTR,
};

fn root() -> CellId {
    CellId::new(0, 3)
}

fn host_def(host: &TestHost, session: SessionKey, schema_id: SchemaId, attr_id: AttrId) -> DefId {
    let defs = host.server.session_defs(session).unwrap();
    let defs = defs.read();
    defs.schemas.def_of(schema_id, attr_id).unwrap()
}

fn pushed_attr_ids(client: &TestClient) -> Vec<AttrId> {
    client
        .syncs
        .iter()
        .filter_map(|(_, op)| match op {
            MsgOp::PushAttr(push) => Some(push.attr_id),
            _ => None,
        })
        .collect()
}

#[test]
fn both_sides_memoize_the_same_definitions() {
    let mut host = TestHost::new();
    let mut client = TestClient::new();
    let session = logged_in_pair(&mut host, &mut client);

    let gallery_title = host_def(&host, session, GALLERY_SCHEMA, TITLE_ATTR);
    let photo_title = host_def(&host, session, PHOTO_SCHEMA, TITLE_ATTR);
    let views = host_def(&host, session, GALLERY_SCHEMA, VIEWS_ATTR);

    // same name, type and series shape is the same definition
    assert_eq!(gallery_title, photo_title);
    assert_ne!(gallery_title, views);

    let client_defs = client.client.session_defs().unwrap();
    let client_defs = client_defs.read();
    assert_eq!(
        client_defs.schemas.def_of(GALLERY_SCHEMA, TITLE_ATTR),
        Ok(gallery_title)
    );
    assert_eq!(client_defs.schemas.def_of(GALLERY_SCHEMA, VIEWS_ATTR), Ok(views));
}

#[test]
fn native_pin_speaks_definition_ids_on_the_wire() {
    let mut host = TestHost::new();
    let mut client = TestClient::new();
    let session = logged_in_pair(&mut host, &mut client);
    let title_def = host_def(&host, session, GALLERY_SCHEMA, TITLE_ATTR);
    let views_def = host_def(&host, session, GALLERY_SCHEMA, VIEWS_ATTR);

    let req_id = client
        .client
        .pin(PinRequest::url("app://gallery/root").with_flags(PinFlags::USE_NATIVE_SYMBOLS))
        .unwrap();
    exchange_frames(&mut host, &mut [&mut client]);

    host.server
        .upsert_cell(session, req_id, CellDecl::new(root(), GALLERY_SCHEMA))
        .unwrap();
    host.server
        .push_attr(session, req_id, root(), AttrRef::Native(title_def), 0i64, "Native")
        .unwrap();
    host.server.commit(session, req_id, Some(root())).unwrap();
    exchange_frames(&mut host, &mut [&mut client]);

    assert_eq!(pushed_attr_ids(&client), vec![title_def as AttrId]);
    let mirror = client.client.pin_context(req_id).unwrap();
    assert_eq!(
        mirror.cell(&root()).unwrap().value(TITLE_ATTR),
        Some(&AttrValue::from("Native"))
    );

    // the client answers in the same numbering
    client
        .client
        .push_attr(req_id, root(), views_def as AttrId, 0i64, 12i64)
        .unwrap();
    exchange_frames(&mut host, &mut [&mut client]);
    let hosted = host.server.pin_context(session, req_id).unwrap();
    assert_eq!(
        hosted.cell(&root()).unwrap().value(VIEWS_ATTR),
        Some(&AttrValue::from(12i64))
    );
    assert_no_errors!(host);
    assert_no_errors!(client);
}

#[test]
fn plain_pin_translates_native_pushes_to_client_ids() {
    let mut host = TestHost::new();
    let mut client = TestClient::new();
    let session = logged_in_pair(&mut host, &mut client);
    let title_def = host_def(&host, session, GALLERY_SCHEMA, TITLE_ATTR);

    let req_id = client.client.pin(PinRequest::url("app://gallery/root")).unwrap();
    exchange_frames(&mut host, &mut [&mut client]);

    host.server
        .upsert_cell(session, req_id, CellDecl::new(root(), GALLERY_SCHEMA))
        .unwrap();
    host.server
        .push_attr(session, req_id, root(), AttrRef::Native(title_def), 0i64, "Plain")
        .unwrap();
    host.server.commit(session, req_id, None).unwrap();
    exchange_frames(&mut host, &mut [&mut client]);

    assert_eq!(pushed_attr_ids(&client), vec![TITLE_ATTR]);
    assert_eq!(client.synced, vec![req_id]);
    assert_no_errors!(client);
}
