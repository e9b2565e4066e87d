use cellsync_shared::{AttrRef, AttrValue, CellId, PinRequest, ReqStatus};
use cellsync_test::{
    assert_status, exchange_frames, logged_in_pair, TestClient, TestHost, TITLE_ATTR, VIEWS_ATTR,
};
use log::debug;
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Step {
    Push(i64),
    Commit,
    Exchange,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        any::<i64>().prop_map(Step::Push),
        Just(Step::Commit),
        Just(Step::Exchange),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn mirror_matches_the_host_after_every_flush(steps in prop::collection::vec(step(), 1..40)) {
        let mut host = TestHost::new();
        let mut client = TestClient::new();
        let session = logged_in_pair(&mut host, &mut client);
        let root = CellId::new(0, 42);

        let req_id = client.client.pin(PinRequest::url("app://gallery/counter")).unwrap();
        exchange_frames(&mut host, &mut [&mut client]);
        host.serve_gallery(session, req_id, root, "Counter").unwrap();

        let mut commits = 1;
        for step in steps {
            debug!("step {:?}", step);
            match step {
                Step::Push(views) => {
                    host.server
                        .push_attr(session, req_id, root, AttrRef::Client(VIEWS_ATTR), 0i64, views)
                        .unwrap();
                }
                Step::Commit => {
                    host.server.commit(session, req_id, None).unwrap();
                    commits += 1;
                }
                Step::Exchange => exchange_frames(&mut host, &mut [&mut client]),
            }
        }
        host.server.commit(session, req_id, None).unwrap();
        commits += 1;
        exchange_frames(&mut host, &mut [&mut client]);

        let hosted = host.server.pin_context(session, req_id).unwrap().cell(&root).unwrap();
        let mirrored = client.client.pin_context(req_id).unwrap().cell(&root).unwrap();
        prop_assert_eq!(mirrored.value(VIEWS_ATTR), hosted.value(VIEWS_ATTR));
        prop_assert_eq!(mirrored.value(TITLE_ATTR), Some(&AttrValue::from("Counter")));
        prop_assert_eq!(client.synced.len(), commits);
        assert_status!(client.client, req_id, ReqStatus::Synced);
        assert_status!(host.server, session, req_id, ReqStatus::Synced);
        prop_assert!(client.errors.is_empty());
    }
}
