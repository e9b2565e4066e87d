/// Assert the status a side reports for a request
#[macro_export]
macro_rules! assert_status {
    ($side:expr, $req_id:expr, $status:expr) => {
        assert_eq!(
            $side.request_status($req_id),
            Some($status),
            "request {} has the wrong status",
            $req_id
        );
    };
    ($side:expr, $session:expr, $req_id:expr, $status:expr) => {
        assert_eq!(
            $side.request_status($session, $req_id),
            Some($status),
            "request {} on {} has the wrong status",
            $req_id,
            $session
        );
    };
}

/// Assert that a test host or client collected no errors
#[macro_export]
macro_rules! assert_no_errors {
    ($side:expr) => {
        assert!(
            $side.errors.is_empty(),
            "unexpected errors: {:?}",
            $side.errors
        );
    };
}
