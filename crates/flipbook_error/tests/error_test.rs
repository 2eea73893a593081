use flipbook_error::{
    AssemblyError, AssemblyErrorKind, FlipbookError, FlipbookErrorKind, OrchestrationError,
    OrchestrationErrorKind, RetryableError, UpstreamError, UpstreamErrorKind,
};

#[test]
fn test_transient_statuses_are_retryable() {
    for status in [408, 429, 500, 502, 503, 504] {
        let err = UpstreamError::from_status(status, "busy");
        assert!(err.is_retryable(), "status {status} should be retryable");
    }
}

#[test]
fn test_client_errors_are_permanent() {
    for status in [400, 401, 403, 404, 422] {
        let err = UpstreamError::from_status(status, "nope");
        assert!(!err.is_retryable(), "status {status} should be permanent");
    }
}

#[test]
fn test_status_maps_onto_named_kinds() {
    assert!(matches!(
        UpstreamError::from_status(429, "slow").kind,
        UpstreamErrorKind::RateLimited(_)
    ));
    assert!(matches!(
        UpstreamError::from_status(503, "down").kind,
        UpstreamErrorKind::Unavailable(_)
    ));
    assert!(matches!(
        UpstreamError::from_status(401, "key").kind,
        UpstreamErrorKind::Rejected(_)
    ));
    assert!(matches!(
        UpstreamError::from_status(502, "gateway").kind,
        UpstreamErrorKind::HttpStatus {
            status_code: 502,
            ..
        }
    ));
}

#[test]
fn test_errors_record_their_origin() {
    let err = UpstreamError::new(UpstreamErrorKind::Network("reset".into()));
    assert!(err.file.ends_with("error_test.rs"));
    assert!(err.line > 0);
}

#[test]
fn test_domain_errors_convert_to_flipbook_error() {
    let err: FlipbookError = AssemblyError::new(AssemblyErrorKind::NoFramesFound).into();
    assert!(matches!(err.kind(), FlipbookErrorKind::Assembly(_)));

    let err: FlipbookError = OrchestrationError::new(OrchestrationErrorKind::NoUsableOutput {
        stage: "rendering".into(),
        salvaged: 0,
    })
    .into();
    assert!(format!("{err}").contains("rendering"));
}
