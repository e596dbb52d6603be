//! Engine-wide properties: identifier codec, read rules, classification,
//! retry termination and update minimality.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hemmer_provider_appstream::api::{classify, codes, ApiError, ErrorKind};
use hemmer_provider_appstream::id;
use hemmer_provider_appstream::retry::{is_conflict, retry, RetryPolicy};
use hemmer_provider_appstream::testing::{assert_no_errors, fake_arn, FakeAppStream, ProviderTester};
use hemmer_provider_appstream::value::Value;
use hemmer_provider_appstream::{AppStreamProvider, Error, RequestContext};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};

#[test]
fn composite_ids_round_trip() {
    let samples: [[&str; 3]; 3] = [
        ["s1", "USERPOOL", "ada@example.com"],
        ["stack", "staff", "notepad"],
        ["fleet-a", "SAML", "CORP\\ada"],
    ];
    for parts in samples {
        let built = id::build(&parts);
        let parsed = assert_ok!(id::parse::<3>(&built));
        assert_eq!(parsed, parts.map(str::to_string));
    }

    let arn = fake_arn("application", "notepad");
    let built = id::build(&["f1", &arn]);
    assert_eq!(assert_ok!(id::parse::<2>(&built)), ["f1".to_string(), arn]);

    for bad in ["", "a", "a|", "|b", "a||b", "a|b|c"] {
        assert_err!(id::parse::<2>(bad), "accepted {bad:?}");
    }
}

#[test]
fn owned_read_preserves_intent() {
    let remote = "remote".to_string();

    assert_eq!(Value::<String>::owned(&Value::Null, Some(&remote)), Value::Null);
    assert_eq!(Value::<String>::owned(&Value::Unknown, Some(&remote)), Value::Unknown);
    assert_eq!(Value::<String>::owned(&"mine".into(), None::<&String>), Value::Null);
    assert_eq!(Value::<String>::owned(&"mine".into(), Some(&remote)), Value::known(remote.clone()));

    assert_eq!(Value::<String>::computed_optional(&Value::Null, Some(&remote)), Value::known(remote.clone()));
    assert_eq!(Value::<String>::computed_optional(&"mine".into(), None::<&String>), "mine".into());
}

#[test]
fn classification_is_a_function_of_the_code() {
    let table = [
        (codes::RESOURCE_NOT_FOUND, ErrorKind::NotFound),
        (codes::ENTITLEMENT_NOT_FOUND, ErrorKind::NotFound),
        (codes::RESOURCE_ALREADY_EXISTS, ErrorKind::AlreadyExists),
        (codes::CONCURRENT_MODIFICATION, ErrorKind::Conflict),
        (codes::OPERATION_NOT_PERMITTED, ErrorKind::Conflict),
        ("InvalidRoleException", ErrorKind::Fatal),
    ];
    for (code, kind) in table {
        assert_eq!(classify(code), kind, "code: {code}");
        assert_eq!(ApiError::new(code, "one message").kind(), kind);
        assert_eq!(ApiError::new(code, "another message").kind(), kind);
    }
}

#[tokio::test(start_paused = true)]
async fn retry_gives_up_within_timeout_plus_max_backoff() {
    let ctx = RequestContext::new();
    let policy = RetryPolicy::with_timeout(Duration::from_secs(10))
        .with_backoff(Duration::from_millis(500), Duration::from_secs(2));
    let calls = AtomicU32::new(0);
    let start = Instant::now();

    let result: Result<(), Error> = retry(&ctx, &policy, &[is_conflict], "update_fleet", || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err(ApiError::new(codes::CONCURRENT_MODIFICATION, "busy").into()) }
    })
    .await;

    let err = assert_err!(result);
    assert_eq!(err.code(), Some(codes::CONCURRENT_MODIFICATION));
    assert!(calls.load(Ordering::SeqCst) > 1);
    assert!(start.elapsed() <= Duration::from_secs(12));
}

#[tokio::test(start_paused = true)]
async fn retry_stops_on_cancellation() {
    let ctx = RequestContext::new().with_timeout(Duration::from_secs(3));
    let policy = RetryPolicy::with_timeout(Duration::from_secs(600));

    let result: Result<(), Error> = retry(&ctx, &policy, &[is_conflict], "associate_fleet", || async {
        Err(ApiError::new(codes::CONCURRENT_MODIFICATION, "busy").into())
    })
    .await;

    assert!(assert_err!(result).is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn unchanged_plans_issue_no_mutation() {
    let fake = Arc::new(FakeAppStream::new());
    let tester = ProviderTester::new(AppStreamProvider::with_api(fake.clone()));
    assert_ok!(tester.configure(json!({"region": "us-east-1", "default_tags": {"tags": {"owner": "ops"}}})).await);

    let configs = [
        ("appstream_stack", json!({"name": "s1", "description": "streaming", "tags": {"env": "dev"}})),
        (
            "appstream_app_block",
            json!({
                "name": "blk",
                "source_s3_location": {"s3_bucket": "bucket", "s3_key": "app.vhdx"},
                "setup_script_details": {
                    "script_s3_location": {"s3_bucket": "bucket", "s3_key": "setup.ps1"},
                    "executable_path": "C:\\setup.exe",
                    "timeout_in_seconds": 60,
                },
            }),
        ),
        (
            "appstream_application",
            json!({
                "name": "paint",
                "launch_path": "C:\\Windows\\System32\\mspaint.exe",
                "platforms": ["WINDOWS_SERVER_2019"],
                "instance_families": ["GENERAL_PURPOSE"],
                "app_block_arn": fake_arn("app-block", "blk"),
                "icon_s3_location": {"s3_bucket": "icons", "s3_key": "paint.png"},
            }),
        ),
        (
            "appstream_directory_config",
            json!({
                "directory_name": "corp.example.com",
                "organizational_unit_distinguished_names": ["OU=AppStream,DC=corp,DC=example,DC=com"],
                "service_account_credentials": {"account_name": "CORP\\svc", "account_password": "hunter2"},
            }),
        ),
        (
            "appstream_fleet",
            json!({
                "name": "f1",
                "image_name": "AppStream-WinServer2019",
                "instance_type": "stream.standard.small",
                "compute_capacity": {"desired_instances": 1},
            }),
        ),
    ];

    for (resource_type, config) in configs {
        let state = assert_ok!(tester.lifecycle_create(resource_type, config.clone()).await);
        fake.clear_calls();

        let plan = assert_ok!(tester.plan_update(resource_type, state.clone(), config).await);
        assert_no_errors(&plan.diagnostics);
        let response = assert_ok!(tester.update(resource_type, state, plan.planned_state).await);
        assert_no_errors(&response.diagnostics);
        assert_eq!(fake.mutations(), vec![], "{resource_type} mutated on an unchanged plan");
    }
}
