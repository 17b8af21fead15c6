//! Live Dataplane Tests
//!
//! Run against a deployed stack. The session (stack resolution plus sample
//! media upload) is bootstrapped once for the whole binary.
//!
//! ## Prerequisites
//!
//! ```bash
//! export TEST_MEDIA_PATH=../test-media/ SAMPLE_IMAGE=sample-image.jpg
//! export REGION=us-west-2 MI_STACK_NAME=mie
//! export AWS_ACCESS_KEY_ID=... AWS_SECRET_ACCESS_KEY=...
//! cargo test --test live_dataplane_test
//! ```
//!
//! Tests skip when `MI_STACK_NAME` is unset.

use dataplane_harness::logging::init_test_logging;
use dataplane_harness::session::TestSession;
use dataplane_harness::DataplaneApi;
use serde_json::{json, Value};
use tokio::sync::OnceCell;

static SESSION: OnceCell<TestSession> = OnceCell::const_new();

fn is_deployment_configured() -> bool {
    std::env::var("MI_STACK_NAME").is_ok()
}

async fn dataplane_api() -> DataplaneApi {
    init_test_logging();
    let session = SESSION
        .get_or_try_init(TestSession::from_environment)
        .await
        .expect("Failed to bootstrap test session");
    session.api().expect("Failed to build dataplane client")
}

async fn create_asset(api: &DataplaneApi) -> String {
    let response = api.create_asset().await.expect("Request failed");
    assert_eq!(response.status(), 200, "create should succeed");

    let body: Value = response.json().await.expect("Invalid create response");
    body["AssetId"]
        .as_str()
        .expect("create response carries AssetId")
        .to_string()
}

#[tokio::test]
async fn test_checkout_and_checkin_asset() {
    if !is_deployment_configured() {
        eprintln!("Skipping: MI_STACK_NAME not set");
        return;
    }

    let api = dataplane_api().await;
    let asset_id = create_asset(&api).await;

    let response = api.checkout_asset(&asset_id).await.expect("Request failed");
    assert_eq!(response.status(), 200);

    let response = api.list_checkouts().await.expect("Request failed");
    assert_eq!(response.status(), 200);
    let checkouts = response.text().await.expect("Invalid checkouts response");
    assert!(checkouts.contains(&asset_id));

    let response = api.checkin_asset(&asset_id).await.expect("Request failed");
    assert_eq!(response.status(), 200);

    let response = api.delete_asset(&asset_id).await.expect("Request failed");
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_metadata_lifecycle() {
    if !is_deployment_configured() {
        eprintln!("Skipping: MI_STACK_NAME not set");
        return;
    }

    let api = dataplane_api().await;
    let asset_id = create_asset(&api).await;

    let operator = json!({
        "OperatorName": "testOperator",
        "Results": {"Labels": [{"Name": "Cat", "Confidence": 99.1}]}
    });

    let response = api
        .post_metadata(&asset_id, &operator, false, false)
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 200);

    let response = api
        .get_single_metadata_field(&asset_id, &operator)
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 200);

    let response = api
        .get_all_metadata(&asset_id, None)
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 200);

    let response = api
        .delete_single_metadata_field(&asset_id, &operator)
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 200);

    let response = api.delete_asset(&asset_id).await.expect("Request failed");
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_paginated_metadata_upload() {
    if !is_deployment_configured() {
        eprintln!("Skipping: MI_STACK_NAME not set");
        return;
    }

    let api = dataplane_api().await;
    let asset_id = create_asset(&api).await;

    let pages = [
        json!({"OperatorName": "pagedOperator", "Results": {"page": 1}}),
        json!({"OperatorName": "pagedOperator", "Results": {"page": 2}}),
    ];

    let response = api
        .post_metadata(&asset_id, &pages[0], true, false)
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 200);

    let response = api
        .post_metadata(&asset_id, &pages[1], true, true)
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 200);

    let response = api.delete_asset(&asset_id).await.expect("Request failed");
    assert_eq!(response.status(), 200);
}
