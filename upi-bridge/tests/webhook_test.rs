mod common;

use common::{TestApp, TestOptions, TEST_WEBHOOK_SECRET};
use reqwest::StatusCode;
use serde_json::{json, Value};
use service_core::utils::signature::sign_payload;

const NOTIFICATION: &str = r#"{"order_id":"BZR1700000000000","status":"Success","amount":"100","utr":"412345678901"}"#;

#[tokio::test]
async fn json_notification_is_acknowledged() {
    let app = TestApp::spawn().await;

    let response = app.post_webhook("zapupi", NOTIFICATION, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "received": true }));
}

#[tokio::test]
async fn notification_with_extra_fields_is_acknowledged() {
    let app = TestApp::spawn().await;

    let response = app
        .post_webhook("zapupi", r#"{"event":"ping","nested":{"a":[1,2,3]}}"#, None)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn malformed_notifications_are_rejected() {
    let app = TestApp::spawn().await;

    for body in ["not json", "[1,2,3]", "42", ""] {
        let response = app.post_webhook("zapupi", body, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body:?}");

        let json: Value = response.json().await.unwrap();
        assert_eq!(json, json!({ "received": false }));
    }
}

#[tokio::test]
async fn unknown_provider_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app.post_webhook("razorpay", NOTIFICATION, None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["received"], false);
}

#[tokio::test]
async fn signed_notification_is_accepted_when_secret_configured() {
    let app = TestApp::spawn_with(TestOptions {
        webhook_secret: Some(TEST_WEBHOOK_SECRET),
        ..TestOptions::default()
    })
    .await;

    let signature = sign_payload(TEST_WEBHOOK_SECRET, NOTIFICATION.as_bytes()).unwrap();
    let response = app
        .post_webhook("zapupi", NOTIFICATION, Some(&signature))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let prefixed = format!("sha256={}", signature.to_uppercase());
    let response = app
        .post_webhook("zapupi", NOTIFICATION, Some(&prefixed))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unsigned_or_forged_notification_is_rejected() {
    let app = TestApp::spawn_with(TestOptions {
        webhook_secret: Some(TEST_WEBHOOK_SECRET),
        ..TestOptions::default()
    })
    .await;

    let response = app.post_webhook("zapupi", NOTIFICATION, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let forged = sign_payload("some-other-secret", NOTIFICATION.as_bytes()).unwrap();
    let response = app
        .post_webhook("zapupi", NOTIFICATION, Some(&forged))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json: Value = response.json().await.unwrap();
    assert_eq!(json, json!({ "received": false }));

    let tampered = NOTIFICATION.replace("100", "1");
    let signature = sign_payload(TEST_WEBHOOK_SECRET, NOTIFICATION.as_bytes()).unwrap();
    let response = app
        .post_webhook("zapupi", &tampered, Some(&signature))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn webhook_does_not_call_provider() {
    let app = TestApp::spawn().await;
    app.mock_provider(wiremock::ResponseTemplate::new(200), 0).await;

    let response = app.post_webhook("zapupi", NOTIFICATION, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    app.provider.verify().await;
}
