//! End-to-end tests against a mock Pusher API.

mod common;

use std::sync::Arc;

use fcp_pusher::{FixedClock, PusherClient, PusherConfig, PusherError, signature};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::init_test_tracing;

const NOW: i64 = 1_700_000_000;

fn client_for(server: &MockServer) -> PusherClient {
    let address = server.address();
    let config = PusherConfig::new("4", "key", "secret")
        .with_host(address.ip().to_string())
        .with_port(address.port())
        .with_ssl(false);

    PusherClient::new(config)
        .unwrap()
        .with_clock(Arc::new(FixedClock::from_unix_secs(NOW)))
}

#[tokio::test]
async fn trigger_sends_signed_post() {
    init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/apps/4/events"))
        .and(query_param("auth_key", "key"))
        .and(query_param("auth_version", "1.0"))
        .and(query_param("auth_timestamp", NOW.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client
        .trigger("my-channel", "my-event", &json!({"message": "hi"}), None)
        .await
        .unwrap();
    assert_eq!(response, json!({}));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];

    let body = String::from_utf8(request.body.clone()).unwrap();
    assert_eq!(
        body,
        r#"{"channels":["my-channel"],"data":"{\"message\":\"hi\"}","name":"my-event"}"#
    );

    let query = request.url.query().unwrap();
    let (unsigned, sig) = query.rsplit_once("&auth_signature=").unwrap();
    assert!(unsigned.contains(&format!("body_md5={}", signature::body_md5(body.as_bytes()))));
    assert_eq!(
        sig,
        signature::sign(b"secret", &format!("POST\n/apps/4/events\n{unsigned}"))
    );
}

#[tokio::test]
async fn channels_info_sends_signed_get() {
    init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/apps/4/channels"))
        .and(query_param("filter_by_prefix", "presence-"))
        .and(query_param("info", "user_count"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"channels": {"presence-room": {"user_count": 2}}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client
        .channels_info(Some("presence-"), &["user_count"])
        .await
        .unwrap();

    assert_eq!(response["channels"]["presence-room"]["user_count"], 2);
}

#[tokio::test]
async fn api_error_is_reported_without_retry() {
    init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/apps/4/channels/presence-room/users"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid signature"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.users_info("presence-room").await.unwrap_err();

    match err {
        PusherError::Api { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid signature");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_input_never_reaches_the_network() {
    init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .trigger(["so/me_channel!"], "some_event", &json!({}), None)
        .await
        .unwrap_err();

    assert!(err.is_input_error());
}
