//! Integration tests for mailbox-poll.
//!
//! Most tests run against a local `wiremock` server. The live-provider test is
//! disabled by default. To run it:
//!
//! ```bash
//! # Set environment variables (or put them in .env)
//! export ZEPTO_API_URL="https://api.zeptomail.com/v1.1/..."
//! export ZEPTO_API_KEY="your-api-key"
//! export ZEPTO_TEST_RECIPIENT="someone@yopmail.com"
//!
//! # Run with the integration-tests feature
//! cargo test --features integration-tests -- --ignored
//! ```

use mailbox_poll::extract::{ExtractorSet, FirstUrlExtractor};
use mailbox_poll::{
    wait_for_email, AuthScheme, Error, HttpMessageSource, MailPoller, MessageSource, PollConfig,
    PollConfigBuilder,
};
use serde_json::{json, Value};
use std::env;
use std::net::TcpListener;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INVITE_HTML: &str = "<p>Email: </p>new.user@yopmail.com ... \
    <p>Temporary Password: </p>Abc12345 ... \
    <a href='https://x/setup?t=1'>Complete Your Setup</a>";

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn invite_message() -> Value {
    json!({
        "to": "Some One <new.user@yopmail.com>",
        "subject": "You've been invited to join ExampleApp",
        "content": {"html_body": INVITE_HTML},
    })
}

fn other_message() -> Value {
    json!({
        "to": "someone.else@yopmail.com",
        "subject": "Weekly digest",
        "content": {"html_body": "<p>Nothing to see</p>"},
    })
}

/// Short timings so the wait tests finish quickly on real time.
fn fast_config(server: &MockServer) -> PollConfigBuilder {
    PollConfig::builder()
        .endpoint(format!("{}/v1.1/messages", server.uri()))
        .api_key("secret")
        .poll_interval(Duration::from_millis(50))
        .max_wait(Duration::from_secs(3))
        .request_timeout(Duration::from_secs(2))
}

async fn mount_list(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/v1.1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn fetch_with_body(body: Value) -> Vec<Value> {
    let server = MockServer::start().await;
    mount_list(&server, body).await;

    let config = fast_config(&server).build().unwrap();
    let source = HttpMessageSource::new(&config).unwrap();
    source
        .fetch_messages()
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.into_value())
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Retrieval Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_response_shapes_normalize_identically() {
    let list = json!([other_message(), invite_message()]);
    let expected = vec![other_message(), invite_message()];

    assert_eq!(fetch_with_body(list.clone()).await, expected);
    assert_eq!(fetch_with_body(json!({"data": list.clone()})).await, expected);
    assert_eq!(
        fetch_with_body(json!({"messages": list.clone()})).await,
        expected
    );
    assert_eq!(
        fetch_with_body(json!({"total": 2, "weird_key": list})).await,
        expected
    );
}

#[tokio::test]
async fn test_no_list_is_empty() {
    let messages = fetch_with_body(json!({"status": "ok", "count": 0})).await;
    assert!(messages.is_empty());
}

#[tokio::test]
async fn test_zoho_auth_header_and_query_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1.1/messages"))
        .and(query_param("mailbox", "qa"))
        .and(header("Authorization", "Zoho-enczapikey secret"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let config = PollConfig::builder()
        .endpoint(format!("{}/v1.1/messages?mailbox=qa", server.uri()))
        .api_key("secret")
        .auth_scheme(AuthScheme::ZohoApiKey)
        .build()
        .unwrap();

    let source = HttpMessageSource::new(&config).unwrap();
    assert!(source.fetch_messages().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_host_uses_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("Authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let config = fast_config(&server).build().unwrap();
    assert_eq!(config.auth_scheme, AuthScheme::Bearer);

    let source = HttpMessageSource::new(&config).unwrap();
    source.fetch_messages().await.unwrap();
}

#[tokio::test]
async fn test_custom_header_scheme() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("x-api-key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let config = fast_config(&server)
        .auth_scheme(AuthScheme::header("x-api-key"))
        .build()
        .unwrap();

    let source = HttpMessageSource::new(&config).unwrap();
    source.fetch_messages().await.unwrap();
}

#[tokio::test]
async fn test_error_status_is_typed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = fast_config(&server).build().unwrap();
    let source = HttpMessageSource::new(&config).unwrap();

    let err = source.fetch_messages().await.unwrap_err();
    match &err {
        Error::Status { status, .. } => assert_eq!(status.as_u16(), 500),
        other => panic!("expected Status, got {other:?}"),
    }
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_non_json_body_is_typed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let config = fast_config(&server).build().unwrap();
    let source = HttpMessageSource::new(&config).unwrap();

    let err = source.fetch_messages().await.unwrap_err();
    assert!(matches!(err, Error::Decode { .. }), "{err:?}");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_unreachable_endpoint_is_typed() {
    // A port nothing listens on; mock servers are pooled, so don't reuse theirs
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let config = PollConfig::builder()
        .endpoint(format!("http://127.0.0.1:{port}/messages"))
        .request_timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let source = HttpMessageSource::new(&config).unwrap();

    let err = source.fetch_messages().await.unwrap_err();
    match err {
        Error::Request { endpoint, .. } => {
            assert_eq!(endpoint, format!("http://127.0.0.1:{port}/messages"));
        }
        other => panic!("expected Request error, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wait Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_end_to_end_invitation() {
    let server = MockServer::start().await;
    mount_list(&server, json!({"data": [other_message(), invite_message()]})).await;

    let config = fast_config(&server)
        .recipient("new.user@yopmail.com")
        .subject_pattern("(?i)invited to join")
        .build()
        .unwrap();

    let email = wait_for_email(config).await.unwrap();

    assert_eq!(email.subject, "You've been invited to join ExampleApp");
    assert_eq!(email.setup_link(), Some("https://x/setup?t=1"));
    assert_eq!(email.temp_password(), Some("Abc12345"));
    assert_eq!(email.user_email(), Some("new.user@yopmail.com"));
    assert_eq!(
        email.user_email_address().map(|a| a.to_string()),
        Some("new.user@yopmail.com".to_string())
    );
}

#[tokio::test]
async fn test_server_errors_are_tolerated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_list(&server, json!({"messages": [invite_message()]})).await;

    let config = fast_config(&server)
        .recipient("new.user@yopmail.com")
        .build()
        .unwrap();
    let poller = MailPoller::new(config).unwrap();

    let email = poller.wait_for_email().await.unwrap();
    assert_eq!(email.temp_password(), Some("Abc12345"));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_non_json_body_is_tolerated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_list(&server, json!([invite_message()])).await;

    let config = fast_config(&server).build().unwrap();
    let email = wait_for_email(config).await.unwrap();
    assert_eq!(email.setup_link(), Some("https://x/setup?t=1"));
}

#[tokio::test]
async fn test_wait_times_out() {
    let server = MockServer::start().await;
    mount_list(&server, json!({"data": [other_message()]})).await;

    let config = fast_config(&server)
        .recipient("new.user@yopmail.com")
        .poll_interval(Duration::from_millis(100))
        .max_wait(Duration::from_millis(400))
        .build()
        .unwrap();

    let started = std::time::Instant::now();
    let err = wait_for_email(config).await.unwrap_err();

    assert!(started.elapsed() >= Duration::from_millis(400));
    match err {
        Error::WaitTimeout { timeout, attempts } => {
            assert_eq!(timeout, Duration::from_millis(400));
            assert!(attempts >= 1);
        }
        other => panic!("expected WaitTimeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_find_match_with_custom_extractors() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        json!([{
            "to": "reset.me@yopmail.com",
            "subject": "Reset your password",
            "content": {"text_body": "Click https://app.example.com/reset?token=abc to reset."},
        }]),
    )
    .await;

    let config = fast_config(&server)
        .recipient("reset.me@yopmail.com")
        .body_pattern("reset")
        .build()
        .unwrap();
    let poller = MailPoller::new(config)
        .unwrap()
        .with_extractors(ExtractorSet::empty().with(FirstUrlExtractor::new("reset_link")));

    let email = poller.find_match().await.unwrap();
    assert_eq!(
        email.field("reset_link"),
        Some("https://app.example.com/reset?token=abc")
    );
}

#[tokio::test]
async fn test_find_match_reports_no_match() {
    let server = MockServer::start().await;
    mount_list(&server, json!([other_message()])).await;

    let config = fast_config(&server)
        .recipient("new.user@yopmail.com")
        .build()
        .unwrap();
    let poller = MailPoller::new(config).unwrap();

    let err = poller.find_match().await.unwrap_err();
    assert!(matches!(err, Error::NoMatch));
    assert!(!err.is_retryable());
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_invalid_configs_are_rejected() {
    assert!(PollConfig::builder().build().is_err());
    assert!(PollConfig::builder().endpoint("not a url").build().is_err());
    assert!(PollConfig::builder()
        .endpoint("https://api.example.com/messages")
        .subject_pattern("(unclosed")
        .build()
        .is_err());
    assert!(PollConfig::builder()
        .endpoint("https://api.example.com/messages")
        .poll_interval(Duration::from_secs(10))
        .max_wait(Duration::from_secs(1))
        .build()
        .is_err());
}

// ─────────────────────────────────────────────────────────────────────────────
// Live Provider Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
#[ignore = "requires a real provider mailbox"]
async fn test_live_provider_fetch() {
    dotenvy::dotenv().ok();
    let recipient = env::var("ZEPTO_TEST_RECIPIENT").unwrap_or_default();

    let config = PollConfigBuilder::from_env("ZEPTO")
        .expect("valid environment")
        .recipient(recipient)
        .build()
        .expect("Test config from environment variables");

    let poller = MailPoller::new(config).expect("HTTP client");
    match poller.find_match().await {
        Ok(email) => println!("Found: {} ({} fields)", email.subject, email.fields.len()),
        Err(e) => println!("No matching message right now: {e}"),
    }
}
