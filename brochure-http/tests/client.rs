use std::time::{Duration, Instant};

use brochure_http::{HttpClient, HttpError};
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn get_bytes_returns_body_and_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .and(header("user-agent", "brochure-test"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                "<html><body>hi</body></html>",
                "text/html; charset=utf-8",
            ),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::unanchored(Some("brochure-test")).unwrap();
    let raw = client
        .get_bytes(&format!("{}/about", server.uri()))
        .await
        .expect("page fetched");

    assert!(raw.status.is_success());
    assert_eq!(raw.body, b"<html><body>hi</body></html>");
    assert_eq!(
        raw.content_type.as_deref(),
        Some("text/html; charset=utf-8")
    );
}

#[tokio::test]
async fn non_success_status_is_an_api_error_without_retry_when_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::unanchored(None).unwrap().with_retries(0);
    let err = client
        .get_bytes(&format!("{}/missing", server.uri()))
        .await
        .unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(503));
    match err {
        HttpError::Api { message, .. } => assert_eq!(message, "down"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::unanchored(None).unwrap().with_retries(3);
    let err = client
        .get_bytes(&format!("{}/gone", server.uri()))
        .await
        .unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(404));
}

#[tokio::test]
async fn post_json_retries_server_errors_and_sends_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&format!("{}/v1/", server.uri())).unwrap();
    let got: Value = client
        .post_json("chat/completions", Some("sk-test"), &json!({"model": "m"}))
        .await
        .expect("second attempt succeeds");

    assert_eq!(got["ok"], true);
}

#[tokio::test]
async fn throttled_request_waits_for_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "1")
                .set_body_json(json!({"error": {"message": "slow down"}})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&format!("{}/v1/", server.uri())).unwrap();
    let started = Instant::now();
    let got: Value = client
        .post_json("chat/completions", None, &json!({}))
        .await
        .expect("retry succeeds");

    assert_eq!(got["ok"], true);
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn pasted_key_is_cleaned_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&format!("{}/v1/", server.uri())).unwrap();
    let _: Value = client
        .post_json("chat/completions", Some("  \"sk-test\"\n"), &json!({}))
        .await
        .expect("cleaned key accepted");
}

#[tokio::test]
async fn undecodable_json_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = HttpClient::new(&format!("{}/v1/", server.uri())).unwrap();
    let err = client
        .post_json::<_, Value>("chat/completions", None, &json!({}))
        .await
        .unwrap_err();

    assert!(matches!(err, HttpError::Decode(_, ref snippet) if snippet == "not json"));
}
