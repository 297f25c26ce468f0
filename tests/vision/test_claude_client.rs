// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Wiremock tests for the Claude vision client
//!
//! Verifies the Messages API request shape and how every failure mode maps
//! onto a classification error.

use photo_market_search::marketplace::Category;
use photo_market_search::vision::{
    ClassificationError, ClaudeVisionClient, ImageMediaType, VisionClassifier,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test_key";
const MODEL: &str = "claude-test";

/// PNG signature followed by filler; small enough to skip resizing
fn png_bytes() -> Vec<u8> {
    let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0u8; 64]);
    bytes
}

fn client(server: &MockServer, timeout: Duration) -> ClaudeVisionClient {
    ClaudeVisionClient::with_base_url(API_KEY, MODEL, timeout, &server.uri())
        .expect("client should build")
}

fn text_reply(text: &str) -> serde_json::Value {
    json!({
        "id": "msg_01",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": text}],
        "usage": {"input_tokens": 1500, "output_tokens": 90}
    })
}

async fn mount_reply(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_classify_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", API_KEY))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": MODEL,
            "max_tokens": 1000,
            "messages": [{
                "role": "user",
                "content": [{
                    "type": "image",
                    "source": {"type": "base64", "media_type": "image/png"}
                }]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply(
            r#"{"object_type": "book", "description": "Roman policier", "search_queries": [{"query": "livre policier", "confidence": 0.9}, {"query": "roman thriller", "confidence": 0.8}], "confidence": 0.92}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server, Duration::from_secs(5))
        .classify(&png_bytes(), ImageMediaType::Png)
        .await
        .expect("classify should succeed");

    assert_eq!(result.object_type, Category::Book);
    assert_eq!(result.description, "Roman policier");
    assert_eq!(result.search_queries.len(), 2);
    assert_eq!(result.search_queries[0].query, "livre policier");
    assert!((result.confidence - 0.92).abs() < 0.001);
}

#[tokio::test]
async fn test_classify_fenced_json() {
    let server = MockServer::start().await;
    let text = "Voici l'analyse :\n```json\n{\"object_type\": \"tools\", \"description\": \"Perceuse sans fil\", \"search_queries\": [{\"query\": \"perceuse visseuse\"}], \"confidence\": 0.85}\n```";
    mount_reply(
        &server,
        ResponseTemplate::new(200).set_body_json(text_reply(text)),
    )
    .await;

    let result = client(&server, Duration::from_secs(5))
        .classify(&png_bytes(), ImageMediaType::Png)
        .await
        .expect("fenced JSON should parse");

    assert_eq!(result.object_type, Category::Tools);
    assert_eq!(result.search_queries[0].query, "perceuse visseuse");
    // Missing phrase confidence falls back to the default
    assert!((result.search_queries[0].confidence - 0.8).abs() < 0.001);
}

#[tokio::test]
async fn test_api_error_status() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        ResponseTemplate::new(529).set_body_json(json!({
            "type": "error",
            "error": {"type": "overloaded_error", "message": "Overloaded"}
        })),
    )
    .await;

    let err = client(&server, Duration::from_secs(5))
        .classify(&png_bytes(), ImageMediaType::Png)
        .await
        .unwrap_err();

    match err {
        ClassificationError::Api { status, message } => {
            assert_eq!(status, 529);
            assert_eq!(message, "Overloaded");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unparseable_text() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        ResponseTemplate::new(200).set_body_json(text_reply("Je ne peux pas analyser cette image.")),
    )
    .await;

    let err = client(&server, Duration::from_secs(5))
        .classify(&png_bytes(), ImageMediaType::Png)
        .await
        .unwrap_err();

    assert!(
        matches!(err, ClassificationError::MalformedJson(_)),
        "got {:?}",
        err
    );
}

#[tokio::test]
async fn test_out_of_bounds_result_rejected() {
    let server = MockServer::start().await;
    let text = r#"{"object_type": "furniture", "description": "Chaise", "search_queries": [], "confidence": 0.7}"#;
    mount_reply(
        &server,
        ResponseTemplate::new(200).set_body_json(text_reply(text)),
    )
    .await;

    let err = client(&server, Duration::from_secs(5))
        .classify(&png_bytes(), ImageMediaType::Png)
        .await
        .unwrap_err();

    assert!(
        matches!(err, ClassificationError::InvalidResult(_)),
        "got {:?}",
        err
    );
}

#[tokio::test]
async fn test_no_text_block() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"content": []})),
    )
    .await;

    let err = client(&server, Duration::from_secs(5))
        .classify(&png_bytes(), ImageMediaType::Png)
        .await
        .unwrap_err();

    assert!(matches!(err, ClassificationError::EmptyResponse));
}

#[tokio::test]
async fn test_request_timeout() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(text_reply("{}"))
            .set_delay(Duration::from_secs(5)),
    )
    .await;

    let err = client(&server, Duration::from_millis(200))
        .classify(&png_bytes(), ImageMediaType::Png)
        .await
        .unwrap_err();

    assert!(matches!(err, ClassificationError::Timeout), "got {:?}", err);
}
