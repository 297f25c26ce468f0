// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! End-to-end tests for the HTTP surface
//!
//! The router runs in-process with a stub classifier and link validation
//! disabled, so no network access is needed.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use photo_market_search::api::errors::VISION_FAILURE_MESSAGE;
use photo_market_search::api::http_server::{create_router, AppState};
use photo_market_search::config::Settings;
use photo_market_search::marketplace::{Category, ClassificationResult, SearchPhrase};
use photo_market_search::service::MarketplaceSearchService;
use photo_market_search::vision::{ClassificationError, ImageMediaType, VisionClassifier};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Classifier double that counts calls
struct StubClassifier {
    result: Option<ClassificationResult>,
    calls: AtomicUsize,
}

#[async_trait]
impl VisionClassifier for StubClassifier {
    async fn classify(
        &self,
        _image: &[u8],
        _media_type: ImageMediaType,
    ) -> Result<ClassificationResult, ClassificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().ok_or(ClassificationError::Api {
            status: 529,
            message: "Overloaded".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

fn book_result() -> ClassificationResult {
    ClassificationResult {
        object_type: Category::Book,
        description: "Roman de science-fiction".to_string(),
        search_queries: vec![
            SearchPhrase::new("dune frank herbert", 0.95),
            SearchPhrase::new("roman science fiction", 0.8),
        ],
        confidence: 0.9,
    }
}

fn test_settings() -> Settings {
    Settings {
        anthropic_api_key: "test_key".to_string(),
        max_upload_size_mb: 1,
        link_validation_enabled: false,
        ..Settings::default()
    }
}

fn setup_app(result: Option<ClassificationResult>) -> (Router, Arc<StubClassifier>) {
    let classifier = Arc::new(StubClassifier {
        result,
        calls: AtomicUsize::new(0),
    });
    let settings = test_settings();
    let service = MarketplaceSearchService::new(classifier.clone(), None, settings.max_links);
    (create_router(AppState::new(service, settings)), classifier)
}

fn png_bytes(len: usize) -> Vec<u8> {
    let mut bytes = PNG_SIGNATURE.to_vec();
    bytes.resize(len.max(PNG_SIGNATURE.len()), 0);
    bytes
}

fn multipart_body(field: &str, filename: Option<&str>, bytes: &[u8]) -> Vec<u8> {
    let disposition = match filename {
        Some(name) => format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, name
        ),
        None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", field),
    };

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(disposition.as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn analyze_request() -> axum::http::request::Builder {
    Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
}

fn multipart_request(field: &str, filename: Option<&str>, bytes: &[u8]) -> Request<Body> {
    analyze_request()
        .body(Body::from(multipart_body(field, filename, bytes)))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[test]
fn test_health_endpoint() {
    let (app, _) = setup_app(Some(book_result()));
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, json) = tokio_test::block_on(send(app, request));

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["link_validation"], false);
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_analyze_success() {
    let (app, classifier) = setup_app(Some(book_result()));

    let (status, json) = send(
        app,
        multipart_request("file", Some("couverture.png"), &png_bytes(512)),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "body: {}", json);
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);

    assert!(json["request_id"].is_string());
    assert_eq!(json["analysis"]["object_type"], "book");
    assert_eq!(json["analysis"]["search_queries"][0]["query"], "dune frank herbert");

    let links = json["marketplace_links"].as_array().unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(links[0]["marketplace"], "abebooks");
    assert_eq!(links[0]["query"], "dune frank herbert");
    assert_eq!(
        links[0]["url"],
        "https://www.abebooks.fr/servlet/SearchResults?kn=dune%20frank%20herbert&sts=t"
    );
    assert!(json["processing_time_seconds"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn test_extension_is_case_insensitive() {
    let (app, _) = setup_app(Some(book_result()));

    let (status, _) = send(
        app,
        multipart_request("file", Some("PHOTO.PNG"), &png_bytes(64)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_vision_failure_returns_503() {
    let (app, classifier) = setup_app(None);

    let (status, json) = send(
        app,
        multipart_request("file", Some("photo.png"), &png_bytes(64)),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error_type"], "api_error");
    assert_eq!(json["detail"], VISION_FAILURE_MESSAGE);
    // Upstream details stay in the logs
    assert!(!json.to_string().contains("Overloaded"));
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_invalid_extension_rejected() {
    let (app, classifier) = setup_app(Some(book_result()));

    let (status, json) = send(
        app,
        multipart_request("file", Some("animation.gif"), b"GIF89a\x01\x00\x01\x00"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_type"], "validation_error");
    let detail = json["detail"].as_str().unwrap();
    assert!(detail.starts_with("Invalid file type: .gif"), "{}", detail);
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_bad_magic_numbers_rejected() {
    let (app, classifier) = setup_app(Some(book_result()));

    let (status, json) = send(
        app,
        multipart_request("file", Some("photo.jpg"), b"definitely not an image"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["detail"],
        "File is not a valid image (invalid magic numbers)"
    );
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_file_rejected() {
    let (app, _) = setup_app(Some(book_result()));

    let (status, json) = send(app, multipart_request("file", Some("photo.png"), b"")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_type"], "validation_error");
}

#[tokio::test]
async fn test_missing_filename_rejected() {
    let (app, _) = setup_app(Some(book_result()));

    let (status, json) = send(app, multipart_request("file", None, &png_bytes(64))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_type"], "validation_error");
}

#[tokio::test]
async fn test_missing_file_field_rejected() {
    let (app, _) = setup_app(Some(book_result()));

    let (status, json) = send(
        app,
        multipart_request("image", Some("photo.png"), &png_bytes(64)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_type"], "validation_error");
}

#[tokio::test]
async fn test_oversized_file_rejected() {
    let (app, classifier) = setup_app(Some(book_result()));

    // Just over the 1 MB limit but inside the multipart allowance
    let (status, json) = send(
        app,
        multipart_request("file", Some("photo.png"), &png_bytes(1024 * 1024 + 1024)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let detail = json["detail"].as_str().unwrap();
    assert!(detail.starts_with("File too large"), "{}", detail);
    assert!(detail.contains("(max 1MB)"), "{}", detail);
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_upload_beyond_body_limit_reports_size() {
    let (app, classifier) = setup_app(Some(book_result()));

    let body = multipart_body("file", Some("photo.png"), &png_bytes(2 * 1024 * 1024));
    let request = analyze_request()
        .header("content-length", body.len().to_string())
        .body(Body::from(body))
        .unwrap();

    let (status, json) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_type"], "validation_error");
    assert_eq!(json["detail"], "File too large: 2.0MB (max 1MB)");
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_upload_beyond_body_limit_without_length() {
    let (app, classifier) = setup_app(Some(book_result()));

    let (status, json) = send(
        app,
        multipart_request("file", Some("photo.png"), &png_bytes(2 * 1024 * 1024)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["detail"], "File too large: over 1MB (max 1MB)");
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
}
