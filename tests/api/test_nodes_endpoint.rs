// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /nodes (detector) and POST /analyze/nodes (vision model)

use super::support::*;
use axum::http::StatusCode;
use serde_json::json;
use wiremock::{
    matchers::{body_string_contains, method, path},
    Mock, MockServer,
};

#[tokio::test]
async fn test_detector_output_passed_through() {
    let (status, body) = send(full_router("http://127.0.0.1:9"), png_upload("/nodes")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{"label": "router", "conf": 0.5, "bbox": {"x1": 1, "y1": 2, "x2": 30, "y2": 40}}])
    );
}

#[tokio::test]
async fn test_missing_detector_is_server_error() {
    let (status, body) = send(ocr_only_router(), png_upload("/nodes")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Node detection model not loaded");
}

#[tokio::test]
async fn test_llm_nodes_renumbered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("json_object"))
        .respond_with(completion(
            r#"{"nodes":[{"id":9,"label":"BB6648"},{"id":4,"label":"R6630"}]}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let request = json_request("/analyze/nodes", json!({"image_url": "https://x.test/d.png"}));
    let (status, body) = send(full_router(&server.uri()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{"id": 1, "label": "BB6648"}, {"id": 2, "label": "R6630"}])
    );
}

#[tokio::test]
async fn test_llm_nodes_without_key() {
    let request = json_request("/analyze/nodes", json!({"image_url": "https://x.test/d.png"}));
    let (status, body) = send(ocr_only_router(), request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "OpenAI API key not configured.");
}
