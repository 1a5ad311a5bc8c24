// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /analyze, /analyze/edges and /analyze/diagram against a mocked
//! chat completions API

use super::support::*;
use axum::http::StatusCode;
use diagram_analyzer::api::AppState;
use serde_json::json;
use std::{sync::Arc, time::Duration};
use wiremock::{
    matchers::{body_string_contains, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

const IMAGE_URL: &str = "https://storage.googleapis.com/diagram-uploads/site.png";

async fn model_replying(content: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(completion(content))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_describe_echoes_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_string_contains(IMAGE_URL))
        .respond_with(completion("A router connected to two switches."))
        .expect(1)
        .mount(&server)
        .await;

    let request = json_request("/analyze", json!({"image_url": IMAGE_URL}));
    let (status, body) = send(full_router(&server.uri()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"description": "A router connected to two switches.", "url": IMAGE_URL})
    );
}

#[tokio::test]
async fn test_describe_upload_sent_as_data_uri() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("data:image/png;base64,"))
        .respond_with(completion("A single red pixel."))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(full_router(&server.uri()), png_upload("/analyze")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "A single red pixel.");
    assert!(body["url"].is_null());
}

#[tokio::test]
async fn test_edges_ids_are_sequential() {
    let server = model_replying(
        r#"{"edges":[{"id":12,"source":"BB6648","target":"R6630"},{"id":3,"source":"R6630","target":"RU6694"},{"source":"RU6694","target":"Antenna"}]}"#,
    )
    .await;

    let request = json_request("/analyze/edges", json!({"image_url": IMAGE_URL}));
    let (status, body) = send(full_router(&server.uri()), request).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<u64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(body[0], json!({"id": 1, "source": "BB6648", "target": "R6630"}));
}

#[tokio::test]
async fn test_edges_not_json_returns_raw_text() {
    let server = model_replying("not json").await;

    let request = json_request("/analyze/edges", json!({"image_url": IMAGE_URL}));
    let (status, body) = send(full_router(&server.uri()), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid JSON from model"));
    assert_eq!(body["raw_response"], "not json");
}

#[tokio::test]
async fn test_edges_reference_context_reaches_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("REF-MARKER-6648"))
        .respond_with(completion(r#"{"edges":[]}"#))
        .expect(1)
        .mount(&server)
        .await;

    let request = json_request(
        "/analyze/edges",
        json!({"image_url": IMAGE_URL, "reference_context": "| REF-MARKER-6648 | R6630 |"}),
    );
    let (status, body) = send(full_router(&server.uri()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_edges_multipart_reference_context() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("REF-MARKER-MULTIPART"))
        .respond_with(completion(r#"{"edges":[{"source":"a","target":"b"}]}"#))
        .expect(1)
        .mount(&server)
        .await;

    let png = tiny_png();
    let request = multipart_request(
        "/analyze/edges",
        &[
            Part::File { name: "image", mime: "image/png", data: &png },
            Part::Text { name: "reference_context", value: "REF-MARKER-MULTIPART" },
        ],
    );
    let (status, body) = send(full_router(&server.uri()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], 1);
}

#[tokio::test]
async fn test_inaccessible_image_names_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "message": "Error while downloading the image.",
                "type": "invalid_request_error",
                "code": "invalid_image_url"
            }
        })))
        .mount(&server)
        .await;

    let request = json_request("/analyze/edges", json!({"image_url": IMAGE_URL}));
    let (status, body) = send(full_router(&server.uri()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains(IMAGE_URL));
    assert!(message.contains("publicly readable"));
}

#[tokio::test]
async fn test_other_model_rejection_reports_api_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "Unsupported parameter", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let request = json_request("/analyze", json!({"image_url": IMAGE_URL}));
    let (status, body) = send(full_router(&server.uri()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Could not analyze the image. The API reported an error: Unsupported parameter"
    );
}

#[tokio::test]
async fn test_model_outage_hides_details() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream secret detail"))
        .mount(&server)
        .await;

    let request = json_request("/analyze", json!({"image_url": IMAGE_URL}));
    let (status, body) = send(full_router(&server.uri()), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "An unexpected error occurred during analysis.");
}

#[tokio::test]
async fn test_slow_model_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(completion("late").set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let vlm = diagram_analyzer::vision::VlmClient::new(&llm_config(
        &server.uri(),
        Duration::from_millis(500),
    ))
    .unwrap();
    let state = AppState::new(
        dispatcher(Duration::from_secs(5)).with_vlm(Some(Arc::new(vlm))),
        None,
    );

    let request = json_request("/analyze", json!({"image_url": IMAGE_URL}));
    let (status, _) = send(router(state), request).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_diagram_returns_nodes_and_edges() {
    let server = model_replying(
        r#"{"nodes":[{"id":"n1","label":"Router"},{"id":"n2","label":"Switch"}],"edges":[{"id":"e9","source":"Router","target":"Switch"}]}"#,
    )
    .await;

    let request = json_request("/analyze/diagram", json!({"image_url": IMAGE_URL}));
    let (status, body) = send(full_router(&server.uri()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "nodes": [{"id": 1, "label": "Router"}, {"id": 2, "label": "Switch"}],
            "edges": [{"id": 1, "source": "Router", "target": "Switch"}]
        })
    );
}

#[tokio::test]
async fn test_diagram_missing_edges_is_malformed() {
    let server = model_replying(r#"{"nodes":[]}"#).await;

    let request = json_request("/analyze/diagram", json!({"image_url": IMAGE_URL}));
    let (status, body) = send(full_router(&server.uri()), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["raw_response"], r#"{"nodes":[]}"#);
}
