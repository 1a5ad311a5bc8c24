// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /ocr and POST /analyze/ocr

use super::support::*;
use axum::{body::Body, http::{header, Request, StatusCode}};
use diagram_analyzer::{
    analysis::Dispatcher,
    api::{create_router, AppState},
    config::ServiceConfig,
};
use serde_json::json;
use std::time::Duration;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

#[tokio::test]
async fn test_upload_returns_text_blocks() {
    let (status, body) = send(ocr_only_router(), png_upload("/ocr")).await;

    assert_eq!(status, StatusCode::OK);
    let blocks = body.as_array().unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0]["block_num"], 1);
    assert_eq!(blocks[0]["text"], "Router");
    // The 12% "~" token is below the threshold
    assert_eq!(blocks[0]["words"].as_array().unwrap().len(), 1);
    assert_eq!(blocks[0]["words"][0]["left"], 10);
}

#[tokio::test]
async fn test_words_are_joined_in_reading_order() {
    let (_, body) = send(ocr_only_router(), png_upload("/analyze/ocr")).await;
    assert_eq!(body[1]["text"], "Switch 2");
    assert_eq!(body[1]["words"][0]["text"], "Switch");
}

#[tokio::test]
async fn test_image_url_is_fetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/diagram.png"))
        .respond_with(png_response())
        .expect(1)
        .mount(&server)
        .await;

    let request = json_request(
        "/ocr",
        json!({"image_url": format!("{}/diagram.png", server.uri())}),
    );
    let (status, body) = send(ocr_only_router(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["text"], "Router");
}

#[tokio::test]
async fn test_no_image_provided() {
    let (status, body) = send(ocr_only_router(), json_request("/ocr", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "No image provided"}));
}

#[tokio::test]
async fn test_unsupported_content_type_is_no_image() {
    let request = Request::builder()
        .method("POST")
        .uri("/ocr")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("diagram"))
        .unwrap();
    let (status, body) = send(ocr_only_router(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No image provided");
}

#[tokio::test]
async fn test_upload_and_url_together_rejected() {
    let png = tiny_png();
    let request = multipart_request(
        "/ocr",
        &[
            Part::File { name: "image", mime: "image/png", data: &png },
            Part::Text { name: "image_url", value: "https://x.test/a.png" },
        ],
    );
    let (status, body) = send(ocr_only_router(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Provide either an image upload or image_url, not both"
    );
}

#[tokio::test]
async fn test_undecodable_upload_is_bad_request() {
    let request = multipart_request(
        "/ocr",
        &[Part::File { name: "image", mime: "image/png", data: b"definitely not a png" }],
    );
    let (status, body) = send(ocr_only_router(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid image"));
}

#[tokio::test]
async fn test_relative_image_url_is_bad_request() {
    let request = json_request("/ocr", json!({"image_url": "/static/diagram.png"}));
    let (status, _) = send(ocr_only_router(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_remote_image_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/missing.png", server.uri());
    let (status, body) = send(ocr_only_router(), json_request("/ocr", json!({"image_url": url}))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("404"));
}

#[tokio::test]
async fn test_slow_remote_image_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(png_response().set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let state = AppState::new(dispatcher(Duration::from_millis(500)), None);
    let url = format!("{}/slow.png", server.uri());
    let (status, _) = send(router(state), json_request("/ocr", json!({"image_url": url}))).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_unavailable_engine_is_server_error() {
    use diagram_analyzer::{config::ServiceConfig, vision::{ImageFetcher, TesseractEngine}};
    use std::sync::Arc;

    let mut config = ServiceConfig::default();
    config.ocr.binary = "/nonexistent/tesseract".to_string();
    let dispatcher = Dispatcher::new(
        ImageFetcher::new(Duration::from_secs(5), config.server.max_upload_bytes).unwrap(),
        config.server.max_upload_bytes,
        Arc::new(TesseractEngine::new(&config.ocr)),
        config.ocr.confidence_threshold,
    );

    let (status, body) = send(router(AppState::new(dispatcher, None)), png_upload("/ocr")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().is_some());
}

fn small_limit_router() -> axum::Router {
    let mut server = ServiceConfig::default().server;
    server.max_upload_bytes = 1024;
    create_router(AppState::new(dispatcher(Duration::from_secs(5)), None), &server)
}

#[tokio::test]
async fn test_oversized_json_body_is_payload_too_large() {
    let request = json_request(
        "/ocr",
        json!({
            "image_url": "https://x.test/a.png",
            "reference_context": "x".repeat(200 * 1024)
        }),
    );
    let (status, body) = send(small_limit_router(), request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_oversized_upload_is_payload_too_large() {
    let big = vec![0u8; 200 * 1024];
    let request = multipart_request(
        "/ocr",
        &[Part::File { name: "image", mime: "image/png", data: &big }],
    );
    let (status, _) = send(small_limit_router(), request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
