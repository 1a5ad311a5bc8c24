// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! GET /health and the CORS policy

use super::support::*;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

fn get(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

fn preflight(origin: &str) -> Request<Body> {
    Request::builder()
        .method("OPTIONS")
        .uri("/analyze/edges")
        .header(header::ORIGIN, origin)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_health_reports_backends() {
    let (status, body) = send(ocr_only_router(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": "ok",
            "backends": {"ocr": true, "detection": false, "llm": false, "storage": false}
        })
    );

    let (_, body) = send(full_router("http://127.0.0.1:9"), get("/health")).await;
    assert_eq!(
        body["backends"],
        json!({"ocr": true, "detection": true, "llm": true, "storage": true})
    );
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let response = ocr_only_router()
        .oneshot(preflight("http://localhost:3000"))
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
}

#[tokio::test]
async fn test_cors_ignores_other_origins() {
    let response = ocr_only_router()
        .oneshot(preflight("https://evil.example"))
        .await
        .unwrap();

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_unknown_route() {
    let response = ocr_only_router().oneshot(get("/v1/models")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
