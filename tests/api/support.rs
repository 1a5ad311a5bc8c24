// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Shared fixtures for the endpoint tests: fake backends, request builders,
//! and a router wired the way the server wires it.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use diagram_analyzer::{
    analysis::Dispatcher,
    api::{create_router, AppState},
    config::{LlmConfig, ServiceConfig},
    storage::{SignedUpload, StorageError, UploadUrlSigner},
    vision::{
        ocr::{OcrToken, OcrWord},
        BoundingBox, DetectionError, ImageFetcher, NodeDetection, ObjectDetector, OcrEngine,
        OcrError, VlmClient,
    },
};
use image::DynamicImage;
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};
use tower::ServiceExt;
use wiremock::ResponseTemplate;

// 1x1 red PNG
pub const TINY_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

pub const BOUNDARY: &str = "diagram-analyzer-test-boundary";

pub fn tiny_png() -> Vec<u8> {
    STANDARD.decode(TINY_PNG_BASE64).unwrap()
}

fn word(text: &str, left: i32, top: i32, conf: f32) -> OcrWord {
    OcrWord {
        text: text.to_string(),
        left,
        top,
        width: 40,
        height: 12,
        conf,
    }
}

/// Reads "Router" in block 1 and "Switch 2" in block 2, plus noise
pub struct RouterOcr;

#[async_trait]
impl OcrEngine for RouterOcr {
    fn name(&self) -> &str {
        "router-ocr"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn recognize(&self, _image: &DynamicImage) -> Result<Vec<OcrToken>, OcrError> {
        Ok(vec![
            OcrToken { block_num: 1, word: word("Router", 10, 10, 96.0) },
            OcrToken { block_num: 1, word: word("~", 60, 10, 12.0) },
            OcrToken { block_num: 2, word: word("2", 90, 50, 88.0) },
            OcrToken { block_num: 2, word: word("Switch", 40, 50, 91.0) },
        ])
    }
}

/// Always reports one router at a fixed box
pub struct OneRouterDetector;

impl ObjectDetector for OneRouterDetector {
    fn name(&self) -> &str {
        "one-router"
    }

    fn detect(&self, _image: &DynamicImage) -> Result<Vec<NodeDetection>, DetectionError> {
        Ok(vec![NodeDetection {
            label: "router".to_string(),
            conf: 0.5,
            bbox: BoundingBox { x1: 1, y1: 2, x2: 30, y2: 40 },
        }])
    }
}

/// Deterministic signer for handler tests
pub struct FakeSigner;

#[async_trait]
impl UploadUrlSigner for FakeSigner {
    async fn signed_upload(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<SignedUpload, StorageError> {
        Ok(SignedUpload {
            signed_url: format!("https://signed.test/{}?type={}", filename, content_type),
            public_url: format!("https://public.test/{}", filename),
        })
    }
}

pub fn llm_config(api_base: &str, timeout: Duration) -> LlmConfig {
    LlmConfig {
        api_key: Some("sk-test".to_string()),
        api_base: api_base.to_string(),
        model: "gpt-4o-mini".to_string(),
        timeout,
        reference_context_path: None,
        reference_context_max_chars: 20_000,
    }
}

pub fn vlm_client(api_base: &str) -> Arc<VlmClient> {
    Arc::new(VlmClient::new(&llm_config(api_base, Duration::from_secs(5))).unwrap())
}

pub fn dispatcher(fetch_timeout: Duration) -> Dispatcher {
    let max_bytes = ServiceConfig::default().server.max_upload_bytes;
    Dispatcher::new(
        ImageFetcher::new(fetch_timeout, max_bytes).unwrap(),
        max_bytes,
        Arc::new(RouterOcr),
        50.0,
    )
}

pub fn router(state: AppState) -> Router {
    create_router(state, &ServiceConfig::default().server)
}

/// Router with OCR only: no detector, no model, no storage
pub fn ocr_only_router() -> Router {
    router(AppState::new(dispatcher(Duration::from_secs(5)), None))
}

/// Router with OCR, detector and a model client pointed at `api_base`
pub fn full_router(api_base: &str) -> Router {
    let dispatcher = dispatcher(Duration::from_secs(5))
        .with_detector(Some(Arc::new(OneRouterDetector)))
        .with_vlm(Some(vlm_client(api_base)));
    router(AppState::new(dispatcher, Some(Arc::new(FakeSigner))))
}

pub fn json_request(path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub enum Part<'a> {
    File { name: &'a str, mime: &'a str, data: &'a [u8] },
    Text { name: &'a str, value: &'a str },
}

pub fn multipart_request(path: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File { name, mime, data } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"diagram.png\"\r\nContent-Type: {}\r\n\r\n",
                        name, mime
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(path)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn png_upload(path: &str) -> Request<Body> {
    let png = tiny_png();
    multipart_request(path, &[Part::File { name: "image", mime: "image/png", data: &png }])
}

/// Send one request and decode the JSON body (Null when empty)
pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// A chat completion whose message content is `content`
pub fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": content}}],
        "usage": {"total_tokens": 42}
    }))
}

pub fn png_response() -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "image/png")
        .set_body_bytes(tiny_png())
}
