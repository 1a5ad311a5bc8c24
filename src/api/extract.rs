// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request extractor shared by the analysis endpoints
//!
//! Accepts either `multipart/form-data` (file part `image`, optional text
//! parts `image_url` and `reference_context`) or a JSON body
//! `{"image_url": ..., "reference_context"?: ...}`.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};
use axum_extra::extract::Multipart;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::errors::ApiError;
use crate::analysis::AnalysisRequest;
use crate::vision::{ImagePayload, IngestError};

/// JSON form of an analysis request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageRequest {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub reference_context: Option<String>,
}

/// A validated image payload plus optional reference text
#[derive(Debug, Clone)]
pub struct ImageSource {
    pub payload: ImagePayload,
    pub reference_context: Option<String>,
}

impl ImageSource {
    pub fn into_request(self) -> AnalysisRequest {
        AnalysisRequest::new(self.payload).with_reference_context(self.reference_context)
    }
}

#[async_trait]
impl<S> FromRequest<S> for ImageSource
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?;
            from_multipart(multipart).await
        } else if content_type.starts_with("application/json") {
            let body = Bytes::from_request(req, state)
                .await
                .map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?;
            from_json(&body)
        } else {
            debug!("Rejecting request with content type '{}'", content_type);
            Err(IngestError::NoImage.into())
        }
    }
}

async fn from_multipart(mut multipart: Multipart) -> Result<ImageSource, ApiError> {
    let mut upload = None;
    let mut image_url = None;
    let mut reference_context = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "image" => {
                let mime = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?;
                // Browsers send an empty part when no file was chosen
                if !data.is_empty() {
                    debug!("Multipart image part: {} bytes ({:?})", data.len(), mime);
                    upload = Some((data, mime));
                }
            }
            "image_url" => {
                image_url = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?,
                );
            }
            "reference_context" => {
                reference_context = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?,
                );
            }
            other => debug!("Ignoring multipart field '{}'", other),
        }
    }

    Ok(ImageSource {
        payload: ImagePayload::from_parts(upload, image_url)?,
        reference_context,
    })
}

fn from_json(body: &[u8]) -> Result<ImageSource, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(IngestError::NoImage.into());
    }
    let request: ImageRequest = serde_json::from_slice(body)
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid JSON body: {}", e)))?;

    Ok(ImageSource {
        payload: ImagePayload::from_parts(None, request.image_url)?,
        reference_context: request.reference_context,
    })
}
