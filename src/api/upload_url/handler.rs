// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Signed upload URL handler

use axum::{body::Bytes, extract::State, Json};
use tracing::{info, warn};

use super::request::UploadUrlRequest;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::storage::{SignedUpload, StorageError};

/// POST /generate-upload-url - Issue a signed `PUT` URL for a new object
///
/// # Request
/// - `filename`: original file name (extension is kept)
/// - `contentType`: MIME type the upload must use
///
/// # Response
/// `{signedUrl, publicUrl}`; the signed URL expires after the configured
/// lifetime.
///
/// # Errors
/// - 500: storage not configured, or signing failed
/// - 400: missing body or fields
pub async fn generate_upload_url_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SignedUpload>, ApiError> {
    let signer = state.upload_signer.as_ref().ok_or_else(|| {
        warn!("Upload URL requested but storage is not configured");
        ApiError::from(StorageError::NotConfigured)
    })?;

    let request = UploadUrlRequest::from_body(&body).map_err(ApiError::InvalidRequest)?;
    let (filename, content_type) = request.validate().map_err(ApiError::InvalidRequest)?;

    let upload = signer.signed_upload(filename, content_type).await?;
    info!("Issued upload URL for {} -> {}", filename, upload.public_url);
    Ok(Json(upload))
}
