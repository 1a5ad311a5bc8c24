// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR endpoint handler

use axum::{extract::State, Json};

use crate::analysis::{AnalysisOutcome, Strategy};
use crate::api::errors::ApiError;
use crate::api::extract::ImageSource;
use crate::api::handlers::run_analysis;
use crate::api::http_server::AppState;

/// POST /ocr, POST /analyze/ocr - Extract text blocks from a diagram
///
/// # Request
/// - multipart `image` part, or JSON `{"image_url": ...}`
///
/// # Response
/// Array of `{block_num, text, words}`; words below the confidence
/// threshold are dropped and the rest are in reading order.
///
/// # Errors
/// - 400: no image, both inputs, bad URL, undecodable image
/// - 502 / 504: the image URL could not be fetched / timed out
/// - 500: Tesseract unavailable or failed
pub async fn ocr_handler(
    State(state): State<AppState>,
    source: ImageSource,
) -> Result<Json<AnalysisOutcome>, ApiError> {
    run_analysis(&state, Strategy::Ocr, source).await
}
