// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Edge and whole-diagram extraction handlers

use axum::{extract::State, Json};

use crate::analysis::{AnalysisOutcome, Strategy};
use crate::api::errors::ApiError;
use crate::api::extract::ImageSource;
use crate::api::handlers::run_analysis;
use crate::api::http_server::AppState;

/// POST /analyze/edges - Few-shot edge extraction
///
/// # Request
/// - `image_url` or multipart `image`
/// - `reference_context` (optional): markdown examples; falls back to the
///   reference file loaded at startup
///
/// # Response
/// `[{id, source, target}]`, ids sequential from 1.
///
/// # Errors
/// - 400: input problems, or the model could not read the image
/// - 500: model output was not the expected JSON (`raw_response` attached)
pub async fn edges_handler(
    State(state): State<AppState>,
    source: ImageSource,
) -> Result<Json<AnalysisOutcome>, ApiError> {
    run_analysis(&state, Strategy::LlmEdges, source).await
}

/// POST /analyze/diagram - Nodes and edges from a single model call
pub async fn diagram_handler(
    State(state): State<AppState>,
    source: ImageSource,
) -> Result<Json<AnalysisOutcome>, ApiError> {
    run_analysis(&state, Strategy::LlmGraph, source).await
}
