// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node extraction handlers

use axum::{extract::State, Json};

use crate::analysis::{AnalysisOutcome, Strategy};
use crate::api::errors::ApiError;
use crate::api::extract::ImageSource;
use crate::api::handlers::run_analysis;
use crate::api::http_server::AppState;

/// POST /nodes - Run the ONNX detector
///
/// Returns `[{label, conf, bbox: {x1, y1, x2, y2}}]` in detector order.
/// A missing model answers 500.
pub async fn detect_nodes_handler(
    State(state): State<AppState>,
    source: ImageSource,
) -> Result<Json<AnalysisOutcome>, ApiError> {
    run_analysis(&state, Strategy::Detection, source).await
}

/// POST /analyze/nodes - Ask the vision model for labelled nodes
///
/// Returns `[{id, label}]` with ids renumbered from 1. Unparseable model
/// output answers 500 with the raw text in `raw_response`.
pub async fn llm_nodes_handler(
    State(state): State<AppState>,
    source: ImageSource,
) -> Result<Json<AnalysisOutcome>, ApiError> {
    run_analysis(&state, Strategy::LlmNodes, source).await
}
