// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Free-form diagram description handler

use axum::{extract::State, Json};

use crate::analysis::{AnalysisOutcome, Strategy};
use crate::api::errors::ApiError;
use crate::api::extract::ImageSource;
use crate::api::handlers::run_analysis;
use crate::api::http_server::AppState;

/// POST /analyze - Describe a diagram in prose
///
/// Returns `{description, url}`; `url` echoes the submitted `image_url` and
/// is `null` for uploads.
pub async fn describe_handler(
    State(state): State<AppState>,
    source: ImageSource,
) -> Result<Json<AnalysisOutcome>, ApiError> {
    run_analysis(&state, Strategy::Describe, source).await
}
