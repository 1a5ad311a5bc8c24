// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::errors::ApiError;
use super::extract::ImageSource;
use super::http_server::AppState;
use crate::analysis::{AnalysisOutcome, Strategy};

/// Which backends were wired up at startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendStatus {
    pub ocr: bool,
    pub detection: bool,
    pub llm: bool,
    pub storage: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub backends: BackendStatus,
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        backends: state.backends,
    })
}

/// Hand one extracted request to the dispatcher
pub(crate) async fn run_analysis(
    state: &AppState,
    strategy: Strategy,
    source: ImageSource,
) -> Result<Json<AnalysisOutcome>, ApiError> {
    debug!("{:?} request from {}", strategy, source.payload.describe());
    let outcome = state
        .dispatcher
        .dispatch(strategy, source.into_request())
        .await?;
    Ok(Json(outcome))
}
