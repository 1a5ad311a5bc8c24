// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analysis::{AnalysisError, AnalysisErrorKind};
use crate::storage::StorageError;
use crate::vision::IngestError;

/// JSON error body: `{"error": ..., "raw_response"?: ...}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    /// A failed dispatch, carrying its own status
    Analysis(AnalysisError),
    InvalidRequest(String),
    /// Body over the configured upload limit
    PayloadTooLarge(String),
    NotConfigured(String),
    InternalError(String),
}

impl ApiError {
    pub fn to_response(&self) -> ErrorResponse {
        match self {
            ApiError::Analysis(e) => ErrorResponse {
                error: e.message.clone(),
                raw_response: e.raw_response.clone(),
            },
            ApiError::InvalidRequest(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::NotConfigured(msg)
            | ApiError::InternalError(msg) => ErrorResponse {
                error: msg.clone(),
                raw_response: None,
            },
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Analysis(e) => e.status_code(),
            ApiError::InvalidRequest(_) => 400,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::NotConfigured(_) | ApiError::InternalError(_) => 500,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Analysis(e) => write!(f, "{}", e),
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            ApiError::NotConfigured(msg) => write!(f, "Not configured: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AnalysisError> for ApiError {
    fn from(e: AnalysisError) -> Self {
        ApiError::Analysis(e)
    }
}

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        ApiError::Analysis(e.into())
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        let analysis: AnalysisError = e.into();
        match analysis.kind {
            AnalysisErrorKind::Configuration => ApiError::NotConfigured(analysis.message),
            _ => ApiError::Analysis(analysis),
        }
    }
}

impl ApiError {
    /// Map an extractor rejection, keeping 413 for bodies over the limit
    pub fn from_rejection(status: StatusCode, body_text: String) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(body_text)
        } else {
            ApiError::InvalidRequest(body_text)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_response())).into_response()
    }
}
