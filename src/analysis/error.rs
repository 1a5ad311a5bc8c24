// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! The single error type returned by the analysis dispatcher

use std::fmt;

use serde::Serialize;
use tracing::error;

use crate::storage::StorageError;
use crate::vision::{DetectionError, ImageError, IngestError, OcrError, VlmError};

/// Message returned for any fault the caller cannot act on
pub const UNEXPECTED_FAILURE: &str = "An unexpected error occurred during analysis.";

/// Discriminates what went wrong, and therefore the HTTP status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisErrorKind {
    /// Missing or malformed request fields
    Input,
    /// Image URL unreachable
    Fetch,
    /// Image URL did not answer in time
    FetchTimeout,
    /// The model backend rejected the request
    Upstream,
    /// The model returned non-JSON where JSON was required
    MalformedUpstreamResponse,
    /// A required credential or backend is not configured
    Configuration,
    /// Any other server-side fault
    Processing,
}

impl AnalysisErrorKind {
    pub fn status_code(self) -> u16 {
        match self {
            Self::Input | Self::Upstream => 400,
            Self::Fetch => 502,
            Self::FetchTimeout => 504,
            Self::MalformedUpstreamResponse | Self::Configuration | Self::Processing => 500,
        }
    }
}

/// A failed analysis: kind, caller-facing message and optional raw upstream text
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisError {
    pub kind: AnalysisErrorKind,
    pub message: String,
    pub raw_response: Option<String>,
}

impl AnalysisError {
    pub fn new(kind: AnalysisErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            raw_response: None,
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(AnalysisErrorKind::Input, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(AnalysisErrorKind::Configuration, message)
    }

    /// Log the detail server-side and return the generic message
    pub fn processing(detail: impl fmt::Display) -> Self {
        error!("Analysis processing failure: {}", detail);
        Self::new(AnalysisErrorKind::Processing, UNEXPECTED_FAILURE)
    }

    /// Model output that failed to parse, with the raw text attached
    pub fn malformed(reason: impl fmt::Display, raw: impl Into<String>) -> Self {
        Self {
            kind: AnalysisErrorKind::MalformedUpstreamResponse,
            message: format!("Invalid JSON from model: {}", reason),
            raw_response: Some(raw.into()),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for AnalysisError {}

impl From<ImageError> for AnalysisError {
    fn from(e: ImageError) -> Self {
        match e {
            ImageError::EncodeFailed(_) => Self::processing(e),
            _ => Self::input(format!("Invalid image: {}", e)),
        }
    }
}

impl From<IngestError> for AnalysisError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::NoImage | IngestError::Ambiguous | IngestError::InvalidUrl(_) => {
                Self::input(e.to_string())
            }
            IngestError::Timeout { .. } => Self::new(AnalysisErrorKind::FetchTimeout, e.to_string()),
            IngestError::Unreachable { .. } | IngestError::Status { .. } => {
                Self::new(AnalysisErrorKind::Fetch, e.to_string())
            }
            IngestError::Image(inner) => inner.into(),
        }
    }
}

impl From<OcrError> for AnalysisError {
    fn from(e: OcrError) -> Self {
        match e {
            OcrError::EngineUnavailable(_) => Self::configuration(e.to_string()),
            OcrError::Image(inner) => inner.into(),
            _ => Self::processing(e),
        }
    }
}

impl From<DetectionError> for AnalysisError {
    fn from(e: DetectionError) -> Self {
        match e {
            DetectionError::ModelNotLoaded(_) => Self::configuration(e.to_string()),
            _ => Self::processing(e),
        }
    }
}

impl From<VlmError> for AnalysisError {
    fn from(e: VlmError) -> Self {
        match e {
            VlmError::NotConfigured => Self::configuration(e.to_string()),
            VlmError::ImageInaccessible { image } => Self::new(
                AnalysisErrorKind::Upstream,
                format!(
                    "Could not analyze the image. The model failed to access the image at the provided URL: {}. Ensure the object exists and is publicly readable.",
                    image
                ),
            ),
            VlmError::BadRequest(detail) => Self::new(
                AnalysisErrorKind::Upstream,
                format!("Could not analyze the image. The API reported an error: {}", detail),
            ),
            VlmError::Timeout(_) => Self::new(AnalysisErrorKind::FetchTimeout, e.to_string()),
            _ => Self::processing(e),
        }
    }
}

impl From<StorageError> for AnalysisError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotConfigured => Self::configuration(e.to_string()),
            StorageError::InvalidRequest(_) => Self::input(e.to_string()),
            StorageError::Signing(_) => Self::processing(e),
        }
    }
}
