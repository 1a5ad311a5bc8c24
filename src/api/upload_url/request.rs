// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload URL request types and validation

use serde::{Deserialize, Serialize};

pub const MISSING_FIELDS: &str = "Missing 'filename' or 'contentType' in request";

/// Request for POST /generate-upload-url
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlRequest {
    /// Client-side file name; only its extension is kept
    #[serde(default)]
    pub filename: Option<String>,

    /// MIME type the client will `PUT` with
    #[serde(default)]
    pub content_type: Option<String>,
}

impl UploadUrlRequest {
    /// Parse a raw body; anything unusable is treated as missing fields
    pub fn from_body(body: &[u8]) -> Result<Self, String> {
        serde_json::from_slice::<Self>(body).map_err(|_| MISSING_FIELDS.to_string())
    }

    /// Both fields, trimmed and non-empty
    pub fn validate(&self) -> Result<(&str, &str), String> {
        let filename = self.filename.as_deref().map(str::trim).unwrap_or("");
        let content_type = self.content_type.as_deref().map(str::trim).unwrap_or("");
        if filename.is_empty() || content_type.is_empty() {
            return Err(MISSING_FIELDS.to_string());
        }
        Ok((filename, content_type))
    }
}
