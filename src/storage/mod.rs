// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Direct-to-bucket upload URLs
//!
//! Clients upload diagrams straight to object storage with a short-lived
//! signed URL, then pass the public URL to the analysis endpoints.

pub mod gcs;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use gcs::GcsHmacSigner;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage backend not configured")]
    NotConfigured,

    #[error("Invalid upload request: {0}")]
    InvalidRequest(String),

    #[error("Failed to sign upload URL: {0}")]
    Signing(String),
}

/// A signed upload target and the URL the object will be readable at
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUpload {
    pub signed_url: String,
    pub public_url: String,
}

/// Issues signed `PUT` URLs for new objects
#[async_trait]
pub trait UploadUrlSigner: Send + Sync {
    async fn signed_upload(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<SignedUpload, StorageError>;
}
