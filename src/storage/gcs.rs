// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Google Cloud Storage V4 signed URLs using an HMAC key

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

use super::{SignedUpload, StorageError, UploadUrlSigner};
use crate::config::StorageConfig;

type HmacSha256 = Hmac<Sha256>;

const GCS_HOST: &str = "storage.googleapis.com";
const ALGORITHM: &str = "GOOG4-HMAC-SHA256";
const SIGNED_HEADERS: &str = "content-type;host";

/// Issues `PUT` upload URLs for one bucket
pub struct GcsHmacSigner {
    bucket: String,
    access_id: String,
    secret: String,
    expiry: Duration,
}

impl std::fmt::Debug for GcsHmacSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcsHmacSigner")
            .field("bucket", &self.bucket)
            .field("access_id", &self.access_id)
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}

impl GcsHmacSigner {
    pub fn new(
        bucket: impl Into<String>,
        access_id: impl Into<String>,
        secret: impl Into<String>,
        expiry: Duration,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            access_id: access_id.into(),
            secret: secret.into(),
            expiry,
        }
    }

    /// Build a signer when bucket and key are all configured
    pub fn from_config(config: &StorageConfig) -> Option<Self> {
        match (&config.bucket, &config.hmac_access_id, &config.hmac_secret) {
            (Some(bucket), Some(access_id), Some(secret)) => Some(Self::new(
                bucket.clone(),
                access_id.clone(),
                secret.clone(),
                config.url_expiry,
            )),
            _ => None,
        }
    }

    pub fn public_url(&self, object: &str) -> String {
        format!("https://{}/{}/{}", GCS_HOST, self.bucket, object)
    }

    /// Sign a `PUT` of `object` with `content_type`, valid from `now`
    pub fn sign_object(
        &self,
        object: &str,
        content_type: &str,
        now: DateTime<Utc>,
    ) -> Result<String, StorageError> {
        let datetime = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let scope = format!("{}/auto/storage/goog4_request", date);
        let credential = format!("{}/{}", self.access_id, scope);

        let mut params = [
            ("X-Goog-Algorithm", ALGORITHM.to_string()),
            ("X-Goog-Credential", credential),
            ("X-Goog-Date", datetime.clone()),
            ("X-Goog-Expires", self.expiry.as_secs().to_string()),
            ("X-Goog-SignedHeaders", SIGNED_HEADERS.to_string()),
        ];
        params.sort_by(|a, b| a.0.cmp(b.0));
        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let path = format!(
            "/{}/{}",
            self.bucket,
            object
                .split('/')
                .map(|segment| urlencoding::encode(segment).into_owned())
                .collect::<Vec<_>>()
                .join("/")
        );
        let canonical_headers = format!("content-type:{}\nhost:{}\n", content_type.trim(), GCS_HOST);
        let canonical_request = format!(
            "PUT\n{}\n{}\n{}\n{}\nUNSIGNED-PAYLOAD",
            path, query, canonical_headers, SIGNED_HEADERS
        );

        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            datetime,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let key = format!("GOOG4{}", self.secret);
        let mut signing_key = hmac_sha256(key.as_bytes(), date.as_bytes())?;
        for part in ["auto", "storage", "goog4_request"] {
            signing_key = hmac_sha256(&signing_key, part.as_bytes())?;
        }
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes())?);

        Ok(format!(
            "https://{}{}?{}&X-Goog-Signature={}",
            GCS_HOST, path, query, signature
        ))
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, StorageError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| StorageError::Signing(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// `<uuid-v4><original extension>`
pub fn object_name_for(filename: &str) -> String {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();
    format!("{}{}", Uuid::new_v4(), extension)
}

#[async_trait]
impl UploadUrlSigner for GcsHmacSigner {
    async fn signed_upload(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<SignedUpload, StorageError> {
        if content_type.contains(['\r', '\n']) {
            return Err(StorageError::InvalidRequest(
                "contentType must be a single line".to_string(),
            ));
        }

        let object = object_name_for(filename);
        let signed_url = self.sign_object(&object, content_type, Utc::now())?;
        debug!(
            "Signed upload URL for gs://{}/{} ({}, {}s)",
            self.bucket,
            object,
            content_type,
            self.expiry.as_secs()
        );

        Ok(SignedUpload {
            signed_url,
            public_url: self.public_url(&object),
        })
    }
}
