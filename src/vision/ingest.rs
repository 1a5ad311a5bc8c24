// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image ingestion: uploaded bytes or a remotely fetchable URL
//!
//! A request carries exactly one image form. Remote fetches are bounded
//! by a timeout, and timeouts are reported separately from other network
//! failures so callers can tell "try again" apart from "bad input".

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use image::ImageFormat;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::image_utils::{mime_for_format, ImageError};

/// Errors raised while turning a request into image bytes
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("No image provided")]
    NoImage,

    #[error("Provide either an image upload or image_url, not both")]
    Ambiguous,

    #[error("Invalid image_url: {0}")]
    InvalidUrl(String),

    #[error("Timed out fetching image from {url}")]
    Timeout { url: String },

    #[error("Failed to fetch image from {url}: {message}")]
    Unreachable { url: String, message: String },

    #[error("Image URL {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error(transparent)]
    Image(#[from] ImageError),
}

/// An image as received: uploaded bytes or a URL to dereference
#[derive(Debug, Clone)]
pub enum ImagePayload {
    Upload {
        data: Bytes,
        /// Content type declared by the client; format sniffing is authoritative
        declared_mime: Option<String>,
    },
    Url(Url),
}

impl ImagePayload {
    /// Build a payload from the optional request parts, enforcing exactly one form
    pub fn from_parts(
        upload: Option<(Bytes, Option<String>)>,
        image_url: Option<String>,
    ) -> Result<Self, IngestError> {
        let image_url = image_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        match (upload, image_url) {
            (Some(_), Some(_)) => Err(IngestError::Ambiguous),
            (None, None) => Err(IngestError::NoImage),
            (Some((data, declared_mime)), None) => {
                if data.is_empty() {
                    return Err(IngestError::NoImage);
                }
                Ok(Self::Upload {
                    data,
                    declared_mime,
                })
            }
            (None, Some(raw)) => Ok(Self::Url(parse_image_url(&raw)?)),
        }
    }

    /// URL form, if any
    pub fn url(&self) -> Option<&Url> {
        match self {
            Self::Url(url) => Some(url),
            Self::Upload { .. } => None,
        }
    }

    /// Declared upload content type, when it disagrees with the sniffed format
    pub fn mime_mismatch(&self, sniffed: ImageFormat) -> Option<&str> {
        match self {
            Self::Upload {
                declared_mime: Some(declared),
                ..
            } => {
                let essence = declared.split(';').next().unwrap_or("").trim();
                (!essence.eq_ignore_ascii_case(mime_for_format(sniffed))).then_some(declared.as_str())
            }
            _ => None,
        }
    }

    /// Short description for logs (never the image bytes)
    pub fn describe(&self) -> String {
        match self {
            Self::Url(url) => url.to_string(),
            Self::Upload { data, .. } => format!("upload ({} bytes)", data.len()),
        }
    }
}

/// Accept only absolute http(s) URLs
pub fn parse_image_url(raw: &str) -> Result<Url, IngestError> {
    let url = Url::parse(raw).map_err(|e| IngestError::InvalidUrl(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(IngestError::InvalidUrl(format!(
            "{}: only absolute http(s) URLs are supported",
            raw
        ))),
    }
}

/// Downloads remote images with a bounded timeout and size limit
#[derive(Clone)]
pub struct ImageFetcher {
    client: Client,
    timeout: Duration,
    max_bytes: usize,
}

impl ImageFetcher {
    pub fn new(timeout: Duration, max_bytes: usize) -> Result<Self, IngestError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IngestError::Unreachable {
                url: String::new(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            timeout,
            max_bytes,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch the bytes behind `url`
    pub async fn fetch(&self, url: &Url) -> Result<Bytes, IngestError> {
        debug!("Fetching image from {}", url);

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_reqwest_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(len) = response.content_length() {
            if len as usize > self.max_bytes {
                return Err(ImageError::TooLarge(len as usize, self.max_bytes).into());
            }
        }

        // Chunked responses carry no length; stop as soon as the limit is passed
        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| classify_reqwest_error(url, e))?
        {
            let received = body.len() + chunk.len();
            if received > self.max_bytes {
                return Err(ImageError::TooLarge(received, self.max_bytes).into());
            }
            body.extend_from_slice(&chunk);
        }

        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body.freeze())
    }
}

fn classify_reqwest_error(url: &Url, e: reqwest::Error) -> IngestError {
    if e.is_timeout() {
        IngestError::Timeout {
            url: url.to_string(),
        }
    } else {
        IngestError::Unreachable {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}
