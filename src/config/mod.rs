// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration loaded from environment variables
//!
//! Every setting has a default so the service starts with an empty
//! environment; backends whose credentials are absent are reported as
//! missing and answer with a configuration error on first use.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Default OCR word confidence cut-off (Tesseract scale, 0-100)
pub const DEFAULT_OCR_CONFIDENCE_THRESHOLD: f32 = 50.0;

/// Default bound on outbound calls: image fetches and model requests
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Default upload limit (10MB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
}

/// HTTP listener and request-surface settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; a single "*" allows any origin
    pub cors_allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

/// Remote image fetch settings
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
}

/// Tesseract settings
#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub binary: String,
    pub language: String,
    pub confidence_threshold: f32,
}

/// ONNX node detector settings
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub model_path: PathBuf,
    pub labels_path: Option<PathBuf>,
    pub score_threshold: f32,
    pub iou_threshold: f32,
}

/// Hosted multimodal model settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub timeout: Duration,
    pub reference_context_path: Option<PathBuf>,
    pub reference_context_max_chars: usize,
}

/// Cloud storage settings for signed upload URLs
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: Option<String>,
    pub hmac_access_id: Option<String>,
    pub hmac_secret: Option<String>,
    pub url_expiry: Duration,
}

impl StorageConfig {
    /// True when bucket and HMAC credentials are all present
    pub fn is_configured(&self) -> bool {
        self.bucket.is_some() && self.hmac_access_id.is_some() && self.hmac_secret.is_some()
    }
}

/// Complete service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub fetch: FetchConfig,
    pub ocr: OcrConfig,
    pub detector: DetectorConfig,
    pub llm: LlmConfig,
    pub storage: StorageConfig,
}

impl ServiceConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("PORT", 5000)?,
                cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                    .map(|v| split_list(&v))
                    .unwrap_or_else(|_| vec!["http://localhost:3000".to_string()]),
                max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            },
            fetch: FetchConfig {
                timeout: Duration::from_secs(parse_var(
                    "FETCH_TIMEOUT_SECS",
                    DEFAULT_FETCH_TIMEOUT_SECS,
                )?),
            },
            ocr: OcrConfig {
                binary: env::var("TESSERACT_BINARY").unwrap_or_else(|_| "tesseract".to_string()),
                language: env::var("TESSERACT_LANG").unwrap_or_else(|_| "eng".to_string()),
                confidence_threshold: parse_var(
                    "OCR_CONFIDENCE_THRESHOLD",
                    DEFAULT_OCR_CONFIDENCE_THRESHOLD,
                )?,
            },
            detector: DetectorConfig {
                model_path: env::var("DETECTOR_MODEL_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("./models/yolov8n.onnx")),
                labels_path: non_empty_var("DETECTOR_LABELS_PATH").map(PathBuf::from),
                score_threshold: parse_var("DETECTOR_SCORE_THRESHOLD", 0.25)?,
                iou_threshold: parse_var("DETECTOR_IOU_THRESHOLD", 0.7)?,
            },
            llm: LlmConfig {
                api_key: non_empty_var("OPENAI_API_KEY"),
                api_base: env::var("OPENAI_API_BASE")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                model: env::var("VISION_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                timeout: Duration::from_secs(parse_var(
                    "LLM_TIMEOUT_SECS",
                    DEFAULT_FETCH_TIMEOUT_SECS,
                )?),
                reference_context_path: non_empty_var("REFERENCE_CONTEXT_PATH").map(PathBuf::from),
                reference_context_max_chars: parse_var("REFERENCE_CONTEXT_MAX_CHARS", 20_000)?,
            },
            storage: StorageConfig {
                bucket: non_empty_var("GCS_BUCKET_NAME"),
                hmac_access_id: non_empty_var("GCS_HMAC_ACCESS_ID"),
                hmac_secret: non_empty_var("GCS_HMAC_SECRET"),
                url_expiry: Duration::from_secs(parse_var("UPLOAD_URL_EXPIRY_SECS", 15 * 60)?),
            },
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.ocr.confidence_threshold) {
            return Err(ConfigError::InvalidValue {
                name: "OCR_CONFIDENCE_THRESHOLD".to_string(),
                message: format!("must be within 0-100, got {}", self.ocr.confidence_threshold),
            });
        }
        for (name, value) in [
            ("DETECTOR_SCORE_THRESHOLD", self.detector.score_threshold),
            ("DETECTOR_IOU_THRESHOLD", self.detector.iou_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    name: name.to_string(),
                    message: format!("must be within 0-1, got {}", value),
                });
            }
        }
        if self.fetch.timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "FETCH_TIMEOUT_SECS".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        // Seven-day ceiling imposed by V4 signing
        if self.storage.url_expiry.is_zero() || self.storage.url_expiry.as_secs() > 604_800 {
            return Err(ConfigError::InvalidValue {
                name: "UPLOAD_URL_EXPIRY_SECS".to_string(),
                message: "must be between 1 and 604800".to_string(),
            });
        }
        Ok(())
    }

    /// Names of the credentials that are absent, for startup warnings
    pub fn missing_backends(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.llm.api_key.is_none() {
            missing.push("OPENAI_API_KEY");
        }
        if self.storage.bucket.is_none() {
            missing.push("GCS_BUCKET_NAME");
        }
        if self.storage.hmac_access_id.is_none() || self.storage.hmac_secret.is_none() {
            missing.push("GCS_HMAC_ACCESS_ID/GCS_HMAC_SECRET");
        }
        missing
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                cors_allowed_origins: vec!["http://localhost:3000".to_string()],
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            fetch: FetchConfig {
                timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            },
            ocr: OcrConfig {
                binary: "tesseract".to_string(),
                language: "eng".to_string(),
                confidence_threshold: DEFAULT_OCR_CONFIDENCE_THRESHOLD,
            },
            detector: DetectorConfig {
                model_path: PathBuf::from("./models/yolov8n.onnx"),
                labels_path: None,
                score_threshold: 0.25,
                iou_threshold: 0.7,
            },
            llm: LlmConfig {
                api_key: None,
                api_base: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
                timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
                reference_context_path: None,
                reference_context_max_chars: 20_000,
            },
            storage: StorageConfig {
                bucket: None,
                hmac_access_id: None,
                hmac_secret: None,
                url_expiry: Duration::from_secs(15 * 60),
            },
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty_var(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            name: name.to_string(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
