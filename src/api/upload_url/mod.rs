// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload URL endpoint module
//!
//! Provides POST /generate-upload-url for direct-to-bucket uploads.

pub mod handler;
pub mod request;

pub use handler::generate_upload_url_handler;
pub use request::UploadUrlRequest;
