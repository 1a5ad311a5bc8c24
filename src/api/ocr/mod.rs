// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR API endpoint module
//!
//! Provides POST /ocr and POST /analyze/ocr.

pub mod handler;

pub use handler::ocr_handler;
