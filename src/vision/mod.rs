// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision backends for diagram analysis
//!
//! This module provides:
//! - Image ingestion (uploads and remote URLs)
//! - OCR via Tesseract
//! - Node detection via a YOLO-family ONNX model (CPU only)
//! - A client for a hosted vision-language model

pub mod detection;
pub mod image_utils;
pub mod ingest;
pub mod ocr;
pub mod prompts;
pub mod vlm_client;

pub use detection::{BoundingBox, DetectionError, NodeDetection, ObjectDetector, OnnxDetector};
pub use image_utils::{decode_image_bytes, detect_format, ImageError, ImageInfo};
pub use ingest::{ImageFetcher, ImagePayload, IngestError};
pub use ocr::{OcrEngine, OcrError, TesseractEngine, TextBlock};
pub use vlm_client::{VlmClient, VlmError};
