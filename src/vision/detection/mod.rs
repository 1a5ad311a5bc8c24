// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node detection strategy
//!
//! Detections are returned in the detector's own emission order with
//! labels resolved from its class table. Nothing above the detector
//! re-sorts or thresholds them.

pub mod labels;
pub mod model;
pub mod postprocess;
pub mod preprocessing;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use labels::LabelTable;
pub use model::OnnxDetector;

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("Node detection model not loaded: {0}")]
    ModelNotLoaded(String),

    #[error("Failed to load detection model: {0}")]
    ModelLoad(String),

    #[error("Detection inference failed: {0}")]
    Inference(String),

    #[error("Unexpected detector output: {0}")]
    UnexpectedOutput(String),
}

/// Pixel-space box with x1 <= x2 and y1 <= y2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

/// A detected diagram node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDetection {
    pub label: String,
    /// Detector confidence in [0, 1]
    pub conf: f32,
    pub bbox: BoundingBox,
}

/// Object detector loaded once per process and shared across requests
///
/// `detect` is CPU-bound and blocking; async callers should run it on the
/// blocking pool.
pub trait ObjectDetector: Send + Sync {
    fn name(&self) -> &str;

    fn detect(&self, image: &DynamicImage) -> Result<Vec<NodeDetection>, DetectionError>;
}
