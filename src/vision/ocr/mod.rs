// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR strategy
//!
//! The engine returns a flat token stream tagged with block numbers;
//! [`extract_text_blocks`] filters and groups it into [`TextBlock`]s.

pub mod blocks;
pub mod tesseract;

use async_trait::async_trait;
use image::DynamicImage;
use thiserror::Error;
use tracing::debug;

pub use blocks::{group_into_blocks, parse_tsv, OcrToken, OcrWord, TextBlock};
pub use tesseract::TesseractEngine;

use super::image_utils::ImageError;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine not available: {0}")]
    EngineUnavailable(String),

    #[error("OCR failed: {0}")]
    Failed(String),

    #[error("Unexpected OCR engine output: {0}")]
    InvalidOutput(String),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text recognizer producing a block-tagged token stream
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Engine name for logs and health output
    fn name(&self) -> &str;

    /// Whether the engine can run in this process
    async fn is_available(&self) -> bool;

    /// Recognize words in `image`, in engine emission order
    async fn recognize(&self, image: &DynamicImage) -> Result<Vec<OcrToken>, OcrError>;
}

/// Run `engine` over `image` and group its output into text blocks
pub async fn extract_text_blocks(
    engine: &dyn OcrEngine,
    image: &DynamicImage,
    min_confidence: f32,
) -> Result<Vec<TextBlock>, OcrError> {
    let tokens = engine.recognize(image).await?;
    let token_count = tokens.len();
    let blocks = group_into_blocks(tokens, min_confidence);
    debug!(
        "{}: {} tokens grouped into {} blocks (min confidence {})",
        engine.name(),
        token_count,
        blocks.len(),
        min_confidence
    );
    Ok(blocks)
}
