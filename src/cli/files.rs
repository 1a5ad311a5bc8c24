// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! One-shot analysis of local image files

use anyhow::{bail, Result};
use clap::Args;
use image::DynamicImage;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::ServiceConfig;
use crate::vision::ocr::extract_text_blocks;
use crate::vision::{decode_image_bytes, ObjectDetector, OnnxDetector, TesseractEngine};

/// Arguments for the `ocr` and `detect` commands
#[derive(Args, Debug)]
pub struct FileArgs {
    /// Image file to analyze
    pub path: PathBuf,
}

async fn load_image(path: &Path, max_bytes: usize) -> Result<DynamicImage> {
    if !path.is_file() {
        bail!("File not found: {}", path.display());
    }
    let bytes = tokio::fs::read(path).await?;
    let (image, info) = decode_image_bytes(&bytes, max_bytes)?;
    info!(
        "Loaded {}: {}x{} {:?}",
        path.display(),
        info.width,
        info.height,
        info.format
    );
    Ok(image)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn run_ocr(args: FileArgs, config: &ServiceConfig) -> Result<()> {
    let image = load_image(&args.path, config.server.max_upload_bytes).await?;
    let engine = TesseractEngine::new(&config.ocr);
    let blocks = extract_text_blocks(&engine, &image, config.ocr.confidence_threshold).await?;
    print_json(&blocks)
}

pub async fn run_detect(args: FileArgs, config: &ServiceConfig) -> Result<()> {
    let image = load_image(&args.path, config.server.max_upload_bytes).await?;
    let detector = OnnxDetector::load(&config.detector)?;
    let detections = tokio::task::spawn_blocking(move || detector.detect(&image)).await??;
    print_json(&detections)
}
