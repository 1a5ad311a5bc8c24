// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tesseract OCR engine driven through its command-line interface

use std::io::Write;

use async_trait::async_trait;
use image::DynamicImage;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{parse_tsv, OcrEngine, OcrError, OcrToken};
use crate::config::OcrConfig;
use crate::vision::image_utils::encode_png;

/// Runs `tesseract <image> stdout -l <lang> tsv` on a temporary PNG
pub struct TesseractEngine {
    binary: String,
    language: String,
}

impl TesseractEngine {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            language: config.language.clone(),
        }
    }

    async fn run(&self, image_path: &std::path::Path) -> Result<String, OcrError> {
        let output = Command::new(&self.binary)
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .arg("tsv")
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(OcrError::Failed(format!("tesseract failed: {}", stderr.trim())))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(OcrError::EngineUnavailable(
                format!("{} not found (install tesseract-ocr)", self.binary),
            )),
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn is_available(&self) -> bool {
        match Command::new(&self.binary).arg("--version").output().await {
            Ok(output) => output.status.success(),
            Err(e) => {
                warn!("Tesseract binary '{}' unavailable: {}", self.binary, e);
                false
            }
        }
    }

    async fn recognize(&self, image: &DynamicImage) -> Result<Vec<OcrToken>, OcrError> {
        let png = encode_png(image)?;

        let mut file = tempfile::Builder::new()
            .prefix("diagram-ocr-")
            .suffix(".png")
            .tempfile()?;
        file.write_all(&png)?;
        file.flush()?;

        debug!(
            "Running {} on {}x{} image ({} bytes)",
            self.binary,
            image.width(),
            image.height(),
            png.len()
        );
        let tsv = self.run(file.path()).await?;
        parse_tsv(&tsv)
    }
}
