// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Server bootstrapping: build every backend once, then serve

use anyhow::Result;
use clap::Args;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::analysis::Dispatcher;
use crate::api::{start_server, AppState};
use crate::config::ServiceConfig;
use crate::storage::{GcsHmacSigner, UploadUrlSigner};
use crate::vision::{
    ImageFetcher, ObjectDetector, OcrEngine, OnnxDetector, TesseractEngine, VlmClient,
};

/// Arguments for the serve command
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Listen address (overrides HOST)
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Listen port (overrides PORT)
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,
}

fn status_icon(available: bool) -> &'static str {
    if available {
        "✅"
    } else {
        "⚠️ "
    }
}

fn load_reference_context(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            info!(
                "Loaded reference context from {} ({} chars)",
                path.display(),
                text.chars().count()
            );
            Some(text)
        }
        Err(e) => {
            warn!(
                "Could not read reference context {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

/// Construct the dispatcher and upload signer from configuration
///
/// Missing credentials or models only disable the endpoints that need them.
pub async fn build_state(config: &ServiceConfig) -> Result<AppState> {
    for missing in config.missing_backends() {
        warn!("Configuration: {} is not set", missing);
    }

    let fetcher = ImageFetcher::new(config.fetch.timeout, config.server.max_upload_bytes)?;
    info!(
        "Remote images: {}s timeout, {} byte limit",
        fetcher.timeout().as_secs(),
        config.server.max_upload_bytes
    );

    let tesseract = TesseractEngine::new(&config.ocr);
    let ocr_available = tesseract.is_available().await;
    if !ocr_available {
        warn!(
            "Tesseract binary '{}' not found; OCR requests will fail",
            config.ocr.binary
        );
    }
    let ocr: Arc<dyn OcrEngine> = Arc::new(tesseract);

    let detector: Option<Arc<dyn ObjectDetector>> = match OnnxDetector::load(&config.detector) {
        Ok(detector) => Some(Arc::new(detector)),
        Err(e) => {
            warn!("Node detection disabled: {}", e);
            None
        }
    };

    let vlm = match VlmClient::new(&config.llm) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            warn!("Vision LLM disabled: {}", e);
            None
        }
    };

    let vlm_model = vlm.as_ref().map(|client| client.model_name().to_string());

    let reference = config
        .llm
        .reference_context_path
        .as_deref()
        .and_then(load_reference_context);

    let dispatcher = Dispatcher::new(
        fetcher,
        config.server.max_upload_bytes,
        ocr,
        config.ocr.confidence_threshold,
    )
    .with_detector(detector)
    .with_vlm(vlm)
    .with_reference_context(reference, config.llm.reference_context_max_chars);

    let upload_signer = GcsHmacSigner::from_config(&config.storage)
        .map(|signer| Arc::new(signer) as Arc<dyn UploadUrlSigner>);

    let mut state = AppState::new(dispatcher, upload_signer);
    state.backends.ocr = ocr_available;
    let backends = state.backends;
    info!("Backends:");
    info!("  {} OCR (tesseract)", status_icon(backends.ocr));
    info!("  {} Node detection (onnx)", status_icon(backends.detection));
    match &vlm_model {
        Some(model) => info!("  {} Vision LLM ({})", status_icon(backends.llm), model),
        None => info!("  {} Vision LLM", status_icon(backends.llm)),
    }
    info!("  {} Upload URLs (gcs)", status_icon(backends.storage));

    Ok(state)
}

pub async fn run(args: ServeArgs, mut config: ServiceConfig) -> Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    info!("🚀 Starting diagram analyzer v{}", env!("CARGO_PKG_VERSION"));
    let state = build_state(&config).await?;
    start_server(state, &config.server).await
}
