// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Routes one request to exactly one analysis strategy
//!
//! Each dispatch walks `Received -> Ingesting -> Analyzing -> Normalizing`
//! and ends in `Responded` or `Failed`. Nothing is shared between requests
//! except the backends handed in at construction.

use std::sync::Arc;

use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::normalize::{
    normalize_edges, normalize_graph, normalize_nodes, AnalysisOutcome, Description,
};
use super::{AnalysisError, AnalysisErrorKind};
use crate::vision::image_utils::{decode_image_bytes, to_data_uri, validate_image_bytes};
use crate::vision::ocr::extract_text_blocks;
use crate::vision::prompts::truncate_chars;
use crate::vision::{ImageFetcher, ImagePayload, ObjectDetector, OcrEngine, VlmClient};

/// The analysis to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Ocr,
    Detection,
    Describe,
    LlmNodes,
    LlmEdges,
    LlmGraph,
}

impl Strategy {
    fn uses_vlm(self) -> bool {
        matches!(
            self,
            Self::Describe | Self::LlmNodes | Self::LlmEdges | Self::LlmGraph
        )
    }
}

/// Lifecycle of a single dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Ingesting,
    Analyzing,
    Normalizing,
    Responded,
    Failed,
}

/// An inbound analysis request
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub payload: ImagePayload,
    /// Reference markdown for edge extraction; overrides the startup default
    pub reference_context: Option<String>,
}

impl AnalysisRequest {
    pub fn new(payload: ImagePayload) -> Self {
        Self {
            payload,
            reference_context: None,
        }
    }

    pub fn with_reference_context(mut self, reference_context: Option<String>) -> Self {
        self.reference_context = reference_context.filter(|r| !r.trim().is_empty());
        self
    }
}

fn warn_on_mime_mismatch(payload: &ImagePayload, sniffed: ImageFormat) {
    if let Some(declared) = payload.mime_mismatch(sniffed) {
        warn!(
            "Upload declared as '{}' but contains {:?}; using the detected format",
            declared, sniffed
        );
    }
}

/// Image handed to a strategy after ingestion
enum Ingested {
    Pixels(DynamicImage),
    /// URL or data URI for the model, plus the public URL to echo back
    Reference { image_url: String, public_url: Option<String> },
}

/// Raw strategy output before normalization
enum RawOutput {
    Ready(AnalysisOutcome),
    Text(String),
}

pub struct Dispatcher {
    fetcher: ImageFetcher,
    max_image_bytes: usize,
    ocr: Arc<dyn OcrEngine>,
    ocr_min_confidence: f32,
    detector: Option<Arc<dyn ObjectDetector>>,
    vlm: Option<Arc<VlmClient>>,
    default_reference: Option<String>,
    reference_max_chars: usize,
}

impl Dispatcher {
    pub fn new(
        fetcher: ImageFetcher,
        max_image_bytes: usize,
        ocr: Arc<dyn OcrEngine>,
        ocr_min_confidence: f32,
    ) -> Self {
        Self {
            fetcher,
            max_image_bytes,
            ocr,
            ocr_min_confidence,
            detector: None,
            vlm: None,
            default_reference: None,
            reference_max_chars: 20_000,
        }
    }

    pub fn with_detector(mut self, detector: Option<Arc<dyn ObjectDetector>>) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_vlm(mut self, vlm: Option<Arc<VlmClient>>) -> Self {
        self.vlm = vlm;
        self
    }

    pub fn with_reference_context(mut self, reference: Option<String>, max_chars: usize) -> Self {
        self.default_reference = reference.filter(|r| !r.trim().is_empty());
        self.reference_max_chars = max_chars;
        self
    }

    pub fn has_detector(&self) -> bool {
        self.detector.is_some()
    }

    pub fn has_vlm(&self) -> bool {
        self.vlm.is_some()
    }

    /// Run `strategy` on `request`; no partial results on failure
    pub async fn dispatch(
        &self,
        strategy: Strategy,
        request: AnalysisRequest,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        let request_id = Uuid::new_v4();
        let mut stage = Stage::Received;
        debug!(
            "[{}] {:?} {:?} source={}",
            request_id,
            stage,
            strategy,
            request.payload.describe()
        );

        let result = self.run(request_id, strategy, request, &mut stage).await;

        match &result {
            Ok(outcome) => {
                debug!("[{}] {:?} -> {:?}", request_id, stage, Stage::Responded);
                info!(
                    "[{}] {:?} produced {} {} item(s)",
                    request_id,
                    strategy,
                    outcome.item_count(),
                    outcome.kind()
                );
            }
            Err(e) => {
                debug!("[{}] {:?} -> {:?}", request_id, stage, Stage::Failed);
                if e.status_code() >= 500 && e.kind != AnalysisErrorKind::FetchTimeout {
                    error!("[{}] {:?} failed during {:?}: {}", request_id, strategy, stage, e);
                } else {
                    warn!("[{}] {:?} failed during {:?}: {}", request_id, strategy, stage, e);
                }
            }
        }

        result
    }

    async fn run(
        &self,
        request_id: Uuid,
        strategy: Strategy,
        request: AnalysisRequest,
        stage: &mut Stage,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        // Unconfigured backends fail before any network traffic
        if strategy == Strategy::Detection && self.detector.is_none() {
            return Err(AnalysisError::configuration(
                "Node detection model not loaded",
            ));
        }
        if strategy.uses_vlm() && self.vlm.is_none() {
            return Err(AnalysisError::configuration("OpenAI API key not configured."));
        }

        advance(request_id, stage, Stage::Ingesting);
        let ingested = if strategy.uses_vlm() {
            self.ingest_reference(&request.payload)?
        } else {
            Ingested::Pixels(self.ingest_pixels(&request.payload).await?)
        };

        advance(request_id, stage, Stage::Analyzing);
        let raw = self
            .analyze(strategy, ingested, request.reference_context.as_deref())
            .await?;

        advance(request_id, stage, Stage::Normalizing);
        match raw {
            RawOutput::Ready(outcome) => Ok(outcome),
            RawOutput::Text(text) => {
                debug!("[{}] normalizing {} chars of model output", request_id, text.len());
                Ok(match strategy {
                    Strategy::LlmNodes => AnalysisOutcome::Nodes(normalize_nodes(&text)?),
                    Strategy::LlmEdges => AnalysisOutcome::Edges(normalize_edges(&text)?),
                    Strategy::LlmGraph => AnalysisOutcome::Graph(normalize_graph(&text)?),
                    other => {
                        return Err(AnalysisError::processing(format!(
                            "{:?} produced unstructured text",
                            other
                        )))
                    }
                })
            }
        }
    }

    async fn ingest_pixels(&self, payload: &ImagePayload) -> Result<DynamicImage, AnalysisError> {
        let bytes: Bytes = match payload {
            ImagePayload::Upload { data, .. } => data.clone(),
            ImagePayload::Url(url) => self.fetcher.fetch(url).await?,
        };
        let (image, info) = decode_image_bytes(&bytes, self.max_image_bytes)?;
        warn_on_mime_mismatch(payload, info.format);
        debug!(
            "Decoded {:?} image {}x{} ({} bytes)",
            info.format, info.width, info.height, info.size_bytes
        );
        Ok(image)
    }

    fn ingest_reference(&self, payload: &ImagePayload) -> Result<Ingested, AnalysisError> {
        Ok(match payload {
            ImagePayload::Url(url) => Ingested::Reference {
                image_url: url.to_string(),
                public_url: Some(url.to_string()),
            },
            ImagePayload::Upload { data, .. } => {
                let format = validate_image_bytes(data, self.max_image_bytes)?;
                warn_on_mime_mismatch(payload, format);
                Ingested::Reference {
                    image_url: to_data_uri(data, format),
                    public_url: None,
                }
            }
        })
    }

    async fn analyze(
        &self,
        strategy: Strategy,
        ingested: Ingested,
        request_reference: Option<&str>,
    ) -> Result<RawOutput, AnalysisError> {
        match (strategy, ingested) {
            (Strategy::Ocr, Ingested::Pixels(image)) => {
                let blocks =
                    extract_text_blocks(self.ocr.as_ref(), &image, self.ocr_min_confidence).await?;
                Ok(RawOutput::Ready(AnalysisOutcome::Ocr(blocks)))
            }
            (Strategy::Detection, Ingested::Pixels(image)) => {
                let detector = self.detector.clone().ok_or_else(|| {
                    AnalysisError::configuration("Node detection model not loaded")
                })?;
                let detections = tokio::task::spawn_blocking(move || detector.detect(&image))
                    .await
                    .map_err(AnalysisError::processing)??;
                Ok(RawOutput::Ready(AnalysisOutcome::Detection(detections)))
            }
            (strategy, Ingested::Reference { image_url, public_url }) => {
                let vlm = self
                    .vlm
                    .as_ref()
                    .ok_or_else(|| AnalysisError::configuration("OpenAI API key not configured."))?;
                match strategy {
                    Strategy::Describe => {
                        let description = vlm.describe(&image_url).await?;
                        Ok(RawOutput::Ready(AnalysisOutcome::Description(Description {
                            description,
                            url: public_url,
                        })))
                    }
                    Strategy::LlmNodes => Ok(RawOutput::Text(vlm.extract_nodes(&image_url).await?)),
                    Strategy::LlmEdges => {
                        let reference = self.reference_for(request_reference);
                        Ok(RawOutput::Text(
                            vlm.extract_edges(&image_url, reference).await?,
                        ))
                    }
                    Strategy::LlmGraph => Ok(RawOutput::Text(vlm.extract_graph(&image_url).await?)),
                    other => Err(AnalysisError::processing(format!(
                        "{:?} cannot run on an image reference",
                        other
                    ))),
                }
            }
            (other, Ingested::Pixels(_)) => Err(AnalysisError::processing(format!(
                "{:?} cannot run on decoded pixels",
                other
            ))),
        }
    }

    /// Request reference, else the startup default, truncated; empty when neither
    fn reference_for<'a>(&'a self, request_reference: Option<&'a str>) -> &'a str {
        match request_reference.or(self.default_reference.as_deref()) {
            Some(reference) => {
                let truncated = truncate_chars(reference, self.reference_max_chars);
                if truncated.len() < reference.len() {
                    debug!(
                        "Reference context truncated to {} characters",
                        self.reference_max_chars
                    );
                }
                truncated
            }
            None => {
                warn!("No reference context provided for few-shot edge detection");
                ""
            }
        }
    }
}

fn advance(request_id: Uuid, stage: &mut Stage, next: Stage) {
    debug!("[{}] {:?} -> {:?}", request_id, stage, next);
    *stage = next;
}
