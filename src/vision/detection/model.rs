// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX Runtime detector for YOLOv8-layout models (CPU only)

use std::fmt::Display;
use std::path::Path;
use std::sync::{Arc, Mutex};

use image::DynamicImage;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use tracing::{debug, info};

use super::labels::LabelTable;
use super::postprocess::{apply_nms, decode_output, to_source_box};
use super::preprocessing::{letterbox, DETECTOR_INPUT_SIZE};
use super::{BoundingBox, DetectionError, NodeDetection, ObjectDetector};
use crate::config::DetectorConfig;

/// YOLO detector backed by an ONNX Runtime session
///
/// `Session::run` takes `&mut self`, so the session sits behind a mutex;
/// inference never changes model state.
#[derive(Clone)]
pub struct OnnxDetector {
    session: Arc<Mutex<Session>>,
    input_name: String,
    labels: LabelTable,
    score_threshold: f32,
    iou_threshold: f32,
}

impl std::fmt::Debug for OnnxDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxDetector")
            .field("input_name", &self.input_name)
            .field("labels", &self.labels.len())
            .field("score_threshold", &self.score_threshold)
            .field("iou_threshold", &self.iou_threshold)
            .finish_non_exhaustive()
    }
}

fn load_err<E: Display>(stage: &'static str) -> impl Fn(E) -> DetectionError {
    move |e| DetectionError::ModelLoad(format!("{}: {}", stage, e))
}

impl OnnxDetector {
    /// Load the model and label table named by `config`
    pub fn load(config: &DetectorConfig) -> Result<Self, DetectionError> {
        let model_path: &Path = &config.model_path;
        if !model_path.exists() {
            return Err(DetectionError::ModelNotLoaded(format!(
                "model file not found: {}",
                model_path.display()
            )));
        }

        info!("Loading node detection model from {}", model_path.display());

        let session = Session::builder()
            .map_err(load_err("Failed to create session builder"))?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .map_err(load_err("Failed to set CPU execution provider"))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(load_err("Failed to set optimization level"))?
            .with_intra_threads(4)
            .map_err(load_err("Failed to set intra threads"))?
            .commit_from_file(model_path)
            .map_err(load_err("Failed to load detection model"))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        let labels = match &config.labels_path {
            Some(path) => LabelTable::from_file(path)?,
            None => LabelTable::coco(),
        };

        info!(
            "✅ Node detection model loaded (input: {}, {} classes)",
            input_name,
            labels.len()
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            labels,
            score_threshold: config.score_threshold,
            iou_threshold: config.iou_threshold,
        })
    }
}

impl ObjectDetector for OnnxDetector {
    fn name(&self) -> &str {
        "onnx-yolov8"
    }

    fn detect(&self, image: &DynamicImage) -> Result<Vec<NodeDetection>, DetectionError> {
        let (tensor, info) = letterbox(image, DETECTOR_INPUT_SIZE);

        let input_value = Value::from_array(tensor)
            .map_err(|e| DetectionError::Inference(format!("Failed to create input tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| DetectionError::Inference("detector session lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .map_err(|e| DetectionError::Inference(e.to_string()))?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| DetectionError::Inference(format!("Failed to extract output tensor: {}", e)))?;
        debug!("Detector output shape: {:?}", output_tensor.shape());

        let candidates = decode_output(output_tensor.view(), self.score_threshold)?;
        let candidate_count = candidates.len();
        let kept = apply_nms(candidates, self.iou_threshold);
        debug!(
            "{} candidates above {:.2}, {} after NMS",
            candidate_count,
            self.score_threshold,
            kept.len()
        );

        Ok(kept
            .iter()
            .map(|c| {
                let (x1, y1, x2, y2) = to_source_box(c, &info);
                NodeDetection {
                    label: self.labels.name(c.class_id),
                    conf: c.score,
                    bbox: BoundingBox { x1, y1, x2, y2 },
                }
            })
            .collect())
    }
}
