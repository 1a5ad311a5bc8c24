// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Class-index label tables

use std::path::Path;

use super::DetectionError;

/// COCO-80 class names, the table stock YOLOv8 weights are trained on
pub const COCO_LABELS: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch", "potted plant",
    "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote", "keyboard", "cell phone",
    "microwave", "oven", "toaster", "sink", "refrigerator", "book", "clock", "vase", "scissors",
    "teddy bear", "hair drier", "toothbrush",
];

/// Class names indexed by detector class id
#[derive(Debug, Clone)]
pub struct LabelTable {
    names: Vec<String>,
}

impl LabelTable {
    pub fn coco() -> Self {
        Self {
            names: COCO_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Parse one label per line; blank lines are skipped
    pub fn parse(contents: &str) -> Self {
        Self {
            names: contents
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, DetectionError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DetectionError::ModelLoad(format!("cannot read labels {}: {}", path.display(), e))
        })?;
        let table = Self::parse(&contents);
        if table.is_empty() {
            return Err(DetectionError::ModelLoad(format!(
                "labels file {} is empty",
                path.display()
            )));
        }
        Ok(table)
    }

    /// Name for `class_id`, or `class_<id>` when the table is shorter
    pub fn name(&self, class_id: usize) -> String {
        self.names
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{}", class_id))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::coco()
    }
}
