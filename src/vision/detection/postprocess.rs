// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLOv8 output decoding and class-aware non-maximum suppression

use ndarray::ArrayViewD;

use super::preprocessing::LetterboxInfo;
use super::DetectionError;

/// A decoded box in model input space, corners as (x1, y1, x2, y2)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub class_id: usize,
    pub score: f32,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Candidate {
    fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }
}

/// Decode a `[1, 4 + C, N]` output (or its transpose `[1, N, 4 + C]`)
///
/// Each anchor keeps its best class; anchors scoring below
/// `score_threshold` are dropped.
pub fn decode_output(
    output: ArrayViewD<f32>,
    score_threshold: f32,
) -> Result<Vec<Candidate>, DetectionError> {
    let shape = output.shape().to_vec();
    if shape.len() != 3 || shape[0] != 1 {
        return Err(DetectionError::UnexpectedOutput(format!(
            "expected [1, 4+C, N], got {:?}",
            shape
        )));
    }

    // Anchors outnumber attributes in every YOLOv8 export
    let transposed = shape[2] < shape[1];
    let (attrs, anchors) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if attrs < 5 {
        return Err(DetectionError::UnexpectedOutput(format!(
            "need at least 5 attributes per anchor, got {}",
            attrs
        )));
    }

    let at = |attr: usize, anchor: usize| -> f32 {
        if transposed {
            output[[0, anchor, attr]]
        } else {
            output[[0, attr, anchor]]
        }
    };

    let mut candidates = Vec::new();
    for anchor in 0..anchors {
        let (class_id, score) = (4..attrs)
            .map(|attr| (attr - 4, at(attr, anchor)))
            .fold((0usize, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

        if !score.is_finite() || score < score_threshold {
            continue;
        }

        let (cx, cy, w, h) = (at(0, anchor), at(1, anchor), at(2, anchor), at(3, anchor));
        candidates.push(Candidate {
            class_id,
            score: score.clamp(0.0, 1.0),
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
        });
    }

    Ok(candidates)
}

/// Intersection over union of two corner boxes
pub fn calculate_iou(a: &Candidate, b: &Candidate) -> f32 {
    let x_min = a.x1.max(b.x1);
    let y_min = a.y1.max(b.y1);
    let x_max = a.x2.min(b.x2);
    let y_max = a.y2.min(b.y2);

    if x_max <= x_min || y_max <= y_min {
        return 0.0;
    }

    let intersection = (x_max - x_min) * (y_max - y_min);
    let union = a.area() + b.area() - intersection;
    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

/// Class-aware NMS; survivors come back in descending score order
pub fn apply_nms(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut suppressed = vec![false; candidates.len()];
    let mut keep = Vec::new();

    for i in 0..candidates.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(candidates[i]);
        for j in (i + 1)..candidates.len() {
            if !suppressed[j]
                && candidates[i].class_id == candidates[j].class_id
                && calculate_iou(&candidates[i], &candidates[j]) > iou_threshold
            {
                suppressed[j] = true;
            }
        }
    }

    keep
}

/// Map a candidate back to source pixels, clamped and rounded
///
/// Returned corners always satisfy x1 <= x2 and y1 <= y2.
pub fn to_source_box(candidate: &Candidate, info: &LetterboxInfo) -> (i32, i32, i32, i32) {
    let (ax, ay) = info.map_to_original(candidate.x1, candidate.y1);
    let (bx, by) = info.map_to_original(candidate.x2, candidate.y2);

    let max_x = info.original_width as f32;
    let max_y = info.original_height as f32;
    let clamp_x = |v: f32| v.clamp(0.0, max_x).round() as i32;
    let clamp_y = |v: f32| v.clamp(0.0, max_y).round() as i32;

    let (x1, x2) = (clamp_x(ax.min(bx)), clamp_x(ax.max(bx)));
    let (y1, y2) = (clamp_y(ay.min(by)), clamp_y(ay.max(by)));
    (x1, y1, x2, y2)
}
