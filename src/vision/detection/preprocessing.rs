// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Letterbox preprocessing for YOLO-family detectors

use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

/// Square model input edge length
pub const DETECTOR_INPUT_SIZE: u32 = 640;

/// Padding value used by YOLO letterboxing
const PAD_VALUE: u8 = 114;

/// Scale and offsets applied by [`letterbox`], for mapping boxes back
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxInfo {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub original_width: u32,
    pub original_height: u32,
}

impl LetterboxInfo {
    /// Map a point in model input space back to source image space
    pub fn map_to_original(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.offset_x) / self.scale,
            (y - self.offset_y) / self.scale,
        )
    }
}

/// Resize preserving aspect ratio, centre on a gray square and build an
/// NCHW tensor scaled to [0, 1]
pub fn letterbox(image: &DynamicImage, target_size: u32) -> (Array4<f32>, LetterboxInfo) {
    let (orig_w, orig_h) = image.dimensions();
    let mut canvas = RgbImage::from_pixel(target_size, target_size, Rgb([PAD_VALUE; 3]));

    let info = if orig_w == 0 || orig_h == 0 {
        LetterboxInfo {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            original_width: orig_w,
            original_height: orig_h,
        }
    } else {
        let scale = (target_size as f32 / orig_w as f32).min(target_size as f32 / orig_h as f32);
        let new_w = ((orig_w as f32 * scale).round() as u32).clamp(1, target_size);
        let new_h = ((orig_h as f32 * scale).round() as u32).clamp(1, target_size);

        let resized = image
            .resize_exact(new_w, new_h, image::imageops::FilterType::Triangle)
            .to_rgb8();

        let offset_x = (target_size - new_w) / 2;
        let offset_y = (target_size - new_h) / 2;
        for (x, y, pixel) in resized.enumerate_pixels() {
            canvas.put_pixel(x + offset_x, y + offset_y, *pixel);
        }

        LetterboxInfo {
            scale,
            offset_x: offset_x as f32,
            offset_y: offset_y as f32,
            original_width: orig_w,
            original_height: orig_h,
        }
    };

    let size = target_size as usize;
    let mut tensor = Array4::zeros((1, 3, size, size));
    for (x, y, pixel) in canvas.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }

    (tensor, info)
}
