//! YOLOv8 output decoding.
//!
//! The exported model emits one `[4 + classes, candidates]` matrix per image:
//! rows 0..4 are `cx, cy, w, h` in model-input pixels, the remaining rows are
//! per-class scores. Decoding keeps the best class per candidate, drops
//! candidates under the confidence threshold, and runs class-wise NMS.

use anyhow::{anyhow, Result};

use crate::detect::result::{BoundingBox, Detection};
use crate::labels::{PpeClass, CLASS_COUNT};

#[derive(Clone, Copy, Debug)]
pub struct DecodeParams {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    /// Model-input to frame scale factors.
    pub scale_x: f32,
    pub scale_y: f32,
    /// Frame size, used to clip decoded boxes.
    pub frame_width: u32,
    pub frame_height: u32,
}

/// Decode a row-major `[channels, candidates]` prediction matrix.
pub fn decode_predictions(
    data: &[f32],
    channels: usize,
    candidates: usize,
    params: &DecodeParams,
) -> Result<Vec<Detection>> {
    if channels != 4 + CLASS_COUNT {
        return Err(anyhow!(
            "model reports {} output channels, expected {} (4 box + {} classes)",
            channels,
            4 + CLASS_COUNT,
            CLASS_COUNT
        ));
    }
    let expected = channels
        .checked_mul(candidates)
        .ok_or_else(|| anyhow!("prediction dimensions overflow"))?;
    if data.len() != expected {
        return Err(anyhow!(
            "expected {} prediction values, received {}",
            expected,
            data.len()
        ));
    }

    let at = |row: usize, col: usize| data[row * candidates + col];
    let max_x = params.frame_width as f32;
    let max_y = params.frame_height as f32;

    let mut found = Vec::new();
    for i in 0..candidates {
        let (class_id, score) = (0..CLASS_COUNT)
            .map(|c| (c, at(4 + c, i)))
            .fold((0, f32::NEG_INFINITY), |best, cur| {
                if cur.1 > best.1 {
                    cur
                } else {
                    best
                }
            });
        if !score.is_finite() || score < params.confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (at(0, i), at(1, i), at(2, i), at(3, i));
        let bbox = BoundingBox::new(
            ((cx - w / 2.0) * params.scale_x).clamp(0.0, max_x),
            ((cy - h / 2.0) * params.scale_y).clamp(0.0, max_y),
            ((cx + w / 2.0) * params.scale_x).clamp(0.0, max_x),
            ((cy + h / 2.0) * params.scale_y).clamp(0.0, max_y),
        );
        if bbox.validate().is_err() {
            continue;
        }
        let class = match PpeClass::from_index(class_id) {
            Ok(class) => class,
            Err(err) => {
                log::warn!("dropping candidate {}: {:#}", i, err);
                continue;
            }
        };
        found.push(Detection::new(class, score.min(1.0), bbox));
    }

    Ok(non_max_suppression(found, params.iou_threshold))
}

/// Class-wise greedy NMS. Output is sorted by descending confidence.
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for det in detections {
        let suppressed = kept
            .iter()
            .any(|k| k.class == det.class && k.bbox.iou(&det.bbox) > iou_threshold);
        if !suppressed {
            kept.push(det);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> DecodeParams {
        DecodeParams {
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            scale_x: 2.0,
            scale_y: 1.0,
            frame_width: 1280,
            frame_height: 640,
        }
    }

    /// Build a `[14, n]` matrix from `(cx, cy, w, h, class, score)` tuples.
    fn matrix(cands: &[(f32, f32, f32, f32, usize, f32)]) -> Vec<f32> {
        let n = cands.len();
        let mut data = vec![0.0; (4 + CLASS_COUNT) * n];
        for (i, &(cx, cy, w, h, class, score)) in cands.iter().enumerate() {
            data[i] = cx;
            data[n + i] = cy;
            data[2 * n + i] = w;
            data[3 * n + i] = h;
            data[(4 + class) * n + i] = score;
        }
        data
    }

    #[test]
    fn decodes_and_scales_boxes() {
        let data = matrix(&[(100.0, 100.0, 20.0, 40.0, 3, 0.8)]);
        let out = decode_predictions(&data, 14, 1, &params()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].class, PpeClass::NoMask);
        assert_eq!(out[0].bbox, BoundingBox::new(180.0, 80.0, 220.0, 120.0));
    }

    #[test]
    fn drops_low_confidence_candidates() {
        let data = matrix(&[(100.0, 100.0, 20.0, 40.0, 0, 0.1)]);
        assert!(decode_predictions(&data, 14, 1, &params()).unwrap().is_empty());
    }

    #[test]
    fn suppresses_overlapping_boxes_of_same_class_only() {
        let data = matrix(&[
            (100.0, 100.0, 20.0, 20.0, 0, 0.9),
            (101.0, 100.0, 20.0, 20.0, 0, 0.7),
            (101.0, 100.0, 20.0, 20.0, 7, 0.6),
        ]);
        let out = decode_predictions(&data, 14, 3, &params()).unwrap();
        let classes: Vec<PpeClass> = out.iter().map(|d| d.class).collect();
        assert_eq!(classes, vec![PpeClass::Hardhat, PpeClass::SafetyVest]);
    }

    #[test]
    fn rejects_wrong_channel_count() {
        assert!(decode_predictions(&[0.0; 84], 84, 1, &params()).is_err());
    }
}
