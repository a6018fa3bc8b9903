use anyhow::{anyhow, Result};

use crate::labels::PpeClass;

/// Axis-aligned box in frame pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Reject boxes with non-finite coordinates or inverted corners.
    pub fn validate(&self) -> Result<()> {
        let coords = [self.x1, self.y1, self.x2, self.y2];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(anyhow!("bounding box has non-finite coordinates: {:?}", self));
        }
        if self.x1 >= self.x2 || self.y1 >= self.y2 {
            return Err(anyhow!("bounding box corners are inverted: {:?}", self));
        }
        Ok(())
    }

    /// Intersection over union, 0.0 when the boxes do not overlap.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);
        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }

    /// Integer pixel rectangle `(x, y, w, h)` clamped into a `width`x`height` frame.
    ///
    /// Returns `None` when nothing of the box lies inside the frame.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        if width == 0 || height == 0 {
            return None;
        }
        let max_x = (width - 1) as f32;
        let max_y = (height - 1) as f32;
        let x1 = self.x1.clamp(0.0, max_x) as u32;
        let y1 = self.y1.clamp(0.0, max_y) as u32;
        let x2 = self.x2.clamp(0.0, max_x) as u32;
        let y2 = self.y2.clamp(0.0, max_y) as u32;
        if x2 < x1 || y2 < y1 {
            return None;
        }
        if self.x2 < 0.0 || self.y2 < 0.0 || self.x1 > max_x || self.y1 > max_y {
            return None;
        }
        Some((x1, y1, x2 - x1 + 1, y2 - y1 + 1))
    }
}

/// One model output.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub class: PpeClass,
    /// Confidence in [0, 1].
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(class: PpeClass, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            class,
            confidence,
            bbox,
        }
    }

    /// Tag text drawn above the box: label and confidence to two decimals.
    pub fn tag(&self) -> String {
        format!("{} {:.2}", self.class, self.confidence)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(anyhow!(
                "confidence {} for {} outside [0, 1]",
                self.confidence,
                self.class
            ));
        }
        self.bbox.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_rounds_confidence_to_two_decimals() {
        let det = Detection::new(
            PpeClass::NoSafetyVest,
            0.876,
            BoundingBox::new(1.0, 1.0, 5.0, 5.0),
        );
        assert_eq!(det.tag(), "NO-Safety Vest 0.88");
    }

    #[test]
    fn malformed_boxes_fail_validation() {
        assert!(BoundingBox::new(5.0, 1.0, 5.0, 4.0).validate().is_err());
        assert!(BoundingBox::new(1.0, 4.0, 5.0, 2.0).validate().is_err());
        assert!(BoundingBox::new(f32::NAN, 1.0, 5.0, 4.0).validate().is_err());
        assert!(BoundingBox::new(1.0, 1.0, 5.0, 4.0).validate().is_ok());
    }

    #[test]
    fn clamp_keeps_box_inside_frame() {
        let bbox = BoundingBox::new(-10.0, 5.0, 120.0, 50.0);
        assert_eq!(bbox.clamp_to(100, 40), Some((0, 5, 100, 35)));

        let outside = BoundingBox::new(200.0, 5.0, 220.0, 10.0);
        assert_eq!(outside.clamp_to(100, 40), None);
    }

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(20.0, 20.0, 30.0, 30.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
        assert_eq!(a.iou(&b), 0.0);
    }
}
