//! Frame annotation: detection boxes, label tags, and the throughput overlay.
//!
//! Boxes and tag bars go through `imageproc`, which clips to the canvas. Tag
//! text uses a loaded TrueType font when one is configured and the built-in
//! bitmap font otherwise.

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::detect::Detection;
use crate::glyphs;

pub const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 255]);
pub const TAG_COLOR: Rgb<u8> = Rgb([255, 0, 255]);
pub const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
pub const BOX_THICKNESS: u32 = 2;

const TAG_OFFSET: i32 = 5;
const TAG_PADDING: u32 = 4;
const BITMAP_SCALE: u32 = 2;
const FPS_ANCHOR: (i32, i32) = (10, 50);

/// Draws detections onto frame copies.
#[derive(Clone)]
pub struct Annotator {
    font: Option<FontArc>,
    scale: f32,
}

impl Annotator {
    pub fn new() -> Self {
        Self {
            font: None,
            scale: 18.0,
        }
    }

    /// Load a TrueType/OpenType font for tag text.
    pub fn with_font_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read label font {}", path.display()))?;
        let font = FontArc::try_from_vec(bytes)
            .with_context(|| format!("invalid label font {}", path.display()))?;
        self.font = Some(font);
        Ok(self)
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Return an annotated copy of `frame`.
    ///
    /// Every detection is validated before anything is drawn, so a malformed
    /// box fails the whole frame and the input is never half-annotated.
    pub fn annotate(&self, frame: &RgbImage, detections: &[Detection]) -> Result<RgbImage> {
        for det in detections {
            det.validate()
                .with_context(|| format!("malformed detection for {}", det.class))?;
        }

        let mut canvas = frame.clone();
        for det in detections {
            self.draw_detection(&mut canvas, det);
        }
        Ok(canvas)
    }

    /// Overlay `FPS: n` in the top-left corner.
    pub fn draw_fps(&self, canvas: &mut RgbImage, fps: u32) {
        let text = format!("FPS: {}", fps);
        self.draw_tag(canvas, &text, FPS_ANCHOR.0, FPS_ANCHOR.1);
    }

    fn draw_detection(&self, canvas: &mut RgbImage, det: &Detection) {
        let Some((x, y, w, h)) = det.bbox.clamp_to(canvas.width(), canvas.height()) else {
            return;
        };

        for inset in 0..BOX_THICKNESS {
            if w <= inset * 2 || h <= inset * 2 {
                break;
            }
            let rect = Rect::at((x + inset) as i32, (y + inset) as i32)
                .of_size(w - inset * 2, h - inset * 2);
            draw_hollow_rect_mut(canvas, rect, BOX_COLOR);
        }

        let (_, tag_h) = self.tag_size(&det.tag());
        let tag_y = (y as i32 - TAG_OFFSET - tag_h as i32).max(0);
        self.draw_tag(canvas, &det.tag(), x as i32, tag_y);
    }

    fn draw_tag(&self, canvas: &mut RgbImage, text: &str, x: i32, y: i32) {
        let (w, h) = self.tag_size(text);
        draw_filled_rect_mut(canvas, Rect::at(x, y).of_size(w, h), TAG_COLOR);

        let pad = (TAG_PADDING / 2) as i32;
        match &self.font {
            Some(font) => draw_text_mut(
                canvas,
                TEXT_COLOR,
                x + pad,
                y + pad,
                PxScale::from(self.scale),
                font,
                text,
            ),
            None => glyphs::draw_text(canvas, TEXT_COLOR, x + pad, y + pad, BITMAP_SCALE, text),
        }
    }

    fn tag_size(&self, text: &str) -> (u32, u32) {
        let (w, h) = match &self.font {
            Some(font) => text_size(PxScale::from(self.scale), font, text),
            None => glyphs::text_size(text, BITMAP_SCALE),
        };
        (w.max(1) + TAG_PADDING, h.max(1) + TAG_PADDING)
    }
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new()
    }
}
