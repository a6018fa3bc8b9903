use std::time::{Duration, Instant};

use anyhow::Result;

use crate::frame::Frame;

/// Synthetic frame generator behind `stub://` sources.
///
/// Produces a moving gradient so consecutive frames differ. `limit` bounds
/// the stream (file-like); `None` streams forever (camera-like). When `pace`
/// is set, frames are released no faster than that interval.
pub(crate) struct SyntheticSource {
    label: String,
    width: u32,
    height: u32,
    limit: Option<u64>,
    pace: Option<Duration>,
    frame_count: u64,
    scene_state: u8,
    last_frame_at: Option<Instant>,
}

impl SyntheticSource {
    pub(crate) fn new(label: &str, width: u32, height: u32, limit: Option<u64>) -> Self {
        Self {
            label: label.to_string(),
            width,
            height,
            limit,
            pace: None,
            frame_count: 0,
            scene_state: 0,
            last_frame_at: None,
        }
    }

    pub(crate) fn paced(mut self, fps: u32) -> Self {
        if fps > 0 {
            self.pace = Some(Duration::from_secs_f64(1.0 / fps as f64));
        }
        self
    }

    pub(crate) fn connect(&mut self) -> Result<()> {
        log::info!("{}: connected (synthetic)", self.label);
        Ok(())
    }

    pub(crate) fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.limit.is_some_and(|limit| self.frame_count >= limit) {
            return Ok(None);
        }
        if let (Some(pace), Some(last)) = (self.pace, self.last_frame_at) {
            let elapsed = last.elapsed();
            if elapsed < pace {
                std::thread::sleep(pace - elapsed);
            }
        }

        let index = self.frame_count;
        self.frame_count += 1;
        self.last_frame_at = Some(Instant::now());

        let pixels = self.generate_synthetic_pixels();
        Frame::from_rgb(index, self.width, self.height, pixels).map(Some)
    }

    pub(crate) fn frames_captured(&self) -> u64 {
        self.frame_count
    }

    fn generate_synthetic_pixels(&mut self) -> Vec<u8> {
        let pixel_count = (self.width * self.height * 3) as usize;
        if self.frame_count % 50 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count + self.scene_state as u64) % 256) as u8;
        }
        pixels
    }
}
