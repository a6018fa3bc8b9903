//! Frame types flowing through the detection loop.
//!
//! - `Frame`: one decoded RGB image pulled from a source.
//! - `AnnotatedFrame`: what the loop hands to the presentation layer.
//! - `FrameSource`: anything that yields frames until end of stream.

use anyhow::{anyhow, Result};
use image::RgbImage;

use crate::tally::FrameTally;

/// Decoded RGB frame.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Zero-based position within its source.
    pub index: u64,
    pub image: RgbImage,
}

impl Frame {
    pub fn new(index: u64, image: RgbImage) -> Self {
        Self { index, image }
    }

    /// Build a frame from packed RGB24 bytes.
    pub fn from_rgb(index: u64, width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected,
                width,
                height,
                pixels.len()
            ));
        }
        let image = RgbImage::from_raw(width, height, pixels)
            .ok_or_else(|| anyhow!("RGB buffer does not fit {}x{}", width, height))?;
        Ok(Self { index, image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Output of one loop iteration.
#[derive(Clone, Debug)]
pub struct AnnotatedFrame {
    pub index: u64,
    /// Annotated copy, or the raw frame when `skipped` is set.
    pub image: RgbImage,
    pub tally: FrameTally,
    /// Throughput at this frame (0 on the first frame).
    pub fps: u32,
    /// Detection or annotation failed and the raw frame was passed through.
    pub skipped: bool,
}

/// A source of decoded frames.
///
/// `Ok(None)` signals end of stream. `Err` means the source itself failed
/// (device disconnected, container unreadable) and cannot continue.
pub trait FrameSource: Send {
    /// Human-readable source description for logs.
    fn describe(&self) -> String;

    /// Open the underlying device or file.
    fn connect(&mut self) -> Result<()>;

    /// Pull the next frame, blocking until one is decoded.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn connect(&mut self) -> Result<()> {
        (**self).connect()
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        (**self).next_frame()
    }
}

/// In-memory source over a fixed list of images.
pub struct VecSource {
    frames: std::vec::IntoIter<RgbImage>,
    next_index: u64,
    label: String,
}

impl VecSource {
    pub fn new(label: impl Into<String>, frames: Vec<RgbImage>) -> Self {
        Self {
            frames: frames.into_iter(),
            next_index: 0,
            label: label.into(),
        }
    }
}

impl FrameSource for VecSource {
    fn describe(&self) -> String {
        format!("memory:{}", self.label)
    }

    fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        Ok(self.frames.next().map(|image| {
            let frame = Frame::new(self.next_index, image);
            self.next_index += 1;
            frame
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgb_validates_length() {
        assert!(Frame::from_rgb(0, 2, 2, vec![0; 12]).is_ok());
        assert!(Frame::from_rgb(0, 2, 2, vec![0; 11]).is_err());
    }

    #[test]
    fn vec_source_numbers_frames_and_ends() -> Result<()> {
        let mut source = VecSource::new("t", vec![RgbImage::new(2, 2), RgbImage::new(2, 2)]);
        source.connect()?;
        assert_eq!(source.next_frame()?.unwrap().index, 0);
        assert_eq!(source.next_frame()?.unwrap().index, 1);
        assert!(source.next_frame()?.is_none());
        Ok(())
    }
}
