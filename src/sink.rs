//! Presentation-layer seam.
//!
//! The loop emits every `AnnotatedFrame` to a `FrameSink`. Rendering is an
//! external concern; the sinks here either write frames to disk for viewing
//! or discard them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::ImageFormat;

use crate::frame::AnnotatedFrame;

pub trait FrameSink: Send {
    fn emit(&mut self, frame: &AnnotatedFrame) -> Result<()>;
}

impl<F> FrameSink for F
where
    F: FnMut(&AnnotatedFrame) -> Result<()> + Send,
{
    fn emit(&mut self, frame: &AnnotatedFrame) -> Result<()> {
        self(frame)
    }
}

/// Drops frames. Tallies still reach the log and the summary mailbox.
#[derive(Debug, Default)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn emit(&mut self, _frame: &AnnotatedFrame) -> Result<()> {
        Ok(())
    }
}

/// Writes each annotated frame as `frame_NNNNNN.jpg` under a directory.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    written: u64,
}

impl DirectorySink {
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
        Ok(Self { dir, written: 0 })
    }

    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame_{:06}.jpg", index))
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

impl FrameSink for DirectorySink {
    fn emit(&mut self, frame: &AnnotatedFrame) -> Result<()> {
        let path = self.frame_path(frame.index);
        frame
            .image
            .save_with_format(&path, ImageFormat::Jpeg)
            .with_context(|| format!("failed to write {}", path.display()))?;
        self.written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tally::FrameTally;
    use image::RgbImage;

    fn annotated(index: u64) -> AnnotatedFrame {
        AnnotatedFrame {
            index,
            image: RgbImage::new(16, 12),
            tally: FrameTally::new(),
            fps: 0,
            skipped: false,
        }
    }

    #[test]
    fn directory_sink_writes_numbered_jpegs() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut sink = DirectorySink::create(dir.path().join("out"))?;
        sink.emit(&annotated(0))?;
        sink.emit(&annotated(7))?;

        assert_eq!(sink.written(), 2);
        let decoded = image::open(dir.path().join("out/frame_000007.jpg"))?;
        assert_eq!((decoded.width(), decoded.height()), (16, 12));
        Ok(())
    }

    #[test]
    fn closures_are_sinks() -> Result<()> {
        let mut seen = Vec::new();
        {
            let mut sink = |frame: &AnnotatedFrame| -> Result<()> {
                seen.push(frame.index);
                Ok(())
            };
            sink.emit(&annotated(3))?;
        }
        assert_eq!(seen, vec![3]);
        Ok(())
    }
}
