//! Local video file frame source.
//!
//! `FileSource` decodes a local video file (mp4/avi/mov) frame by frame. Real
//! files go through FFmpeg (feature: ingest-file-ffmpeg). Paths of the form
//! `stub://name` or `stub://name?frames=N` produce a bounded synthetic clip
//! for tests and demos.

use anyhow::{anyhow, Result};

#[cfg(feature = "ingest-file-ffmpeg")]
use super::file_ffmpeg::FfmpegFileSource;
use super::synthetic::SyntheticSource;
use crate::frame::{Frame, FrameSource};

const DEFAULT_SYNTHETIC_FRAMES: u64 = 30;

/// Configuration for a local file source.
#[derive(Clone, Debug)]
pub struct FileConfig {
    /// Local file path (e.g., "/tmp/.tmpXYZ.mp4").
    pub path: String,
    /// Frame size for synthetic clips. Real files use their own size.
    pub width: u32,
    pub height: u32,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            width: 640,
            height: 480,
        }
    }
}

impl FileConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

/// Local file frame source.
pub struct FileSource {
    path: String,
    backend: FileBackend,
}

enum FileBackend {
    Synthetic(SyntheticSource),
    #[cfg(feature = "ingest-file-ffmpeg")]
    Ffmpeg(FfmpegFileSource),
}

impl FileSource {
    pub fn new(config: FileConfig) -> Result<Self> {
        if !is_local_file_path(&config.path) {
            return Err(anyhow!(
                "file ingestion only supports local paths (no URL schemes)"
            ));
        }
        if config.path.starts_with("stub://") {
            let frames = synthetic_frame_count(&config.path)?;
            let label = format!("FileSource {}", config.path);
            Ok(Self {
                path: config.path.clone(),
                backend: FileBackend::Synthetic(SyntheticSource::new(
                    &label,
                    config.width,
                    config.height,
                    Some(frames),
                )),
            })
        } else {
            #[cfg(feature = "ingest-file-ffmpeg")]
            {
                Ok(Self {
                    path: config.path.clone(),
                    backend: FileBackend::Ffmpeg(FfmpegFileSource::new(config)?),
                })
            }
            #[cfg(not(feature = "ingest-file-ffmpeg"))]
            {
                Err(anyhow!(
                    "file ingestion requires the ingest-file-ffmpeg feature"
                ))
            }
        }
    }

    /// Get frame statistics.
    pub fn stats(&self) -> FileStats {
        let frames_captured = match &self.backend {
            FileBackend::Synthetic(source) => source.frames_captured(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.frames_captured(),
        };
        FileStats {
            frames_captured,
            path: self.path.clone(),
        }
    }
}

impl FrameSource for FileSource {
    fn describe(&self) -> String {
        format!("file {}", self.path)
    }

    fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            FileBackend::Synthetic(source) => source.connect(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.connect(),
        }
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        match &mut self.backend {
            FileBackend::Synthetic(source) => source.next_frame(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.next_frame(),
        }
    }
}

/// Statistics for a file source.
#[derive(Clone, Debug)]
pub struct FileStats {
    pub frames_captured: u64,
    pub path: String,
}

fn is_local_file_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    if path.starts_with("stub://") {
        return true;
    }
    !path.contains("://")
}

fn synthetic_frame_count(path: &str) -> Result<u64> {
    let Some((_, query)) = path.split_once('?') else {
        return Ok(DEFAULT_SYNTHETIC_FRAMES);
    };
    for pair in query.split('&') {
        if let Some(value) = pair.strip_prefix("frames=") {
            return value
                .parse()
                .map_err(|_| anyhow!("invalid synthetic frame count '{}'", value));
        }
    }
    Ok(DEFAULT_SYNTHETIC_FRAMES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_remote_urls() {
        assert!(FileSource::new(FileConfig::new("https://example.com/a.mp4")).is_err());
        assert!(FileSource::new(FileConfig::new("  ")).is_err());
    }

    #[test]
    fn synthetic_clip_honours_frame_count() -> Result<()> {
        let mut source = FileSource::new(FileConfig {
            path: "stub://clip?frames=3".to_string(),
            width: 32,
            height: 24,
        })?;
        source.connect()?;
        let mut seen = 0;
        while let Some(frame) = source.next_frame()? {
            assert_eq!(frame.width(), 32);
            seen += 1;
        }
        assert_eq!(seen, 3);
        assert_eq!(source.stats().frames_captured, 3);
        Ok(())
    }

    #[test]
    fn synthetic_clip_defaults_length() -> Result<()> {
        assert_eq!(synthetic_frame_count("stub://clip")?, DEFAULT_SYNTHETIC_FRAMES);
        assert!(synthetic_frame_count("stub://clip?frames=x").is_err());
        Ok(())
    }
}
