//! Frame ingestion sources.
//!
//! This module provides the two media sources of the dashboard:
//! - Local video files, i.e. uploads (feature: ingest-file-ffmpeg)
//! - Live camera devices over V4L2 (feature: ingest-v4l2)
//!
//! Both accept `stub://` names that produce synthetic frames without FFmpeg
//! or hardware. Every source yields RGB `Frame`s through `FrameSource` and
//! reports end of stream as `Ok(None)`.

pub mod camera;
pub mod file;
#[cfg(feature = "ingest-file-ffmpeg")]
pub(crate) mod file_ffmpeg;
mod normalize;
mod synthetic;
#[cfg(feature = "ingest-v4l2")]
pub(crate) mod v4l2;

pub use camera::{CameraConfig, CameraSource};
pub use file::{FileConfig, FileSource, FileStats};
