//! PPE Watch
//!
//! Detects personal protective equipment in video and camera feeds, draws the
//! detections onto each frame, and keeps a per-frame count of every class seen.
//!
//! # Module Structure
//!
//! - `labels`: The fixed set of ten PPE classes the model reports
//! - `detect`: Detector backends (tract ONNX, scripted stub) and the shared model cache
//! - `annotate`: Box and tag drawing, FPS overlay
//! - `tally`: Per-frame class counts and session totals
//! - `frame`, `ingest`: Frames and the file/camera sources that produce them
//! - `pipeline`: The per-frame loop (detect, annotate, tally, emit)
//! - `upload`: Temporary storage for uploaded videos
//! - `live`: Capture thread plus the latest-summary mailbox
//! - `sink`: Where annotated frames go
//! - `config`, `ui`: Runtime configuration and terminal output

pub mod annotate;
pub mod config;
pub mod detect;
pub mod frame;
mod glyphs;
pub mod ingest;
pub mod labels;
pub mod live;
pub mod pipeline;
pub mod sink;
pub mod tally;
pub mod throughput;
pub mod ui;
pub mod upload;

pub use annotate::Annotator;
pub use config::{CameraSettings, ModelSettings, PpeConfig};
pub use detect::{
    load_backend, shared_backend, BoundingBox, Detection, DetectorBackend, ModelCache,
    ModelHandle, ScriptedResponse, StubBackend,
};
pub use frame::{AnnotatedFrame, Frame, FrameSource, VecSource};
pub use ingest::{CameraConfig, CameraSource, FileConfig, FileSource, FileStats};
pub use labels::PpeClass;
pub use live::{summary_text, LiveSession, Snapshot, SummaryMailbox};
pub use pipeline::{
    process_upload, FrameLoop, FrameProcessor, LoopState, RunSummary, StopFlag, StopReason,
};
pub use sink::{DirectorySink, FrameSink, NullSink};
pub use tally::{FrameTally, SessionTally, NO_DETECTIONS};
pub use throughput::FpsMeter;
pub use upload::{container_extension, UploadedVideo, ALLOWED_EXTENSIONS};
