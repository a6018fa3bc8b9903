//! Frame annotation and tally loop.
//!
//! `FrameProcessor` handles one frame: detect, annotate, tally, throughput.
//! `FrameLoop` drives a `FrameSource` through the processor until the source
//! ends, fails, or a stop is requested:
//!
//! ```text
//! Initializing --connect--> Running --(eof | stop | source error)--> Stopped
//! ```
//!
//! Per-frame failures never leave `Running`; the raw frame is emitted with an
//! empty tally instead.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::annotate::Annotator;
use crate::detect::ModelHandle;
use crate::frame::{AnnotatedFrame, Frame, FrameSource};
use crate::sink::FrameSink;
use crate::tally::{FrameTally, SessionTally};
use crate::throughput::FpsMeter;
use crate::upload::UploadedVideo;

/// Why a loop stopped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The source has no more frames.
    EndOfStream,
    /// A stop was requested through the `StopFlag`.
    StopRequested,
    /// The source failed mid-stream (device gone, decode error).
    SourceFailed(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EndOfStream => f.write_str("end of stream"),
            StopReason::StopRequested => f.write_str("stop requested"),
            StopReason::SourceFailed(err) => write!(f, "source failed: {}", err),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoopState {
    Initializing,
    Running,
    Stopped(StopReason),
}

/// Shared stop request, checked once per iteration.
#[derive(Clone, Debug, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-frame detect, annotate, tally.
pub struct FrameProcessor {
    detector: ModelHandle,
    annotator: Annotator,
    meter: FpsMeter,
    show_fps: bool,
}

impl FrameProcessor {
    pub fn new(detector: ModelHandle, annotator: Annotator) -> Self {
        Self {
            detector,
            annotator,
            meter: FpsMeter::new(),
            show_fps: true,
        }
    }

    pub fn with_fps_overlay(mut self, show_fps: bool) -> Self {
        self.show_fps = show_fps;
        self
    }

    pub fn process(&mut self, frame: Frame) -> AnnotatedFrame {
        self.process_at(frame, Instant::now())
    }

    /// Process `frame` as if it arrived at `now`.
    pub fn process_at(&mut self, frame: Frame, now: Instant) -> AnnotatedFrame {
        let fps = self.meter.tick(now);

        let detections = match self.detector.detect(&frame.image) {
            Ok(detections) => detections,
            Err(err) => {
                log::warn!(
                    "frame {}: {} inference failed, passing frame through: {:#}",
                    frame.index,
                    self.detector.name(),
                    err
                );
                return passthrough(frame, fps);
            }
        };

        let mut image = match self.annotator.annotate(&frame.image, &detections) {
            Ok(image) => image,
            Err(err) => {
                log::warn!(
                    "frame {}: annotation failed, passing frame through: {:#}",
                    frame.index,
                    err
                );
                return passthrough(frame, fps);
            }
        };

        let tally = FrameTally::from_detections(&detections);
        if self.show_fps {
            self.annotator.draw_fps(&mut image, fps);
        }
        log::debug!("frame {}: {} fps, tally {}", frame.index, fps, tally);

        AnnotatedFrame {
            index: frame.index,
            image,
            tally,
            fps,
            skipped: false,
        }
    }
}

fn passthrough(frame: Frame, fps: u32) -> AnnotatedFrame {
    AnnotatedFrame {
        index: frame.index,
        image: frame.image,
        tally: FrameTally::new(),
        fps,
        skipped: true,
    }
}

/// Totals reported when a loop reaches `Stopped`.
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub frames_processed: u64,
    pub frames_skipped: u64,
    pub session: SessionTally,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
}

/// Drives a source through a `FrameProcessor` into a sink.
pub struct FrameLoop<S: FrameSource> {
    source: S,
    processor: FrameProcessor,
    stop: StopFlag,
    state: LoopState,
}

impl<S: FrameSource> FrameLoop<S> {
    pub fn new(source: S, processor: FrameProcessor, stop: StopFlag) -> Self {
        Self {
            source,
            processor,
            stop,
            state: LoopState::Initializing,
        }
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    /// Run until the source ends, fails, or a stop is requested.
    ///
    /// Errors only when the source cannot be opened. Sink failures are
    /// logged and the loop carries on.
    pub fn run(&mut self, sink: &mut dyn FrameSink) -> Result<RunSummary> {
        let started = Instant::now();
        let description = self.source.describe();
        self.source
            .connect()
            .with_context(|| format!("failed to open {}", description))?;
        self.state = LoopState::Running;
        log::info!("processing {}", description);

        let mut frames_processed = 0u64;
        let mut frames_skipped = 0u64;
        let mut session = SessionTally::default();

        let reason = loop {
            if self.stop.is_stop_requested() {
                break StopReason::StopRequested;
            }
            let frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break StopReason::EndOfStream,
                Err(err) => {
                    log::warn!("{} stopped delivering frames: {:#}", description, err);
                    break StopReason::SourceFailed(format!("{:#}", err));
                }
            };

            let annotated = self.processor.process(frame);
            frames_processed += 1;
            if annotated.skipped {
                frames_skipped += 1;
            }
            session.absorb(&annotated.tally);

            if let Err(err) = sink.emit(&annotated) {
                log::warn!("frame {}: presentation sink failed: {:#}", annotated.index, err);
            }
        };

        log::info!(
            "{} stopped after {} frames ({})",
            description,
            frames_processed,
            reason
        );
        self.state = LoopState::Stopped(reason.clone());
        Ok(RunSummary {
            frames_processed,
            frames_skipped,
            session,
            stop_reason: reason,
            elapsed: started.elapsed(),
        })
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

/// Run an uploaded video through the loop and remove its temporary storage.
///
/// `open` builds the source from the spooled file's path. The upload is
/// removed whether the run completes, fails to open, or is stopped.
pub fn process_upload<S, F>(
    upload: UploadedVideo,
    open: F,
    processor: FrameProcessor,
    stop: StopFlag,
    sink: &mut dyn FrameSink,
) -> Result<RunSummary>
where
    S: FrameSource,
    F: FnOnce(&std::path::Path) -> Result<S>,
{
    let outcome = open(upload.path()).and_then(|source| {
        let mut frame_loop = FrameLoop::new(source, processor, stop);
        frame_loop.run(sink)
    });

    match upload.close() {
        Ok(path) => log::debug!("removed upload storage {}", path.display()),
        Err(err) => log::warn!("{:#}", err),
    }
    outcome
}
