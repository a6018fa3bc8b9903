//! Live camera session.
//!
//! The camera is read on a dedicated capture thread. Each frame goes through
//! the `FrameProcessor` in the capture callback, which then posts the frame's
//! summary into a single-slot `SummaryMailbox`. A refresh loop on the caller's
//! thread polls the mailbox on a fixed cadence and renders whatever is newest.
//! The mailbox never queues, so a slow consumer only ever skips summaries.

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};

use crate::frame::{AnnotatedFrame, FrameSource};
use crate::pipeline::{FrameLoop, FrameProcessor, RunSummary, StopFlag};
use crate::sink::FrameSink;
use crate::tally::FrameTally;

/// Heading shown above a non-empty tally.
pub const SUMMARY_HEADING: &str = "Detection Summary";

/// Render the text block the dashboard shows for one frame's tally.
pub fn summary_text(tally: &FrameTally) -> String {
    if tally.is_empty() {
        tally.summary()
    } else {
        format!("{}\n{}", SUMMARY_HEADING, tally.summary())
    }
}

/// Latest posted summary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    /// Increments on every post; lets a poller tell new from repeated.
    pub sequence: u64,
    pub frame_index: u64,
    pub tally: FrameTally,
    pub text: String,
}

/// Single-slot, last-write-wins summary slot shared between the capture
/// thread and the refresh loop. The lock is held only to swap or clone.
#[derive(Clone, Debug, Default)]
pub struct SummaryMailbox {
    slot: Arc<Mutex<Option<Snapshot>>>,
}

impl SummaryMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Snapshot>> {
        // A poisoned slot still holds a complete snapshot.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the slot with this frame's summary.
    pub fn post(&self, frame_index: u64, tally: &FrameTally) {
        let text = summary_text(tally);
        let mut slot = self.lock();
        let sequence = slot.as_ref().map_or(1, |s| s.sequence + 1);
        *slot = Some(Snapshot {
            sequence,
            frame_index,
            tally: tally.clone(),
            text,
        });
    }

    /// Most recent snapshot, if any frame has been posted.
    pub fn latest(&self) -> Option<Snapshot> {
        self.lock().clone()
    }
}

/// A running camera session.
pub struct LiveSession {
    mailbox: SummaryMailbox,
    stop: StopFlag,
    worker: Option<JoinHandle<Result<RunSummary>>>,
}

impl LiveSession {
    /// Start capturing from `source` on a new thread.
    ///
    /// Every annotated frame is forwarded to `sink` after its summary has been
    /// posted to the mailbox. Raising `stop` ends the capture loop.
    pub fn start<S>(
        source: S,
        processor: FrameProcessor,
        stop: StopFlag,
        mut sink: Box<dyn FrameSink>,
    ) -> Result<Self>
    where
        S: FrameSource + 'static,
    {
        let mailbox = SummaryMailbox::new();

        let worker_mailbox = mailbox.clone();
        let worker_stop = stop.clone();
        let worker = thread::Builder::new()
            .name("ppe-capture".to_string())
            .spawn(move || {
                let mut frame_loop = FrameLoop::new(source, processor, worker_stop);
                let mut callback = |frame: &AnnotatedFrame| -> Result<()> {
                    worker_mailbox.post(frame.index, &frame.tally);
                    sink.emit(frame)
                };
                frame_loop.run(&mut callback)
            })
            .context("failed to spawn capture thread")?;

        Ok(Self {
            mailbox,
            stop,
            worker: Some(worker),
        })
    }

    pub fn mailbox(&self) -> SummaryMailbox {
        self.mailbox.clone()
    }

    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    /// True once the capture thread has exited.
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, |w| w.is_finished())
    }

    /// Poll the mailbox every `cadence` and hand the newest snapshot to
    /// `render`, until a stop is requested, capture ends, or `deadline`
    /// passes. Returns the number of renders.
    pub fn refresh<F>(&self, cadence: Duration, deadline: Option<Instant>, mut render: F) -> u64
    where
        F: FnMut(&Snapshot),
    {
        let mut renders = 0;
        loop {
            thread::sleep(cadence);
            if let Some(snapshot) = self.mailbox.latest() {
                render(&snapshot);
                renders += 1;
            }
            if self.stop.is_stop_requested() || self.is_finished() {
                break;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                break;
            }
        }
        renders
    }

    /// Request a stop and wait for the capture thread.
    pub fn stop(mut self) -> Result<RunSummary> {
        self.stop.request_stop();
        self.join()
    }

    fn join(&mut self) -> Result<RunSummary> {
        let worker = self
            .worker
            .take()
            .ok_or_else(|| anyhow!("capture thread already joined"))?;
        worker
            .join()
            .map_err(|_| anyhow!("capture thread panicked"))?
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.stop.request_stop();
            if let Err(err) = self.join() {
                log::warn!("live session ended with error: {:#}", err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::Annotator;
    use crate::detect::{BoundingBox, Detection, StubBackend};
    use crate::ingest::{CameraConfig, CameraSource};
    use crate::labels::PpeClass;
    use crate::pipeline::StopReason;
    use crate::sink::NullSink;

    fn det(class: PpeClass) -> Detection {
        Detection::new(class, 0.7, BoundingBox::new(2.0, 2.0, 20.0, 20.0))
    }

    #[test]
    fn mailbox_keeps_only_latest_summary() {
        let mailbox = SummaryMailbox::new();
        assert!(mailbox.latest().is_none());

        mailbox.post(0, &FrameTally::from_detections(&[det(PpeClass::Hardhat)]));
        mailbox.post(1, &FrameTally::new());

        let latest = mailbox.latest().unwrap();
        assert_eq!(latest.sequence, 2);
        assert_eq!(latest.frame_index, 1);
        assert_eq!(latest.text, "No PPE detected");
    }

    #[test]
    fn summary_text_has_heading_when_non_empty() {
        let tally = FrameTally::from_detections(&[det(PpeClass::NoHardhat), det(PpeClass::NoHardhat)]);
        assert_eq!(summary_text(&tally), "Detection Summary\nNO-Hardhat: 2");
    }

    #[test]
    fn live_session_publishes_and_stops() -> Result<()> {
        let backend = StubBackend::with_frames([vec![det(PpeClass::Person)]]);
        let processor = FrameProcessor::new(Arc::new(backend), Annotator::new());
        let source = CameraSource::new(CameraConfig {
            device: "stub://cam".to_string(),
            target_fps: 100,
            width: 32,
            height: 24,
        })?;

        let session = LiveSession::start(source, processor, StopFlag::new(), Box::new(NullSink))?;
        let mut rendered = Vec::new();
        let deadline = Instant::now() + Duration::from_millis(200);
        session.refresh(Duration::from_millis(50), Some(deadline), |snapshot| {
            rendered.push(snapshot.sequence)
        });
        assert!(!rendered.is_empty());
        assert!(rendered.windows(2).all(|w| w[0] <= w[1]));

        let summary = session.stop()?;
        assert_eq!(summary.stop_reason, StopReason::StopRequested);
        assert!(summary.frames_processed >= 1);
        assert_eq!(summary.session.totals().get(PpeClass::Person), 1);
        Ok(())
    }
}
