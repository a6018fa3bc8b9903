use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use image::{Rgb, RgbImage};

use ppe_watch::{
    process_upload, AnnotatedFrame, Annotator, FrameProcessor, NullSink, StopFlag, StopReason,
    StubBackend, UploadedVideo, VecSource,
};

fn processor() -> FrameProcessor {
    FrameProcessor::new(Arc::new(StubBackend::new()), Annotator::new())
}

fn clip(frames: usize) -> VecSource {
    VecSource::new("upload", vec![RgbImage::from_pixel(16, 16, Rgb([1, 2, 3])); frames])
}

#[test]
fn upload_is_removed_after_normal_completion() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let upload = UploadedVideo::spool_in(dir.path(), "site.mp4", &b"not really a video"[..])?;
    let spooled = upload.path().to_path_buf();

    let mut seen_path: Option<PathBuf> = None;
    let summary = process_upload(
        upload,
        |path| {
            assert!(path.exists());
            seen_path = Some(path.to_path_buf());
            Ok(clip(3))
        },
        processor(),
        StopFlag::new(),
        &mut NullSink,
    )?;

    assert_eq!(seen_path.as_deref(), Some(spooled.as_path()));
    assert_eq!(summary.frames_processed, 3);
    assert_eq!(summary.stop_reason, StopReason::EndOfStream);
    assert!(!spooled.exists());
    Ok(())
}

#[test]
fn upload_is_removed_after_forced_stop() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let upload = UploadedVideo::spool_in(dir.path(), "site.mov", &b"x"[..])?;
    let spooled = upload.path().to_path_buf();

    let stop = StopFlag::new();
    let sink_stop = stop.clone();
    let summary = process_upload(
        upload,
        |_| Ok(clip(10)),
        processor(),
        stop,
        &mut |_frame: &AnnotatedFrame| -> Result<()> {
            sink_stop.request_stop();
            Ok(())
        },
    )?;

    assert_eq!(summary.stop_reason, StopReason::StopRequested);
    assert!(summary.frames_processed < 10);
    assert!(!spooled.exists());
    Ok(())
}

#[test]
fn upload_is_removed_when_the_source_cannot_open() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let upload = UploadedVideo::spool_in(dir.path(), "site.avi", &b"x"[..])?;
    let spooled = upload.path().to_path_buf();

    let result = process_upload(
        upload,
        |_| -> Result<VecSource> { Err(anyhow!("unsupported codec")) },
        processor(),
        StopFlag::new(),
        &mut NullSink,
    );

    assert!(result.is_err());
    assert!(!spooled.exists());
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}
