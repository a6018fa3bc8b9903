//! ppe_watch - PPE detection over a video file or a live camera
//!
//! `video` runs an uploaded clip through the detector frame by frame and
//! prints the run summary. `live` captures from a camera on a background
//! thread and redraws the latest detection summary on a fixed cadence.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use ppe_watch::ui::{Ui, UiMode};
use ppe_watch::{
    process_upload, shared_backend, summary_text, AnnotatedFrame, Annotator, CameraSource,
    DirectorySink, FileConfig, FileSource, FrameLoop, FrameProcessor, FrameSink, LiveSession,
    NullSink, PpeConfig, RunSummary, StopFlag, UploadedVideo,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Terminal output style.
    #[arg(long, value_enum, default_value_t = UiMode::Auto, global = true)]
    ui: UiMode,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process an mp4/avi/mov file (or a stub:// clip).
    Video {
        file: String,
        /// Write annotated frames here as numbered JPEGs.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Do not draw the FPS counter.
        #[arg(long)]
        no_fps: bool,
    },
    /// Capture from a camera and show the live summary.
    Live {
        /// Camera device path or stub://name.
        #[arg(long)]
        device: Option<String>,
        /// Stop after this many seconds (default: until Ctrl-C).
        #[arg(long)]
        seconds: Option<u64>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let ui = Ui::new(args.ui, std::io::stderr().is_terminal());
    let mut cfg = PpeConfig::load()?;

    let model = {
        let _stage = ui.stage("load model");
        shared_backend(&cfg.model)?
    };
    log::info!("detector {} ready ({})", model.name(), cfg.model.path);

    let mut annotator = Annotator::new();
    if let Some(font) = &cfg.font_path {
        annotator = annotator.with_font_file(font)?;
    }

    let stop = StopFlag::new();
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || {
        handler_stop.request_stop();
    })
    .context("error setting Ctrl-C handler")?;

    match args.command {
        Command::Video {
            file,
            output,
            no_fps,
        } => {
            if no_fps {
                cfg.show_fps = false;
            }
            if output.is_some() {
                cfg.output_dir = output;
            }
            let processor = FrameProcessor::new(model, annotator).with_fps_overlay(cfg.show_fps);
            let summary = run_video(&ui, &cfg, &file, processor, stop)?;
            report(&summary);
            println!(
                "Video processing completed: {} frames processed",
                summary.frames_processed
            );
        }
        Command::Live { device, seconds } => {
            if let Some(device) = device {
                cfg.camera.device = device;
            }
            let processor = FrameProcessor::new(model, annotator).with_fps_overlay(cfg.show_fps);
            let summary = run_live(&ui, &cfg, seconds, processor, stop)?;
            report(&summary);
        }
    }
    Ok(())
}

fn output_sink(cfg: &PpeConfig) -> Result<Box<dyn FrameSink>> {
    match &cfg.output_dir {
        Some(dir) => {
            log::info!("annotated frames will be written to {}", dir.display());
            Ok(Box::new(DirectorySink::create(dir)?))
        }
        None => Ok(Box::new(NullSink)),
    }
}

fn run_video(
    ui: &Ui,
    cfg: &PpeConfig,
    file: &str,
    processor: FrameProcessor,
    stop: StopFlag,
) -> Result<RunSummary> {
    let mut sink = output_sink(cfg)?;
    let mut panel = ui.summary_panel();

    let summary = {
        let mut emit = |frame: &AnnotatedFrame| -> Result<()> {
            panel.update(&summary_text(&frame.tally));
            sink.emit(frame)
        };

        if file.starts_with("stub://") {
            let _stage = ui.stage("process video");
            let source = FileSource::new(FileConfig::new(file))?;
            FrameLoop::new(source, processor, stop).run(&mut emit)?
        } else {
            let upload = {
                let _stage = ui.stage("store upload");
                UploadedVideo::from_local_file(file)?
            };
            let _stage = ui.stage("process video");
            process_upload(
                upload,
                |path| FileSource::new(FileConfig::new(path.to_string_lossy().into_owned())),
                processor,
                stop,
                &mut emit,
            )?
        }
    };
    panel.finish(&format!("stopped: {}", summary.stop_reason));
    Ok(summary)
}

fn run_live(
    ui: &Ui,
    cfg: &PpeConfig,
    seconds: Option<u64>,
    processor: FrameProcessor,
    stop: StopFlag,
) -> Result<RunSummary> {
    let source = CameraSource::new(cfg.camera.to_camera_config())?;
    let session = LiveSession::start(source, processor, stop, output_sink(cfg)?)?;

    let deadline = seconds.map(|s| Instant::now() + Duration::from_secs(s));
    let mut panel = ui.summary_panel();
    session.refresh(cfg.refresh, deadline, |snapshot| {
        panel.show(snapshot.sequence, &snapshot.text)
    });

    let summary = session.stop()?;
    panel.finish(&format!("stopped: {}", summary.stop_reason));
    Ok(summary)
}

fn report(summary: &RunSummary) {
    println!(
        "frames: {} processed, {} skipped in {:.1}s ({})",
        summary.frames_processed,
        summary.frames_skipped,
        summary.elapsed.as_secs_f64(),
        summary.stop_reason
    );
    let totals = summary.session.totals();
    if totals.is_empty() {
        println!("{}", totals.summary());
    } else {
        println!(
            "Session totals across {} frames with detections",
            summary.session.frames_with_detections()
        );
        println!("{}", totals.summary());
        let missing: Vec<&str> = totals
            .iter()
            .filter(|(class, _)| class.is_violation())
            .map(|(class, _)| class.as_str())
            .collect();
        if !missing.is_empty() {
            println!(
                "PPE violations: {} ({})",
                totals.violations(),
                missing.join(", ")
            );
        }
    }
}
