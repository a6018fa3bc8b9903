use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ingest::CameraConfig;

const DEFAULT_MODEL_PATH: &str = "best.onnx";
const DEFAULT_MODEL_INPUT: u32 = 640;
const DEFAULT_CONFIDENCE: f32 = 0.25;
const DEFAULT_IOU: f32 = 0.45;
const DEFAULT_CAMERA_DEVICE: &str = "/dev/video0";
const DEFAULT_CAMERA_FPS: u32 = 15;
const DEFAULT_CAMERA_WIDTH: u32 = 640;
const DEFAULT_CAMERA_HEIGHT: u32 = 480;
const DEFAULT_REFRESH_MS: u64 = 1000;

#[derive(Debug, Deserialize, Default)]
struct PpeConfigFile {
    model: Option<ModelConfigFile>,
    camera: Option<CameraConfigFile>,
    live: Option<LiveConfigFile>,
    overlay: Option<OverlayConfigFile>,
    output: Option<OutputConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelConfigFile {
    path: Option<String>,
    input_size: Option<u32>,
    confidence: Option<f32>,
    iou: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    device: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct LiveConfigFile {
    refresh_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct OverlayConfigFile {
    font_path: Option<PathBuf>,
    show_fps: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct OutputConfigFile {
    dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct PpeConfig {
    pub model: ModelSettings,
    pub camera: CameraSettings,
    /// How often the live summary is redrawn.
    pub refresh: Duration,
    pub font_path: Option<PathBuf>,
    pub show_fps: bool,
    /// Where annotated frames are written; `None` discards them.
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    /// ONNX weights, or `stub://name` for a detector that finds nothing.
    pub path: String,
    pub input_size: u32,
    pub confidence: f32,
    pub iou: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraSettings {
    pub device: String,
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
}

impl CameraSettings {
    pub fn to_camera_config(&self) -> CameraConfig {
        CameraConfig {
            device: self.device.clone(),
            target_fps: self.target_fps,
            width: self.width,
            height: self.height,
        }
    }
}

impl Default for PpeConfig {
    fn default() -> Self {
        // Every field of an empty file falls back to its default.
        Self::from_file(PpeConfigFile::default())
    }
}

impl PpeConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("PPE_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: PpeConfigFile) -> Self {
        let model_file = file.model.unwrap_or_default();
        let model = ModelSettings {
            path: model_file
                .path
                .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string()),
            input_size: model_file.input_size.unwrap_or(DEFAULT_MODEL_INPUT),
            confidence: model_file.confidence.unwrap_or(DEFAULT_CONFIDENCE),
            iou: model_file.iou.unwrap_or(DEFAULT_IOU),
        };
        let camera_file = file.camera.unwrap_or_default();
        let camera = CameraSettings {
            device: camera_file
                .device
                .unwrap_or_else(|| DEFAULT_CAMERA_DEVICE.to_string()),
            target_fps: camera_file.target_fps.unwrap_or(DEFAULT_CAMERA_FPS),
            width: camera_file.width.unwrap_or(DEFAULT_CAMERA_WIDTH),
            height: camera_file.height.unwrap_or(DEFAULT_CAMERA_HEIGHT),
        };
        let refresh = Duration::from_millis(
            file.live
                .and_then(|live| live.refresh_ms)
                .unwrap_or(DEFAULT_REFRESH_MS),
        );
        let overlay = file.overlay.unwrap_or_default();
        Self {
            model,
            camera,
            refresh,
            font_path: overlay.font_path,
            show_fps: overlay.show_fps.unwrap_or(true),
            output_dir: file.output.and_then(|output| output.dir),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("PPE_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.model.path = path;
            }
        }
        if let Ok(size) = std::env::var("PPE_MODEL_INPUT") {
            self.model.input_size = size
                .trim()
                .parse()
                .map_err(|_| anyhow!("PPE_MODEL_INPUT must be an integer pixel size"))?;
        }
        if let Ok(conf) = std::env::var("PPE_CONFIDENCE") {
            self.model.confidence = conf
                .trim()
                .parse()
                .map_err(|_| anyhow!("PPE_CONFIDENCE must be a number between 0 and 1"))?;
        }
        if let Ok(device) = std::env::var("PPE_CAMERA_DEVICE") {
            if !device.trim().is_empty() {
                self.camera.device = device;
            }
        }
        if let Ok(refresh) = std::env::var("PPE_REFRESH_MS") {
            let millis: u64 = refresh
                .trim()
                .parse()
                .map_err(|_| anyhow!("PPE_REFRESH_MS must be an integer number of milliseconds"))?;
            self.refresh = Duration::from_millis(millis);
        }
        if let Ok(path) = std::env::var("PPE_FONT_PATH") {
            if !path.trim().is_empty() {
                self.font_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(dir) = std::env::var("PPE_OUTPUT_DIR") {
            if !dir.trim().is_empty() {
                self.output_dir = Some(PathBuf::from(dir));
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.model.path.trim().is_empty() {
            return Err(anyhow!("model path must not be empty"));
        }
        if self.model.input_size == 0 || self.model.input_size % 32 != 0 {
            return Err(anyhow!(
                "model input size must be a positive multiple of 32 (got {})",
                self.model.input_size
            ));
        }
        if !(self.model.confidence > 0.0 && self.model.confidence <= 1.0) {
            return Err(anyhow!("confidence threshold must be in (0, 1]"));
        }
        if !(self.model.iou > 0.0 && self.model.iou <= 1.0) {
            return Err(anyhow!("IoU threshold must be in (0, 1]"));
        }
        if self.camera.target_fps == 0 {
            return Err(anyhow!("camera target_fps must be greater than zero"));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!("camera resolution must be non-zero"));
        }
        if self.refresh.is_zero() {
            return Err(anyhow!("live refresh interval must be greater than zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<PpeConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = PpeConfig::default();
        assert_eq!(cfg.model.path, "best.onnx");
        assert_eq!(cfg.model.input_size, 640);
        assert_eq!(cfg.camera.device, "/dev/video0");
        assert_eq!(cfg.refresh, Duration::from_secs(1));
        assert!(cfg.show_fps);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        let mut cfg = PpeConfig::default();
        cfg.model.confidence = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = PpeConfig::default();
        cfg.model.iou = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = PpeConfig::default();
        cfg.model.input_size = 600;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unknown_sections_are_ignored_but_bad_types_are_not() {
        let ok: PpeConfigFile = serde_json::from_str(r#"{"extra": 1}"#).unwrap();
        assert!(ok.model.is_none());
        assert!(serde_json::from_str::<PpeConfigFile>(r#"{"model": {"input_size": "big"}}"#).is_err());
    }
}
