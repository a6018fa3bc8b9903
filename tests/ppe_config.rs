use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use ppe_watch::config::PpeConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "PPE_CONFIG",
        "PPE_MODEL_PATH",
        "PPE_MODEL_INPUT",
        "PPE_CONFIDENCE",
        "PPE_CAMERA_DEVICE",
        "PPE_REFRESH_MS",
        "PPE_FONT_PATH",
        "PPE_OUTPUT_DIR",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "model": {
            "path": "weights/ppe.onnx",
            "input_size": 416,
            "confidence": 0.4,
            "iou": 0.5
        },
        "camera": {
            "device": "/dev/video2",
            "target_fps": 30,
            "width": 1280,
            "height": 720
        },
        "live": { "refresh_ms": 500 },
        "overlay": { "show_fps": false },
        "output": { "dir": "annotated" }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("PPE_CONFIG", file.path());
    std::env::set_var("PPE_CAMERA_DEVICE", "stub://yard");
    std::env::set_var("PPE_REFRESH_MS", "2000");

    let cfg = PpeConfig::load().expect("load config");

    assert_eq!(cfg.model.path, "weights/ppe.onnx");
    assert_eq!(cfg.model.input_size, 416);
    assert_eq!(cfg.model.confidence, 0.4);
    assert_eq!(cfg.model.iou, 0.5);
    assert_eq!(cfg.camera.device, "stub://yard");
    assert_eq!(cfg.camera.target_fps, 30);
    assert_eq!(cfg.camera.width, 1280);
    assert_eq!(cfg.camera.height, 720);
    assert_eq!(cfg.refresh, Duration::from_secs(2));
    assert!(!cfg.show_fps);
    assert_eq!(cfg.output_dir.unwrap().to_str(), Some("annotated"));
    assert!(cfg.font_path.is_none());

    clear_env();
}

#[test]
fn defaults_apply_without_a_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = PpeConfig::load().expect("load defaults");
    assert_eq!(cfg.model.path, "best.onnx");
    assert_eq!(cfg.model.confidence, 0.25);
    assert_eq!(cfg.model.iou, 0.45);
    assert_eq!(cfg.camera.to_camera_config().device, "/dev/video0");
    assert_eq!(cfg.refresh, Duration::from_millis(1000));
    assert!(cfg.output_dir.is_none());

    clear_env();
}

#[test]
fn rejects_invalid_env_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("PPE_CONFIDENCE", "high");
    assert!(PpeConfig::load().is_err());
    clear_env();

    std::env::set_var("PPE_CONFIDENCE", "1.5");
    assert!(PpeConfig::load().is_err());
    clear_env();

    std::env::set_var("PPE_REFRESH_MS", "0");
    assert!(PpeConfig::load().is_err());
    clear_env();

    std::env::set_var("PPE_MODEL_INPUT", "500");
    assert!(PpeConfig::load().is_err());
    clear_env();
}

#[test]
fn missing_config_file_is_an_error() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let dir = tempfile::tempdir().expect("temp dir");
    std::env::set_var("PPE_CONFIG", dir.path().join("absent.json"));
    let err = PpeConfig::load().unwrap_err();
    assert!(err.to_string().contains("failed to read config file"));

    clear_env();
}
