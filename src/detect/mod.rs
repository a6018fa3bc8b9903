mod backend;
pub mod backends;
mod cache;
pub mod postprocess;
mod result;

use std::sync::Arc;

use anyhow::{anyhow, Result};

pub use backend::DetectorBackend;
pub use backends::{ScriptedResponse, StubBackend};
pub use cache::{ModelCache, ModelHandle};
pub use result::{BoundingBox, Detection};

use crate::config::ModelSettings;

/// Load the backend named by `settings.path`.
///
/// `stub://` paths load a quiet stub (no detections). Anything else is an
/// ONNX weights file and needs the `backend-tract` feature. Errors here are
/// fatal at startup.
pub fn load_backend(settings: &ModelSettings) -> Result<ModelHandle> {
    if settings.path.starts_with("stub://") {
        log::warn!("model {} is a stub; no detections will be reported", settings.path);
        return Ok(Arc::new(StubBackend::new()));
    }

    #[cfg(feature = "backend-tract")]
    {
        let backend = backends::TractBackend::new(&settings.path, settings.input_size)?
            .with_thresholds(settings.confidence, settings.iou);
        backend.warm_up()?;
        Ok(Arc::new(backend))
    }
    #[cfg(not(feature = "backend-tract"))]
    {
        Err(anyhow!(
            "loading {} requires the backend-tract feature",
            settings.path
        ))
    }
}

/// Load through the process-wide cache so every session shares one model.
pub fn shared_backend(settings: &ModelSettings) -> Result<ModelHandle> {
    load_cached(ModelCache::global(), settings)
}

fn load_cached(cache: &ModelCache, settings: &ModelSettings) -> Result<ModelHandle> {
    cache
        .get_or_load(|| load_backend(settings))
        .map_err(|e| anyhow!("failed to load detection model {}: {:#}", settings.path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(path: &str) -> ModelSettings {
        ModelSettings {
            path: path.to_string(),
            input_size: 640,
            confidence: 0.25,
            iou: 0.45,
        }
    }

    #[test]
    fn missing_weights_fail_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.onnx");
        let err = load_backend(&settings(&path.to_string_lossy())).err().unwrap();
        assert!(format!("{:#}", err).contains("absent.onnx"));
    }

    #[cfg(feature = "backend-tract")]
    #[test]
    fn corrupt_weights_fail_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.onnx");
        std::fs::write(&path, b"not a protobuf").unwrap();
        assert!(load_backend(&settings(&path.to_string_lossy())).is_err());
    }

    #[test]
    fn cached_load_error_names_the_model_path_and_keeps_cache_empty() {
        let cache = ModelCache::new();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.onnx").to_string_lossy().into_owned();

        let err = load_cached(&cache, &settings(&path)).err().unwrap();
        assert!(err.to_string().contains(&path));
        assert!(cache.get().is_none());
    }

    #[test]
    fn stub_model_loads_once_through_cache() {
        let cache = ModelCache::new();
        let first = load_cached(&cache, &settings("stub://quiet")).unwrap();
        let second = load_cached(&cache, &settings("stub://other")).unwrap();
        assert_eq!(first.name(), "stub");
        assert!(Arc::ptr_eq(&first, &second));
    }
}
