use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use image::RgbImage;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;

/// One scripted reply.
#[derive(Clone, Debug)]
pub enum ScriptedResponse {
    Detections(Vec<Detection>),
    Failure(String),
}

/// Stub backend that replays a fixed script, one entry per `detect` call.
///
/// Once the script runs out every call returns no detections, so an empty
/// script behaves as a model that never fires.
#[derive(Default)]
pub struct StubBackend {
    script: Mutex<VecDeque<ScriptedResponse>>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = ScriptedResponse>,
    {
        Self {
            script: Mutex::new(responses.into_iter().collect()),
        }
    }

    /// Script that returns the given detections on successive frames.
    pub fn with_frames<I>(frames: I) -> Self
    where
        I: IntoIterator<Item = Vec<Detection>>,
    {
        Self::with_script(frames.into_iter().map(ScriptedResponse::Detections))
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().map(|s| s.len()).unwrap_or(0)
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&self, _image: &RgbImage) -> Result<Vec<Detection>> {
        let next = self
            .script
            .lock()
            .map_err(|_| anyhow!("stub script lock poisoned"))?
            .pop_front();
        match next {
            Some(ScriptedResponse::Detections(detections)) => Ok(detections),
            Some(ScriptedResponse::Failure(message)) => Err(anyhow!(message)),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::result::BoundingBox;
    use crate::labels::PpeClass;

    #[test]
    fn stub_backend_replays_script_then_goes_quiet() {
        let hardhat = Detection::new(
            PpeClass::Hardhat,
            0.9,
            BoundingBox::new(1.0, 1.0, 4.0, 4.0),
        );
        let backend = StubBackend::with_script([
            ScriptedResponse::Detections(vec![hardhat.clone()]),
            ScriptedResponse::Failure("inference exploded".into()),
        ]);
        let image = RgbImage::new(8, 8);

        assert_eq!(backend.detect(&image).unwrap(), vec![hardhat]);
        assert!(backend.detect(&image).is_err());
        assert!(backend.detect(&image).unwrap().is_empty());
        assert_eq!(backend.remaining(), 0);
    }
}
