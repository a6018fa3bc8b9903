use anyhow::Result;
use image::RgbImage;

use crate::detect::result::Detection;

/// Detector backend trait.
///
/// Backends wrap an externally trained model. They must treat the image as
/// read-only and keep no reference to it after `detect` returns.
///
/// `detect` takes `&self` so a loaded model can be shared across threads as an
/// immutable handle (see `ModelCache`).
pub trait DetectorBackend: Send + Sync {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on one RGB frame. Output order is unspecified.
    fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>>;

    /// Optional warm-up hook, run once after load.
    fn warm_up(&self) -> Result<()> {
        Ok(())
    }
}
