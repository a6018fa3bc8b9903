use std::sync::{Arc, Mutex, OnceLock};

use anyhow::{anyhow, Result};

use super::backend::DetectorBackend;

/// Shared, immutable handle to a loaded model.
pub type ModelHandle = Arc<dyn DetectorBackend>;

/// Lazily initialised model slot.
///
/// The first successful `get_or_load` stores the handle; every later call
/// returns the same `Arc`. Loading runs under `init` so concurrent first use
/// loads once. A failed load leaves the slot empty and returns the error.
pub struct ModelCache {
    slot: OnceLock<ModelHandle>,
    init: Mutex<()>,
}

static GLOBAL: ModelCache = ModelCache::new();

impl ModelCache {
    pub const fn new() -> Self {
        Self {
            slot: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    /// Process-wide model cache.
    pub fn global() -> &'static ModelCache {
        &GLOBAL
    }

    pub fn get(&self) -> Option<ModelHandle> {
        self.slot.get().cloned()
    }

    pub fn get_or_load<F>(&self, load: F) -> Result<ModelHandle>
    where
        F: FnOnce() -> Result<ModelHandle>,
    {
        if let Some(handle) = self.slot.get() {
            return Ok(handle.clone());
        }

        let _guard = self
            .init
            .lock()
            .map_err(|_| anyhow!("model cache init lock poisoned"))?;
        if let Some(handle) = self.slot.get() {
            return Ok(handle.clone());
        }

        let handle = load()?;
        log::info!("model cache: loaded {} backend", handle.name());
        // Cannot already be set: writers hold `init`.
        let _ = self.slot.set(handle.clone());
        Ok(handle)
    }
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new()
    }
}
