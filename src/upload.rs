//! Temporary storage for uploaded videos.
//!
//! An upload is spooled into a named temporary file so the decoder can open
//! it by path. The file lives exactly as long as the `UploadedVideo`: it is
//! removed on `close()` or on drop, including during unwinding.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tempfile::{Builder, NamedTempFile};

/// Container types the dashboard accepts.
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["mp4", "avi", "mov"];

/// Validate an upload's file name and return its lowercase extension.
pub fn container_extension(file_name: &str) -> Result<String> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .ok_or_else(|| anyhow!("upload '{}' has no file extension", file_name))?;
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(anyhow!(
            "upload '{}' is not a supported video ({})",
            file_name,
            ALLOWED_EXTENSIONS.join(", ")
        ));
    }
    Ok(ext)
}

/// An uploaded video spooled to temporary storage.
pub struct UploadedVideo {
    file: NamedTempFile,
    original_name: String,
    bytes: u64,
}

impl UploadedVideo {
    /// Spool `reader` into the system temp directory.
    pub fn spool<R: Read>(file_name: &str, reader: R) -> Result<Self> {
        Self::spool_in(std::env::temp_dir(), file_name, reader)
    }

    /// Spool `reader` into `dir`.
    pub fn spool_in<P: AsRef<Path>, R: Read>(dir: P, file_name: &str, mut reader: R) -> Result<Self> {
        let ext = container_extension(file_name)?;
        let suffix = format!(".{}", ext);
        let mut file = Builder::new()
            .prefix("ppe-upload-")
            .suffix(&suffix)
            .tempfile_in(dir.as_ref())
            .with_context(|| {
                format!("failed to create upload storage in {}", dir.as_ref().display())
            })?;
        let bytes = io::copy(&mut reader, file.as_file_mut())
            .with_context(|| format!("failed to spool upload '{}'", file_name))?;
        file.as_file_mut()
            .flush()
            .context("failed to flush upload storage")?;

        log::info!(
            "upload '{}' spooled to {} ({} bytes)",
            file_name,
            file.path().display(),
            bytes
        );
        Ok(Self {
            file,
            original_name: file_name.to_string(),
            bytes,
        })
    }

    /// Spool a copy of a local file, as if it had been uploaded.
    pub fn from_local_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("invalid video path {}", path.display()))?;
        container_extension(name)?;
        let source =
            File::open(path).with_context(|| format!("failed to open video {}", path.display()))?;
        Self::spool(name, source)
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn len(&self) -> u64 {
        self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes == 0
    }

    /// Remove the temporary file now, surfacing any removal error.
    pub fn close(self) -> Result<PathBuf> {
        let path = self.file.path().to_path_buf();
        self.file
            .close()
            .with_context(|| format!("failed to remove upload storage {}", path.display()))?;
        log::debug!("upload storage {} removed", path.display());
        Ok(path)
    }
}
