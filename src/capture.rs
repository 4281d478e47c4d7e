//! Producers of image payloads.
//!
//! Screen capture itself is platform specific and lives outside this crate.
//! [`ScreenSource`] is the seam a capture backend implements; [`FileSource`]
//! serves a pre-captured image from disk.

use std::{io, path::PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Errors raised by a [`ScreenSource`].
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Reading the captured image failed.
    #[error("failed to read capture from {path}: {source}")]
    Read {
        /// Location the capture was read from.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The capture backend reported a failure of its own.
    #[error("capture backend failed: {0}")]
    Backend(String),
}

/// Opaque producer of an encoded screen image.
#[async_trait]
pub trait ScreenSource: Send + Sync {
    /// Produce one encoded image.
    async fn capture(&self) -> Result<Bytes, CaptureError>;
}

/// Serves the contents of a file as the captured image.
#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Read captures from `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    /// File the capture is read from.
    #[must_use]
    pub fn path(&self) -> &std::path::Path { &self.path }
}

#[async_trait]
impl ScreenSource for FileSource {
    async fn capture(&self) -> Result<Bytes, CaptureError> {
        tokio::fs::read(&self.path)
            .await
            .map(Bytes::from)
            .map_err(|source| CaptureError::Read {
                path: self.path.clone(),
                source,
            })
    }
}
