//! Destinations for completed transfers and text messages.
//!
//! [`TransferSink`] receives each reassembled payload together with the
//! identity of its sender; [`DirectorySink`] writes it below a per-sender
//! directory using a timestamped file name. [`TextSink`] receives text
//! messages, which never touch reassembly state.

use std::{
    io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use tracing::info;

use crate::reassembly::SenderId;

/// Attempts made to find an unused file name before giving up.
const NAME_ATTEMPTS: u32 = 64;

/// Errors reported by a [`TransferSink`].
#[derive(Debug, Error)]
pub enum SinkError {
    /// Writing the payload failed.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Destination of the failed write.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The sink refused the payload for a reason of its own.
    #[error("sink rejected transfer: {0}")]
    Rejected(String),
}

/// Consumer of completed transfers.
///
/// Failures are reported to the caller, which logs them; the transfer state
/// has already been discarded and is never retried.
#[async_trait]
pub trait TransferSink: Send + Sync {
    /// Persist a completed payload received from `sender`.
    async fn save(&self, sender: SenderId, payload: Bytes) -> Result<(), SinkError>;
}

/// Consumer of text messages.
pub trait TextSink: Send + Sync {
    /// Deliver a text message received from `sender`.
    fn deliver(&self, sender: SenderId, text: &str);
}

/// Writes each transfer to `<root>/<sender>/screenshot_<timestamp>.<ext>`.
#[derive(Clone, Debug)]
pub struct DirectorySink {
    root: PathBuf,
    extension: String,
}

impl DirectorySink {
    /// Store transfers below `root` with a `.jpg` extension.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: "jpg".to_owned(),
        }
    }

    /// Override the file extension.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Root directory holding the per-sender directories.
    #[must_use]
    pub fn root(&self) -> &Path { &self.root }

    /// Directory that holds transfers from `sender`.
    #[must_use]
    pub fn sender_dir(&self, sender: SenderId) -> PathBuf { self.root.join(sender.path_component()) }

    /// Write `payload` and return the path of the new file.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Write`] if the directory cannot be created or the
    /// file cannot be written.
    pub async fn write(&self, sender: SenderId, payload: &[u8]) -> Result<PathBuf, SinkError> {
        let dir = self.sender_dir(sender);
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| SinkError::Write {
                path: dir.clone(),
                source,
            })?;

        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S_%3f");
        let mut attempt = 0;
        loop {
            let name = if attempt == 0 {
                format!("screenshot_{stamp}.{}", self.extension)
            } else {
                format!("screenshot_{stamp}_{attempt}.{}", self.extension)
            };
            let path = dir.join(name);
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    let written = async {
                        file.write_all(payload).await?;
                        file.flush().await
                    };
                    written
                        .await
                        .map_err(|source| SinkError::Write {
                            path: path.clone(),
                            source,
                        })?;
                    return Ok(path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists && attempt < NAME_ATTEMPTS => {
                    attempt += 1;
                }
                Err(source) => return Err(SinkError::Write { path, source }),
            }
        }
    }
}

#[async_trait]
impl TransferSink for DirectorySink {
    async fn save(&self, sender: SenderId, payload: Bytes) -> Result<(), SinkError> {
        let path = self.write(sender, &payload).await?;
        info!(%sender, path = %path.display(), len = payload.len(), "transfer saved");
        Ok(())
    }
}

/// Logs each text message at `info` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogTextSink;

impl TextSink for LogTextSink {
    fn deliver(&self, sender: SenderId, text: &str) {
        info!(%sender, text, "text message received");
    }
}

#[cfg(test)]
mod tests {
    use std::{
        net::SocketAddr,
        sync::atomic::{AtomicU32, Ordering},
    };

    use rstest::{fixture, rstest};

    use super::DirectorySink;
    use crate::reassembly::SenderId;

    fn scratch_dir() -> std::path::PathBuf {
        static NEXT: AtomicU32 = AtomicU32::new(0);
        std::env::temp_dir().join(format!(
            "snapwire-sink-{}-{}",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::Relaxed)
        ))
    }

    #[fixture]
    fn sender() -> SenderId {
        let addr: SocketAddr = "127.0.0.1:4567".parse().expect("valid address");
        SenderId::from(addr)
    }

    #[rstest]
    #[tokio::test]
    async fn writes_payload_below_sender_directory(sender: SenderId) {
        let root = scratch_dir();
        let sink = DirectorySink::new(&root);

        let path = sink.write(sender, b"image").await.expect("write succeeds");

        assert_eq!(path.parent(), Some(root.join("127.0.0.1_4567").as_path()));
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .expect("utf-8 file name");
        assert!(name.starts_with("screenshot_"));
        assert!(name.ends_with(".jpg"));
        assert_eq!(tokio::fs::read(&path).await.expect("read back"), b"image");
        tokio::fs::remove_dir_all(&root).await.expect("cleanup");
    }

    #[rstest]
    #[tokio::test]
    async fn same_instant_writes_do_not_clobber(sender: SenderId) {
        let root = scratch_dir();
        let sink = DirectorySink::new(&root).with_extension("bin");

        let first = sink.write(sender, b"one").await.expect("first write");
        let second = sink.write(sender, b"two").await.expect("second write");

        assert_ne!(first, second);
        assert_eq!(tokio::fs::read(&first).await.expect("read first"), b"one");
        assert_eq!(tokio::fs::read(&second).await.expect("read second"), b"two");
        tokio::fs::remove_dir_all(&root).await.expect("cleanup");
    }

    #[rstest]
    #[tokio::test]
    async fn unwritable_root_reports_error(sender: SenderId) {
        let root = scratch_dir();
        tokio::fs::write(&root, b"not a directory")
            .await
            .expect("create blocking file");
        let sink = DirectorySink::new(&root);

        let err = sink.write(sender, b"x").await.expect_err("must fail");
        assert!(matches!(err, super::SinkError::Write { .. }));
        tokio::fs::remove_file(&root).await.expect("cleanup");
    }
}
