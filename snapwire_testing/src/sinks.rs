//! Sinks that record what the server delivered.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use snapwire::{
    reassembly::SenderId,
    sink::{SinkError, TextSink, TransferSink},
};
use tokio::sync::Notify;

/// Records every completed transfer.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    saved: Arc<Mutex<Vec<(SenderId, Bytes)>>>,
    changed: Arc<Notify>,
}

impl RecordingSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Transfers saved so far, in completion order.
    #[must_use]
    pub fn saved(&self) -> Vec<(SenderId, Bytes)> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Wait until at least `count` transfers have been saved.
    pub async fn wait_for(&self, count: usize) -> Vec<(SenderId, Bytes)> {
        loop {
            let changed = self.changed.notified();
            let saved = self.saved();
            if saved.len() >= count {
                return saved;
            }
            changed.await;
        }
    }
}

#[async_trait]
impl TransferSink for RecordingSink {
    async fn save(&self, sender: SenderId, payload: Bytes) -> Result<(), SinkError> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((sender, payload));
        self.changed.notify_waiters();
        Ok(())
    }
}

/// Records every text message.
#[derive(Clone, Debug, Default)]
pub struct RecordingTextSink {
    messages: Arc<Mutex<Vec<(SenderId, String)>>>,
    changed: Arc<Notify>,
}

impl RecordingTextSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Messages delivered so far.
    #[must_use]
    pub fn messages(&self) -> Vec<(SenderId, String)> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Wait until at least `count` messages have been delivered.
    pub async fn wait_for(&self, count: usize) -> Vec<(SenderId, String)> {
        loop {
            let changed = self.changed.notified();
            let messages = self.messages();
            if messages.len() >= count {
                return messages;
            }
            changed.await;
        }
    }
}

impl TextSink for RecordingTextSink {
    fn deliver(&self, sender: SenderId, text: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((sender, text.to_owned()));
        self.changed.notify_waiters();
    }
}
