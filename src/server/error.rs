//! Errors raised by [`SnapServer`](super::SnapServer) operations.

use std::io;

use thiserror::Error;

/// Errors that may occur while setting up or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding or configuring the socket failed.
    #[error("bind error: {0}")]
    Bind(#[source] io::Error),
}
