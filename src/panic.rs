//! Rendering of panic payloads caught by worker tasks.

use std::{any::Any, fmt};

/// Panic payload that displays as its message.
///
/// Payloads raised by `panic!` with a literal or a formatted message are
/// shown verbatim; anything else falls back to a placeholder.
///
/// ```
/// use snapwire::panic::format_panic;
///
/// assert_eq!(format_panic(Box::new("boom")).to_string(), "boom");
/// assert_eq!(format_panic(Box::new(String::from("bang"))).to_string(), "bang");
/// assert_eq!(format_panic(Box::new(7_u8)).to_string(), "<non-string panic>");
/// ```
#[derive(Debug)]
#[must_use]
pub struct PanicMessage(Box<dyn Any + Send>);

impl PanicMessage {
    /// Message carried by the payload, if it is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.0
            .downcast_ref::<&'static str>()
            .copied()
            .or_else(|| self.0.downcast_ref::<String>().map(String::as_str))
    }
}

impl fmt::Display for PanicMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str().unwrap_or("<non-string panic>"))
    }
}

/// Wrap a payload returned by `catch_unwind` for logging.
pub fn format_panic(panic: Box<dyn Any + Send>) -> PanicMessage { PanicMessage(panic) }
