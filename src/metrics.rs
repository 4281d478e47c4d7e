//! Metric helpers for `snapwire`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. With the `metrics` feature
//! disabled every helper compiles to a no-op.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the counter tracking received datagrams by outcome.
pub const DATAGRAMS_RECEIVED: &str = "snapwire_datagrams_total";
/// Name of the counter tracking datagrams emitted by senders.
pub const DATAGRAMS_SENT: &str = "snapwire_datagrams_sent_total";
/// Name of the counter tracking transfers by how they left the table.
pub const TRANSFERS_TOTAL: &str = "snapwire_transfers_total";
/// Name of the gauge tracking transfers currently being reassembled.
pub const TRANSFERS_IN_FLIGHT: &str = "snapwire_transfers_in_flight";
/// Name of the counter tracking text messages by direction.
pub const TEXT_MESSAGES: &str = "snapwire_text_messages_total";

/// What the dispatch path did with one received datagram.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatagramOutcome {
    /// Routed to a handler. Chunks count once taken into a transfer.
    Accepted,
    /// A chunk already held for its transfer.
    Duplicate,
    /// A chunk the reassembly engine refused.
    Rejected,
    /// Too short for its kind.
    Malformed,
    /// Carried an unrecognised kind.
    UnknownKind,
    /// Longer than the configured datagram ceiling.
    Oversized,
    /// Dropped because the worker pool was gone.
    Dropped,
}

impl DatagramOutcome {
    /// Label value used for this outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Duplicate => "duplicate",
            Self::Rejected => "rejected",
            Self::Malformed => "malformed",
            Self::UnknownKind => "unknown_kind",
            Self::Oversized => "oversized",
            Self::Dropped => "dropped",
        }
    }
}

/// How a transfer left, or failed to enter, the reassembly table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferOutcome {
    /// All chunks arrived.
    Completed,
    /// Timed out without progress.
    Evicted,
    /// A chunk breached a limit.
    Rejected,
    /// A new transfer from the same sender displaced it.
    Replaced,
}

impl TransferOutcome {
    /// Label value used for this outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Evicted => "evicted",
            Self::Rejected => "rejected",
            Self::Replaced => "replaced",
        }
    }
}

/// Record a received datagram.
pub fn record_datagram(outcome: DatagramOutcome) {
    #[cfg(feature = "metrics")]
    counter!(DATAGRAMS_RECEIVED, "outcome" => outcome.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = outcome;
}

/// Record a datagram emitted by a sender.
pub fn inc_datagrams_sent() {
    #[cfg(feature = "metrics")]
    counter!(DATAGRAMS_SENT).increment(1);
}

/// Record a transfer outcome.
pub fn record_transfer(outcome: TransferOutcome) {
    #[cfg(feature = "metrics")]
    counter!(TRANSFERS_TOTAL, "outcome" => outcome.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = outcome;
}

/// Publish the number of transfers currently buffered.
#[cfg_attr(
    feature = "metrics",
    expect(
        clippy::cast_precision_loss,
        reason = "gauge values are f64; transfer counts stay far below 2^52"
    )
)]
pub fn set_transfers_in_flight(count: usize) {
    #[cfg(feature = "metrics")]
    gauge!(TRANSFERS_IN_FLIGHT).set(count as f64);
    #[cfg(not(feature = "metrics"))]
    let _ = count;
}

/// Record a text message handed to the text sink.
pub fn inc_text_received() {
    #[cfg(feature = "metrics")]
    counter!(TEXT_MESSAGES, "direction" => "inbound").increment(1);
}

/// Record a text message emitted by a sender.
pub fn inc_text_sent() {
    #[cfg(feature = "metrics")]
    counter!(TEXT_MESSAGES, "direction" => "outbound").increment(1);
}
