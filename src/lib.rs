#![doc(html_root_url = "https://docs.rs/snapwire/latest")]
//! Public API for the `snapwire` library.
//!
//! Screenshots and short text messages are sent over unreliable UDP. Images
//! are split into numbered chunks that each fit one datagram; the receiver
//! reassembles them per sender in index order, whatever order they arrive
//! in, and hands completed payloads to a sink.
//!
//! - [`packet`] is the wire codec shared by both halves.
//! - [`fragment`] splits payloads into chunks and emits them.
//! - [`reassembly`] collects chunks per sender and evicts stalled transfers.
//! - [`server`] receives datagrams and dispatches them to a worker pool.

pub mod byte_order;
pub mod capture;
pub mod fragment;
pub mod metrics;
pub mod packet;
pub mod panic;
pub mod reassembly;
pub mod server;
pub mod sink;
pub mod transport;

pub use fragment::{ChunkSender, FragmentationConfig, Fragmenter, SendError, SenderConfig};
pub use metrics::{DATAGRAMS_RECEIVED, TRANSFERS_IN_FLIGHT, TRANSFERS_TOTAL};
pub use packet::{ChunkHeader, ChunkIndex, Packet, PacketError, PacketKind};
pub use reassembly::{
    ChunkOutcome,
    CompletedTransfer,
    Reassembler,
    ReassemblyConfig,
    ReassemblyError,
    SenderId,
};
pub use server::{ServerError, SnapServer};
