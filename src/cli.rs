//! Command line interface for the `snapwire` binary.
//!
//! Kept free of crate-internal types so the build script can render a man
//! page from the same definitions.

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroUsize},
    path::PathBuf,
};

use clap::{Args, Parser, Subcommand};

/// Command line arguments for the `snapwire` binary.
#[derive(Debug, Parser)]
#[command(
    name = "snapwire",
    version,
    about = "Send screenshots and text messages over UDP in chunks"
)]
pub struct Cli {
    /// Operation to perform.
    #[command(subcommand)]
    pub command: Command,
}

/// Sub-commands understood by the binary.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Receive transfers and save them below an output directory.
    Serve(ServeArgs),
    /// Send one text message.
    SendText {
        /// Receiver address.
        #[arg(long)]
        to: SocketAddr,
        /// Message to send.
        text: String,
        #[command(flatten)]
        link: LinkArgs,
    },
    /// Send a file as a chunked image transfer.
    SendFile {
        /// Receiver address.
        #[arg(long)]
        to: SocketAddr,
        /// File to send.
        path: PathBuf,
        #[command(flatten)]
        link: LinkArgs,
    },
    /// Read lines from standard input and send each as a text message.
    ///
    /// The line `screenshot` sends the capture file instead.
    Console {
        /// Receiver address.
        #[arg(long)]
        to: SocketAddr,
        /// File served as the screen capture.
        #[arg(long, default_value = "screenshot.jpg")]
        capture: PathBuf,
        #[command(flatten)]
        link: LinkArgs,
    },
}

/// Options for the receiving server.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to receive datagrams on.
    #[arg(long, default_value = "127.0.0.1:4567")]
    pub bind: SocketAddr,
    /// Directory completed transfers are written below.
    #[arg(long, default_value = "screenshots")]
    pub out_dir: PathBuf,
    /// Number of worker tasks; defaults to the number of CPUs.
    #[arg(long)]
    pub workers: Option<usize>,
    /// Datagrams buffered between the receive loop and the workers.
    #[arg(long, default_value_t = NonZeroUsize::new(1024).unwrap_or(NonZeroUsize::MIN))]
    pub queue_capacity: NonZeroUsize,
    /// Seconds without progress before an incomplete transfer is dropped.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
    /// Largest datagram accepted, in bytes.
    #[arg(long, default_value_t = 60_000)]
    pub max_datagram: usize,
    /// Largest transfer accepted, in bytes.
    #[arg(long, default_value_t = NonZeroUsize::new(10 * 1024 * 1024).unwrap_or(NonZeroUsize::MIN))]
    pub max_payload: NonZeroUsize,
    /// Largest chunk count a transfer may declare; defaults to the payload
    /// ceiling in 512-byte chunks.
    #[arg(long)]
    pub max_chunks: Option<NonZeroU32>,
    /// Senders that may have a transfer in flight at once.
    #[arg(long, default_value_t = NonZeroUsize::new(1024).unwrap_or(NonZeroUsize::MIN))]
    pub max_in_flight: NonZeroUsize,
    /// Serve Prometheus metrics on this address.
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}

/// Options shared by the sending commands.
#[derive(Debug, Args)]
pub struct LinkArgs {
    /// Largest datagram emitted, in bytes.
    #[arg(long, default_value_t = 60_000)]
    pub max_datagram: usize,
    /// Largest payload sent, in bytes.
    #[arg(long, default_value_t = NonZeroUsize::new(10 * 1024 * 1024).unwrap_or(NonZeroUsize::MIN))]
    pub max_payload: NonZeroUsize,
    /// Pace datagrams to at most this many per second.
    #[arg(long)]
    pub rate: Option<NonZeroUsize>,
}
