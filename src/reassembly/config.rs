//! Limits applied by the reassembly engine.

use std::{
    num::{NonZeroU32, NonZeroUsize},
    time::Duration,
};

use crate::fragment::FragmentationConfig;

/// Settings that bound reassembly resource usage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReassemblyConfig {
    /// Largest chunk count a transfer may declare.
    pub max_chunks: NonZeroU32,
    /// Hard cap on the bytes buffered for, and the size of, one transfer.
    pub max_transfer_size: NonZeroUsize,
    /// Number of senders that may have a transfer in flight at once.
    pub max_in_flight: NonZeroUsize,
    /// Transfers with no new chunk for this long are evicted.
    pub reassembly_timeout: Duration,
    /// Period of the background eviction sweep.
    pub sweep_interval: Duration,
}

impl ReassemblyConfig {
    /// Default number of concurrent transfers.
    pub const DEFAULT_MAX_IN_FLIGHT: usize = 1024;
    /// Default staleness timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    /// Default sweep period.
    pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);
    /// Smallest chunk body a peer is assumed to use when sizing the default
    /// chunk-count cap.
    ///
    /// A 576-byte datagram, the size every IPv4 host must accept, leaves 536
    /// body bytes after the IP, UDP and chunk headers.
    pub const MIN_CHUNK_BODY: usize = 512;

    /// Derive limits for a receiver whose payload ceiling matches
    /// `fragmentation`.
    ///
    /// Peers choose their own datagram budget, so the chunk-count cap is not
    /// tied to this side's chunk size. It admits a ceiling-sized payload cut
    /// into [`MIN_CHUNK_BODY`](Self::MIN_CHUNK_BODY) chunks, or into chunks
    /// of `fragmentation`'s own capacity when that needs more. Memory stays
    /// bounded by `max_transfer_size`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::num::NonZeroUsize;
    ///
    /// use snapwire::{fragment::FragmentationConfig, reassembly::ReassemblyConfig};
    ///
    /// let limit = NonZeroUsize::new(1000).expect("non-zero");
    /// let fragmentation = FragmentationConfig::for_datagram_budget(112, limit).expect("fits");
    /// let cfg = ReassemblyConfig::from_fragmentation(&fragmentation);
    /// assert_eq!(cfg.max_chunks.get(), 10);
    /// assert_eq!(cfg.max_transfer_size, limit);
    ///
    /// // 10 MiB in 512-byte chunks.
    /// assert_eq!(ReassemblyConfig::default().max_chunks.get(), 20_480);
    /// ```
    #[must_use]
    pub fn from_fragmentation(fragmentation: &FragmentationConfig) -> Self {
        let max_transfer_size = fragmentation.max_payload_size();
        let floor_chunks = u32::try_from(max_transfer_size.get().div_ceil(Self::MIN_CHUNK_BODY))
            .unwrap_or(u32::MAX);
        let max_chunks = floor_chunks.max(fragmentation.max_chunks());
        Self {
            max_chunks: NonZeroU32::new(max_chunks).unwrap_or(NonZeroU32::MIN),
            max_transfer_size,
            max_in_flight: NonZeroUsize::new(Self::DEFAULT_MAX_IN_FLIGHT)
                .unwrap_or(NonZeroUsize::MIN),
            reassembly_timeout: Self::DEFAULT_TIMEOUT,
            sweep_interval: Self::DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Replace the staleness timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.reassembly_timeout = timeout;
        self
    }

    /// Replace the cap on declared chunk counts.
    #[must_use]
    pub const fn with_max_chunks(mut self, max_chunks: NonZeroU32) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    /// Replace the in-flight transfer cap.
    #[must_use]
    pub const fn with_max_in_flight(mut self, max_in_flight: NonZeroUsize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    /// Clamp the sweep period so the background sweep always makes progress.
    ///
    /// A zero period becomes one millisecond; a period longer than the
    /// timeout is shortened to the timeout.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let floor = Duration::from_millis(1);
        self.sweep_interval = self
            .sweep_interval
            .min(self.reassembly_timeout)
            .max(floor);
        self
    }
}

impl Default for ReassemblyConfig {
    fn default() -> Self { Self::from_fragmentation(&FragmentationConfig::default()) }
}
