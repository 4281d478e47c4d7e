//! Configuration bounding chunk sizes and transfer sizes.

use std::num::NonZeroUsize;

use crate::packet::{CHUNK_HEADER_LEN, DEFAULT_MAX_DATAGRAM_SIZE, KIND_LEN};

/// Settings that bound datagram sizes and the largest payload accepted for
/// fragmentation.
///
/// The datagram budget always exceeds the 12-byte image chunk header, so
/// every chunk carries at least one body byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FragmentationConfig {
    max_datagram_size: NonZeroUsize,
    max_payload_size: NonZeroUsize,
}

impl FragmentationConfig {
    /// Ceiling applied to image payloads unless configured otherwise.
    pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 10 * 1024 * 1024;

    /// Derive a configuration from the largest datagram the transport will
    /// carry.
    ///
    /// Returns `None` when the budget cannot hold the chunk header plus at
    /// least one body byte.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::num::NonZeroUsize;
    ///
    /// use snapwire::fragment::FragmentationConfig;
    ///
    /// let limit = NonZeroUsize::new(1024).expect("non-zero");
    /// let cfg = FragmentationConfig::for_datagram_budget(112, limit).expect("budget fits");
    /// assert_eq!(cfg.chunk_capacity().get(), 100);
    /// assert!(FragmentationConfig::for_datagram_budget(12, limit).is_none());
    /// ```
    #[must_use]
    pub fn for_datagram_budget(
        max_datagram_size: usize,
        max_payload_size: NonZeroUsize,
    ) -> Option<Self> {
        if max_datagram_size <= CHUNK_HEADER_LEN {
            return None;
        }
        Some(Self {
            max_datagram_size: NonZeroUsize::new(max_datagram_size)?,
            max_payload_size,
        })
    }

    /// Largest datagram, header included.
    #[must_use]
    pub const fn max_datagram_size(&self) -> NonZeroUsize { self.max_datagram_size }

    /// Largest image payload accepted for fragmentation.
    #[must_use]
    pub const fn max_payload_size(&self) -> NonZeroUsize { self.max_payload_size }

    /// Body bytes carried by each full image chunk.
    #[must_use]
    pub fn chunk_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_datagram_size.get() - CHUNK_HEADER_LEN)
            .unwrap_or(NonZeroUsize::MIN)
    }

    /// Body bytes a single text packet can carry.
    #[must_use]
    pub const fn text_capacity(&self) -> usize { self.max_datagram_size.get() - KIND_LEN }

    /// Chunk count of the largest acceptable payload at this budget.
    ///
    /// Saturates at `u32::MAX`.
    #[must_use]
    pub fn max_chunks(&self) -> u32 {
        let chunks = self
            .max_payload_size
            .get()
            .div_ceil(self.chunk_capacity().get());
        u32::try_from(chunks).unwrap_or(u32::MAX)
    }
}

impl Default for FragmentationConfig {
    fn default() -> Self {
        Self {
            max_datagram_size: NonZeroUsize::new(DEFAULT_MAX_DATAGRAM_SIZE)
                .unwrap_or(NonZeroUsize::MIN),
            max_payload_size: NonZeroUsize::new(Self::DEFAULT_MAX_PAYLOAD_SIZE)
                .unwrap_or(NonZeroUsize::MIN),
        }
    }
}
