use derive_more::Display;

use super::PacketError;

/// Discriminant carried in the first four bytes of every datagram.
///
/// # Examples
///
/// ```
/// use snapwire::packet::PacketKind;
///
/// assert_eq!(PacketKind::try_from(1), Ok(PacketKind::ImageChunk));
/// assert_eq!(u32::from(PacketKind::Text), 0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum PacketKind {
    /// A short unfragmented UTF-8 message.
    #[display("text")]
    Text,
    /// One fragment of a larger binary transfer.
    #[display("image-chunk")]
    ImageChunk,
}

impl PacketKind {
    /// Minimum datagram length needed to decode a packet of this kind.
    #[must_use]
    pub const fn header_len(self) -> usize {
        match self {
            Self::Text => super::KIND_LEN,
            Self::ImageChunk => super::CHUNK_HEADER_LEN,
        }
    }
}

impl TryFrom<u32> for PacketKind {
    type Error = PacketError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Text),
            1 => Ok(Self::ImageChunk),
            other => Err(PacketError::UnknownKind { kind: other }),
        }
    }
}

impl From<PacketKind> for u32 {
    fn from(value: PacketKind) -> Self {
        match value {
            PacketKind::Text => 0,
            PacketKind::ImageChunk => 1,
        }
    }
}
