use std::net::SocketAddr;

use derive_more::{Display, From, Into};

/// Identity correlating chunks of the same transfer.
///
/// Derived from the transport-level origin address. A sender may only have
/// one transfer in flight; chunks of a second transfer from the same address
/// replace the first.
///
/// # Examples
///
/// ```
/// use std::net::SocketAddr;
///
/// use snapwire::reassembly::SenderId;
///
/// let addr: SocketAddr = "10.0.0.7:4567".parse().expect("valid address");
/// let sender = SenderId::from(addr);
/// assert_eq!(sender.to_string(), "10.0.0.7:4567");
/// assert_eq!(sender.path_component(), "10.0.0.7_4567");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, From, Into)]
#[display("{_0}")]
pub struct SenderId(SocketAddr);

impl SenderId {
    /// Create an identity for `addr`.
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self { Self(addr) }

    /// Return the origin address.
    #[must_use]
    pub const fn addr(self) -> SocketAddr { self.0 }

    /// Render the identity as a single file-system safe path component.
    ///
    /// Characters other than ASCII alphanumerics, `.` and `-` become `_`.
    #[must_use]
    pub fn path_component(self) -> String {
        self.0
            .to_string()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}
