//! Node addressing.

use core::fmt;

/// A 16-bit node identifier.
///
/// `NodeAddress::NULL` is the distinguished "no node" value, used for an
/// unconnected node's parent and for absent routing-table entries.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeAddress(pub u16);

impl NodeAddress {
    /// Wire size of an address when it appears in an address list (bytes).
    pub const WIRE_SIZE: usize = 2;

    /// Distinguished "unconnected" / "unknown" address.
    pub const NULL: NodeAddress = NodeAddress(0xFFFF);

    pub const fn new(id: u16) -> Self {
        NodeAddress(id)
    }

    pub const fn is_null(&self) -> bool {
        self.0 == Self::NULL.0
    }

    pub(crate) fn to_le_bytes(self) -> [u8; 2] {
        self.0.to_le_bytes()
    }

    pub(crate) fn from_le_bytes(bytes: [u8; 2]) -> Self {
        NodeAddress(u16::from_le_bytes(bytes))
    }
}

impl fmt::Debug for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "{:#06x}", self.0)
        }
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
