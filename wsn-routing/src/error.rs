//! Error taxonomy for the routing core.
//!
//! Every variant here is handled locally by the core; nothing in this crate
//! panics or aborts the process on a routing-level failure. Public
//! operations surface these through a `Result`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// Beacon size mismatch, or a collect header too short to parse.
    #[error("malformed frame: {0}")]
    MalformedFrame(&'static str),

    /// Ascending send/forward attempted with no parent selected.
    #[error("no parent selected")]
    NoParent,

    /// Packet buffer header allocation exhausted the buffer.
    #[error("packet buffer header grow failed")]
    BufferGrowFailed,

    /// Packet buffer header shrink attempted past the end of the header.
    #[error("packet buffer header shrink failed")]
    BufferShrinkFailed,

    /// Self address already present in an ascending address list, or a
    /// repeated address while walking the routing table.
    #[error("loop detected in route")]
    LoopDetected,

    /// `find_route` could not reach the sink (missing parent entry, or
    /// chain deeper than `MAX_PATH_LENGTH`).
    #[error("no path to destination")]
    NoPath,
}
