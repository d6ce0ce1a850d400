//! Many-to-one / one-to-many routing core for a multi-hop, low-power
//! sensor network.
//!
//! Nodes cooperatively form a spanning tree rooted at a single sink: data
//! travels upward along parent links (collection), and the sink can send
//! commands downward along explicit source routes derived from observed
//! tree topology (dissemination). This crate is the routing state machine
//! only — beacon-driven parent selection, the sink's routing-table
//! construction, source-routed downward forwarding, loop detection, and
//! header manipulation on a shared packet buffer. The underlying
//! link-layer transports, the packet buffer implementation, timers, RNG,
//! and application callbacks are consumed as traits (see [`link`]); this
//! crate ships no hardware binding for them.
//!
//! The entry point is [`Connection`]: `Connection::open` binds a node's
//! routing state to concrete implementations of those traits, after
//! which the embedder's event loop drives it via `on_broadcast_received`,
//! `on_unicast_received`, and the `on_*_timer` methods, and the
//! application drives it via `send_upward` / `send_downward`.

pub mod addr;
pub mod beacon;
pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod forwarding;
pub mod link;
pub mod logging;
pub mod routing_table;

#[cfg(any(test, feature = "testing"))]
pub mod test_support;

pub use addr::NodeAddress;
pub use config::RoutingConfig;
pub use connection::Connection;
pub use error::RoutingError;
pub use routing_table::{RoutingTable, SourceRoute};
