//! Logging conventions for this crate.
//!
//! Every module logs through the `log` facade: `log::info!`/`warn!`/
//! `debug!` call sites tagged with their owning module's target constant
//! below, so a single `RUST_LOG` filter on the embedder's logger (e.g.
//! `RUST_LOG=beacon=debug`) can isolate one concern without touching the
//! others. There is no crate-specific logger setup here — `env_logger`
//! (or whatever the embedder wires up) owns that.

/// Log targets used across this crate's log messages, kept here so they
/// stay consistent if a module is renamed.
pub const BEACON_TARGET: &str = "beacon";
pub const FORWARDING_TARGET: &str = "forwarding";
pub const CONNECTION_TARGET: &str = "connection";
pub const ROUTING_TABLE_TARGET: &str = "routing_table";
