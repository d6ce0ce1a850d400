//! Tunables.
//!
//! Plain top-of-module `pub const` values rather than a separate settings
//! file: there is no runtime discovery or reconfiguration story for a
//! firmware image, so a settings file would just be indirection between
//! the value and its one caller.

/// How often the sink re-emits its periodic beacon, in milliseconds.
pub const BEACON_INTERVAL_MS: u32 = 60_000;

/// Upper bound of the random jitter applied before a router rebroadcasts
/// its own beacon after adopting a new parent, in milliseconds.
pub const BEACON_FORWARD_DELAY_MAX_MS: u32 = 1_000;

/// Beacons received at or below this RSSI (dBm) are rejected outright.
pub const RSSI_THRESHOLD_DBM: i16 = -95;

/// Maximum depth of a source route / parent chain the routing table will
/// walk before giving up with `NoPath`.
pub const MAX_PATH_LENGTH: usize = 10;

/// Unicast traffic uses `STARTING_CHANNEL + 1`; broadcast (beacons) use
/// `STARTING_CHANNEL`. Implementation choice, left here for callers that
/// want a single source of truth.
pub const STARTING_CHANNEL: u16 = 0xC0;

/// Runtime-overridable tunables, defaulting to the constants above.
///
/// Tests shrink these (e.g. a near-zero `beacon_interval_ms`) to run many
/// epochs without a real clock; production callers use `Default::default()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingConfig {
    pub beacon_interval_ms: u32,
    pub beacon_forward_delay_max_ms: u32,
    pub rssi_threshold_dbm: i16,
    pub max_path_length: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        RoutingConfig {
            beacon_interval_ms: BEACON_INTERVAL_MS,
            beacon_forward_delay_max_ms: BEACON_FORWARD_DELAY_MAX_MS,
            rssi_threshold_dbm: RSSI_THRESHOLD_DBM,
            max_path_length: MAX_PATH_LENGTH,
        }
    }
}
