//! Beacon emission, reception, and the parent-adoption decision table.
//!
//! The decision table is pulled out as a pure function so the tricky part
//! — ordering and tie-breaking across stale/fresh epochs and noisy RSSI —
//! is unit-testable without any link/timer/rng mocks at all.

use crate::addr::NodeAddress;

/// The locally held beacon-relevant state of a router, at the moment a
/// beacon is received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeaconState {
    pub seqn: u16,
    pub metric: u16,
    pub parent_rssi: i16,
}

/// A beacon as received over the air, plus its RSSI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeaconObservation {
    pub sender: NodeAddress,
    pub seqn: u16,
    pub metric: u16,
    pub rssi: i16,
}

/// The outcome of applying the stale/fresh-epoch, better-metric, and
/// RSSI-tie-break decision table to a received beacon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeaconDecision {
    /// Reject: rssi at/below threshold, stale seqn, or no tie-break win.
    Discard,
    /// Adopt `sender` as parent with `new_metric`. `epoch_changed` is true
    /// when the observation carried a strictly newer seqn, meaning the
    /// sink started a fresh round and the topology may have shifted since;
    /// callers use this to decide whether to update `beacon_seqn`
    /// unconditionally.
    Adopt { new_metric: u16, epoch_changed: bool },
}

/// Applies the stale/fresh-epoch, better-metric, and RSSI-tie-break
/// decision table. `rssi_threshold` rejects anything at or below it before
/// the table is even consulted.
pub fn decide(local: &BeaconState, obs: &BeaconObservation, rssi_threshold: i16) -> BeaconDecision {
    if obs.rssi <= rssi_threshold {
        return BeaconDecision::Discard;
    }

    if obs.seqn < local.seqn {
        return BeaconDecision::Discard;
    }

    if obs.seqn > local.seqn {
        return BeaconDecision::Adopt {
            new_metric: obs.metric + 1,
            epoch_changed: true,
        };
    }

    // obs.seqn == local.seqn
    if obs.metric + 1 < local.metric {
        return BeaconDecision::Adopt {
            new_metric: obs.metric + 1,
            epoch_changed: false,
        };
    }

    if obs.metric + 1 == local.metric && obs.rssi > local.parent_rssi {
        return BeaconDecision::Adopt {
            new_metric: obs.metric + 1,
            epoch_changed: false,
        };
    }

    BeaconDecision::Discard
}

/// The deferred-rebroadcast delay, jittered uniformly in
/// `[0, forward_delay_max_ms)` to avoid every router in earshot
/// rebroadcasting its new beacon in the same instant.
pub fn rebroadcast_delay_ms(forward_delay_max_ms: u32, random_u16: u16) -> u32 {
    if forward_delay_max_ms == 0 {
        0
    } else {
        random_u16 as u32 % forward_delay_max_ms
    }
}

/// The deferred dedicated-topology-report delay: deeper (higher-metric)
/// nodes report sooner, capped at half the beacon interval.
pub fn topology_report_delay_ms(
    forward_delay_ms: u32,
    metric: u16,
    max_path_length: u16,
    beacon_interval_ms: u32,
    random_u16: u16,
) -> u32 {
    let depth_factor = max_path_length.saturating_sub(metric) as u32;
    let jitter_ms = random_u16 as u32 % 1000;
    let delay = forward_delay_ms.saturating_add(depth_factor.saturating_mul(jitter_ms));
    delay.min(beacon_interval_ms / 2)
}
