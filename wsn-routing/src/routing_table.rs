//! Sink-only routing table and the source routes it produces.

use std::collections::HashMap;

use heapless::Vec as HVec;
use log::debug;

use crate::addr::NodeAddress;
use crate::config::MAX_PATH_LENGTH;
use crate::error::RoutingError;
use crate::logging::ROUTING_TABLE_TARGET;

/// An ordered hop list from the sink's direct neighbor (first) to the
/// final destination (last, inclusive). Never contains the sink itself,
/// and never repeats an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRoute {
    hops: HVec<NodeAddress, MAX_PATH_LENGTH>,
}

impl SourceRoute {
    pub fn empty() -> Self {
        SourceRoute { hops: HVec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    pub fn as_slice(&self) -> &[NodeAddress] {
        &self.hops
    }

    /// The sink's direct neighbor — where the first unicast goes.
    pub fn next_hop(&self) -> Option<NodeAddress> {
        self.hops.first().copied()
    }

    /// Everything after `next_hop`, in order — what the sink embeds in the
    /// outgoing command packet's address list.
    pub fn remaining(&self) -> &[NodeAddress] {
        if self.hops.is_empty() {
            &[]
        } else {
            &self.hops[1..]
        }
    }
}

/// `child -> parent`, as observed from ascending data packets. Owned by
/// the sink's `Connection`; a hash map keyed by address stands in for a
/// fixed, address-indexed array, trading a fixed memory footprint for
/// support of sparse or large address spaces.
#[derive(Debug, Default)]
pub struct RoutingTable {
    parents: HashMap<NodeAddress, NodeAddress>,
    sink: NodeAddress,
    max_path_length: usize,
}

impl RoutingTable {
    pub fn new(sink: NodeAddress) -> Self {
        RoutingTable {
            parents: HashMap::new(),
            sink,
            max_path_length: MAX_PATH_LENGTH,
        }
    }

    pub fn with_max_path_length(sink: NodeAddress, max_path_length: usize) -> Self {
        RoutingTable {
            parents: HashMap::new(),
            sink,
            max_path_length: max_path_length.min(MAX_PATH_LENGTH),
        }
    }

    /// Records the latest observation, overwriting any prior parent for
    /// `child`.
    pub fn update(&mut self, parent: NodeAddress, child: NodeAddress) {
        if let Some(old_parent) = self.parents.insert(child, parent) {
            if old_parent != parent {
                debug!(target: ROUTING_TABLE_TARGET, "{child:?} reparented from {old_parent:?} to {parent:?}");
            }
        }
    }

    /// Latest known parent of `child`, or `NodeAddress::NULL` if unknown.
    pub fn parent_of(&self, child: NodeAddress) -> NodeAddress {
        self.parents.get(&child).copied().unwrap_or(NodeAddress::NULL)
    }

    /// Walks parent pointers from `dest` up to the sink, collecting the
    /// visited nodes (excluding the sink) and reversing them so the
    /// result reads from the sink's neighbor to `dest`.
    ///
    /// `dest == sink` returns an empty route rather than an error — there
    /// is nothing wrong with the request itself, it just isn't this
    /// function's place to decide whether addressing a command to the sink
    /// makes sense. That judgment belongs to the caller (`send_downward`).
    pub fn find_route(&self, dest: NodeAddress) -> Result<SourceRoute, RoutingError> {
        if dest == self.sink {
            return Ok(SourceRoute::empty());
        }

        let mut walked: HVec<NodeAddress, MAX_PATH_LENGTH> = HVec::new();
        let mut current = dest;

        loop {
            if current == self.sink {
                break;
            }
            if walked.iter().any(|a| *a == current) {
                return Err(RoutingError::LoopDetected);
            }
            if walked.len() >= self.max_path_length {
                return Err(RoutingError::NoPath);
            }
            walked.push(current).map_err(|_| RoutingError::NoPath)?;

            let parent = self.parent_of(current);
            if parent.is_null() {
                return Err(RoutingError::NoPath);
            }
            current = parent;
        }

        walked.reverse();
        Ok(SourceRoute { hops: walked })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(id: u16) -> NodeAddress {
        NodeAddress::new(id)
    }

    #[test]
    fn empty_route_for_sink_itself() {
        let table = RoutingTable::new(addr(1));
        let route = table.find_route(addr(1)).unwrap();
        assert!(route.is_empty());
    }

    #[test]
    fn two_hop_route_excludes_sink_and_includes_dest() {
        let mut table = RoutingTable::new(addr(1));
        table.update(addr(1), addr(2)); // sink -> 2
        table.update(addr(2), addr(3)); // 2 -> 3
        let route = table.find_route(addr(3)).unwrap();
        assert_eq!(route.as_slice(), &[addr(2), addr(3)]);
        assert_eq!(route.next_hop(), Some(addr(2)));
        assert_eq!(route.remaining(), &[addr(3)]);
    }

    #[test]
    fn missing_parent_is_no_path() {
        let table = RoutingTable::new(addr(1));
        assert_eq!(table.find_route(addr(5)), Err(RoutingError::NoPath));
    }

    #[test]
    fn cycle_is_detected() {
        let mut table = RoutingTable::new(addr(1));
        table.update(addr(3), addr(2)); // 2 -> 3 (wrong way around)
        table.update(addr(2), addr(3)); // 3 -> 2
        assert_eq!(table.find_route(addr(3)), Err(RoutingError::LoopDetected));
    }

    #[test]
    fn chain_deeper_than_max_is_no_path() {
        let mut table = RoutingTable::with_max_path_length(addr(0), 3);
        // 0 -> 1 -> 2 -> 3 -> 4 -> 5 (depth 5, cap is 3)
        for i in 0..5u16 {
            table.update(addr(i), addr(i + 1));
        }
        assert_eq!(table.find_route(addr(5)), Err(RoutingError::NoPath));
    }

    #[test]
    fn latest_observation_wins() {
        let mut table = RoutingTable::new(addr(1));
        table.update(addr(1), addr(2));
        table.update(addr(9), addr(2));
        assert_eq!(table.parent_of(addr(2)), addr(9));
    }
}
