//! Wire formats and in-place (de)serialization against a `PacketBuffer`.
//! Little-endian, no padding.

use heapless::Vec as HVec;

use crate::addr::NodeAddress;
use crate::config::MAX_PATH_LENGTH;
use crate::error::RoutingError;
use crate::link::PacketBuffer;

/// `seqn(u16) || metric(u16)`, 4 bytes, sent by broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeaconHeader {
    pub seqn: u16,
    pub metric: u16,
}

impl BeaconHeader {
    pub const WIRE_SIZE: usize = 4;
}

/// `source(2) || hops(1) || is_command(1) || path_length(1)`, 5 bytes,
/// followed by `path_length` addresses and then the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectHeader {
    pub source: NodeAddress,
    pub hops: u8,
    pub is_command: bool,
    pub path_length: u8,
}

impl CollectHeader {
    pub const WIRE_SIZE: usize = 5;
}

/// A fixed-capacity address list, used both for the ascending "who touched
/// this packet" trail and the descending remaining-hops list.
pub type AddrList = HVec<NodeAddress, MAX_PATH_LENGTH>;

pub fn write_beacon(buf: &mut dyn PacketBuffer, hdr: &BeaconHeader) -> Result<(), RoutingError> {
    buf.grow_header(BeaconHeader::WIRE_SIZE)
        .map_err(|_| RoutingError::BufferGrowFailed)?;
    let mut bytes = [0u8; BeaconHeader::WIRE_SIZE];
    bytes[0..2].copy_from_slice(&hdr.seqn.to_le_bytes());
    bytes[2..4].copy_from_slice(&hdr.metric.to_le_bytes());
    buf.write(0, &bytes);
    Ok(())
}

pub fn read_beacon(buf: &dyn PacketBuffer) -> Result<BeaconHeader, RoutingError> {
    if buf.len() != BeaconHeader::WIRE_SIZE {
        return Err(RoutingError::MalformedFrame("beacon frame size mismatch"));
    }
    let mut bytes = [0u8; BeaconHeader::WIRE_SIZE];
    buf.read(0, &mut bytes);
    Ok(BeaconHeader {
        seqn: u16::from_le_bytes([bytes[0], bytes[1]]),
        metric: u16::from_le_bytes([bytes[2], bytes[3]]),
    })
}

/// Grows the header by `sizeof(CollectHeader) + addrs.len() * sizeof(NodeAddress)`
/// and writes the fixed fields followed by `addrs`, in order.
pub fn write_collect_header_and_addrs(
    buf: &mut dyn PacketBuffer,
    hdr: &CollectHeader,
    addrs: &[NodeAddress],
) -> Result<(), RoutingError> {
    let total = CollectHeader::WIRE_SIZE + addrs.len() * NodeAddress::WIRE_SIZE;
    buf.grow_header(total)
        .map_err(|_| RoutingError::BufferGrowFailed)?;
    write_collect_header_fields(buf, hdr);
    for (i, addr) in addrs.iter().enumerate() {
        buf.write(CollectHeader::WIRE_SIZE + i * NodeAddress::WIRE_SIZE, &addr.to_le_bytes());
    }
    Ok(())
}

/// Overwrites just the 5 fixed header fields at the front of the buffer,
/// in place, without growing or shrinking it. Used by the downward
/// forwarder, which consumes one address from the list and rewrites the
/// header to match without touching the remaining addresses.
pub fn write_collect_header_fields(buf: &mut dyn PacketBuffer, hdr: &CollectHeader) {
    let mut bytes = [0u8; CollectHeader::WIRE_SIZE];
    bytes[0..2].copy_from_slice(&hdr.source.to_le_bytes());
    bytes[2] = hdr.hops;
    bytes[3] = hdr.is_command as u8;
    bytes[4] = hdr.path_length;
    buf.write(0, &bytes);
}

pub fn read_collect_header(buf: &dyn PacketBuffer) -> Result<CollectHeader, RoutingError> {
    if buf.len() < CollectHeader::WIRE_SIZE {
        return Err(RoutingError::MalformedFrame("collect header too short"));
    }
    let mut bytes = [0u8; CollectHeader::WIRE_SIZE];
    buf.read(0, &mut bytes);
    Ok(CollectHeader {
        source: NodeAddress::from_le_bytes([bytes[0], bytes[1]]),
        hops: bytes[2],
        is_command: bytes[3] != 0,
        path_length: bytes[4],
    })
}

/// Reads the `path_length`-entry address list that immediately follows the
/// collect header's fixed fields.
pub fn read_addr_list(buf: &dyn PacketBuffer, path_length: u8) -> Result<AddrList, RoutingError> {
    let mut out = AddrList::new();
    for i in 0..path_length as usize {
        if out.capacity() == out.len() {
            return Err(RoutingError::MalformedFrame("path_length exceeds MAX_PATH_LENGTH"));
        }
        let mut bytes = [0u8; NodeAddress::WIRE_SIZE];
        buf.read(CollectHeader::WIRE_SIZE + i * NodeAddress::WIRE_SIZE, &mut bytes);
        // capacity checked above; push cannot fail.
        let _ = out.push(NodeAddress::from_le_bytes(bytes));
    }
    Ok(out)
}

/// Reads just the first address of the trailing list, without decoding the
/// whole thing. Used by the downward forwarder to find the next hop.
pub fn read_first_addr(buf: &dyn PacketBuffer) -> NodeAddress {
    let mut bytes = [0u8; NodeAddress::WIRE_SIZE];
    buf.read(CollectHeader::WIRE_SIZE, &mut bytes);
    NodeAddress::from_le_bytes(bytes)
}
