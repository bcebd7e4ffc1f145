//! Flow-table key type and the per-field mask that the `FT_FIELDS` gateway
//! op installs (`spec.md` §4.2, §6).

use std::net::Ipv4Addr;

use super::super::pipeline::metadata::FiveTuple;

bitflags::bitflags! {
    /// Which 5-tuple fields participate in a masked lookup. Installed via
    /// the `FT_FIELDS` gateway command; defaults to matching every field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FieldMask: u8 {
        const SRC_IP   = 0b0000_0001;
        const DST_IP   = 0b0000_0010;
        const SRC_PORT = 0b0000_0100;
        const DST_PORT = 0b0000_1000;
        const VM_ID    = 0b0001_0000;
    }
}

impl Default for FieldMask {
    fn default() -> Self {
        Self::all()
    }
}

/// A flow-table key: the subset of a [`FiveTuple`] selected by a
/// [`FieldMask`], with masked-out fields zeroed so that two tuples which
/// differ only in a masked-out field hash and compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlowKey {
    src_ip: Ipv4Addr,
    dst_ip: Ipv4Addr,
    src_port: u16,
    dst_port: u16,
    vm_id: u8,
}

impl FlowKey {
    pub fn masked(tuple: FiveTuple, mask: FieldMask) -> Self {
        Self {
            src_ip: if mask.contains(FieldMask::SRC_IP) { tuple.src_ip } else { Ipv4Addr::UNSPECIFIED },
            dst_ip: if mask.contains(FieldMask::DST_IP) { tuple.dst_ip } else { Ipv4Addr::UNSPECIFIED },
            src_port: if mask.contains(FieldMask::SRC_PORT) { tuple.src_port } else { 0 },
            dst_port: if mask.contains(FieldMask::DST_PORT) { tuple.dst_port } else { 0 },
            vm_id: if mask.contains(FieldMask::VM_ID) { tuple.vm_id } else { 0 },
        }
    }
}
