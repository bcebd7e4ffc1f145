//! Per-packet side metadata: the raw-bus `mlx::metadata` (`spec.md` §3) and
//! the richer ikernel-boundary `metadata` that accompanies every packet
//! crossing an ikernel.

use std::net::Ipv4Addr;

/// Per-packet side metadata carried alongside the raw bus, split off before
/// header parsing and rejoined on egress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawMetadata {
    /// 12-bit opaque value; bit 0 is a drop marker, bit 2 a lossy marker.
    pub user: u16,
    /// 3-bit packet id.
    pub id: u8,
}

const USER_MASK: u16 = 0x0FFF;
const ID_MASK: u8 = 0x07;

impl RawMetadata {
    pub fn new(user: u16, id: u8) -> Self {
        Self { user: user & USER_MASK, id: id & ID_MASK }
    }

    pub fn is_drop(&self) -> bool {
        self.user & 0b1 != 0
    }

    pub fn is_lossy(&self) -> bool {
        self.user & 0b100 != 0
    }
}

/// UDP 5-tuple flow key carried in `PacketMetadata::var` for ordinary
/// (non-custom-ring) traffic. `vm_id` (`spec.md` §3: "`{src_port, dst_port,
/// src_ip, dst_ip, vm_id}`") identifies the originating VM/tenant context;
/// it has no field in the Ethernet/IP/UDP header itself, so the software
/// port always carries `0` unless a caller sets it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FiveTuple {
    pub src_ip: Ipv4Addr,
    pub dst_ip: Ipv4Addr,
    pub src_port: u16,
    pub dst_port: u16,
    pub vm_id: u8,
}

/// Custom-ring side of the `var` union: just the end-of-message bit, per
/// `spec.md` §3 ("custom-ring-EOM-bit").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomRingMeta {
    pub end_of_message: bool,
}

/// The tagged union `spec.md` §3 calls `var`. The invariant `ring_id = 0 ⇔
/// var holds packet_metadata` is enforced at construction: [`PacketMetadata::new_udp`]
/// always pairs `Udp` with `ring_id = 0`, and [`PacketMetadata::new_ring`]
/// always pairs `CustomRing` with a non-zero `ring_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketVar {
    Udp(FiveTuple),
    CustomRing(CustomRingMeta),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    Udp,
    Raw,
}

/// Metadata that accompanies each packet crossing an ikernel boundary
/// (`spec.md` §3 "Ikernel metadata").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketMetadata {
    pub pkt_type: PacketType,
    /// Flow-table index + 1; `None` encodes "0 = miss".
    pub flow_id: Option<u16>,
    /// Destination engine within a direction (6 bits).
    pub ikernel_id: u8,
    pub var: PacketVar,
    /// 0 = ordinary UDP egress; non-zero = custom ring number (7 bits).
    pub ring_id: u8,
    pub ip_identification: u16,
    /// Payload length in bytes, excluding headers.
    pub length: u16,
}

impl PacketMetadata {
    pub fn new_udp(
        pkt_type: PacketType,
        flow_id: Option<u16>,
        ikernel_id: u8,
        tuple: FiveTuple,
        ip_identification: u16,
        length: u16,
    ) -> Self {
        Self {
            pkt_type,
            flow_id,
            ikernel_id: ikernel_id & 0x3F,
            var: PacketVar::Udp(tuple),
            ring_id: 0,
            ip_identification,
            length,
        }
    }

    pub fn new_ring(
        ikernel_id: u8,
        ring_id: u8,
        end_of_message: bool,
        ip_identification: u16,
        length: u16,
    ) -> Self {
        assert_ne!(ring_id & 0x7F, 0, "custom-ring metadata requires a non-zero ring_id");
        Self {
            pkt_type: PacketType::Udp,
            flow_id: None,
            ikernel_id: ikernel_id & 0x3F,
            var: PacketVar::CustomRing(CustomRingMeta { end_of_message }),
            ring_id: ring_id & 0x7F,
            ip_identification,
            length,
        }
    }

    pub fn is_custom_ring(&self) -> bool {
        self.ring_id != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_metadata_masks_to_width() {
        let m = RawMetadata::new(0xFFFF, 0xFF);
        assert_eq!(m.user, USER_MASK);
        assert_eq!(m.id, ID_MASK);
    }

    #[test]
    fn drop_and_lossy_bits() {
        assert!(RawMetadata::new(0b001, 0).is_drop());
        assert!(!RawMetadata::new(0b010, 0).is_drop());
        assert!(RawMetadata::new(0b100, 0).is_lossy());
    }

    #[test]
    fn ring_id_var_invariant_holds_for_udp() {
        let tuple = FiveTuple {
            src_ip: Ipv4Addr::new(10, 0, 0, 1),
            dst_ip: Ipv4Addr::new(10, 0, 0, 2),
            src_port: 1,
            dst_port: 2,
            vm_id: 0,
        };
        let m = PacketMetadata::new_udp(PacketType::Udp, Some(3), 1, tuple, 7, 64);
        assert_eq!(m.ring_id, 0);
        assert!(matches!(m.var, PacketVar::Udp(_)));
        assert!(!m.is_custom_ring());
    }

    #[test]
    fn ring_id_var_invariant_holds_for_ring() {
        let m = PacketMetadata::new_ring(2, 5, true, 9, 128);
        assert_eq!(m.ring_id, 5);
        assert!(matches!(m.var, PacketVar::CustomRing(_)));
        assert!(m.is_custom_ring());
    }

    #[test]
    #[should_panic]
    fn ring_metadata_rejects_zero_ring_id() {
        let _ = PacketMetadata::new_ring(2, 0, true, 9, 128);
    }
}
