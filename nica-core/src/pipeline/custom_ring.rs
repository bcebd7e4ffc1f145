//! Custom-ring packet builder (n2h only): synthesizes a RoCE v2 UC SEND
//! ONLY frame from an ikernel egress packet flagged with `ring_id != 0`
//! (`spec.md` §4.8, §6 custom-ring gateway ops).

use std::net::Ipv4Addr;

use crate::gateway::addr::custom_ring::*;
use crate::gateway::{GatewayStatus, GatewayTarget};
use crate::pipeline::header::HeaderBuffer;
use crate::pipeline::metadata::PacketMetadata;
use crate::pipeline::EgressUnit;

pub const CUSTOM_RINGS_LOG_NUM: u32 = 6;
pub const NUM_RINGS: usize = 1 << CUSTOM_RINGS_LOG_NUM;

pub const RDMA_UDP_PORT: u16 = 4791;
pub const BTH_LEN: usize = 12;
pub const ICRC_LEN: usize = 4;
const OPCODE_UC_SEND_ONLY: u8 = 0x2C;
const PKEY_DEFAULT: u16 = 0xFFFF;

/// `{eth_dst, ip_dst, dest_qpn, psn}` per ring (`spec.md` §3 "Ring
/// context"). `psn` increments on every packet sent to the ring.
#[derive(Debug, Clone, Copy, Default)]
pub struct RingContext {
    pub eth_dst: [u8; 6],
    pub ip_dst: Ipv4Addr,
    pub dest_qpn: u32,
    pub psn: u32,
}

/// Locally-configured source identity the builder stamps into every
/// synthesized RoCE frame (the pipeline's own MAC/IP/UDP source port).
#[derive(Debug, Clone, Copy, Default)]
pub struct RingSourceIdentity {
    pub eth_src: [u8; 6],
    pub ip_src: Ipv4Addr,
    pub udp_src_port: u16,
}

/// Build a 12-byte BTH (`spec.md` §4.8): `opcode = UC_SEND_ONLY`, `pkey =
/// 0xFFFF`, `qpn`, `psn`, `pad = pad_count << 4`.
fn build_bth(qpn: u32, psn: u32, pad_count: u8) -> [u8; BTH_LEN] {
    let mut bth = [0u8; BTH_LEN];
    bth[0] = OPCODE_UC_SEND_ONLY;
    bth[1] = pad_count << 4;
    bth[2..4].copy_from_slice(&PKEY_DEFAULT.to_be_bytes());
    bth[4..8].copy_from_slice(&(qpn & 0x00FF_FFFF).to_be_bytes());
    bth[8..12].copy_from_slice(&(psn & 0x00FF_FFFF).to_be_bytes());
    bth
}

/// Fixed-size table of per-ring contexts, indexed by `ring_id - 1`
/// (`spec.md` §3, §6 `CR_WRITE_CONTEXT`/`CR_READ_CONTEXT`).
pub struct CustomRingTable {
    rings: Vec<RingContext>,
    pub source: RingSourceIdentity,
    staged: RingContext,
}

impl CustomRingTable {
    pub fn new(source: RingSourceIdentity) -> Self {
        Self { rings: vec![RingContext::default(); NUM_RINGS], source, staged: RingContext::default() }
    }

    pub fn context(&self, ring_id: u8) -> Option<&RingContext> {
        if ring_id == 0 {
            return None;
        }
        self.rings.get((ring_id - 1) as usize)
    }

    pub fn context_mut(&mut self, ring_id: u8) -> Option<&mut RingContext> {
        if ring_id == 0 {
            return None;
        }
        self.rings.get_mut((ring_id - 1) as usize)
    }

    /// Consume one [`RingInput`] whose `ring_id != 0` and produce the
    /// RoCE-framed egress unit, incrementing the ring's PSN. Invariant
    /// (`spec.md` §4.8): exactly one input in, exactly one output out.
    pub fn build(&mut self, input: EgressUnit) -> Option<EgressUnit> {
        let ring_id = input.metadata.ring_id;
        let ctx = self.context_mut(ring_id)?;

        let payload_len = input.payload.len();
        let pad_count = ((4 - (payload_len % 4)) % 4) as u8;

        let mut out_payload = Vec::with_capacity(BTH_LEN + payload_len + pad_count as usize + ICRC_LEN);
        out_payload.extend_from_slice(&build_bth(ctx.dest_qpn, ctx.psn, pad_count));
        out_payload.extend_from_slice(&input.payload);
        out_payload.resize(out_payload.len() + pad_count as usize, 0);
        // ICRC placeholder: zero, per `spec.md` §9 open question (a real
        // CRC32C is the downstream RDMA verbs consumer's job).
        out_payload.extend_from_slice(&[0u8; ICRC_LEN]);

        let mut header = input.header;
        header.eth_dst = ctx.eth_dst;
        header.eth_src = self.source.eth_src;
        header.ip_src = self.source.ip_src;
        header.ip_dst = ctx.ip_dst;
        header.udp_src_port = self.source.udp_src_port;
        header.udp_dst_port = RDMA_UDP_PORT;
        header.udp_length = 8 + out_payload.len() as u16;
        header.ip_tot_len = 20 + header.udp_length;

        let mut metadata = input.metadata;
        metadata.length = out_payload.len() as u16;

        ctx.psn = ctx.psn.wrapping_add(1) & 0x00FF_FFFF;

        Some(EgressUnit { header, metadata, payload: out_payload })
    }
}

impl GatewayTarget for CustomRingTable {
    fn gateway_write(&mut self, addr: u32, data: u32) -> GatewayStatus {
        match addr {
            CR_SRC_MAC_LO => {
                self.source.eth_src[2..6].copy_from_slice(&data.to_be_bytes());
                GatewayStatus::Done
            }
            CR_SRC_MAC_HI => {
                self.source.eth_src[0..2].copy_from_slice(&(data as u16).to_be_bytes());
                GatewayStatus::Done
            }
            CR_SRC_IP => {
                self.source.ip_src = Ipv4Addr::from(data);
                GatewayStatus::Done
            }
            CR_SRC_UDP => {
                self.source.udp_src_port = data as u16;
                GatewayStatus::Done
            }
            CR_DST_UDP => GatewayStatus::Done, // destination UDP port is fixed at 4791 per RoCE v2.
            CR_DST_MAC_LO => {
                self.staged.eth_dst[2..6].copy_from_slice(&data.to_be_bytes());
                GatewayStatus::Done
            }
            CR_DST_MAC_HI => {
                self.staged.eth_dst[0..2].copy_from_slice(&(data as u16).to_be_bytes());
                GatewayStatus::Done
            }
            CR_DST_IP => {
                self.staged.ip_dst = Ipv4Addr::from(data);
                GatewayStatus::Done
            }
            CR_DST_QPN => {
                self.staged.dest_qpn = data & 0x00FF_FFFF;
                GatewayStatus::Done
            }
            CR_PSN => {
                self.staged.psn = data & 0x00FF_FFFF;
                GatewayStatus::Done
            }
            CR_WRITE_CONTEXT => {
                let n = data as u8;
                match self.context_mut(n) {
                    Some(ctx) => {
                        *ctx = self.staged;
                        GatewayStatus::Done
                    }
                    None => GatewayStatus::Fail,
                }
            }
            CR_READ_CONTEXT => {
                let n = data as u8;
                match self.context(n) {
                    Some(ctx) => {
                        self.staged = *ctx;
                        GatewayStatus::Done
                    }
                    None => GatewayStatus::Fail,
                }
            }
            _ => GatewayStatus::Fail,
        }
    }

    fn gateway_read(&mut self, addr: u32) -> (GatewayStatus, u32) {
        match addr {
            CR_DST_IP => (GatewayStatus::Done, u32::from(self.staged.ip_dst)),
            CR_DST_QPN => (GatewayStatus::Done, self.staged.dest_qpn),
            CR_PSN => (GatewayStatus::Done, self.staged.psn),
            CR_NUM_CONTEXTS => (GatewayStatus::Done, NUM_RINGS as u32),
            _ => (GatewayStatus::Fail, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::metadata::{PacketMetadata, PacketVar};

    fn source() -> RingSourceIdentity {
        RingSourceIdentity { eth_src: [1, 2, 3, 4, 5, 6], ip_src: Ipv4Addr::new(192, 168, 0, 1), udp_src_port: 9999 }
    }

    fn sample_header() -> HeaderBuffer {
        HeaderBuffer::parse(&{
            let mut b = vec![0u8; crate::pipeline::header::HEADER_LEN];
            b[12..14].copy_from_slice(&crate::pipeline::header::ETHERTYPE_IPV4.to_be_bytes());
            b[14] = 0x45;
            b
        })
        .unwrap()
    }

    #[test]
    fn builds_bth_framed_packet_and_increments_psn() {
        let mut table = CustomRingTable::new(source());
        let ctx = table.context_mut(1).unwrap();
        ctx.eth_dst = [0xff; 6];
        ctx.ip_dst = Ipv4Addr::new(127, 0, 0, 1);
        ctx.dest_qpn = 1;
        ctx.psn = 41;

        let metadata = PacketMetadata::new_ring(0, 1, true, 0, 10);
        let input = EgressUnit { header: sample_header(), metadata, payload: vec![0xAB; 10] };
        let out = table.build(input).expect("ring 1 exists");
        let (header, out_meta, payload) = (out.header, out.metadata, out.payload);

        assert_eq!(header.udp_dst_port, RDMA_UDP_PORT);
        assert_eq!(header.eth_dst, [0xff; 6]);
        assert_eq!(&payload[0..BTH_LEN][0], &OPCODE_UC_SEND_ONLY);
        assert_eq!(u32::from_be_bytes([0, payload[5], payload[6], payload[7]]) & 0x00FF_FFFF, 1);
        assert_eq!(u32::from_be_bytes([0, payload[9], payload[10], payload[11]]), 41);
        assert_eq!(out_meta.length as usize, payload.len());
        // 10-byte payload needs 2 bytes of padding to reach a 4-byte boundary.
        assert_eq!(payload.len(), BTH_LEN + 10 + 2 + ICRC_LEN);

        assert_eq!(table.context(1).unwrap().psn, 42);
    }

    #[test]
    fn ring_zero_has_no_context() {
        let mut table = CustomRingTable::new(source());
        let metadata = PacketMetadata { ring_id: 0, ..PacketMetadata::new_ring(0, 1, false, 0, 0) };
        let input = EgressUnit { header: sample_header(), metadata, payload: vec![] };
        assert!(table.build(input).is_none());
    }

    #[test]
    fn unaligned_payload_pads_icrc_onto_a_four_byte_boundary() {
        let mut table = CustomRingTable::new(source());
        table.context_mut(2).unwrap().dest_qpn = 5;
        let metadata = PacketMetadata::new_ring(0, 2, true, 0, 0);
        let input = EgressUnit { header: sample_header(), metadata, payload: vec![1, 2, 3] };
        let payload = table.build(input).unwrap().payload;
        assert_eq!((payload.len() - BTH_LEN) % 4, 0);
    }

    #[test]
    fn var_remains_custom_ring_metadata() {
        let m = PacketMetadata::new_ring(1, 3, false, 0, 0);
        assert!(matches!(m.var, PacketVar::CustomRing(_)));
    }
}
