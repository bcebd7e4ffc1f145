//! Passthrough ikernel (`spec.md` §4.11): forwards a packet unchanged when
//! `ring_id = 0`, or rewraps it as custom-ring traffic toward a configured
//! ring, gated on ring credit unless `ignore_credits` is set for testing.

use crate::gateway::addr::passthrough::*;
use crate::gateway::{GatewayStatus, GatewayTarget};
use crate::ikernel::{can_transmit, new_message, CreditTable, Direction, Ikernel, IkernelEmit, IkernelPacket, TcCounts};
use crate::pipeline::custom_ring::NUM_RINGS;

pub struct PassthroughIkernel {
    ikernel_id: u8,
    ring_id: u8,
    ignore_credits: bool,
    credit: CreditTable,
}

impl PassthroughIkernel {
    pub fn new(ikernel_id: u8, ring_id: u8, ignore_credits: bool) -> Self {
        Self { ikernel_id, ring_id, ignore_credits, credit: CreditTable::new(NUM_RINGS) }
    }

    /// Grants full credit on `ring_id` so tests don't need to drive the
    /// credit-intake path separately.
    pub fn grant_credit(&mut self, max_msn: u32) {
        self.credit.update(self.ring_id, max_msn, false);
    }
}

impl GatewayTarget for PassthroughIkernel {
    fn gateway_write(&mut self, addr: u32, data: u32) -> GatewayStatus {
        match addr {
            RING_ID => {
                self.ring_id = data as u8;
                GatewayStatus::Done
            }
            IGNORE_CREDITS => {
                self.ignore_credits = data != 0;
                GatewayStatus::Done
            }
            _ => GatewayStatus::Fail,
        }
    }

    fn gateway_read(&mut self, addr: u32) -> (GatewayStatus, u32) {
        match addr {
            RING_ID => (GatewayStatus::Done, u32::from(self.ring_id)),
            IGNORE_CREDITS => (GatewayStatus::Done, u32::from(self.ignore_credits)),
            _ => (GatewayStatus::Fail, 0),
        }
    }
}

impl Ikernel for PassthroughIkernel {
    fn ingress(&mut self, direction: Direction, mut packet: IkernelPacket, tc_counts: &TcCounts) -> Vec<IkernelEmit> {
        if self.ring_id == 0 {
            return vec![IkernelEmit::Forward(packet)];
        }

        if !self.ignore_credits && !can_transmit(tc_counts, &self.credit, self.ikernel_id, self.ring_id, direction) {
            return vec![];
        }

        let meta = &packet.metadata;
        let rewrapped = crate::pipeline::metadata::PacketMetadata::new_ring(
            meta.ikernel_id,
            self.ring_id,
            true,
            meta.ip_identification,
            meta.length,
        );
        packet.metadata = rewrapped;

        if !self.ignore_credits {
            new_message(&mut self.credit, self.ring_id, direction);
        }
        vec![IkernelEmit::Forward(packet)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::header::HeaderBuffer;
    use crate::pipeline::metadata::{FiveTuple, PacketMetadata, PacketType};
    use std::net::Ipv4Addr;

    fn unit() -> IkernelPacket {
        let tuple = FiveTuple {
            src_ip: Ipv4Addr::new(10, 0, 0, 1),
            dst_ip: Ipv4Addr::new(10, 0, 0, 2),
            src_port: 1,
            dst_port: 2,
            vm_id: 0,
        };
        IkernelPacket {
            header: HeaderBuffer {
                eth_dst: [0; 6],
                eth_src: [0; 6],
                ethertype: 0x0800,
                ip_ihl_version: 0x45,
                ip_tos: 0,
                ip_tot_len: 32,
                ip_identification: 7,
                ip_flags_frag: 0,
                ip_ttl: 64,
                ip_protocol: 17,
                ip_src: Ipv4Addr::UNSPECIFIED,
                ip_dst: Ipv4Addr::UNSPECIFIED,
                udp_src_port: tuple.src_port,
                udp_dst_port: tuple.dst_port,
                udp_length: 12,
            },
            metadata: PacketMetadata::new_udp(PacketType::Udp, None, 3, tuple, 7, 4),
            payload: vec![1, 2, 3, 4],
        }
    }

    #[test]
    fn ring_zero_forwards_unchanged() {
        let mut ik = PassthroughIkernel::new(0, 0, false);
        let out = ik.ingress(Direction::Net, unit(), &TcCounts::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].packet().metadata.ring_id, 0);
    }

    #[test]
    fn nonzero_ring_rewraps_as_custom_ring_traffic() {
        let mut ik = PassthroughIkernel::new(0, 2, true);
        let out = ik.ingress(Direction::Host, unit(), &TcCounts::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].packet().metadata.ring_id, 2);
    }

    #[test]
    fn exhausted_credit_blocks_emission_unless_ignored() {
        let mut ik = PassthroughIkernel::new(0, 1, false);
        let out = ik.ingress(Direction::Host, unit(), &TcCounts::default());
        assert!(out.is_empty());

        ik.grant_credit(1);
        let out = ik.ingress(Direction::Host, unit(), &TcCounts::default());
        assert_eq!(out.len(), 1);
    }
}
