//! Threshold ikernel (`spec.md` §4.11): drops a packet unless the first
//! four bytes of its payload, read as a big-endian `u32`, meet a
//! host-programmed threshold, while keeping running min/max/count/sum
//! statistics over every value observed.

use crate::gateway::addr::threshold::*;
use crate::gateway::{GatewayStatus, GatewayTarget};
use crate::ikernel::{can_transmit, new_message, CreditTable, Direction, Ikernel, IkernelEmit, IkernelPacket, TcCounts};

pub struct ThresholdIkernel {
    ikernel_id: u8,
    threshold_value: u32,
    min: u32,
    max: u32,
    count: u64,
    sum: u64,
    dropped: u64,
    dropped_backpressure: u64,
    credit: CreditTable,
}

impl ThresholdIkernel {
    pub fn new(ikernel_id: u8) -> Self {
        Self {
            ikernel_id,
            threshold_value: 0,
            min: u32::MAX,
            max: 0,
            count: 0,
            sum: 0,
            dropped: 0,
            dropped_backpressure: 0,
            credit: CreditTable::new(0),
        }
    }

    fn observe(&mut self, value: u32) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.count += 1;
        self.sum += u64::from(value);
    }

    fn reset(&mut self) {
        self.min = u32::MAX;
        self.max = 0;
        self.count = 0;
        self.sum = 0;
        self.dropped = 0;
        self.dropped_backpressure = 0;
    }
}

impl GatewayTarget for ThresholdIkernel {
    fn gateway_write(&mut self, addr: u32, data: u32) -> GatewayStatus {
        match addr {
            THRESHOLD_VALUE => {
                self.threshold_value = data;
                GatewayStatus::Done
            }
            THRESHOLD_RESET => {
                self.reset();
                GatewayStatus::Done
            }
            _ => GatewayStatus::Fail,
        }
    }

    fn gateway_read(&mut self, addr: u32) -> (GatewayStatus, u32) {
        match addr {
            THRESHOLD_VALUE => (GatewayStatus::Done, self.threshold_value),
            THRESHOLD_MIN => (GatewayStatus::Done, self.min),
            THRESHOLD_MAX => (GatewayStatus::Done, self.max),
            THRESHOLD_COUNT => (GatewayStatus::Done, self.count as u32),
            THRESHOLD_SUM_LO => (GatewayStatus::Done, self.sum as u32),
            THRESHOLD_SUM_HI => (GatewayStatus::Done, (self.sum >> 32) as u32),
            THRESHOLD_DROPPED => (GatewayStatus::Done, self.dropped as u32),
            THRESHOLD_DROPPED_BACKPRESSURE => (GatewayStatus::Done, self.dropped_backpressure as u32),
            _ => (GatewayStatus::Fail, 0),
        }
    }
}

impl Ikernel for ThresholdIkernel {
    /// The hardware variant reassembles its four value bytes across flit
    /// boundaries; here the payload already arrives whole, so the
    /// reassembly state machine collapses to a single slice read.
    fn ingress(&mut self, direction: Direction, packet: IkernelPacket, tc_counts: &TcCounts) -> Vec<IkernelEmit> {
        let Some(value_bytes) = packet.payload.get(0..4) else {
            return vec![IkernelEmit::Forward(packet)];
        };
        let value = u32::from_be_bytes(value_bytes.try_into().unwrap());
        self.observe(value);

        if value < self.threshold_value {
            self.dropped += 1;
            return vec![];
        }
        if !can_transmit(tc_counts, &self.credit, self.ikernel_id, packet.metadata.ring_id, direction) {
            self.dropped_backpressure += 1;
            return vec![];
        }
        new_message(&mut self.credit, packet.metadata.ring_id, direction);
        vec![IkernelEmit::Forward(packet)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::header::HeaderBuffer;
    use crate::pipeline::metadata::{FiveTuple, PacketMetadata, PacketType};
    use std::net::Ipv4Addr;

    fn unit(value: u32) -> IkernelPacket {
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
                ip_identification: 0,
                ip_flags_frag: 0,
                ip_ttl: 64,
                ip_protocol: 17,
                ip_src: Ipv4Addr::UNSPECIFIED,
                ip_dst: Ipv4Addr::UNSPECIFIED,
                udp_src_port: tuple.src_port,
                udp_dst_port: tuple.dst_port,
                udp_length: 12,
            },
            metadata: PacketMetadata::new_udp(PacketType::Udp, None, 0, tuple, 0, 4),
            payload: value.to_be_bytes().to_vec(),
        }
    }

    #[test]
    fn below_threshold_is_dropped_and_counted() {
        let mut ik = ThresholdIkernel::new(0);
        ik.gateway_write(THRESHOLD_VALUE, 100);
        let out = ik.ingress(Direction::Net, unit(50), &TcCounts::default());
        assert!(out.is_empty());
        assert_eq!(ik.gateway_read(THRESHOLD_DROPPED), (GatewayStatus::Done, 1));
    }

    #[test]
    fn at_or_above_threshold_passes_through() {
        let mut ik = ThresholdIkernel::new(0);
        ik.gateway_write(THRESHOLD_VALUE, 100);
        let out = ik.ingress(Direction::Net, unit(100), &TcCounts::default());
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn statistics_accumulate_across_packets() {
        let mut ik = ThresholdIkernel::new(0);
        ik.ingress(Direction::Net, unit(10), &TcCounts::default());
        ik.ingress(Direction::Net, unit(30), &TcCounts::default());
        assert_eq!(ik.gateway_read(THRESHOLD_MIN), (GatewayStatus::Done, 10));
        assert_eq!(ik.gateway_read(THRESHOLD_MAX), (GatewayStatus::Done, 30));
        assert_eq!(ik.gateway_read(THRESHOLD_COUNT), (GatewayStatus::Done, 2));
        assert_eq!(ik.gateway_read(THRESHOLD_SUM_LO), (GatewayStatus::Done, 40));
    }

    #[test]
    fn reset_clears_counters_but_not_threshold() {
        let mut ik = ThresholdIkernel::new(0);
        ik.gateway_write(THRESHOLD_VALUE, 5);
        ik.ingress(Direction::Net, unit(1), &TcCounts::default());
        ik.gateway_write(THRESHOLD_RESET, 0);
        assert_eq!(ik.gateway_read(THRESHOLD_COUNT), (GatewayStatus::Done, 0));
        assert_eq!(ik.gateway_read(THRESHOLD_VALUE), (GatewayStatus::Done, 5));
    }

    #[test]
    fn backpressured_traffic_class_is_dropped_and_counted() {
        let mut ik = ThresholdIkernel::new(0);
        let mut tc_counts = TcCounts::default();
        tc_counts.metadata_depth[0] = crate::ikernel::TC_BACKPRESSURE_THRESHOLD;
        let out = ik.ingress(Direction::Net, unit(1), &tc_counts);
        assert!(out.is_empty());
        assert_eq!(ik.gateway_read(THRESHOLD_DROPPED_BACKPRESSURE), (GatewayStatus::Done, 1));
    }
}
