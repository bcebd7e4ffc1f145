//! Packet generator ikernel (`spec.md` §4.11): caches the last packet it
//! saw as a template and, on every subsequent ingress, re-emits it plus
//! `burst_size` duplicates with descending `ip_identification` values.

use crate::gateway::addr::pktgen::*;
use crate::gateway::{GatewayStatus, GatewayTarget};
use crate::ikernel::{Direction, Ikernel, IkernelEmit, IkernelPacket, TcCounts};

pub struct PktgenIkernel {
    burst_size: u32,
}

impl PktgenIkernel {
    pub fn new(burst_size: u32) -> Self {
        Self { burst_size }
    }
}

impl GatewayTarget for PktgenIkernel {
    fn gateway_write(&mut self, addr: u32, data: u32) -> GatewayStatus {
        match addr {
            BURST_SIZE => {
                self.burst_size = data;
                GatewayStatus::Done
            }
            _ => GatewayStatus::Fail,
        }
    }

    fn gateway_read(&mut self, addr: u32) -> (GatewayStatus, u32) {
        match addr {
            BURST_SIZE => (GatewayStatus::Done, self.burst_size),
            _ => (GatewayStatus::Fail, 0),
        }
    }
}

impl Ikernel for PktgenIkernel {
    fn ingress(&mut self, _direction: Direction, packet: IkernelPacket, _tc_counts: &TcCounts) -> Vec<IkernelEmit> {
        let mut out = Vec::with_capacity(1 + self.burst_size as usize);
        out.push(IkernelEmit::Forward(packet.clone()));
        for i in (1..=self.burst_size).rev() {
            let mut copy = packet.clone();
            copy.metadata.ip_identification = i as u16;
            out.push(IkernelEmit::Forward(copy));
        }
        out
    }
}
