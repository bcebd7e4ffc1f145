//! Echo ikernel (`spec.md` §4.11): the simplest possible engine, used as a
//! baseline for throughput tests and as a template for new engines. No
//! register state; every packet is forwarded unchanged.

use crate::gateway::{GatewayStatus, GatewayTarget};
use crate::ikernel::{Direction, Ikernel, IkernelEmit, IkernelPacket, TcCounts};

#[derive(Default)]
pub struct EchoIkernel;

impl EchoIkernel {
    pub fn new() -> Self {
        Self
    }
}

impl GatewayTarget for EchoIkernel {
    fn gateway_write(&mut self, _addr: u32, _data: u32) -> GatewayStatus {
        GatewayStatus::Fail
    }

    fn gateway_read(&mut self, _addr: u32) -> (GatewayStatus, u32) {
        (GatewayStatus::Fail, 0)
    }
}

impl Ikernel for EchoIkernel {
    fn ingress(&mut self, _direction: Direction, packet: IkernelPacket, _tc_counts: &TcCounts) -> Vec<IkernelEmit> {
        vec![IkernelEmit::Forward(packet)]
    }
}
