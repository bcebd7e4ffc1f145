//! Steering: probe/resolve/act over the flow table (`spec.md` §4.2).
//!
//! Unlike the HLS source this models as three decoupled FIFO-connected
//! stages, the software port collapses probe+resolve into one synchronous
//! call against the in-process [`FlowTable`] — there is no lookup latency
//! to hide, and the gateway serialization invariant ("at most one command
//! drained per tick") is preserved by `&mut FlowTable` exclusivity rather
//! than a queue.

use crate::flow::gateway::FlowTableGateway;
use crate::flow::table::{FlowAction, FlowValue};
use crate::gateway::{GatewayStatus, GatewayTarget};
use crate::pipeline::header::HeaderBuffer;
use crate::pipeline::metadata::FiveTuple;

/// Outcome of steering one packet: which port the act stage should signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteeringDecision {
    Passthrough,
    Drop,
    Ikernel { ikernel_id: u8, flow_id: u16 },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SteeringCounters {
    pub disabled: u64,
    pub not_ipv4: u64,
    pub bad_length: u64,
    pub not_udp: u64,
    pub hits: u64,
    pub misses: u64,
}

/// Owns the same [`FlowTableGateway`] the top-level register dispatch
/// writes flow entries through, so a gateway `FT_ADD_FLOW` is visible to
/// the very next `steer()` call on this port (`spec.md` §8 "gateway write
/// then immediate lookup" ordering guarantee).
pub struct Steering {
    pub gateway: FlowTableGateway,
    pub enabled: bool,
    pub counters: SteeringCounters,
}

impl Default for Steering {
    fn default() -> Self {
        Self::new()
    }
}

impl Steering {
    pub fn new() -> Self {
        Self { gateway: FlowTableGateway::new(), enabled: true, counters: SteeringCounters::default() }
    }

    /// Probe + resolve + act, collapsed into one call. `spec.md` §4.2: any
    /// synchronous header check forces `Passthrough` regardless of the
    /// table result, and the matching counter is incremented either way.
    pub fn steer(&mut self, header: &HeaderBuffer) -> SteeringDecision {
        if !self.enabled {
            self.counters.disabled += 1;
            return SteeringDecision::Passthrough;
        }
        if !header.is_ipv4() {
            self.counters.not_ipv4 += 1;
            return SteeringDecision::Passthrough;
        }
        if header.bad_length() {
            self.counters.bad_length += 1;
            return SteeringDecision::Passthrough;
        }
        if !header.is_udp() {
            self.counters.not_udp += 1;
            return SteeringDecision::Passthrough;
        }

        let tuple = FiveTuple {
            src_ip: header.ip_src,
            dst_ip: header.ip_dst,
            src_port: header.udp_src_port,
            dst_port: header.udp_dst_port,
            vm_id: 0,
        };
        let key = crate::flow::key::FlowKey::masked(tuple, self.gateway.fields);
        let result = self.gateway.table.lookup(key);

        match result.value.action {
            FlowAction::Passthrough => {
                self.counters.misses += 1;
                SteeringDecision::Passthrough
            }
            FlowAction::Drop => {
                self.counters.hits += 1;
                SteeringDecision::Drop
            }
            FlowAction::Ikernel => {
                self.counters.hits += 1;
                SteeringDecision::Ikernel { ikernel_id: result.value.ikernel_id, flow_id: result.flow_id }
            }
        }
    }

    pub fn add_flow(&mut self, tuple: FiveTuple, value: FlowValue) -> Option<u16> {
        let key = crate::flow::key::FlowKey::masked(tuple, self.gateway.fields);
        self.gateway.table.add(key, value)
    }

    pub fn delete_flow(&mut self, tuple: FiveTuple) -> bool {
        let key = crate::flow::key::FlowKey::masked(tuple, self.gateway.fields);
        self.gateway.table.delete(key)
    }
}

/// Forwards every `FT_*` op straight to the embedded [`FlowTableGateway`]
/// (`spec.md` §6 flow-table ops), so the glue's top-level dispatch can
/// address this port's flow table without knowing it is nested inside
/// steering.
impl GatewayTarget for Steering {
    fn gateway_write(&mut self, addr: u32, data: u32) -> GatewayStatus {
        self.gateway.gateway_write(addr, data)
    }

    fn gateway_read(&mut self, addr: u32) -> (GatewayStatus, u32) {
        self.gateway.gateway_read(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn udp_header(src_port: u16, dst_port: u16) -> HeaderBuffer {
        let mut bytes = [0u8; crate::pipeline::header::HEADER_LEN];
        bytes[12..14].copy_from_slice(&crate::pipeline::header::ETHERTYPE_IPV4.to_be_bytes());
        bytes[14] = 0x45;
        bytes[16..18].copy_from_slice(&28u16.to_be_bytes());
        bytes[23] = crate::pipeline::header::PROTO_UDP;
        bytes[26..30].copy_from_slice(&[10, 0, 0, 1]);
        bytes[30..34].copy_from_slice(&[10, 0, 0, 2]);
        bytes[34..36].copy_from_slice(&src_port.to_be_bytes());
        bytes[36..38].copy_from_slice(&dst_port.to_be_bytes());
        bytes[38..40].copy_from_slice(&8u16.to_be_bytes());
        HeaderBuffer::parse(&bytes).unwrap()
    }

    #[test]
    fn miss_is_passthrough_and_counted() {
        let mut steering = Steering::new();
        let decision = steering.steer(&udp_header(1, 2));
        assert_eq!(decision, SteeringDecision::Passthrough);
        assert_eq!(steering.counters.misses, 1);
    }

    #[test]
    fn hit_routes_to_ikernel() {
        let mut steering = Steering::new();
        let tuple = FiveTuple {
            src_ip: Ipv4Addr::new(10, 0, 0, 1),
            dst_ip: Ipv4Addr::new(10, 0, 0, 2),
            src_port: 1,
            dst_port: 2,
            vm_id: 0,
        };
        steering
            .add_flow(tuple, FlowValue { action: FlowAction::Ikernel, engine_id: 0, ikernel_id: 3 })
            .unwrap();
        let decision = steering.steer(&udp_header(1, 2));
        assert_eq!(decision, SteeringDecision::Ikernel { ikernel_id: 3, flow_id: 1 });
        assert_eq!(steering.counters.hits, 1);
    }

    #[test]
    fn disabled_pipeline_forces_passthrough() {
        let mut steering = Steering::new();
        steering.enabled = false;
        assert_eq!(steering.steer(&udp_header(1, 2)), SteeringDecision::Passthrough);
        assert_eq!(steering.counters.disabled, 1);
    }

    #[test]
    fn bad_length_forces_passthrough_even_on_hit() {
        let mut steering = Steering::new();
        let tuple = FiveTuple {
            src_ip: Ipv4Addr::new(10, 0, 0, 1),
            dst_ip: Ipv4Addr::new(10, 0, 0, 2),
            src_port: 1,
            dst_port: 2,
            vm_id: 0,
        };
        steering
            .add_flow(tuple, FlowValue { action: FlowAction::Ikernel, engine_id: 0, ikernel_id: 3 })
            .unwrap();
        let mut bytes = [0u8; crate::pipeline::header::HEADER_LEN];
        bytes[12..14].copy_from_slice(&crate::pipeline::header::ETHERTYPE_IPV4.to_be_bytes());
        bytes[14] = 0x45;
        bytes[16..18].copy_from_slice(&20u16.to_be_bytes());
        bytes[23] = crate::pipeline::header::PROTO_UDP;
        bytes[34..36].copy_from_slice(&1u16.to_be_bytes());
        bytes[36..38].copy_from_slice(&2u16.to_be_bytes());
        let header = HeaderBuffer::parse(&bytes).unwrap();
        assert_eq!(steering.steer(&header), SteeringDecision::Passthrough);
        assert_eq!(steering.counters.bad_length, 1);
    }
}
