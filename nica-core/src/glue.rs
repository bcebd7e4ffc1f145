//! Glue: wires two independent instances of the packet pipeline (one per
//! direction) together with the shared ikernel registry into a single
//! `Nica` runtime (`spec.md` §4.12).
//!
//! Every other module in this crate models one pipeline stage in
//! isolation; this is the only place that decides what happens to a
//! packet crossing from one stage into the next, and the only place that
//! owns both directions at once (needed because a memcached cache hit or
//! a custom-ring reply crosses from one direction's ingress straight to
//! the other's egress, per `spec.md` §4.11).

use std::collections::HashMap;
use std::fs;

use crate::config::{Config, CustomRingConfig, IkernelConfig};
use crate::error::Result;
use crate::gateway::addr::{pipeline as reg, scheduler};
use crate::gateway::{GatewayStatus, GatewayTarget};
use crate::ikernel::{self, Direction as IkernelDirection, Ikernel};
use crate::ikernels::{CmsIkernel, CoapIkernel, EchoIkernel, MemcachedIkernel, PassthroughIkernel, PktgenIkernel, ThresholdIkernel};
use crate::pipeline::arbiter::Arbiter;
use crate::pipeline::builder;
use crate::pipeline::codec::{Codec, CodecEvent};
use crate::pipeline::custom_ring::{CustomRingTable, RingSourceIdentity};
use crate::pipeline::demux::Demux;
use crate::pipeline::flit::Flit;
use crate::pipeline::header::HeaderBuffer;
use crate::pipeline::length_adjust::LengthAdjust;
use crate::pipeline::metadata::{FiveTuple, PacketMetadata, PacketType};
use crate::pipeline::steering::{Steering, SteeringDecision};
use crate::pipeline::EgressUnit;

/// Which way a frame is travelling through the crossbar. Distinct from
/// [`ikernel::Direction`], which is host-vs-net from an engine's own
/// point of view rather than direction of travel (`spec.md` §4.4, §4.12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    HostToNet,
    NetToHost,
}

impl Direction {
    /// `spec.md` §4.11 memcached doc: a packet on the net-to-host
    /// pipeline is heading toward the host, so an engine sees it as
    /// [`IkernelDirection::Host`]; host-to-net is the reverse.
    fn ikernel_direction(self) -> IkernelDirection {
        match self {
            Direction::NetToHost => IkernelDirection::Host,
            Direction::HostToNet => IkernelDirection::Net,
        }
    }
}

#[derive(Debug, Default)]
pub struct PipelineCounters {
    pub frames_in: u64,
    pub frames_out: u64,
    pub dropped: u64,
    pub non_udp_passthrough: u64,
    pub unknown_ikernel: u64,
    pub ring_unconfigured_drops: u64,
}

/// One direction's worth of pipeline state: everything downstream of the
/// shared ikernel registry (`spec.md` §4: steering, the DRR arbiter, the
/// demultiplexor, and — n2h only — the custom-ring builder).
struct PipelineState {
    steering: Steering,
    arbiter: Arbiter,
    demux: Demux,
    custom_ring: Option<CustomRingTable>,
    /// Frames that bypass the arbiter entirely: the codec's own
    /// `NonUdp` classification is "routed to the passthrough port
    /// untouched" (`spec.md` §4.1) with no header to demux or schedule by.
    immediate_out: Vec<Vec<u8>>,
    counters: PipelineCounters,
}

impl PipelineState {
    fn new(cfg: &crate::config::PipelineConfig, custom_ring: Option<CustomRingTable>) -> Self {
        let mut steering = Steering::new();
        steering.enabled = cfg.enabled;

        let mut arbiter = Arbiter::new(ikernel::NUM_TC);
        for tc in 0..ikernel::NUM_TC as u32 {
            let addr = scheduler::base(tc) + scheduler::SCHED_DRR_QUANTUM;
            arbiter.gateway_write(addr, cfg.scheduler_default_quantum);
        }

        Self { steering, arbiter, demux: Demux, custom_ring, immediate_out: Vec::new(), counters: PipelineCounters::default() }
    }
}

/// Everything the codec produces for one inbound frame, short of the
/// steering decision.
enum CodecResult {
    Header { header: HeaderBuffer, payload: Vec<u8> },
    /// Too short (or otherwise malformed) to carry a 42-byte header.
    NonUdp,
}

fn frame_to_flits(frame: &[u8]) -> Vec<Flit> {
    if frame.is_empty() {
        return vec![Flit::last_with([0u8; 32], 0)];
    }
    let mut chunks = frame.chunks(Flit::WIDTH_BYTES).peekable();
    let mut flits = Vec::with_capacity(frame.len().div_ceil(Flit::WIDTH_BYTES));
    while let Some(chunk) = chunks.next() {
        if chunks.peek().is_some() {
            let mut data = [0u8; 32];
            data.copy_from_slice(chunk);
            flits.push(Flit::full(data));
        } else {
            let mut data = [0u8; 32];
            data[..chunk.len()].copy_from_slice(chunk);
            flits.push(Flit::last_with(data, chunk.len()));
        }
    }
    flits
}

/// Drives [`Codec`] (and, once the header is known, [`LengthAdjust`])
/// across every flit of one frame, including the extra flush push
/// `Codec::is_draining` calls for (`spec.md` §4.1, §4.3).
fn drive_codec(frame: &[u8]) -> CodecResult {
    let mut codec = Codec::new();
    let mut adjust: Option<LengthAdjust> = None;
    let mut header = None;
    let mut payload = Vec::new();

    for flit in frame_to_flits(frame) {
        match codec.push(flit) {
            CodecEvent::NeedMore => {}
            CodecEvent::Header(h) => {
                adjust = Some(LengthAdjust::new(h.udp_length));
                header = Some(h);
            }
            CodecEvent::Data(f) | CodecEvent::LastData(f) => {
                if let Some(out) = adjust.as_mut().and_then(|a| a.push(f)) {
                    payload.extend_from_slice(out.valid_bytes());
                }
            }
            CodecEvent::NonUdp(_) => return CodecResult::NonUdp,
        }
        if codec.is_draining() {
            if let CodecEvent::LastData(f) = codec.push(Flit::last_with([0u8; 32], 0)) {
                if let Some(out) = adjust.as_mut().and_then(|a| a.push(f)) {
                    payload.extend_from_slice(out.valid_bytes());
                }
            }
        }
    }

    match header {
        Some(header) => CodecResult::Header { header, payload },
        None => CodecResult::NonUdp,
    }
}

/// Enqueues one ikernel-produced packet onto whichever direction it is
/// actually bound for: `Forward` stays on `origin`, `Reply` crosses to
/// the opposite direction's egress without touching that direction's own
/// steering or ikernels (`spec.md` §4.11 "answered here and never
/// reaches the host"). Custom-ring framing is applied later, at drain
/// time, not here (`spec.md` §4: "...arbiter → demux → custom-ring →
/// builder").
fn route_emit(host_to_net: &mut PipelineState, net_to_host: &mut PipelineState, origin: Direction, emit: ikernel::IkernelEmit) {
    use ikernel::IkernelEmit;

    let (dest_is_net_to_host, unit) = match emit {
        IkernelEmit::Forward(p) => (origin == Direction::NetToHost, p),
        IkernelEmit::Reply(p) => (origin == Direction::HostToNet, p),
    };
    let dest = if dest_is_net_to_host { net_to_host } else { host_to_net };
    let tc = dest.demux.route(&unit.metadata, false);
    dest.arbiter.enqueue(tc, unit);
}

fn build_ikernels(configs: &[IkernelConfig], custom_rings: &[CustomRingConfig]) -> Result<HashMap<u8, Box<dyn Ikernel>>> {
    let mut map = HashMap::new();
    for cfg in configs {
        let ikernel_id = cfg.ikernel_id();
        let engine: Box<dyn Ikernel> = match cfg {
            IkernelConfig::Threshold { ikernel_id, threshold_value } => {
                let mut ik = ThresholdIkernel::new(*ikernel_id);
                ik.gateway_write(crate::gateway::addr::threshold::THRESHOLD_VALUE, *threshold_value);
                Box::new(ik)
            }
            IkernelConfig::CountMinSketch { top_k, .. } => Box::new(CmsIkernel::new(*top_k)),
            IkernelConfig::Passthrough { ikernel_id, ring_id, ignore_credits } => {
                let mut ik = PassthroughIkernel::new(*ikernel_id, *ring_id, *ignore_credits);
                if let Some(ring) = custom_rings.iter().find(|r| r.ring_id == *ring_id) {
                    ik.grant_credit(ring.max_msn);
                }
                Box::new(ik)
            }
            IkernelConfig::Pktgen { burst_size, .. } => Box::new(PktgenIkernel::new(*burst_size)),
            // `log_size` has no counterpart here: the software cache is a
            // plain HashMap with no fixed-capacity CAM to size.
            IkernelConfig::Memcached { ikernel_id, .. } => Box::new(MemcachedIkernel::new(*ikernel_id)),
            IkernelConfig::Echo { .. } => Box::new(EchoIkernel::new()),
            IkernelConfig::Coap { hmac_key_path, .. } => {
                let key = fs::read(hmac_key_path)?;
                Box::new(CoapIkernel::new(key))
            }
        };
        map.insert(ikernel_id, engine);
    }
    Ok(map)
}

/// The whole software-equivalent dataplane: two pipeline directions plus
/// the ikernel registry shared between them (`spec.md` §4.12).
pub struct Nica {
    host_to_net: PipelineState,
    net_to_host: PipelineState,
    ikernels: HashMap<u8, Box<dyn Ikernel>>,
}

impl Nica {
    pub fn new(config: &Config) -> Result<Self> {
        let ikernels = build_ikernels(&config.ikernels, &config.custom_rings)?;

        let host_to_net = PipelineState::new(&config.host_to_net, None);
        let mut net_to_host = PipelineState::new(&config.net_to_host, Some(CustomRingTable::new(RingSourceIdentity::default())));
        if let Some(rings) = net_to_host.custom_ring.as_mut() {
            for ring in &config.custom_rings {
                if let Some(ctx) = rings.context_mut(ring.ring_id) {
                    ctx.eth_dst = ring.eth_dst;
                    ctx.ip_dst = ring.ip_dst;
                    ctx.dest_qpn = ring.dest_qpn;
                }
            }
        }

        Ok(Self { host_to_net, net_to_host, ikernels })
    }

    fn pipeline(&self, direction: Direction) -> &PipelineState {
        match direction {
            Direction::HostToNet => &self.host_to_net,
            Direction::NetToHost => &self.net_to_host,
        }
    }

    pub fn counters(&self, direction: Direction) -> &PipelineCounters {
        &self.pipeline(direction).counters
    }

    /// Per-check histogram data for `spec.md` §4.2 (`disabled`,
    /// `not_ipv4`, `bad_length`, `not_udp`, `hits`, `misses`), exposed for
    /// telemetry scraping.
    pub fn steering_counters(&self, direction: Direction) -> &crate::pipeline::steering::SteeringCounters {
        &self.pipeline(direction).steering.counters
    }

    pub fn ikernel_count(&self) -> usize {
        self.ikernels.len()
    }

    pub fn pipeline_enabled(&self, direction: Direction) -> bool {
        self.pipeline(direction).steering.enabled
    }

    /// Codec → steering → length-adjust → (ikernel crossbar) for one
    /// inbound frame (`spec.md` §4.1-§4.4). Output frames are not
    /// produced here; call [`Nica::drain`] to service the arbiter.
    pub fn ingest(&mut self, direction: Direction, frame: &[u8]) {
        match drive_codec(frame) {
            CodecResult::NonUdp => {
                let pipeline = match direction {
                    Direction::HostToNet => &mut self.host_to_net,
                    Direction::NetToHost => &mut self.net_to_host,
                };
                pipeline.counters.non_udp_passthrough += 1;
                pipeline.immediate_out.push(frame.to_vec());
            }
            CodecResult::Header { header, payload } => self.ingest_udp(direction, header, payload),
        }
    }

    fn ingest_udp(&mut self, direction: Direction, header: HeaderBuffer, payload: Vec<u8>) {
        let tuple =
            FiveTuple { src_ip: header.ip_src, dst_ip: header.ip_dst, src_port: header.udp_src_port, dst_port: header.udp_dst_port, vm_id: 0 };

        let Nica { host_to_net, net_to_host, ikernels } = self;
        let current = match direction {
            Direction::HostToNet => &mut *host_to_net,
            Direction::NetToHost => &mut *net_to_host,
        };
        current.counters.frames_in += 1;

        match current.steering.steer(&header) {
            SteeringDecision::Passthrough => {
                let metadata = PacketMetadata::new_udp(PacketType::Udp, None, 0, tuple, header.ip_identification, payload.len() as u16);
                let unit = EgressUnit { header, metadata, payload };
                let tc = current.demux.route(&unit.metadata, true);
                current.arbiter.enqueue(tc, unit);
            }
            SteeringDecision::Drop => {
                current.counters.dropped += 1;
            }
            SteeringDecision::Ikernel { ikernel_id, flow_id } => {
                let Some(engine) = ikernels.get_mut(&ikernel_id) else {
                    current.counters.unknown_ikernel += 1;
                    return;
                };
                let metadata =
                    PacketMetadata::new_udp(PacketType::Udp, Some(flow_id), ikernel_id, tuple, header.ip_identification, payload.len() as u16);
                let packet = EgressUnit { header, metadata, payload };
                // Consulted against the producing direction's own arbiter
                // queues; `can_transmit` only treats host-bound ring
                // traffic specially, so this is the natural call site
                // (`spec.md` §4.4).
                let tc_counts = current.arbiter.tc_counts();
                let emits = engine.ingress(direction.ikernel_direction(), packet, &tc_counts);
                for emit in emits {
                    route_emit(host_to_net, net_to_host, direction, emit);
                }
            }
        }
    }

    /// Service one direction's arbiter and return every frame ready to
    /// send, applying custom-ring framing (n2h only) and rebuilding the
    /// Ethernet/IP/UDP header as the final step (`spec.md` §4.6-§4.9).
    pub fn drain(&mut self, direction: Direction) -> Vec<Vec<u8>> {
        let pipeline = match direction {
            Direction::HostToNet => &mut self.host_to_net,
            Direction::NetToHost => &mut self.net_to_host,
        };

        let mut frames = std::mem::take(&mut pipeline.immediate_out);
        while pipeline.arbiter.has_pending() {
            for unit in pipeline.arbiter.service_next() {
                if unit.metadata.is_custom_ring() {
                    match pipeline.custom_ring.as_mut().and_then(|cr| cr.build(unit)) {
                        Some(built) => {
                            frames.push(builder::build_frame(&built.header, &built.payload));
                            pipeline.counters.frames_out += 1;
                        }
                        None => pipeline.counters.ring_unconfigured_drops += 1,
                    }
                    continue;
                }
                frames.push(builder::build_frame(&unit.header, &unit.payload));
                pipeline.counters.frames_out += 1;
            }
        }
        frames
    }

    /// Top-level register dispatch (`spec.md` §6): decodes a
    /// `gateway::addr::pipeline` offset into the matching embedded
    /// component's own [`GatewayTarget`], treating each `*_DATA` constant
    /// as a base offset the way [`crate::pipeline::arbiter::Arbiter`]
    /// already treats `STRIDE`-scaled addresses — the three-register
    /// `{cmd, data, done}` handshake collapses to one direct call, same
    /// as every other control surface in this crate.
    pub fn gateway_write(&mut self, direction: Direction, addr: u32, data: u32) -> GatewayStatus {
        let pipeline = match direction {
            Direction::HostToNet => &mut self.host_to_net,
            Direction::NetToHost => &mut self.net_to_host,
        };

        if addr == reg::ENABLE {
            pipeline.steering.enabled = data != 0;
            return GatewayStatus::Done;
        }
        if (reg::FLOW_TABLE_DATA..reg::ARBITER_CMD).contains(&addr) {
            return pipeline.steering.gateway_write(addr - reg::FLOW_TABLE_DATA, data);
        }
        if (reg::ARBITER_DATA..reg::CUSTOM_RING_CMD).contains(&addr) {
            return pipeline.arbiter.gateway_write(addr - reg::ARBITER_DATA, data);
        }
        if (reg::CUSTOM_RING_DATA..reg::IKERNEL_STRIDE).contains(&addr) {
            return match pipeline.custom_ring.as_mut() {
                Some(cr) => cr.gateway_write(addr - reg::CUSTOM_RING_DATA, data),
                None => GatewayStatus::Fail,
            };
        }
        if addr >= reg::IKERNEL_STRIDE {
            let ikernel_id = (addr / reg::IKERNEL_STRIDE) as u8;
            let Some(sub) = (addr % reg::IKERNEL_STRIDE).checked_sub(reg::IKERNEL_VIRT_GATEWAY_OFFSET) else {
                return GatewayStatus::Fail;
            };
            return match self.ikernels.get_mut(&ikernel_id) {
                Some(engine) => engine.gateway_write(sub, data),
                None => GatewayStatus::Fail,
            };
        }
        GatewayStatus::Fail
    }

    pub fn gateway_read(&mut self, direction: Direction, addr: u32) -> (GatewayStatus, u32) {
        let pipeline = match direction {
            Direction::HostToNet => &mut self.host_to_net,
            Direction::NetToHost => &mut self.net_to_host,
        };

        if addr == reg::ENABLE {
            return (GatewayStatus::Done, pipeline.steering.enabled as u32);
        }
        if (reg::FLOW_TABLE_DATA..reg::ARBITER_CMD).contains(&addr) {
            return pipeline.steering.gateway_read(addr - reg::FLOW_TABLE_DATA);
        }
        if (reg::ARBITER_DATA..reg::CUSTOM_RING_CMD).contains(&addr) {
            return pipeline.arbiter.gateway_read(addr - reg::ARBITER_DATA);
        }
        if (reg::CUSTOM_RING_DATA..reg::IKERNEL_STRIDE).contains(&addr) {
            return match pipeline.custom_ring.as_mut() {
                Some(cr) => cr.gateway_read(addr - reg::CUSTOM_RING_DATA),
                None => (GatewayStatus::Fail, 0),
            };
        }
        if addr >= reg::IKERNEL_STRIDE {
            let ikernel_id = (addr / reg::IKERNEL_STRIDE) as u8;
            let Some(sub) = (addr % reg::IKERNEL_STRIDE).checked_sub(reg::IKERNEL_VIRT_GATEWAY_OFFSET) else {
                return (GatewayStatus::Fail, 0);
            };
            return match self.ikernels.get_mut(&ikernel_id) {
                Some(engine) => engine.gateway_read(sub),
                None => (GatewayStatus::Fail, 0),
            };
        }
        (GatewayStatus::Fail, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IkernelConfig, PipelineConfig};
    use std::net::Ipv4Addr;

    fn udp_frame(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
        let mut frame = vec![0u8; 14 + 20 + 8];
        frame[12..14].copy_from_slice(&crate::pipeline::header::ETHERTYPE_IPV4.to_be_bytes());
        frame[14] = 0x45;
        let udp_len = 8 + payload.len() as u16;
        frame[16..18].copy_from_slice(&(20 + udp_len).to_be_bytes());
        frame[23] = crate::pipeline::header::PROTO_UDP;
        frame[26..30].copy_from_slice(&[10, 0, 0, 1]);
        frame[30..34].copy_from_slice(&[10, 0, 0, 2]);
        frame[34..36].copy_from_slice(&src_port.to_be_bytes());
        frame[36..38].copy_from_slice(&dst_port.to_be_bytes());
        frame[38..40].copy_from_slice(&udp_len.to_be_bytes());
        frame.extend_from_slice(payload);
        frame
    }

    fn base_config() -> Config {
        Config {
            interface: "eth0".to_string(),
            host_to_net: PipelineConfig::default(),
            net_to_host: PipelineConfig::default(),
            ikernels: Vec::new(),
            custom_rings: Vec::new(),
            logging: Default::default(),
            telemetry: Default::default(),
        }
    }

    #[test]
    fn passthrough_frame_round_trips_unchanged_payload() {
        let mut nica = Nica::new(&base_config()).unwrap();
        let frame = udp_frame(1111, 2222, b"hello");
        nica.ingest(Direction::NetToHost, &frame);
        let out = nica.drain(Direction::NetToHost);
        assert_eq!(out.len(), 1);
        assert!(out[0].ends_with(b"hello"));
        assert_eq!(nica.counters(Direction::NetToHost).frames_in, 1);
        assert_eq!(nica.counters(Direction::NetToHost).frames_out, 1);
    }

    #[test]
    fn disabled_pipeline_still_counts_as_passthrough() {
        let mut config = base_config();
        config.net_to_host.enabled = false;
        let mut nica = Nica::new(&config).unwrap();
        nica.ingest(Direction::NetToHost, &udp_frame(1, 2, b"x"));
        assert_eq!(nica.drain(Direction::NetToHost).len(), 1);
    }

    #[test]
    fn flow_hit_routes_through_configured_ikernel() {
        let mut config = base_config();
        config.ikernels.push(IkernelConfig::Threshold { ikernel_id: 3, threshold_value: 0 });
        let mut nica = Nica::new(&config).unwrap();

        let tuple = FiveTuple { src_ip: Ipv4Addr::new(10, 0, 0, 1), dst_ip: Ipv4Addr::new(10, 0, 0, 2), src_port: 1111, dst_port: 2222, vm_id: 0 };
        nica.host_to_net.steering.add_flow(tuple, crate::flow::table::FlowValue {
            action: crate::flow::table::FlowAction::Ikernel,
            engine_id: 0,
            ikernel_id: 3,
        });

        nica.ingest(Direction::HostToNet, &udp_frame(1111, 2222, &100u32.to_be_bytes()));
        let out = nica.drain(Direction::HostToNet);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn short_frame_is_passed_through_immediately() {
        let mut nica = Nica::new(&base_config()).unwrap();
        nica.ingest(Direction::NetToHost, &[1, 2, 3]);
        let out = nica.drain(Direction::NetToHost);
        assert_eq!(out, vec![vec![1, 2, 3]]);
        assert_eq!(nica.counters(Direction::NetToHost).non_udp_passthrough, 1);
    }

    #[test]
    fn memcached_get_hit_replies_on_the_opposite_direction() {
        let mut config = base_config();
        config.ikernels.push(IkernelConfig::Memcached { ikernel_id: 5, log_size: 10 });
        let mut nica = Nica::new(&config).unwrap();

        let tuple = FiveTuple { src_ip: Ipv4Addr::new(10, 0, 0, 1), dst_ip: Ipv4Addr::new(10, 0, 0, 2), src_port: 40000, dst_port: 11211, vm_id: 0 };
        nica.net_to_host.steering.add_flow(tuple, crate::flow::table::FlowValue {
            action: crate::flow::table::FlowAction::Ikernel,
            engine_id: 0,
            ikernel_id: 5,
        });

        // Prime the cache with a SET, arriving net-to-host (client -> server).
        nica.ingest(Direction::NetToHost, &udp_frame(40000, 11211, b"set color 0 0 3\r\nred"));
        nica.drain(Direction::NetToHost);

        // A GET for the same key now hits locally and replies out the
        // host-to-net direction without the host ever seeing it.
        nica.ingest(Direction::NetToHost, &udp_frame(40000, 11211, b"get color\r\n"));
        assert!(nica.drain(Direction::NetToHost).is_empty());
        let reply = nica.drain(Direction::HostToNet);
        assert_eq!(reply.len(), 1);
    }

    #[test]
    fn gateway_write_then_read_round_trips_arbiter_quantum() {
        let mut nica = Nica::new(&base_config()).unwrap();
        let addr = reg::ARBITER_DATA + scheduler::base(2) + scheduler::SCHED_DRR_QUANTUM;
        assert_eq!(nica.gateway_write(Direction::HostToNet, addr, 99), GatewayStatus::Done);
        assert_eq!(nica.gateway_read(Direction::HostToNet, addr), (GatewayStatus::Done, 99));
    }

    #[test]
    fn gateway_enable_register_disables_the_pipeline() {
        let mut nica = Nica::new(&base_config()).unwrap();
        assert_eq!(nica.gateway_write(Direction::NetToHost, reg::ENABLE, 0), GatewayStatus::Done);
        assert!(!nica.pipeline_enabled(Direction::NetToHost));
    }

    #[test]
    fn gateway_reaches_ikernel_registers_by_stride() {
        let mut config = base_config();
        config.ikernels.push(IkernelConfig::Threshold { ikernel_id: 2, threshold_value: 0 });
        let mut nica = Nica::new(&config).unwrap();
        let addr = reg::ikernel_base(2) + reg::IKERNEL_VIRT_GATEWAY_OFFSET + crate::gateway::addr::threshold::THRESHOLD_VALUE;
        assert_eq!(nica.gateway_write(Direction::HostToNet, addr, 77), GatewayStatus::Done);
        assert_eq!(nica.gateway_read(Direction::HostToNet, addr), (GatewayStatus::Done, 77));
    }
}
