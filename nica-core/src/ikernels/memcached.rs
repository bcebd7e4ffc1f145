//! Memcached-offload ikernel (`spec.md` §4.11): answers `get` requests
//! from an on-device cache when possible, intercepting them before they
//! ever reach the host; `set` requests and the host's own `VALUE`
//! responses both refresh the cache as they pass through.
//!
//! The same engine instance is wired into both pipeline directions by the
//! glue (`spec.md` §4.12): called with [`Direction::Host`] it is looking
//! at a request arriving from the net side and heading toward the host;
//! called with [`Direction::Net`] it is looking at the host's own
//! response heading back out to the net.

use std::collections::HashMap;

use crate::gateway::addr::memcached::*;
use crate::gateway::{GatewayStatus, GatewayTarget};
use crate::ikernel::{can_transmit, Direction, Ikernel, IkernelEmit, IkernelPacket, TcCounts};
use crate::pipeline::metadata::{FiveTuple, PacketMetadata, PacketType};

enum Request<'a> {
    Get { key: &'a str },
    Set { key: &'a str, value: Vec<u8> },
    Other,
}

fn parse_request(payload: &[u8]) -> Request<'_> {
    let text = std::str::from_utf8(payload).unwrap_or("");
    let Some(line_end) = text.find("\r\n") else { return Request::Other };
    let mut parts = text[..line_end].split(' ');
    match parts.next() {
        Some("get") => match parts.next() {
            Some(key) if !key.is_empty() => Request::Get { key },
            _ => Request::Other,
        },
        Some("set") => {
            let (Some(key), Some(_flags), Some(_exptime), Some(len_str)) =
                (parts.next(), parts.next(), parts.next(), parts.next())
            else {
                return Request::Other;
            };
            let Ok(len) = len_str.parse::<usize>() else { return Request::Other };
            let data_start = line_end + 2;
            match payload.get(data_start..data_start + len) {
                Some(value) => Request::Set { key, value: value.to_vec() },
                None => Request::Other,
            }
        }
        _ => Request::Other,
    }
}

/// Extracts `(key, value)` from a `VALUE <key> <flags> <bytes>\r\n<data>\r\n`
/// response, ignoring the trailing `END\r\n`.
fn parse_value_response(payload: &[u8]) -> Option<(String, Vec<u8>)> {
    let text = std::str::from_utf8(payload).ok()?;
    let line_end = text.find("\r\n")?;
    let mut parts = text[..line_end].split(' ');
    if parts.next()? != "VALUE" {
        return None;
    }
    let key = parts.next()?.to_string();
    let _flags = parts.next()?;
    let len: usize = parts.next()?.parse().ok()?;
    let data_start = line_end + 2;
    let value = payload.get(data_start..data_start + len)?.to_vec();
    Some((key, value))
}

fn build_hit_response(request: &IkernelPacket, key: &str, value: &[u8]) -> IkernelPacket {
    let mut header = request.header;
    std::mem::swap(&mut header.eth_src, &mut header.eth_dst);
    std::mem::swap(&mut header.ip_src, &mut header.ip_dst);
    std::mem::swap(&mut header.udp_src_port, &mut header.udp_dst_port);

    let mut payload = format!("VALUE {key} 0 {}\r\n", value.len()).into_bytes();
    payload.extend_from_slice(value);
    payload.extend_from_slice(b"\r\nEND\r\n");

    let reverse_tuple = match &request.metadata.var {
        crate::pipeline::metadata::PacketVar::Udp(tuple) => FiveTuple {
            src_ip: tuple.dst_ip,
            dst_ip: tuple.src_ip,
            src_port: tuple.dst_port,
            dst_port: tuple.src_port,
            vm_id: tuple.vm_id,
        },
        crate::pipeline::metadata::PacketVar::CustomRing(_) => FiveTuple {
            src_ip: request.header.ip_src,
            dst_ip: request.header.ip_dst,
            src_port: request.header.udp_src_port,
            dst_port: request.header.udp_dst_port,
            vm_id: 0,
        },
    };
    let metadata = PacketMetadata::new_udp(
        PacketType::Udp,
        None,
        request.metadata.ikernel_id,
        reverse_tuple,
        request.metadata.ip_identification,
        payload.len() as u16,
    );

    IkernelPacket { header, metadata, payload }
}

pub struct MemcachedIkernel {
    ikernel_id: u8,
    cache: HashMap<String, Vec<u8>>,
    get_requests: u64,
    get_hits: u64,
    hit_drops: u64,
}

impl MemcachedIkernel {
    pub fn new(ikernel_id: u8) -> Self {
        Self { ikernel_id, cache: HashMap::new(), get_requests: 0, get_hits: 0, hit_drops: 0 }
    }
}

impl GatewayTarget for MemcachedIkernel {
    fn gateway_write(&mut self, _addr: u32, _data: u32) -> GatewayStatus {
        GatewayStatus::Fail
    }

    fn gateway_read(&mut self, addr: u32) -> (GatewayStatus, u32) {
        match addr {
            STATS_GET_REQUESTS => (GatewayStatus::Done, self.get_requests as u32),
            STATS_GET_REQUESTS_HITS => (GatewayStatus::Done, self.get_hits as u32),
            STAT_HIT_DROP => (GatewayStatus::Done, self.hit_drops as u32),
            _ => (GatewayStatus::Fail, 0),
        }
    }
}

impl Ikernel for MemcachedIkernel {
    fn ingress(&mut self, direction: Direction, packet: IkernelPacket, tc_counts: &TcCounts) -> Vec<IkernelEmit> {
        match direction {
            Direction::Host => match parse_request(&packet.payload) {
                Request::Get { key } => {
                    self.get_requests += 1;
                    let Some(value) = self.cache.get(key).cloned() else {
                        return vec![IkernelEmit::Forward(packet)];
                    };
                    self.get_hits += 1;
                    if !can_transmit(
                        tc_counts,
                        &crate::ikernel::CreditTable::new(0),
                        self.ikernel_id,
                        0,
                        Direction::Net,
                    ) {
                        self.hit_drops += 1;
                        return vec![];
                    }
                    let response = build_hit_response(&packet, key, &value);
                    vec![IkernelEmit::Reply(response)]
                }
                Request::Set { key, value } => {
                    self.cache.insert(key.to_string(), value);
                    vec![IkernelEmit::Forward(packet)]
                }
                Request::Other => vec![IkernelEmit::Forward(packet)],
            },
            Direction::Net => {
                if let Some((key, value)) = parse_value_response(&packet.payload) {
                    self.cache.insert(key, value);
                }
                vec![IkernelEmit::Forward(packet)]
            }
        }
    }
}
