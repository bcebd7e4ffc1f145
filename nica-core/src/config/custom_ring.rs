use serde::Deserialize;
use std::net::Ipv4Addr;

/// One statically-provisioned custom-ring context (`spec.md` §3 "Ring
/// context", §6 `CR_WRITE_CONTEXT`). `ring_id` is 1-based; 0 is reserved
/// for "ordinary UDP egress" (`spec.md` §3).
#[derive(Debug, Deserialize, Clone)]
pub struct CustomRingConfig {
    pub ring_id: u8,
    pub eth_dst: [u8; 6],
    pub ip_dst: Ipv4Addr,
    pub dest_qpn: u32,
    /// Initial host-advertised credit limit (`spec.md` §3 "Per-ikernel
    /// credit table" `max_msn`).
    #[serde(default)]
    pub max_msn: u32,
}
