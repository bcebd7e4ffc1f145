//! CoAP/JWT gate ikernel (`spec.md` §4.11): verifies an HMAC-SHA-256-signed
//! claims envelope prepended to each CoAP datagram and drops the packet
//! unless the tag checks out, stripping the envelope before forwarding.
//!
//! The hardware computes the inner/outer SHA-256 passes of HMAC by hand
//! across per-traffic-class reassembly buffers sized for a 125- or
//! 255-byte token; in software that collapses to one call into the `hmac`
//! crate's constant-time `Mac::verify_slice`, since the payload already
//! arrives as a single contiguous buffer.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::gateway::addr::coap::*;
use crate::gateway::{GatewayStatus, GatewayTarget};
use crate::ikernel::{Direction, Ikernel, IkernelEmit, IkernelPacket, TcCounts};

type HmacSha256 = Hmac<Sha256>;

const ENVELOPE_TAG: u8 = 0x58;
const MAC_LEN: usize = 32;

/// Splits a `[tag][claims_len][claims...][mac: 32 bytes][coap payload...]`
/// envelope into its claims region and MAC, returning the remaining CoAP
/// payload alongside. `None` if the envelope is malformed.
fn split_envelope(payload: &[u8]) -> Option<(&[u8], &[u8], &[u8])> {
    let (&tag, rest) = payload.split_first()?;
    if tag != ENVELOPE_TAG {
        return None;
    }
    let (&claims_len, rest) = rest.split_first()?;
    let claims_len = claims_len as usize;
    if rest.len() < claims_len + MAC_LEN {
        return None;
    }
    let (claims, rest) = rest.split_at(claims_len);
    let (mac, coap_payload) = rest.split_at(MAC_LEN);
    Some((claims, mac, coap_payload))
}

pub struct CoapIkernel {
    hmac_key: Vec<u8>,
    verified: u64,
    rejected: u64,
}

impl CoapIkernel {
    pub fn new(hmac_key: Vec<u8>) -> Self {
        Self { hmac_key, verified: 0, rejected: 0 }
    }

    fn verify(&self, claims: &[u8], mac: &[u8]) -> bool {
        let Ok(mut hmac) = HmacSha256::new_from_slice(&self.hmac_key) else { return false };
        hmac.update(claims);
        hmac.verify_slice(mac).is_ok()
    }
}

impl GatewayTarget for CoapIkernel {
    fn gateway_write(&mut self, _addr: u32, _data: u32) -> GatewayStatus {
        GatewayStatus::Fail
    }

    fn gateway_read(&mut self, addr: u32) -> (GatewayStatus, u32) {
        match addr {
            STATS_VERIFIED => (GatewayStatus::Done, self.verified as u32),
            STATS_REJECTED => (GatewayStatus::Done, self.rejected as u32),
            _ => (GatewayStatus::Fail, 0),
        }
    }
}

impl Ikernel for CoapIkernel {
    fn ingress(&mut self, _direction: Direction, mut packet: IkernelPacket, _tc_counts: &TcCounts) -> Vec<IkernelEmit> {
        let Some((claims, mac, coap_payload)) = split_envelope(&packet.payload) else {
            self.rejected += 1;
            return vec![];
        };
        if !self.verify(claims, mac) {
            self.rejected += 1;
            return vec![];
        }
        self.verified += 1;
        packet.payload = coap_payload.to_vec();
        packet.metadata.length = packet.payload.len() as u16;
        vec![IkernelEmit::Forward(packet)]
    }
}
