//! UDP builder & Ethernet padding (`spec.md` §4.9): rebuilds the
//! Ethernet+IP+UDP header in front of an egress payload, pads the frame
//! to the 60-byte Ethernet minimum, and regenerates the IP and UDP
//! checksums.
//!
//! The hardware's `push_header` primitive merges a fixed-width prefix
//! stream with an unaligned data stream at flit granularity; in software
//! this collapses to a single `Vec<u8>` concatenation since there is no
//! bus-width alignment to preserve.

use super::header::{HeaderBuffer, ETH_MIN_FRAME, HEADER_LEN};

/// Serialize `header` followed by `payload`, recomputing IP/UDP
/// checksums over the *unpadded* payload (`spec.md` §4.9: checksums are
/// computed over the real payload; padding is link-layer filler, not content).
/// The returned frame is padded with zero bytes to `ETH_MIN_FRAME` (60)
/// bytes total if shorter.
pub fn build_frame(header: &HeaderBuffer, payload: &[u8]) -> Vec<u8> {
    let header_bytes = header.serialize_with_checksums(payload);
    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.extend_from_slice(&header_bytes);
    frame.extend_from_slice(payload);
    if frame.len() < ETH_MIN_FRAME {
        frame.resize(ETH_MIN_FRAME, 0);
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::header::{ETHERTYPE_IPV4, PROTO_UDP};
    use std::net::Ipv4Addr;

    fn sample_header(udp_len: u16) -> HeaderBuffer {
        HeaderBuffer {
            eth_dst: [0xff; 6],
            eth_src: [0x02; 6],
            ethertype: ETHERTYPE_IPV4,
            ip_ihl_version: 0x45,
            ip_tos: 0,
            ip_tot_len: 20 + udp_len,
            ip_identification: 7,
            ip_flags_frag: 0,
            ip_ttl: 64,
            ip_protocol: PROTO_UDP,
            ip_src: Ipv4Addr::new(10, 0, 0, 1),
            ip_dst: Ipv4Addr::new(10, 0, 0, 2),
            udp_src_port: 1000,
            udp_dst_port: 2000,
            udp_length: udp_len,
        }
    }

    #[test]
    fn short_payload_pads_to_ethernet_minimum() {
        let payload = vec![0xAB; 4];
        let header = sample_header(8 + payload.len() as u16);
        let frame = build_frame(&header, &payload);
        assert_eq!(frame.len(), ETH_MIN_FRAME);
    }

    #[test]
    fn large_payload_is_not_truncated() {
        let payload = vec![0xCD; 200];
        let header = sample_header(8 + payload.len() as u16);
        let frame = build_frame(&header, &payload);
        assert_eq!(frame.len(), HEADER_LEN + payload.len());
    }

    #[test]
    fn checksums_validate_on_the_built_frame() {
        let payload = vec![1, 2, 3, 4, 5];
        let header = sample_header(8 + payload.len() as u16);
        let frame = build_frame(&header, &payload);
        let reparsed = HeaderBuffer::parse(&frame).unwrap();

        let mut ip = [0u8; 20];
        ip.copy_from_slice(&frame[14..34]);
        let sum = crate::pipeline::checksum::ones_complement_sum(ip.chunks(2).map(|c| u16::from_be_bytes([c[0], c[1]])));
        assert_eq!(crate::pipeline::checksum::fold_to_u16(sum), 0xFFFF);
        assert_eq!(reparsed.udp_src_port, header.udp_src_port);
    }
}
