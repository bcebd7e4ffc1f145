//! Ethernet + IPv4 + UDP header parsing and serialization. The 42-byte
//! layout `spec.md` §4.1 refers to: 14 bytes Ethernet, 20 bytes IPv4 (no
//! options), 8 bytes UDP.

use std::net::Ipv4Addr;

use super::checksum;

pub const HEADER_LEN: usize = 14 + 20 + 8;
pub const ETHERTYPE_IPV4: u16 = 0x0800;
pub const PROTO_UDP: u8 = 17;
pub const ETH_MIN_FRAME: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderBuffer {
    pub eth_dst: [u8; 6],
    pub eth_src: [u8; 6],
    pub ethertype: u16,
    pub ip_ihl_version: u8,
    pub ip_tos: u8,
    pub ip_tot_len: u16,
    pub ip_identification: u16,
    pub ip_flags_frag: u16,
    pub ip_ttl: u8,
    pub ip_protocol: u8,
    pub ip_src: Ipv4Addr,
    pub ip_dst: Ipv4Addr,
    pub udp_src_port: u16,
    pub udp_dst_port: u16,
    pub udp_length: u16,
}

impl HeaderBuffer {
    /// Parse the first `HEADER_LEN` bytes. Returns `None` if the slice is
    /// too short; the caller (the splitter) treats that as non-UDP.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_LEN {
            return None;
        }
        let eth_dst = bytes[0..6].try_into().ok()?;
        let eth_src = bytes[6..12].try_into().ok()?;
        let ethertype = u16::from_be_bytes([bytes[12], bytes[13]]);

        let ip = &bytes[14..34];
        let ip_ihl_version = ip[0];
        let ip_tos = ip[1];
        let ip_tot_len = u16::from_be_bytes([ip[2], ip[3]]);
        let ip_identification = u16::from_be_bytes([ip[4], ip[5]]);
        let ip_flags_frag = u16::from_be_bytes([ip[6], ip[7]]);
        let ip_ttl = ip[8];
        let ip_protocol = ip[9];
        let ip_src = Ipv4Addr::new(ip[12], ip[13], ip[14], ip[15]);
        let ip_dst = Ipv4Addr::new(ip[16], ip[17], ip[18], ip[19]);

        let udp = &bytes[34..42];
        let udp_src_port = u16::from_be_bytes([udp[0], udp[1]]);
        let udp_dst_port = u16::from_be_bytes([udp[2], udp[3]]);
        let udp_length = u16::from_be_bytes([udp[4], udp[5]]);

        Some(Self {
            eth_dst,
            eth_src,
            ethertype,
            ip_ihl_version,
            ip_tos,
            ip_tot_len,
            ip_identification,
            ip_flags_frag,
            ip_ttl,
            ip_protocol,
            ip_src,
            ip_dst,
            udp_src_port,
            udp_dst_port,
            udp_length,
        })
    }

    pub fn is_ipv4(&self) -> bool {
        self.ethertype == ETHERTYPE_IPV4
    }

    pub fn is_udp(&self) -> bool {
        self.ip_protocol == PROTO_UDP
    }

    /// `bad_length` check of `spec.md` §4.2: total IP length below the
    /// minimum IPv4+UDP header size.
    pub fn bad_length(&self) -> bool {
        self.ip_tot_len < 28
    }

    pub fn payload_len(&self) -> u16 {
        self.udp_length.saturating_sub(8)
    }

    /// Serialize this header into its 42-byte wire form, regenerating the
    /// IP and UDP checksums (`spec.md` §4.9). `payload` is used only to
    /// compute the UDP checksum; it is not written into the returned
    /// buffer.
    pub fn serialize_with_checksums(&self, payload: &[u8]) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..6].copy_from_slice(&self.eth_dst);
        out[6..12].copy_from_slice(&self.eth_src);
        out[12..14].copy_from_slice(&self.ethertype.to_be_bytes());

        let mut ip = [0u8; 20];
        ip[0] = self.ip_ihl_version;
        ip[1] = self.ip_tos;
        ip[2..4].copy_from_slice(&self.ip_tot_len.to_be_bytes());
        ip[4..6].copy_from_slice(&self.ip_identification.to_be_bytes());
        ip[6..8].copy_from_slice(&self.ip_flags_frag.to_be_bytes());
        ip[8] = self.ip_ttl;
        ip[9] = self.ip_protocol;
        // bytes 10..12 (checksum) left zero for the checksum pass
        ip[12..16].copy_from_slice(&self.ip_src.octets());
        ip[16..20].copy_from_slice(&self.ip_dst.octets());
        let ip_csum = checksum::ip_header_checksum(&ip);
        ip[10..12].copy_from_slice(&ip_csum.to_be_bytes());
        out[14..34].copy_from_slice(&ip);

        let mut udp = [0u8; 8];
        udp[0..2].copy_from_slice(&self.udp_src_port.to_be_bytes());
        udp[2..4].copy_from_slice(&self.udp_dst_port.to_be_bytes());
        udp[4..6].copy_from_slice(&self.udp_length.to_be_bytes());
        let udp_csum = checksum::udp_checksum(
            self.ip_src.octets(),
            self.ip_dst.octets(),
            self.udp_length,
            &udp,
            payload,
        );
        udp[6..8].copy_from_slice(&udp_csum.to_be_bytes());
        out[34..42].copy_from_slice(&udp);

        out
    }
}
