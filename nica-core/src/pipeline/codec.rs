//! Frame codec and header splitter: reassembles the 42-byte Ethernet+IP+UDP
//! header out of the leading flits of a packet and re-streams the rest of
//! the payload as full-width data flits (`spec.md` §4.1).
//!
//! The hardware owns a single 256-bit shift register between the header and
//! data streams; this port keeps the same "one buffer, no allocation on the
//! hot path" shape using a fixed-size byte array and a live-length counter.
//! Byte counts, not the 512/336/176-bit figures of the hardware description,
//! drive the arithmetic here, since flits are byte arrays in this port.

use super::flit::Flit;
use super::header::{HeaderBuffer, HEADER_LEN};

const FLIT_BYTES: usize = Flit::WIDTH_BYTES;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    ReadingHeader,
    Stream,
    Last,
}

/// Result of feeding one flit to the [`Codec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecEvent {
    /// Not enough information yet; keep feeding flits.
    NeedMore,
    /// The header has been fully reassembled.
    Header(HeaderBuffer),
    /// A full-width data flit, not the last of the packet.
    Data(Flit),
    /// The final data flit of the packet.
    LastData(Flit),
    /// Packet was shorter than two flits or otherwise malformed; classified
    /// non-UDP and routed to the passthrough port untouched.
    NonUdp(Vec<Flit>),
}

/// Owns the single shift-register buffer shared between the header and data
/// streams for one packet's worth of flits.
pub struct Codec {
    state: State,
    buffer: [u8; FLIT_BYTES],
    buffer_len: usize,
    first_flit: Option<Flit>,
}

impl Default for Codec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec {
    pub fn new() -> Self {
        Self { state: State::Idle, buffer: [0u8; FLIT_BYTES], buffer_len: 0, first_flit: None }
    }

    fn reset(&mut self) {
        self.state = State::Idle;
        self.buffer_len = 0;
        self.first_flit = None;
    }

    /// Feed the next flit of the current packet. Callers must call this
    /// repeatedly until a flit with `last = true` has been fed, and then
    /// once more to drain the tail (see [`Codec::is_draining`]), before
    /// starting a fresh sequence for the next packet.
    pub fn push(&mut self, flit: Flit) -> CodecEvent {
        match self.state {
            State::Idle => {
                if flit.last {
                    self.reset();
                    return CodecEvent::NonUdp(vec![flit]);
                }
                self.first_flit = Some(flit);
                self.state = State::ReadingHeader;
                CodecEvent::NeedMore
            }
            State::ReadingHeader => {
                let first = self.first_flit.take().expect("first flit set in Idle->ReadingHeader");
                let mut combined = [0u8; FLIT_BYTES * 2];
                combined[..FLIT_BYTES].copy_from_slice(&first.data);
                combined[FLIT_BYTES..].copy_from_slice(&flit.data);
                let valid_len = FLIT_BYTES + flit.num_kept_bytes();

                if valid_len < HEADER_LEN {
                    self.reset();
                    return CodecEvent::NonUdp(vec![first, flit]);
                }
                let header = match HeaderBuffer::parse(&combined[..HEADER_LEN]) {
                    Some(h) => h,
                    None => {
                        self.reset();
                        return CodecEvent::NonUdp(vec![first, flit]);
                    }
                };

                let residual = valid_len - HEADER_LEN;
                self.buffer[..residual].copy_from_slice(&combined[HEADER_LEN..valid_len]);
                self.buffer_len = residual;

                self.state = if flit.last { State::Last } else { State::Stream };
                CodecEvent::Header(header)
            }
            State::Stream if flit.last => {
                let kept = flit.num_kept_bytes();
                let total = self.buffer_len + kept;
                if total >= FLIT_BYTES {
                    let mut window = [0u8; FLIT_BYTES * 2];
                    window[..self.buffer_len].copy_from_slice(&self.buffer[..self.buffer_len]);
                    window[self.buffer_len..total].copy_from_slice(&flit.data[..kept]);

                    let mut out_data = [0u8; FLIT_BYTES];
                    out_data.copy_from_slice(&window[..FLIT_BYTES]);
                    let residual = total - FLIT_BYTES;
                    self.buffer[..residual].copy_from_slice(&window[FLIT_BYTES..total]);
                    self.buffer_len = residual;
                    self.state = State::Last;
                    CodecEvent::Data(Flit::full(out_data))
                } else {
                    self.buffer[self.buffer_len..total].copy_from_slice(&flit.data[..kept]);
                    self.buffer_len = total;
                    self.state = State::Last;
                    CodecEvent::NeedMore
                }
            }
            State::Stream => {
                let mut window = [0u8; FLIT_BYTES * 2];
                window[..self.buffer_len].copy_from_slice(&self.buffer[..self.buffer_len]);
                window[self.buffer_len..self.buffer_len + FLIT_BYTES].copy_from_slice(&flit.data);
                let total = self.buffer_len + FLIT_BYTES;

                let mut out_data = [0u8; FLIT_BYTES];
                out_data.copy_from_slice(&window[..FLIT_BYTES]);
                let residual = total - FLIT_BYTES;
                self.buffer[..residual].copy_from_slice(&window[FLIT_BYTES..total]);
                self.buffer_len = residual;
                CodecEvent::Data(Flit::full(out_data))
            }
            State::Last => {
                let mut data = [0u8; FLIT_BYTES];
                let n = self.buffer_len.min(FLIT_BYTES);
                data[..n].copy_from_slice(&self.buffer[..n]);
                let last_flit = Flit::last_with(data, n);
                self.reset();
                CodecEvent::LastData(last_flit)
            }
        }
    }

    /// Whether the codec is holding a final flush pending; the next call to
    /// [`Codec::push`] (with any flit — its contents are ignored) drains the
    /// residual bytes and produces [`CodecEvent::LastData`].
    pub fn is_draining(&self) -> bool {
        self.state == State::Last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flit_of(byte: u8) -> Flit {
        Flit::full([byte; 32])
    }

    /// Builds a header spanning two flits with `udp_payload_len` bytes of
    /// zeroed payload following immediately after the header within the
    /// second flit.
    fn sample_header_flits(udp_payload_len: usize) -> (Flit, Flit) {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[12..14].copy_from_slice(&super::super::header::ETHERTYPE_IPV4.to_be_bytes());
        bytes[14] = 0x45;
        let udp_len = 8 + udp_payload_len as u16;
        bytes[16..18].copy_from_slice(&(20 + udp_len).to_be_bytes());
        bytes[23] = super::super::header::PROTO_UDP;
        bytes[34..36].copy_from_slice(&1111u16.to_be_bytes());
        bytes[36..38].copy_from_slice(&2222u16.to_be_bytes());
        bytes[38..40].copy_from_slice(&udp_len.to_be_bytes());

        let mut flit0 = [0u8; 32];
        flit0.copy_from_slice(&bytes[0..32]);
        let mut flit1_data = [0u8; 32];
        flit1_data[..10].copy_from_slice(&bytes[32..42]);
        let flit1_kept = 10 + udp_payload_len;
        let flit1 = Flit::last_with(flit1_data, flit1_kept);
        (Flit::full(flit0), flit1)
    }

    #[test]
    fn single_flit_packet_is_non_udp() {
        let mut codec = Codec::new();
        let f = Flit::last_with([9; 32], 5);
        match codec.push(f) {
            CodecEvent::NonUdp(flits) => assert_eq!(flits.len(), 1),
            other => panic!("expected NonUdp, got {other:?}"),
        }
    }

    #[test]
    fn two_flit_header_reassembles_with_trailing_payload() {
        let mut codec = Codec::new();
        let (flit0, flit1) = sample_header_flits(8);

        assert_eq!(codec.push(flit0), CodecEvent::NeedMore);
        match codec.push(flit1) {
            CodecEvent::Header(hdr) => {
                assert!(hdr.is_ipv4());
                assert!(hdr.is_udp());
                assert_eq!(hdr.udp_src_port, 1111);
            }
            other => panic!("expected Header, got {other:?}"),
        }
        assert!(codec.is_draining());

        match codec.push(flit_of(0)) {
            CodecEvent::LastData(last) => assert_eq!(last.num_kept_bytes(), 8),
            other => panic!("expected LastData, got {other:?}"),
        }
    }

    #[test]
    fn header_only_packet_drains_zero_bytes() {
        let mut codec = Codec::new();
        let (flit0, flit1) = sample_header_flits(0);

        assert_eq!(codec.push(flit0), CodecEvent::NeedMore);
        assert!(matches!(codec.push(flit1), CodecEvent::Header(_)));
        assert!(codec.is_draining());
        match codec.push(flit_of(0)) {
            CodecEvent::LastData(last) => assert_eq!(last.num_kept_bytes(), 0),
            other => panic!("expected LastData, got {other:?}"),
        }
    }

    #[test]
    fn multi_flit_stream_shifts_residual_window() {
        let mut codec = Codec::new();
        let (flit0, mut flit1) = sample_header_flits(8);
        flit1.last = false;
        flit1.keep = u32::MAX;

        assert_eq!(codec.push(flit0), CodecEvent::NeedMore);
        assert!(matches!(codec.push(flit1), CodecEvent::Header(_)));

        let data_flit = Flit::full([0xAA; 32]);
        match codec.push(data_flit) {
            CodecEvent::Data(_) => {}
            other => panic!("expected Data, got {other:?}"),
        }

        let last = Flit::last_with([0xBB; 32], 4);
        match codec.push(last) {
            CodecEvent::Data(_) => {}
            other => panic!("expected Data before drain, got {other:?}"),
        }
        assert!(codec.is_draining());
        match codec.push(flit_of(0)) {
            CodecEvent::LastData(_) => {}
            other => panic!("expected LastData, got {other:?}"),
        }
    }

    #[test]
    fn malformed_two_flits_classified_non_udp() {
        let mut codec = Codec::new();
        let flit0 = Flit::full([0u8; 32]);
        let flit1 = Flit::last_with([0u8; 32], 20);
        assert_eq!(codec.push(flit0), CodecEvent::NeedMore);
        match codec.push(flit1) {
            CodecEvent::NonUdp(flits) => assert_eq!(flits.len(), 2),
            other => panic!("expected NonUdp, got {other:?}"),
        }
    }
}
