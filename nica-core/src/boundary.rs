//! Narrow interfaces onto the collaborators `spec.md` §1 puts out of
//! scope: the UDP socket server/client wrappers, the `nica-manager` IPC,
//! and the RDMA verbs custom-ring consumer. Only the shape the core
//! consumes or exposes is specified here; real kernel-bypass sockets,
//! the UNIX-domain manager protocol, and RDMA queue-pair setup are not
//! implemented by this crate (`SPEC_FULL.md` §8.3).

use std::collections::VecDeque;
use std::io;

/// Stands in for `UdpServer`/`UdpClient`/`EchoUdpServer`/
/// `StatisticsUdpServer` (`spec.md` §1): the raw Ethernet-frame boundary
/// a pipeline direction reads from and writes to.
pub trait RawSocket: Send {
    async fn recv(&mut self) -> io::Result<Vec<u8>>;
    async fn send(&mut self, frame: &[u8]) -> io::Result<()>;
}

/// In-memory loopback implementation for tests and demos. Frames queued
/// with [`LoopbackSocket::push_inbound`] are returned by `recv`; frames
/// passed to `send` are captured for inspection via
/// [`LoopbackSocket::sent`]. The real kernel-bypass binding is out of
/// scope (`spec.md` §1).
#[derive(Default)]
pub struct LoopbackSocket {
    inbound: VecDeque<Vec<u8>>,
    outbound: Vec<Vec<u8>>,
}

impl LoopbackSocket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_inbound(&mut self, frame: Vec<u8>) {
        self.inbound.push_back(frame);
    }

    pub fn sent(&self) -> &[Vec<u8>] {
        &self.outbound
    }
}

impl RawSocket for LoopbackSocket {
    async fn recv(&mut self) -> io::Result<Vec<u8>> {
        self.inbound
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::WouldBlock, "no inbound frame queued"))
    }

    async fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        self.outbound.push(frame.to_vec());
        Ok(())
    }
}

/// Stands in for the RDMA verbs queue-pair consumer a custom-ring frame
/// is ultimately delivered to (`spec.md` §4.8, §1).
pub trait CustomRingConsumer: Send {
    async fn deliver(&mut self, ring: u8, frame: &[u8]) -> io::Result<()>;
}

/// `nica-manager`'s wire header (`spec.md` §6): 8 bytes, `{opcode,
/// length, flags, status}`. `flags` bit 0 distinguishes request (1) from
/// response (0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerHeader {
    pub opcode: u16,
    pub length: u16,
    pub flags: u16,
    pub status: u16,
}

impl ManagerHeader {
    pub fn is_request(&self) -> bool {
        self.flags & 0b1 != 0
    }
}

/// `nica-manager` opcodes (`spec.md` §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerOpcode {
    IkCreate = 1,
    IkDestroy = 2,
    IkRpc = 3,
    IkAttach = 4,
    IkDetach = 5,
    CrCreate = 6,
    CrDestroy = 7,
    CrUpdateCredits = 8,
    IkCreateAttrs = 9,
}

impl TryFrom<u16> for ManagerOpcode {
    type Error = ();

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => Self::IkCreate,
            2 => Self::IkDestroy,
            3 => Self::IkRpc,
            4 => Self::IkAttach,
            5 => Self::IkDetach,
            6 => Self::CrCreate,
            7 => Self::CrDestroy,
            8 => Self::CrUpdateCredits,
            9 => Self::IkCreateAttrs,
            _ => return Err(()),
        })
    }
}

/// A decoded manager request body. `IkAttach`/`IkDetach` pass a socket fd
/// via `SCM_RIGHTS` out-of-band; this core never populates that fd, it
/// only carries the marker that one was expected (`SPEC_FULL.md` §8.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerBody {
    IkCreate { ikernel_id: u8 },
    IkDestroy { ikernel_id: u8 },
    IkRpc { ikernel_id: u8, address: u32, value: u32, write: bool },
    IkAttach { ikernel_id: u8, fd_passed: bool },
    IkDetach { ikernel_id: u8 },
    CrCreate { ring_id: u8 },
    CrDestroy { ring_id: u8 },
    CrUpdateCredits { ring_id: u8, max_msn: u32 },
    IkCreateAttrs { ikernel_id: u8, attrs: Vec<u8> },
}

/// One request/response exchange on the `/var/run/nica-manager.socket`
/// channel (`spec.md` §6). The wire framing and the `SCM_RIGHTS` fd
/// passing itself are out of scope; only the decoded shape this core
/// would act on is modeled.
pub trait ManagerChannel: Send {
    async fn recv_request(&mut self) -> io::Result<(ManagerHeader, ManagerBody)>;
    async fn send_response(&mut self, header: ManagerHeader, status: u16) -> io::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loopback_echoes_queued_inbound_frames() {
        let mut sock = LoopbackSocket::new();
        sock.push_inbound(vec![1, 2, 3]);
        let frame = sock.recv().await.unwrap();
        assert_eq!(frame, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn loopback_captures_sent_frames() {
        let mut sock = LoopbackSocket::new();
        sock.send(&[9, 9]).await.unwrap();
        assert_eq!(sock.sent(), &[vec![9, 9]]);
    }

    #[tokio::test]
    async fn recv_on_empty_loopback_would_block() {
        let mut sock = LoopbackSocket::new();
        let err = sock.recv().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    }

    #[test]
    fn request_flag_bit_distinguishes_request_from_response() {
        let req = ManagerHeader { opcode: 1, length: 0, flags: 1, status: 0 };
        let resp = ManagerHeader { opcode: 1, length: 0, flags: 0, status: 0 };
        assert!(req.is_request());
        assert!(!resp.is_request());
    }

    #[test]
    fn opcode_round_trips_through_try_from() {
        assert_eq!(ManagerOpcode::try_from(8), Ok(ManagerOpcode::CrUpdateCredits));
        assert_eq!(ManagerOpcode::try_from(200), Err(()));
    }
}
