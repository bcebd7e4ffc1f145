//! The per-direction packet pipeline: codec → steering → length-adjust →
//! (ikernel crossbar, outside this module) → arbiter → demux → [custom-ring]
//! → builder (`spec.md` §4).

pub mod arbiter;
pub mod builder;
pub mod checksum;
pub mod codec;
pub mod custom_ring;
pub mod demux;
pub mod flit;
pub mod header;
pub mod length_adjust;
pub mod metadata;
pub mod steering;

pub use flit::Flit;
pub use metadata::{PacketMetadata, PacketType, PacketVar};

use header::HeaderBuffer;

/// A fully-formed packet at the egress side of the crossbar: the header
/// the builder will reserialize, the ikernel metadata that routed it, and
/// its payload bytes. Shared by the arbiter, the demultiplexor, the
/// custom-ring builder, and the UDP builder so a packet threads through
/// all four stages without re-deriving its header each time.
#[derive(Debug, Clone)]
pub struct EgressUnit {
    pub header: HeaderBuffer,
    pub metadata: PacketMetadata,
    pub payload: Vec<u8>,
}
