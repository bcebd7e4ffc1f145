//! Demultiplexor: routes arbiter-after-ikernel fan-out to one of
//! `NUM_TC - 1` traffic classes by `ikernel_id mod (NUM_TC - 1)`, with the
//! last slot reserved for passthrough traffic that bypassed every ikernel
//! (`spec.md` §4.7).

use crate::ikernel::NUM_TC;
use crate::pipeline::metadata::PacketMetadata;

/// Index of the traffic class reserved for passthrough traffic.
pub const PASSTHROUGH_TC: usize = NUM_TC - 1;

#[derive(Debug, Default)]
pub struct Demux;

impl Demux {
    /// Which traffic-class FIFO `metadata` (and its data) should be
    /// pushed onto.
    pub fn route(&self, metadata: &PacketMetadata, is_passthrough: bool) -> usize {
        if is_passthrough {
            PASSTHROUGH_TC
        } else {
            metadata.ikernel_id as usize % PASSTHROUGH_TC
        }
    }
}
