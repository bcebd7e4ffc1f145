//! The uniform ikernel runtime contracts every engine in
//! `nica_core::ikernels` consumes (`spec.md` §4.4): a `step` entry point,
//! register RPC via [`crate::gateway`], `can_transmit`/`new_message`
//! credit preconditions, and the per-ikernel context/credit tables.

pub mod context;
pub mod credit;
pub mod scheduler;

pub use context::{ContextArray, ContextIndex};
pub use credit::{CreditTable, RingCredit};
pub use scheduler::{FlowContext, Scheduler};

use crate::gateway::GatewayTarget;
use crate::pipeline::EgressUnit;

/// Host vs net side, from an ikernel's perspective (`spec.md` §4.4, §4.8).
/// A custom-ring emission is only credit-gated on the host side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Host,
    Net,
}

/// A packet crossing an ikernel boundary carries its header alongside the
/// ikernel metadata so a passthrough decision needs no reparsing; engines
/// that rewrite the payload are free to leave the header untouched, since
/// the builder downstream reserializes it from the (possibly ikernel- or
/// custom-ring-adjusted) metadata and header fields.
pub type IkernelPacket = EgressUnit;

/// What the glue crossbar does with a packet an engine emits from
/// `ingress` (`spec.md` §4.11 memcached: a cache hit "is answered here and
/// never reaches the host", which needs to leave toward the *opposite*
/// direction from the one that produced it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IkernelEmit {
    /// Continue toward this call's own direction — the common case every
    /// engine other than memcached uses exclusively.
    Forward(IkernelPacket),
    /// A locally-synthesized packet bound for the other direction's
    /// egress, bypassing the host (or net) entirely.
    Reply(IkernelPacket),
}

impl IkernelEmit {
    pub fn packet(&self) -> &IkernelPacket {
        match self {
            Self::Forward(p) | Self::Reply(p) => p,
        }
    }
}

/// The uniform contract every concrete engine in `nica_core::ikernels`
/// implements (`spec.md` §4.4, §4.11). Register RPC is carried separately
/// through [`GatewayTarget`] so the gateway can drain at most one command
/// per tick independent of packet processing.
pub trait Ikernel: GatewayTarget {
    /// Consume at most one ingress packet and return zero or more egress
    /// packets to emit this tick. Failure of any single ikernel (e.g. an
    /// invalid register access, reported via [`GatewayTarget`] instead) is
    /// localized and never blocks ingress processing (`spec.md` §4.12).
    fn ingress(&mut self, direction: Direction, packet: IkernelPacket, tc_counts: &TcCounts) -> Vec<IkernelEmit>;
}

/// Number of arbiter traffic classes (`spec.md` §4.6, §4.7); the last slot
/// is reserved for passthrough traffic per `spec.md` §4.7.
pub const NUM_TC: usize = 8;

/// Metadata/data FIFO depth at which a traffic class is considered
/// backpressured (`spec.md` §4.4: "currently 256 entries of each").
pub const TC_BACKPRESSURE_THRESHOLD: u32 = 256;

/// Per-traffic-class depth gauges an ikernel consults before transmitting
/// (`spec.md` §4.4 `tc_counts`).
#[derive(Debug, Clone, Copy, Default)]
pub struct TcCounts {
    pub metadata_depth: [u32; NUM_TC],
    pub data_depth: [u32; NUM_TC],
}

impl TcCounts {
    pub fn backpressured(&self, tc: usize) -> bool {
        self.metadata_depth[tc] >= TC_BACKPRESSURE_THRESHOLD || self.data_depth[tc] >= TC_BACKPRESSURE_THRESHOLD
    }
}

/// The `can_transmit` precondition every ikernel must check before
/// producing a packet (`spec.md` §4.4). Returns `false` iff the packet is
/// host-bound on an exhausted custom ring, or iff its traffic class (`tc =
/// ikernel_id mod (NUM_TC - 1)`) is backpressured.
pub fn can_transmit(
    tc_counts: &TcCounts,
    credit: &CreditTable,
    ikernel_id: u8,
    ring_id: u8,
    direction: Direction,
) -> bool {
    if direction == Direction::Host && ring_id != 0 {
        let has_credit = credit.get(ring_id).is_some_and(RingCredit::has_credit);
        if !has_credit {
            return false;
        }
    }
    let tc = ikernel_id as usize % (NUM_TC - 1);
    !tc_counts.backpressured(tc)
}

/// Must be called exactly once per emitted custom-ring packet (`spec.md`
/// §4.4, §8 "credit safety"). No-op (and reports `false`) for
/// `ring_id = 0` or an out-of-range ring.
pub fn new_message(credit: &mut CreditTable, ring_id: u8, _direction: Direction) -> bool {
    if ring_id == 0 {
        return false;
    }
    match credit.get_mut(ring_id) {
        Some(ring) => ring.consume(),
        None => false,
    }
}
