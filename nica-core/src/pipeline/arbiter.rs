//! Arbiter: a pipelined peek/pick/transmit machine merging `N`
//! traffic-class streams into one egress stream under deficit round robin
//! (`spec.md` §4.6).
//!
//! The hardware keeps peek, pick, and transmit as three decoupled
//! pipeline stages to hide scheduler latency; in software a single
//! `service_next` call plays all three in one step, the same collapse
//! [`super::steering`] makes for probe/resolve/act.

use std::collections::VecDeque;

use crate::gateway::addr::scheduler::{SCHED_DRR_DEFICIT, SCHED_DRR_QUANTUM, STRIDE};
use crate::gateway::{GatewayStatus, GatewayTarget};
use crate::ikernel::Scheduler;
use crate::pipeline::flit::Flit;
use crate::pipeline::EgressUnit;

fn flits_for(len: usize) -> u32 {
    len.div_ceil(Flit::WIDTH_BYTES).max(1) as u32
}

#[derive(Debug, Default)]
pub struct PortStats {
    pub packets_sent: u64,
    pub evictions: u64,
}

/// Merges `num_ports` traffic-class queues into a single egress order
/// determined entirely by DRR (`spec.md` §4.6, §8 "ordering").
pub struct Arbiter {
    scheduler: Scheduler,
    queues: Vec<VecDeque<EgressUnit>>,
    pub port_stats: Vec<PortStats>,
}

impl Arbiter {
    pub fn new(num_ports: usize) -> Self {
        Self {
            scheduler: Scheduler::new(num_ports),
            queues: (0..num_ports).map(|_| VecDeque::new()).collect(),
            port_stats: (0..num_ports).map(|_| PortStats::default()).collect(),
        }
    }

    /// Peek stage folded into submission: push onto port `tc`'s queue and
    /// schedule it if this is the first packet observed non-empty
    /// (`schedule` is idempotent, per `spec.md` §4.5).
    pub fn enqueue(&mut self, tc: usize, unit: EgressUnit) {
        self.queues[tc].push_back(unit);
        self.scheduler.schedule(tc);
    }

    /// Pick + transmit: service the next scheduled port for as long as
    /// its head packet's flit count fits the remaining quota, then report
    /// the unused quota back to the scheduler (`spec.md` §4.6).
    pub fn service_next(&mut self) -> Vec<EgressUnit> {
        let Some((tc, mut quota)) = self.scheduler.next_flow() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        while let Some(front) = self.queues[tc].front() {
            let cost = flits_for(front.payload.len());
            if cost > quota {
                break;
            }
            quota -= cost;
            out.push(self.queues[tc].pop_front().expect("front() just confirmed Some"));
            self.port_stats[tc].packets_sent += 1;
        }
        let still_nonempty = !self.queues[tc].is_empty();
        if still_nonempty {
            // Re-arm: more work remains on this port for a future round.
            self.scheduler.schedule(tc);
        } else {
            self.port_stats[tc].evictions += 1;
        }
        self.scheduler.update_flow(tc, still_nonempty, quota);
        out
    }

    pub fn has_pending(&self) -> bool {
        self.queues.iter().any(|q| !q.is_empty())
    }

    /// Current per-traffic-class queue depth, consulted by
    /// [`crate::ikernel::can_transmit`] before an ikernel emits a packet
    /// (`spec.md` §4.4). The software port has no separate metadata/data
    /// FIFOs, so both gauges mirror the same queue length.
    pub fn tc_counts(&self) -> crate::ikernel::TcCounts {
        let mut counts = crate::ikernel::TcCounts::default();
        for (tc, queue) in self.queues.iter().enumerate() {
            if tc >= counts.metadata_depth.len() {
                break;
            }
            let depth = queue.len() as u32;
            counts.metadata_depth[tc] = depth;
            counts.data_depth[tc] = depth;
        }
        counts
    }
}

/// Per-flow DRR quantum/deficit register access (`spec.md` §6
/// `ARBITER_CMD`/`ARBITER_DATA`/`ARBITER_DONE`, stride-2 per flow).
impl GatewayTarget for Arbiter {
    fn gateway_write(&mut self, addr: u32, data: u32) -> GatewayStatus {
        let flow = (addr / STRIDE) as usize;
        if flow >= self.queues.len() {
            return GatewayStatus::Fail;
        }
        match addr % STRIDE {
            SCHED_DRR_QUANTUM => {
                self.scheduler.set_quantum(flow, data);
                GatewayStatus::Done
            }
            SCHED_DRR_DEFICIT => {
                self.scheduler.set_deficit(flow, data);
                GatewayStatus::Done
            }
            _ => GatewayStatus::Fail,
        }
    }

    fn gateway_read(&mut self, addr: u32) -> (GatewayStatus, u32) {
        let flow = (addr / STRIDE) as usize;
        if flow >= self.queues.len() {
            return (GatewayStatus::Fail, 0);
        }
        match addr % STRIDE {
            SCHED_DRR_QUANTUM => (GatewayStatus::Done, self.scheduler.quantum(flow)),
            SCHED_DRR_DEFICIT => (GatewayStatus::Done, self.scheduler.deficit(flow)),
            _ => (GatewayStatus::Fail, 0),
        }
    }
}
