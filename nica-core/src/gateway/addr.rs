//! Register address layout for every gateway-addressable component
//! (`spec.md` §6, grounded on `flow_table.hpp`, `threshold.hpp`,
//! `scheduler.hpp` and `nicamgr.h`).

/// Per-direction pipeline offsets (`spec.md` §6 configuration surface
/// table).
pub mod pipeline {
    pub const ENABLE: u32 = 0x10;
    pub const FLOW_TABLE_CMD: u32 = 0x18;
    pub const FLOW_TABLE_DATA: u32 = 0x20;
    pub const FLOW_TABLE_DONE: u32 = 0x30;
    pub const ARBITER_CMD: u32 = 0x58;
    pub const ARBITER_DATA: u32 = 0x60;
    pub const ARBITER_DONE: u32 = 0x70;
    /// n2h only.
    pub const CUSTOM_RING_CMD: u32 = 0x78;
    pub const CUSTOM_RING_DATA: u32 = 0x80;
    pub const CUSTOM_RING_DONE: u32 = 0x90;

    pub const IKERNEL_STRIDE: u32 = 0x1000;
    pub const IKERNEL_UUID_OFFSET: u32 = 0x0;
    pub const IKERNEL_VIRT_GATEWAY_OFFSET: u32 = 0x14;
    pub const IKERNEL_CREDIT_OFFSET: u32 = 0x50;

    pub fn ikernel_base(k: u32) -> u32 {
        IKERNEL_STRIDE * k
    }
}

/// Flow-table gateway ops (`flow_table.hpp`).
pub mod flow_table {
    pub const FT_FIELDS: u32 = 0x0;
    pub const FT_ADD_FLOW: u32 = 0x1;
    pub const FT_DELETE_FLOW: u32 = 0x2;
    pub const FT_SET_ENTRY: u32 = 0x4;
    pub const FT_READ_ENTRY: u32 = 0x5;

    pub const FT_KEY_SADDR: u32 = 0x10;
    pub const FT_KEY_DADDR: u32 = 0x11;
    pub const FT_KEY_SPORT: u32 = 0x12;
    pub const FT_KEY_DPORT: u32 = 0x13;
    pub const FT_KEY_VMID: u32 = 0x14;
    pub const FT_RESULT_ACTION: u32 = 0x18;
    pub const FT_RESULT_ENGINE: u32 = 0x19;
    pub const FT_RESULT_IKERNEL_ID: u32 = 0x1a;
    pub const FT_VALID: u32 = 0x20;
}

/// Custom-ring gateway ops (`spec.md` §6).
pub mod custom_ring {
    pub const CR_SRC_MAC_LO: u32 = 0x0;
    pub const CR_SRC_MAC_HI: u32 = 0x1;
    pub const CR_SRC_IP: u32 = 0x2;
    pub const CR_SRC_UDP: u32 = 0x3;
    pub const CR_DST_UDP: u32 = 0x4;
    pub const CR_DST_MAC_LO: u32 = 0x5;
    pub const CR_DST_MAC_HI: u32 = 0x6;
    pub const CR_DST_IP: u32 = 0x7;
    pub const CR_DST_QPN: u32 = 0x8;
    pub const CR_PSN: u32 = 0x9;
    pub const CR_WRITE_CONTEXT: u32 = 0xa;
    pub const CR_READ_CONTEXT: u32 = 0xb;
    pub const CR_NUM_CONTEXTS: u32 = 0xc;
}

/// DRR scheduler ops, stride-2 per flow (`scheduler.hpp`).
pub mod scheduler {
    pub const SCHED_DRR_QUANTUM: u32 = 0;
    pub const SCHED_DRR_DEFICIT: u32 = 1;
    pub const STRIDE: u32 = 2;

    pub fn base(flow: u32) -> u32 {
        flow * STRIDE
    }
}

/// Threshold ikernel register map (`threshold.hpp`).
pub mod threshold {
    pub const THRESHOLD_VALUE: u32 = 0x0;
    pub const THRESHOLD_MIN: u32 = 0x1;
    pub const THRESHOLD_MAX: u32 = 0x2;
    pub const THRESHOLD_COUNT: u32 = 0x3;
    pub const THRESHOLD_SUM_LO: u32 = 0x4;
    pub const THRESHOLD_SUM_HI: u32 = 0x5;
    pub const THRESHOLD_DROPPED: u32 = 0x6;
    pub const THRESHOLD_DROPPED_BACKPRESSURE: u32 = 0x7;
    pub const THRESHOLD_RESET: u32 = 0x8;
}

/// CMS / Top-K ikernel register map.
pub mod cms {
    pub const READ_TOP_K: u32 = 0x0;
    pub const TOPK_READ_NEXT_VALUE: u32 = 0x1;
    pub const HASHES_BASE: u32 = 0x10;
}

/// Passthrough ikernel register map (`spec.md` §4.11: "ignore_credits flag
/// for testing").
pub mod passthrough {
    pub const RING_ID: u32 = 0x0;
    pub const IGNORE_CREDITS: u32 = 0x1;
}

/// Packet generator ikernel register map.
pub mod pktgen {
    pub const BURST_SIZE: u32 = 0x0;
}

/// Memcached-offload ikernel register map (`spec.md` §4.11).
pub mod memcached {
    pub const STATS_GET_REQUESTS: u32 = 0x0;
    pub const STATS_GET_REQUESTS_HITS: u32 = 0x1;
    pub const STAT_HIT_DROP: u32 = 0x2;
}

/// CoAP/JWT-gate ikernel register map (`spec.md` §4.11).
pub mod coap {
    pub const STATS_VERIFIED: u32 = 0x0;
    pub const STATS_REJECTED: u32 = 0x1;
}
