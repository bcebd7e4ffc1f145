//! Count-min sketch + indexed-heap top-K ikernel (`spec.md` §4.11): every
//! packet's first four payload bytes, read as a big-endian `u32`, update a
//! `DEPTH`-row sketch whose hash parameters the host programs through
//! `HASHES_BASE`; the estimate also feeds an on-device top-K heap the host
//! drains through `READ_TOP_K`/`TOPK_READ_NEXT_VALUE`.

use std::collections::HashMap;

use crate::gateway::addr::cms::*;
use crate::gateway::{GatewayStatus, GatewayTarget};
use crate::ikernel::{Direction, Ikernel, IkernelEmit, IkernelPacket, TcCounts};

pub const DEPTH: usize = 3;
pub const WIDTH: usize = 272;

/// Count-min sketch: `DEPTH` independent `(a, b)` hash rows over `WIDTH`
/// saturating counters.
#[derive(Debug, Clone)]
pub struct Sketch {
    counters: [[u32; WIDTH]; DEPTH],
    hash_params: [(u32, u32); DEPTH],
}

impl Default for Sketch {
    fn default() -> Self {
        Self { counters: [[0; WIDTH]; DEPTH], hash_params: [(1, 0); DEPTH] }
    }
}

impl Sketch {
    fn hash(&self, row: usize, x: u32) -> usize {
        let (a, b) = self.hash_params[row];
        (a.wrapping_mul(x).wrapping_add(b) as usize) % WIDTH
    }

    pub fn set_hash_params(&mut self, row: usize, a: u32, b: u32) {
        if let Some(slot) = self.hash_params.get_mut(row) {
            *slot = (a, b);
        }
    }

    pub fn update(&mut self, x: u32) {
        for row in 0..DEPTH {
            let idx = self.hash(row, x);
            self.counters[row][idx] = self.counters[row][idx].saturating_add(1);
        }
    }

    pub fn estimate(&self, x: u32) -> u32 {
        (0..DEPTH).map(|row| self.counters[row][self.hash(row, x)]).min().unwrap_or(0)
    }
}

/// Indexed min-heap over `(value, count)`, capped at `capacity` entries
/// (`spec.md` §4.11 "on-device top-K heap"): observing a value already
/// tracked updates its key in place; observing a new value evicts the
/// current minimum once the heap is full and the candidate exceeds it.
pub struct TopKHeap {
    capacity: usize,
    heap: Vec<(u32, u32)>,
    position: HashMap<u32, usize>,
}

impl TopKHeap {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, heap: Vec::with_capacity(capacity), position: HashMap::new() }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn observe(&mut self, value: u32, count: u32) {
        if let Some(&idx) = self.position.get(&value) {
            self.heap[idx].1 = count;
            self.sift_up(idx);
            self.sift_down(idx);
            return;
        }
        if self.heap.len() < self.capacity {
            self.push(value, count);
        } else if self.capacity > 0 && count > self.heap[0].1 {
            self.pop_root();
            self.push(value, count);
        }
    }

    /// Values in descending-count order; used to service `READ_TOP_K`.
    pub fn ranked_values(&self) -> Vec<u32> {
        let mut entries = self.heap.clone();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.into_iter().map(|(v, _)| v).collect()
    }

    fn push(&mut self, value: u32, count: u32) {
        let idx = self.heap.len();
        self.heap.push((value, count));
        self.position.insert(value, idx);
        self.sift_up(idx);
    }

    fn pop_root(&mut self) {
        let last = self.heap.len() - 1;
        self.swap(0, last);
        let (value, _) = self.heap.pop().unwrap();
        self.position.remove(&value);
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.position.insert(self.heap[a].0, a);
        self.position.insert(self.heap[b].0, b);
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if self.heap[idx].1 < self.heap[parent].1 {
                self.swap(idx, parent);
                idx = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        loop {
            let (left, right) = (2 * idx + 1, 2 * idx + 2);
            let mut smallest = idx;
            if left < self.heap.len() && self.heap[left].1 < self.heap[smallest].1 {
                smallest = left;
            }
            if right < self.heap.len() && self.heap[right].1 < self.heap[smallest].1 {
                smallest = right;
            }
            if smallest == idx {
                break;
            }
            self.swap(idx, smallest);
            idx = smallest;
        }
    }
}

pub struct CmsIkernel {
    sketch: Sketch,
    top_k: TopKHeap,
    read_cursor: Vec<u32>,
}

impl CmsIkernel {
    pub fn new(top_k: usize) -> Self {
        Self { sketch: Sketch::default(), top_k: TopKHeap::new(top_k), read_cursor: Vec::new() }
    }
}

impl GatewayTarget for CmsIkernel {
    fn gateway_write(&mut self, addr: u32, data: u32) -> GatewayStatus {
        if addr == READ_TOP_K {
            // Stored ascending so `pop()` (removes from the end) yields the
            // highest-ranked value first.
            self.read_cursor = self.top_k.ranked_values();
            self.read_cursor.reverse();
            return GatewayStatus::Done;
        }
        if addr >= HASHES_BASE {
            let offset = addr - HASHES_BASE;
            let row = (offset / 2) as usize;
            if row >= DEPTH {
                return GatewayStatus::Fail;
            }
            // The register map exposes `a` and `b` as separate writes; fold
            // whichever half just changed into the existing pair.
            let (a, b) = self.sketch.hash_params[row];
            let updated = if offset % 2 == 0 { (data, b) } else { (a, data) };
            self.sketch.set_hash_params(row, updated.0, updated.1);
            return GatewayStatus::Done;
        }
        GatewayStatus::Fail
    }

    fn gateway_read(&mut self, addr: u32) -> (GatewayStatus, u32) {
        if addr == TOPK_READ_NEXT_VALUE {
            return match self.read_cursor.pop() {
                Some(v) => (GatewayStatus::Done, v),
                None => (GatewayStatus::Fail, 0),
            };
        }
        (GatewayStatus::Fail, 0)
    }
}

impl Ikernel for CmsIkernel {
    fn ingress(&mut self, _direction: Direction, packet: IkernelPacket, _tc_counts: &TcCounts) -> Vec<IkernelEmit> {
        if let Some(bytes) = packet.payload.get(0..4) {
            let value = u32::from_be_bytes(bytes.try_into().unwrap());
            self.sketch.update(value);
            let estimate = self.sketch.estimate(value);
            self.top_k.observe(value, estimate);
        }
        vec![IkernelEmit::Forward(packet)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sketch_estimate_never_undercounts() {
        let mut sketch = Sketch::default();
        sketch.set_hash_params(0, 7, 1);
        sketch.set_hash_params(1, 11, 2);
        sketch.set_hash_params(2, 13, 3);
        for _ in 0..5 {
            sketch.update(42);
        }
        sketch.update(99);
        assert!(sketch.estimate(42) >= 5);
    }

    #[test]
    fn top_k_heap_evicts_the_minimum_when_full() {
        let mut heap = TopKHeap::new(2);
        heap.observe(1, 10);
        heap.observe(2, 20);
        heap.observe(3, 30);
        let mut values = heap.ranked_values();
        values.sort_unstable();
        assert_eq!(values, vec![2, 3]);
    }

    #[test]
    fn top_k_heap_updates_existing_entry_in_place() {
        let mut heap = TopKHeap::new(2);
        heap.observe(1, 5);
        heap.observe(1, 50);
        assert_eq!(heap.len(), 1);
        assert_eq!(heap.ranked_values(), vec![1]);
    }

    #[test]
    fn read_top_k_then_next_value_drains_in_rank_order() {
        let mut ik = CmsIkernel::new(3);
        ik.top_k.observe(5, 1);
        ik.top_k.observe(6, 9);
        ik.top_k.observe(7, 5);
        ik.gateway_write(READ_TOP_K, 0);
        let (status, first) = ik.gateway_read(TOPK_READ_NEXT_VALUE);
        assert_eq!(status, GatewayStatus::Done);
        assert_eq!(first, 6);
    }

    #[test]
    fn next_value_fails_once_cursor_is_exhausted() {
        let mut ik = CmsIkernel::new(1);
        ik.gateway_write(READ_TOP_K, 0);
        assert_eq!(ik.gateway_read(TOPK_READ_NEXT_VALUE), (GatewayStatus::Fail, 0));
    }
}
