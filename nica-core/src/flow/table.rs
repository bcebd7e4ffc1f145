//! Bounded linear-probing flow table (`spec.md` §3, §4.2, §6, §8).
//!
//! Grounded on `flow_table.hpp`/`flow_table.cpp`'s hash table: a fixed-size
//! array of `Option<(FlowKey, FlowValue)>` slots probed linearly from
//! `hash(key) % capacity`, bounded by a maximum hop count. The hardware
//! never rehashes; neither does this port.

use ahash::AHasher;
use std::hash::{Hash, Hasher};

use super::key::FlowKey;

pub const LOG_SIZE: u32 = 10;
pub const CAPACITY: usize = 1 << LOG_SIZE;
pub const MAX_HOPS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowAction {
    #[default]
    Passthrough,
    Drop,
    Ikernel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlowValue {
    pub action: FlowAction,
    pub engine_id: u8,
    pub ikernel_id: u8,
}

impl FlowValue {
    pub const fn passthrough() -> Self {
        Self { action: FlowAction::Passthrough, engine_id: 0, ikernel_id: 0 }
    }
}

/// A lookup result: the 1-based flow index (0 = miss) and the resolved
/// value. Mirrors the `flow_table_result` pair the gateway returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupResult {
    pub flow_id: u16,
    pub value: FlowValue,
}

impl LookupResult {
    pub fn miss() -> Self {
        Self { flow_id: 0, value: FlowValue::passthrough() }
    }
}

fn slot_hash(key: &FlowKey) -> usize {
    let mut hasher = AHasher::default();
    key.hash(&mut hasher);
    (hasher.finish() as usize) % CAPACITY
}

struct Slot {
    key: FlowKey,
    value: FlowValue,
}

/// Fixed-capacity linear-probed hash table. `add`/`delete`/`lookup` never
/// allocate past construction and never grow the backing array.
pub struct FlowTable {
    slots: Vec<Option<Slot>>,
}

impl Default for FlowTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowTable {
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(CAPACITY);
        slots.resize_with(CAPACITY, || None);
        Self { slots }
    }

    /// Insert `key -> value`. Returns `Some(index + 1)` on success, `None`
    /// if every probe within `MAX_HOPS` is occupied (mirrors the hardware
    /// returning flow id 0 on failure).
    pub fn add(&mut self, key: FlowKey, value: FlowValue) -> Option<u16> {
        let start = slot_hash(&key);
        for hop in 0..MAX_HOPS {
            let idx = (start + hop) % CAPACITY;
            if self.slots[idx].is_none() {
                self.slots[idx] = Some(Slot { key, value });
                return Some(idx as u16 + 1);
            }
        }
        None
    }

    /// Remove the entry for `key`. Returns `true` if a matching entry was
    /// found and removed, `false` if the key was never present within the
    /// probe bound (mirrors a missing-key delete returning false).
    ///
    /// After clearing the slot, shifts any later entry whose natural hash
    /// is at or before the new hole into it (the "classical hole-filling
    /// shift", `spec.md` §3), otherwise later entries that collided with
    /// the deleted key would become unreachable from their own hash.
    pub fn delete(&mut self, key: FlowKey) -> bool {
        let start = slot_hash(&key);
        for hop in 0..MAX_HOPS {
            let idx = (start + hop) % CAPACITY;
            match &self.slots[idx] {
                Some(slot) if slot.key == key => {
                    self.slots[idx] = None;
                    self.fill_hole(idx);
                    return true;
                }
                Some(_) => continue,
                None => return false,
            }
        }
        false
    }

    /// Re-home entries following a freshly cleared slot so every key
    /// remains reachable by linear probing from its own hash.
    fn fill_hole(&mut self, mut hole: usize) {
        loop {
            let mut shifted = false;
            for hop in 1..MAX_HOPS {
                let idx = (hole + hop) % CAPACITY;
                let Some(slot) = &self.slots[idx] else { break };
                let natural = slot_hash(&slot.key);
                let dist_to_hole = hole.wrapping_sub(natural) % CAPACITY;
                let dist_to_idx = idx.wrapping_sub(natural) % CAPACITY;
                if dist_to_hole < dist_to_idx {
                    self.slots[hole] = self.slots[idx].take();
                    hole = idx;
                    shifted = true;
                    break;
                }
            }
            if !shifted {
                break;
            }
        }
    }

    pub fn lookup(&self, key: FlowKey) -> LookupResult {
        let start = slot_hash(&key);
        for hop in 0..MAX_HOPS {
            let idx = (start + hop) % CAPACITY;
            match &self.slots[idx] {
                Some(slot) if slot.key == key => {
                    return LookupResult { flow_id: idx as u16 + 1, value: slot.value };
                }
                Some(_) => continue,
                None => return LookupResult::miss(),
            }
        }
        LookupResult::miss()
    }

    /// Debug read by raw slot index (`FT_READ_ENTRY`). `None` if empty or
    /// out of range.
    pub fn read_entry(&self, index: u16) -> Option<(FlowKey, FlowValue)> {
        self.slots.get(index as usize)?.as_ref().map(|s| (s.key, s.value))
    }

    /// Debug write by raw slot index (`FT_SET_ENTRY`). Returns `false` if
    /// `index` is out of range.
    pub fn set_entry(&mut self, index: u16, key: FlowKey, value: FlowValue) -> bool {
        match self.slots.get_mut(index as usize) {
            Some(slot) => {
                *slot = Some(Slot { key, value });
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::metadata::FiveTuple;
    use std::net::Ipv4Addr;

    fn key(port: u16) -> FlowKey {
        use super::super::key::FieldMask;
        FlowKey::masked(
            FiveTuple {
                src_ip: Ipv4Addr::new(10, 0, 0, 1),
                dst_ip: Ipv4Addr::new(10, 0, 0, 2),
                src_port: port,
                dst_port: 53,
                vm_id: 0,
            },
            FieldMask::default(),
        )
    }

    #[test]
    fn add_lookup_delete_round_trip() {
        let mut table = FlowTable::new();
        let value = FlowValue { action: FlowAction::Ikernel, engine_id: 1, ikernel_id: 2 };
        let id = table.add(key(1), value).expect("insert succeeds");
        assert_ne!(id, 0);
        assert_eq!(table.lookup(key(1)), LookupResult { flow_id: id, value });

        assert!(table.delete(key(1)));
        assert_eq!(table.lookup(key(1)), LookupResult::miss());
    }

    #[test]
    fn delete_missing_key_returns_false() {
        let mut table = FlowTable::new();
        assert!(!table.delete(key(99)));
    }

    #[test]
    fn lookup_miss_is_passthrough() {
        let table = FlowTable::new();
        let result = table.lookup(key(7));
        assert_eq!(result.flow_id, 0);
        assert_eq!(result.value.action, FlowAction::Passthrough);
    }

    #[test]
    fn delete_fills_hole_so_collided_key_stays_reachable() {
        let mut table = FlowTable::new();
        let base = slot_hash(&key(1));
        // Force a second key to land one slot past `base` by occupying
        // `base` first; both keys share the same natural hash bucket only
        // if their computed hashes collide, so instead we simulate the
        // collision directly by writing raw slots at adjacent indices
        // with the second key's *actual* natural hash equal to `base`.
        let a = key(1);
        let value_a = FlowValue { action: FlowAction::Ikernel, engine_id: 1, ikernel_id: 1 };
        table.slots[base] = Some(Slot { key: a, value: value_a });

        // Find a second key whose natural hash is also `base` (brute force
        // over a small port range — collisions are common at CAPACITY=1024
        // only probabilistically, so fall back gracefully if none found).
        let mut b = None;
        for port in 2..2000u16 {
            let candidate = key(port);
            if slot_hash(&candidate) == base {
                b = Some(candidate);
                break;
            }
        }
        let Some(b) = b else { return };
        let idx_b = (base + 1) % CAPACITY;
        let value_b = FlowValue { action: FlowAction::Ikernel, engine_id: 2, ikernel_id: 2 };
        table.slots[idx_b] = Some(Slot { key: b, value: value_b });

        assert!(table.delete(a));
        assert_eq!(table.lookup(b), LookupResult { flow_id: base as u16 + 1, value: value_b });
    }

    #[test]
    fn stress_many_distinct_flows_round_trip() {
        let mut table = FlowTable::new();
        let mut ids = Vec::new();
        for port in 0..100u16 {
            let id = table.add(key(port), FlowValue { action: FlowAction::Ikernel, engine_id: 0, ikernel_id: 0 });
            ids.push(id);
        }
        assert!(ids.iter().all(|id| id.is_some()));
        let mut uniq: Vec<u16> = ids.iter().map(|i| i.unwrap()).collect();
        uniq.sort_unstable();
        uniq.dedup();
        assert_eq!(uniq.len(), 100);

        for port in 0..100u16 {
            assert!(table.delete(key(port)));
            assert!(!table.delete(key(port)));
        }
    }
}
