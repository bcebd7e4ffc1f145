//! Per-ring credit bookkeeping for custom-ring transmission (`spec.md`
//! §4.4, §8 "credit safety"). Grounded on the `ring_id`/`max_msn`/`reset`
//! credit-intake registers described alongside the ikernel runtime.

/// Credit state for one custom ring: a message sequence number bounded by
/// a host-advertised maximum.
#[derive(Debug, Clone, Copy, Default)]
pub struct RingCredit {
    pub msn: u32,
    pub max_msn: u32,
}

impl RingCredit {
    pub fn has_credit(&self) -> bool {
        self.msn < self.max_msn
    }

    /// Must be called exactly once per emitted custom-ring packet
    /// (`new_message`). Returns `false` (and leaves `msn` unchanged) if no
    /// credit remains — the caller must not have emitted a packet in that
    /// case.
    pub fn consume(&mut self) -> bool {
        if !self.has_credit() {
            return false;
        }
        self.msn += 1;
        true
    }

    pub fn reset(&mut self) {
        self.msn = 0;
    }
}

/// Fixed-size table of per-ring credit state, indexed by `ring_id - 1`.
/// Tracks the last-observed `{ring_id, max_msn, reset}` tuple so that only
/// genuine changes are applied, mirroring the single-element intake queue
/// the hardware drains via `update()`.
pub struct CreditTable {
    rings: Vec<RingCredit>,
    last_observed: Vec<Option<(u32, bool)>>,
}

impl CreditTable {
    pub fn new(num_rings: usize) -> Self {
        Self { rings: vec![RingCredit::default(); num_rings], last_observed: vec![None; num_rings] }
    }

    pub fn get(&self, ring_id: u8) -> Option<&RingCredit> {
        self.index(ring_id).map(|i| &self.rings[i])
    }

    pub fn get_mut(&mut self, ring_id: u8) -> Option<&mut RingCredit> {
        self.index(ring_id).map(move |i| &mut self.rings[i])
    }

    fn index(&self, ring_id: u8) -> Option<usize> {
        if ring_id == 0 {
            return None;
        }
        let idx = (ring_id - 1) as usize;
        if idx < self.rings.len() { Some(idx) } else { None }
    }

    /// Apply an `{ring_id, max_msn, reset}` update, ignoring it entirely
    /// (as the hardware logs-and-ignores) unless `ring_id` is in range and
    /// the observed tuple actually changed.
    pub fn update(&mut self, ring_id: u8, max_msn: u32, reset: bool) -> bool {
        let Some(idx) = self.index(ring_id) else { return false };
        let observed = (max_msn, reset);
        if self.last_observed[idx] == Some(observed) {
            return false;
        }
        self.last_observed[idx] = Some(observed);
        let credit = &mut self.rings[idx];
        credit.max_msn = max_msn;
        if reset {
            credit.reset();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_exhausts_at_max_msn() {
        let mut c = RingCredit { msn: 0, max_msn: 2 };
        assert!(c.consume());
        assert!(c.consume());
        assert!(!c.has_credit());
        assert!(!c.consume());
    }

    #[test]
    fn invalid_ring_id_zero_is_ignored() {
        let mut table = CreditTable::new(4);
        assert!(!table.update(0, 100, false));
        assert!(table.get(0).is_none());
    }

    #[test]
    fn out_of_range_ring_id_is_ignored() {
        let mut table = CreditTable::new(2);
        assert!(!table.update(9, 100, false));
    }

    #[test]
    fn update_only_applies_on_change() {
        let mut table = CreditTable::new(2);
        assert!(table.update(1, 50, false));
        assert!(!table.update(1, 50, false));
        assert_eq!(table.get(1).unwrap().max_msn, 50);
    }

    #[test]
    fn reset_clears_msn() {
        let mut table = CreditTable::new(2);
        table.update(1, 10, false);
        table.get_mut(1).unwrap().msn = 5;
        table.update(1, 20, true);
        assert_eq!(table.get(1).unwrap().msn, 0);
    }
}
