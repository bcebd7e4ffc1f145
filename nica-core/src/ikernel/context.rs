//! Fixed-capacity per-ikernel context array, replacing the HLS
//! `context_manager<T, log_size>` template (`spec.md` §9 "generic
//! fixed-capacity maps become arrays indexed by a newtype").
//!
//! The hardware version threads gateway reads/writes through an update
//! queue to hide RTL access latency. A software port has no such latency,
//! so this collapses to direct indexed access with a bounds check that
//! mirrors `valid_index`.

/// Opaque index into a [`ContextArray`], distinct from a raw `usize` so
/// call sites can't accidentally index one array with another's key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextIndex(pub u32);

/// A fixed-size `1 << log_size` array of per-flow/per-ikernel contexts.
pub struct ContextArray<T> {
    contexts: Vec<T>,
}

impl<T: Default + Clone> ContextArray<T> {
    pub fn new(log_size: u32) -> Self {
        Self { contexts: vec![T::default(); 1usize << log_size] }
    }
}

impl<T> ContextArray<T> {
    pub fn with_capacity(capacity: usize, init: impl Fn() -> T) -> Self {
        Self { contexts: (0..capacity).map(|_| init()).collect() }
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn valid_index(&self, index: ContextIndex) -> bool {
        (index.0 as usize) < self.contexts.len()
    }

    pub fn get(&self, index: ContextIndex) -> Option<&T> {
        self.contexts.get(index.0 as usize)
    }

    pub fn get_mut(&mut self, index: ContextIndex) -> Option<&mut T> {
        self.contexts.get_mut(index.0 as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_size_determines_capacity() {
        let arr: ContextArray<u32> = ContextArray::new(4);
        assert_eq!(arr.len(), 16);
    }

    #[test]
    fn valid_index_respects_capacity() {
        let arr: ContextArray<u32> = ContextArray::new(2);
        assert!(arr.valid_index(ContextIndex(3)));
        assert!(!arr.valid_index(ContextIndex(4)));
    }

    #[test]
    fn get_mut_allows_in_place_update() {
        let mut arr: ContextArray<u32> = ContextArray::new(2);
        *arr.get_mut(ContextIndex(1)).unwrap() = 42;
        assert_eq!(*arr.get(ContextIndex(1)).unwrap(), 42);
    }
}
