//! The 32-byte flit that moves across every bounded channel in the
//! pipeline (`spec.md` §3 "Flit (`axi_data`)").

/// A single 256-bit (32-byte) beat of the packet bus.
///
/// Invariant: for a non-last flit `keep == u32::MAX`; for the last flit
/// `keep` is a run of leading ones (`0b1110_0000_...`, MSB-first), i.e.
/// `keep = !(u32::MAX >> num_bytes)` for `num_bytes` valid bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flit {
    pub data: [u8; 32],
    pub keep: u32,
    pub last: bool,
}

impl Flit {
    pub const WIDTH_BYTES: usize = 32;

    pub fn full(data: [u8; 32]) -> Self {
        Self { data, keep: u32::MAX, last: false }
    }

    /// Build the final flit of a packet from `num_bytes` valid bytes (0..=32).
    /// Bytes beyond `num_bytes` in `data` are ignored by `num_kept_bytes`
    /// but are not zeroed here — callers that care must zero them.
    pub fn last_with(data: [u8; 32], num_bytes: usize) -> Self {
        debug_assert!(num_bytes <= 32);
        let keep = if num_bytes == 32 { u32::MAX } else { !(u32::MAX >> num_bytes) };
        Self { data, keep, last: true }
    }

    /// Number of valid bytes in this flit, equal to `popcount(keep)` and,
    /// by the leading-run invariant, also to the index of the first zero
    /// bit counting from the MSB.
    pub fn num_kept_bytes(&self) -> usize {
        self.keep.count_ones() as usize
    }

    pub fn valid_bytes(&self) -> &[u8] {
        &self.data[..self.num_kept_bytes()]
    }
}
