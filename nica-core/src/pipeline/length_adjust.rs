//! Length adjust: truncates the codec's data stream to exactly the byte
//! count the UDP header declares, discarding NIC padding flits and
//! resyncing on upstream/declared-length mismatch (`spec.md` §4.3).

use super::flit::Flit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Streaming,
    /// Upstream asserted `last` before `word_count` reached zero; wait for
    /// the true last flit before resuming with the next packet.
    Consume,
}

/// Computes `word_count`/`last_word_data` from a declared UDP payload
/// length and truncates an incoming flit stream to match.
pub struct LengthAdjust {
    state: State,
    words_remaining: u32,
    last_word_bytes: usize,
}

impl LengthAdjust {
    pub fn new(udp_length: u16) -> Self {
        let payload_len = udp_length.saturating_sub(8) as u32;
        let word_count = payload_len.div_ceil(Flit::WIDTH_BYTES as u32);
        let last_word_bytes = if payload_len == 0 {
            0
        } else {
            let rem = (payload_len % Flit::WIDTH_BYTES as u32) as usize;
            if rem == 0 { Flit::WIDTH_BYTES } else { rem }
        };
        Self { state: State::Streaming, words_remaining: word_count, last_word_bytes }
    }

    /// Feed the next upstream flit. Returns `Some(flit)` to emit downstream
    /// (with `keep`/`last` overridden on the truncation boundary), or
    /// `None` if the flit was padding to discard or the machine is
    /// resyncing in [`State::Consume`].
    pub fn push(&mut self, flit: Flit) -> Option<Flit> {
        match self.state {
            State::Consume => {
                if flit.last {
                    self.state = State::Streaming;
                }
                None
            }
            State::Streaming => {
                if self.words_remaining == 0 {
                    // Pure padding beyond the declared length.
                    if !flit.last {
                        self.state = State::Consume;
                    }
                    return None;
                }

                self.words_remaining -= 1;
                if self.words_remaining == 0 {
                    let out = Flit::last_with(flit.data, self.last_word_bytes);
                    if !flit.last {
                        // Declared length reached before upstream's own
                        // `last`; the remaining upstream flits are padding.
                        self.state = State::Consume;
                    }
                    Some(out)
                } else {
                    if flit.last {
                        // Upstream ended early: resync on the next packet.
                        self.state = State::Streaming;
                        return Some(Flit::last_with(flit.data, flit.num_kept_bytes()));
                    }
                    Some(Flit::full(flit.data))
                }
            }
        }
    }
}
