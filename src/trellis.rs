//! Half-rate trellis coding for 196-bit signalling blocks.
//!
//! The code is a binary K=5 rate-1/2 convolutional code: each data bit
//! produces one constellation point of two coded bits, so a 98-bit payload
//! fills one 196-bit block. The decoder is a full Viterbi search over the
//! 16 encoder states with traceback across the whole block.

use crate::bits::BitBuffer;
use crate::interleave::BLOCK_SIZE;

/// Decoded payload width per block.
pub const DATA_BITS: usize = 98;

const STATES: usize = 16;

// Generator taps over the 5-bit encoder register. Bit 4 is the current input
// bit, bit 0 the oldest: g1 = 1 + D^3 + D^4, g2 = 1 + D + D^2 + D^4.
const G1: u8 = 0b1_0011;
const G2: u8 = 0b1_1101;

const NO_PATH: u32 = u32::MAX / 2;

fn parity(word: u8) -> bool {
    word.count_ones() & 1 == 1
}

/// Coded bit pair emitted for encoder register `reg`.
fn branch_output(reg: u8) -> (bool, bool) {
    (parity(reg & G1), parity(reg & G2))
}

/// Viterbi codec for the half-rate trellis.
///
/// The survivor matrix (16 states x 98 steps) is allocated once here, not
/// per block, so decoding stays allocation-free on the ingest path.
#[derive(Debug, Clone)]
pub struct TrellisHalfRate {
    // survivors[step][state] packs the predecessor state and the input bit
    // that entered `state` at `step`.
    survivors: Vec<[u8; STATES]>,
}

impl Default for TrellisHalfRate {
    fn default() -> Self {
        Self::new()
    }
}

impl TrellisHalfRate {
    pub fn new() -> TrellisHalfRate {
        TrellisHalfRate {
            survivors: vec![[0; STATES]; DATA_BITS],
        }
    }

    /// Decode the 196 coded bits at `[start, end)` in place: afterwards the
    /// first 98 bits of the range hold the most likely payload and the rest
    /// of the range is cleared.
    ///
    /// Decoding cannot fail; with a corrupted block the survivor path is
    /// simply the nearest codeword. Payload validation is the consumer's
    /// CRC check.
    ///
    /// # Panics
    ///
    /// Panics unless `end - start == 196` and the range lies inside the
    /// buffer.
    pub fn decode(&mut self, buffer: &mut BitBuffer, start: usize, end: usize) {
        assert_eq!(
            end - start,
            BLOCK_SIZE,
            "block {start}..{end} must span {BLOCK_SIZE} bits"
        );

        // The encoder starts from the zero state.
        let mut metrics = [NO_PATH; STATES];
        metrics[0] = 0;

        for step in 0..DATA_BITS {
            let r1 = buffer.get_bit(start + step * 2);
            let r2 = buffer.get_bit(start + step * 2 + 1);

            let mut next = [NO_PATH; STATES];
            let survivors = &mut self.survivors[step];
            for state in 0..STATES as u8 {
                if metrics[state as usize] >= NO_PATH {
                    continue;
                }
                for input in 0..2u8 {
                    let reg = (input << 4) | state;
                    let (c1, c2) = branch_output(reg);
                    let cost = metrics[state as usize]
                        + (c1 != r1) as u32
                        + (c2 != r2) as u32;
                    let successor = (reg >> 1) as usize;
                    if cost < next[successor] {
                        next[successor] = cost;
                        survivors[successor] = (state << 1) | input;
                    }
                }
            }
            metrics = next;
        }

        let mut state = (0..STATES)
            .min_by_key(|&s| metrics[s])
            .unwrap_or(0);

        let mut decoded = [false; DATA_BITS];
        for step in (0..DATA_BITS).rev() {
            let survivor = self.survivors[step][state];
            decoded[step] = survivor & 1 == 1;
            state = (survivor >> 1) as usize;
        }

        buffer.clear(start..end);
        for (ix, bit) in decoded.iter().enumerate() {
            if *bit {
                buffer.set(start + ix);
            }
        }
    }

    /// Encode in place: the first 98 bits of `[start, end)` are taken as
    /// payload and replaced by the 196 coded bits. Exact inverse of
    /// [`TrellisHalfRate::decode`] on an error-free block.
    ///
    /// # Panics
    ///
    /// Panics unless `end - start == 196` and the range lies inside the
    /// buffer.
    pub fn encode(&self, buffer: &mut BitBuffer, start: usize, end: usize) {
        assert_eq!(
            end - start,
            BLOCK_SIZE,
            "block {start}..{end} must span {BLOCK_SIZE} bits"
        );

        let mut data = [false; DATA_BITS];
        for (ix, bit) in data.iter_mut().enumerate() {
            *bit = buffer.get_bit(start + ix);
        }

        buffer.clear(start..end);
        let mut state = 0u8;
        for (ix, &bit) in data.iter().enumerate() {
            let reg = ((bit as u8) << 4) | state;
            let (c1, c2) = branch_output(reg);
            if c1 {
                buffer.set(start + ix * 2);
            }
            if c2 {
                buffer.set(start + ix * 2 + 1);
            }
            state = reg >> 1;
        }
    }
}
