//! 196-bit block interleaving.
//!
//! Trellis-coded blocks are interleaved on the air in 49 four-bit groups
//! spread across four rows of the block (row offsets 0, 52, 100 and 148).
//! Both permutation tables are derived from that structure at compile time,
//! and each is the inverse of the other.

use crate::bits::BitBuffer;

/// Coded block width in bits.
pub const BLOCK_SIZE: usize = 196;

const ROW_OFFSETS: [usize; 4] = [0, 52, 100, 148];

/// `DEINTERLEAVE[i]` is the deinterleaved position of received bit `i`.
pub static DEINTERLEAVE: [usize; BLOCK_SIZE] = build_deinterleave();

/// Inverse of [`DEINTERLEAVE`]: the transmitted position of source bit `i`.
pub static INTERLEAVE: [usize; BLOCK_SIZE] = build_interleave();

const fn build_deinterleave() -> [usize; BLOCK_SIZE] {
    let mut table = [0usize; BLOCK_SIZE];
    let mut out = 0;
    let mut group = 0;
    while group < 13 {
        let mut row = 0;
        while row < 4 {
            // Rows 1..4 hold twelve groups; row 0 holds thirteen.
            if group < 12 || row == 0 {
                let base = ROW_OFFSETS[row] + group * 4;
                let mut bit = 0;
                while bit < 4 {
                    table[out] = base + bit;
                    out += 1;
                    bit += 1;
                }
            }
            row += 1;
        }
        group += 1;
    }
    table
}

const fn build_interleave() -> [usize; BLOCK_SIZE] {
    let forward = build_deinterleave();
    let mut table = [0usize; BLOCK_SIZE];
    let mut ix = 0;
    while ix < BLOCK_SIZE {
        table[forward[ix]] = ix;
        ix += 1;
    }
    table
}

/// Undo the air-interface permutation of the block at `[start, end)`,
/// in place.
///
/// # Panics
///
/// Panics unless `end - start == 196` and the range lies inside the buffer.
pub fn deinterleave(buffer: &mut BitBuffer, start: usize, end: usize) {
    permute(buffer, start, end, &DEINTERLEAVE);
}

/// Apply the air-interface permutation to the block at `[start, end)`,
/// in place. Exact inverse of [`deinterleave`].
///
/// # Panics
///
/// Panics unless `end - start == 196` and the range lies inside the buffer.
pub fn interleave(buffer: &mut BitBuffer, start: usize, end: usize) {
    permute(buffer, start, end, &INTERLEAVE);
}

fn permute(buffer: &mut BitBuffer, start: usize, end: usize, table: &[usize; BLOCK_SIZE]) {
    assert_eq!(
        end - start,
        BLOCK_SIZE,
        "block {start}..{end} must span {BLOCK_SIZE} bits"
    );
    let mut snapshot = [false; BLOCK_SIZE];
    for (ix, bit) in snapshot.iter_mut().enumerate() {
        *bit = buffer.get_bit(start + ix);
    }
    buffer.clear(start..end);
    for (ix, bit) in snapshot.iter().enumerate() {
        if *bit {
            buffer.set(start + table[ix]);
        }
    }
}
