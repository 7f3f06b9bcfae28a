//! Server-side evaluation of the three function families.
//!
//! Every evaluator walks a chain of PRF expansions, one per domain bit, so a
//! single evaluation is strictly serial. Independent evaluations may run in
//! parallel as long as each owns its [`Scratch`].

use crate::context::{Fss, MP_SLOT_BYTES, MpWord};
use crate::error::{FssError, Result};
use crate::keys::{FssKeyEq2P, FssKeyEqMP, Party, ServerKeyLt};
use crate::prf::{BLOCK_SIZE, Scratch, ZERO_BLOCK, xor_bytes};

/// Point-function expansion: `sL || tL || sR || tR` packed into 3 blocks.
pub(crate) const PF_PRF_BLOCKS: usize = 3;
pub(crate) const PF_T_LEFT: usize = BLOCK_SIZE;
pub(crate) const PF_SEED_RIGHT: usize = BLOCK_SIZE + 1;
pub(crate) const PF_T_RIGHT: usize = 2 * BLOCK_SIZE + 1;

/// Interval expansion: two child seeds, two control bytes at 32/33, two
/// 8-byte increments at 40/48.
pub(crate) const LT_PRF_BLOCKS: usize = 4;
pub(crate) const LT_T_OFFSET: usize = 2 * BLOCK_SIZE;
pub(crate) const LT_V_OFFSET: usize = 2 * BLOCK_SIZE + 8;

pub(crate) fn read_i64(bytes: &[u8]) -> i64 {
    let mut arr = [0u8; 8];
    arr.copy_from_slice(&bytes[..8]);
    i64::from_le_bytes(arr)
}

pub(crate) fn read_u64(bytes: &[u8]) -> u64 {
    let mut arr = [0u8; 8];
    arr.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(arr)
}

pub(crate) fn read_word(bytes: &[u8]) -> MpWord {
    let mut arr = [0u8; MP_SLOT_BYTES];
    arr.copy_from_slice(&bytes[..MP_SLOT_BYTES]);
    MpWord::from_le_bytes(arr)
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(FssError::KeyShapeMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Seed and control byte of the child selected by `x_bit` in a
/// point-function expansion.
pub(crate) fn pf_child(expanded: &[u8], x_bit: u8) -> ([u8; BLOCK_SIZE], u8) {
    let (seed_start, t_idx) = if x_bit == 0 {
        (0, PF_T_LEFT)
    } else {
        (PF_SEED_RIGHT, PF_T_RIGHT)
    };
    let mut seed = ZERO_BLOCK;
    seed.copy_from_slice(&expanded[seed_start..seed_start + BLOCK_SIZE]);
    (seed, expanded[t_idx])
}

/// Final point-function output: `(-1)^b * (conv(s) + t * final_cw)`.
pub(crate) fn pf_output(party: Party, seed: &[u8; BLOCK_SIZE], t: u8, final_cw: i64) -> i64 {
    let share = read_i64(seed).wrapping_add((t as i64).wrapping_mul(final_cw));
    match party {
        Party::Zero => share,
        Party::One => share.wrapping_neg(),
    }
}

impl Fss {
    /// Two-party point-function share at `x`. The shares of both parties sum
    /// to `beta` at `alpha` and to 0 elsewhere.
    pub fn evaluate_pf(&self, party: Party, key: &FssKeyEq2P, x: u64) -> Result<i64> {
        self.evaluate_pf_with(&mut Scratch::new(), party, key, x)
    }

    pub fn evaluate_pf_with(
        &self,
        scratch: &mut Scratch,
        party: Party,
        key: &FssKeyEq2P,
        x: u64,
    ) -> Result<i64> {
        self.check_input(x)?;
        check_len("point-function correction words", self.num_bits() as usize, key.cw.len())?;

        let mut seed = key.s_init;
        let mut t = key.t_init & 1;
        for (level, cw) in key.cw.iter().enumerate() {
            let x_bit = self.bit_at(x, level as u32);
            let expanded = self.prf().expand(&seed, PF_PRF_BLOCKS, scratch)?;
            let (mut next_seed, mut next_t) = pf_child(expanded, x_bit);

            // G(s) ^ t * (sCW || tLCW || sCW || tRCW), restricted to the chosen half
            if t == 1 {
                xor_bytes(&mut next_seed, &cw.seed);
                next_t ^= if x_bit == 0 { cw.t_left } else { cw.t_right };
            }
            seed = next_seed;
            t = next_t & 1;
        }
        Ok(pf_output(party, &seed, t, key.final_cw))
    }

    /// Two-party interval share at `x`. Party 1's accumulator is negated so
    /// that both shares sum (mod 2^64) to the configured relation's value.
    pub fn evaluate_lt(&self, party: Party, key: &ServerKeyLt, x: u64) -> Result<u64> {
        self.evaluate_lt_with(&mut Scratch::new(), party, key, x)
    }

    pub fn evaluate_lt_with(
        &self,
        scratch: &mut Scratch,
        party: Party,
        key: &ServerKeyLt,
        x: u64,
    ) -> Result<u64> {
        self.check_input(x)?;
        let levels = self.num_bits() as usize - 1;
        check_len("interval correction table (t = 0)", levels, key.cw[0].len())?;
        check_len("interval correction table (t = 1)", levels, key.cw[1].len())?;

        let first = self.bit_at(x, 0) as usize;
        let mut seed = key.s[first];
        let mut t = key.t[first] & 1;
        let mut v = key.v[first];

        for level in 1..self.num_bits() {
            let x_bit = self.bit_at(x, level) as usize;
            let expanded = self.prf().expand(&seed, LT_PRF_BLOCKS, scratch)?;
            let cw = &key.cw[t as usize][level as usize - 1];

            seed.copy_from_slice(&expanded[x_bit * BLOCK_SIZE..(x_bit + 1) * BLOCK_SIZE]);
            xor_bytes(&mut seed, &cw.cs[x_bit]);

            let increment = read_u64(&expanded[LT_V_OFFSET + 8 * x_bit..]);
            v = v.wrapping_add(increment).wrapping_add(cw.cv[x_bit]);

            t = (expanded[LT_T_OFFSET + x_bit] ^ cw.ct[x_bit]) & 1;
        }

        Ok(match party {
            Party::Zero => v,
            Party::One => v.wrapping_neg(),
        })
    }

    /// N-party equality share at `x`. XOR over all parties' shares gives
    /// `beta` at `alpha` and 0 elsewhere.
    pub fn evaluate_eq_mp(&self, key: &FssKeyEqMP, x: u64) -> Result<MpWord> {
        self.evaluate_eq_mp_with(&mut Scratch::new(), key, x)
    }

    pub fn evaluate_eq_mp_with(
        &self,
        scratch: &mut Scratch,
        key: &FssKeyEqMP,
        x: u64,
    ) -> Result<MpWord> {
        self.check_input(x)?;
        let layout = self.mp_layout(key.num_parties)?;
        check_len("multi-party seed buckets", layout.buckets, key.sigma.len())?;
        check_len("multi-party correction rows", layout.slots, key.cw.len())?;
        for row in &key.cw {
            check_len("multi-party correction row", layout.output_len, row.len())?;
        }

        let (delta, gamma) = self.split_mp_input(x, &layout);
        let bucket = &key.sigma[gamma];
        check_len("multi-party seed bucket", layout.slots, bucket.len())?;

        let mut y: Vec<MpWord> = vec![0; layout.output_len];
        for (slot, seed) in bucket.iter().enumerate() {
            // an empty slot contributes nothing, skip the expansion
            if *seed == ZERO_BLOCK {
                continue;
            }
            let expanded = self.prf().expand(seed, layout.prf_blocks, scratch)?;
            for (acc, chunk) in y.iter_mut().zip(expanded.chunks_exact(self.slot_bytes())) {
                *acc ^= read_word(chunk);
            }
            for (acc, correction) in y.iter_mut().zip(&key.cw[slot]) {
                *acc ^= correction;
            }
        }
        Ok(y[delta])
    }
}
