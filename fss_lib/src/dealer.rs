//! Trusted dealer: generates the key shares the servers evaluate.
//!
//! The dealer runs client-side with its own [`Fss`] context built from the
//! same PRF keys it hands to the servers.

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use tracing::debug;

use crate::context::{Fss, MP_SLOT_BYTES, MpLayout, MpWord};
use crate::error::{FssError, Result};
use crate::eval::{
    LT_PRF_BLOCKS, LT_T_OFFSET, LT_V_OFFSET, PF_PRF_BLOCKS, pf_child, read_i64, read_u64, read_word,
};
use crate::keys::{CWLt, CorrectionWord, FssKeyEq2P, FssKeyEqMP, ServerKeyLt};
use crate::prf::{BLOCK_SIZE, Block, DEFAULT_PRF_BLOCKS, Scratch, ZERO_BLOCK, xor_bytes};

/// Ordering relation encoded by an interval key pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
}

impl Relation {
    pub fn holds(self, x: u64, alpha: u64) -> bool {
        match self {
            Relation::LessThan => x < alpha,
            Relation::LessOrEqual => x <= alpha,
            Relation::GreaterThan => x > alpha,
            Relation::GreaterOrEqual => x >= alpha,
        }
    }

    fn includes_below(self) -> bool {
        matches!(self, Relation::LessThan | Relation::LessOrEqual)
    }

    fn includes_above(self) -> bool {
        matches!(self, Relation::GreaterThan | Relation::GreaterOrEqual)
    }

    fn includes_equal(self) -> bool {
        matches!(self, Relation::LessOrEqual | Relation::GreaterOrEqual)
    }
}

fn random_block<R: RngCore + ?Sized>(rng: &mut R) -> Block {
    let mut block = ZERO_BLOCK;
    rng.fill_bytes(&mut block);
    block
}

fn random_bit<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.random::<bool>() as u8
}

/// Fresh fixed PRF keys, one per cipher instance.
pub fn prf_keys<R: RngCore + ?Sized>(rng: &mut R, count: usize) -> Vec<Block> {
    (0..count).map(|_| random_block(rng)).collect()
}

/// Number of PRF keys a context needs to serve every evaluator, including
/// the multi-party scheme for `num_parties` parties when given.
pub fn prf_key_count(num_bits: u32, num_parties: Option<usize>) -> Result<usize> {
    match num_parties {
        Some(parties) => {
            let layout = MpLayout::new(num_bits, parties, MP_SLOT_BYTES)?;
            Ok(layout.prf_blocks.max(DEFAULT_PRF_BLOCKS))
        }
        None => Ok(DEFAULT_PRF_BLOCKS),
    }
}

/// Point-function key pair for `f(alpha) = beta`, 0 elsewhere.
pub fn gen_pf<R: Rng + ?Sized>(
    fss: &Fss,
    rng: &mut R,
    alpha: u64,
    beta: i64,
) -> Result<(FssKeyEq2P, FssKeyEq2P)> {
    fss.check_input(alpha)?;
    let n = fss.num_bits();
    let mut scratch = [Scratch::new(), Scratch::new()];

    let s_init = [random_block(rng), random_block(rng)];
    let t0 = random_bit(rng);
    let t_init = [t0, t0 ^ 1];

    let mut seeds = s_init;
    let mut ts = t_init;
    let mut cw = Vec::with_capacity(n as usize);

    for level in 0..n {
        let a = fss.bit_at(alpha, level);
        let [scratch0, scratch1] = &mut scratch;
        let e0 = fss.prf().expand(&seeds[0], PF_PRF_BLOCKS, scratch0)?;
        let e1 = fss.prf().expand(&seeds[1], PF_PRF_BLOCKS, scratch1)?;
        let children = [[pf_child(e0, 0), pf_child(e0, 1)], [pf_child(e1, 0), pf_child(e1, 1)]];

        let lose = (a ^ 1) as usize;
        let mut seed = children[0][lose].0;
        xor_bytes(&mut seed, &children[1][lose].0);
        let word = CorrectionWord {
            seed,
            t_left: (children[0][0].1 ^ children[1][0].1 ^ a ^ 1) & 1,
            t_right: (children[0][1].1 ^ children[1][1].1 ^ a) & 1,
        };

        let keep = a as usize;
        for party in 0..2 {
            let (mut next_seed, mut next_t) = children[party][keep];
            if ts[party] == 1 {
                xor_bytes(&mut next_seed, &word.seed);
                next_t ^= if a == 0 { word.t_left } else { word.t_right };
            }
            seeds[party] = next_seed;
            ts[party] = next_t & 1;
        }
        cw.push(word);
    }

    // t0 - t1 is +-1 at alpha, so it is its own inverse
    let sign = (ts[0] as i64).wrapping_sub(ts[1] as i64);
    let final_cw = sign.wrapping_mul(
        beta.wrapping_sub(read_i64(&seeds[0]))
            .wrapping_add(read_i64(&seeds[1])),
    );
    debug!(num_bits = n, "generated point-function keys");

    Ok((
        FssKeyEq2P {
            s_init: s_init[0],
            t_init: t_init[0],
            cw: cw.clone(),
            final_cw,
        },
        FssKeyEq2P {
            s_init: s_init[1],
            t_init: t_init[1],
            cw,
            final_cw,
        },
    ))
}

fn zero_cw_lt() -> CWLt {
    CWLt {
        cs: [ZERO_BLOCK; 2],
        ct: [0; 2],
        cv: [0; 2],
    }
}

/// Child seed, control bit and increment of one interval expansion.
fn lt_children(expanded: &[u8]) -> [(Block, u8, u64); 2] {
    let mut out = [(ZERO_BLOCK, 0u8, 0u64); 2];
    for (bit, child) in out.iter_mut().enumerate() {
        child
            .0
            .copy_from_slice(&expanded[bit * BLOCK_SIZE..(bit + 1) * BLOCK_SIZE]);
        child.1 = expanded[LT_T_OFFSET + bit] & 1;
        child.2 = read_u64(&expanded[LT_V_OFFSET + 8 * bit..]);
    }
    out
}

/// Interval key pair: shares sum to `beta` where `relation.holds(x, alpha)`.
pub fn gen_lt<R: Rng + ?Sized>(
    fss: &Fss,
    rng: &mut R,
    alpha: u64,
    beta: u64,
    relation: Relation,
) -> Result<(ServerKeyLt, ServerKeyLt)> {
    fss.check_input(alpha)?;
    let n = fss.num_bits();
    let levels = n as usize - 1;

    // value of a whole subtree that branches off alpha's path at bit `a`
    let branch_value = |a: u8| {
        let below = a == 1;
        let included = if below {
            relation.includes_below()
        } else {
            relation.includes_above()
        };
        if included { beta } else { 0 }
    };
    let equal_value = if relation.includes_equal() { beta } else { 0 };

    let mut keys = [
        ServerKeyLt {
            s: [ZERO_BLOCK; 2],
            t: [0; 2],
            v: [0; 2],
            cw: [Vec::new(), Vec::new()],
        },
        ServerKeyLt {
            s: [ZERO_BLOCK; 2],
            t: [0; 2],
            v: [0; 2],
            cw: [Vec::new(), Vec::new()],
        },
    ];

    let a = fss.bit_at(alpha, 0);
    let (on, off) = (a as usize, (a ^ 1) as usize);

    // off-path branch: identical state, offset accumulators
    let shared_seed = random_block(rng);
    let shared_t = random_bit(rng);
    let shared_v: u64 = rng.random();
    for key in keys.iter_mut() {
        key.s[off] = shared_seed;
        key.t[off] = shared_t;
    }
    keys[0].v[off] = shared_v;
    keys[1].v[off] = shared_v.wrapping_sub(branch_value(a));

    // on-path branch: independent seeds, complementary control bits
    let t0 = random_bit(rng);
    keys[0].s[on] = random_block(rng);
    keys[1].s[on] = random_block(rng);
    keys[0].t[on] = t0;
    keys[1].t[on] = t0 ^ 1;
    keys[0].v[on] = rng.random();
    keys[1].v[on] = if levels == 0 {
        keys[0].v[on].wrapping_sub(equal_value)
    } else {
        rng.random()
    };

    let mut seeds = [keys[0].s[on], keys[1].s[on]];
    let mut ts = [keys[0].t[on], keys[1].t[on]];
    let mut vs = [keys[0].v[on], keys[1].v[on]];
    let mut cw = [vec![zero_cw_lt(); levels], vec![zero_cw_lt(); levels]];
    let mut scratch = [Scratch::new(), Scratch::new()];

    for level in 1..n {
        let a = fss.bit_at(alpha, level);
        let (on, off) = (a as usize, (a ^ 1) as usize);
        let last = level == n - 1;

        let [scratch0, scratch1] = &mut scratch;
        let g = [
            lt_children(fss.prf().expand(&seeds[0], LT_PRF_BLOCKS, scratch0)?),
            lt_children(fss.prf().expand(&seeds[1], LT_PRF_BLOCKS, scratch1)?),
        ];

        // entries[p] lands at cw[ts[p]][level - 1]; ts differ on the path
        let mut entries = [zero_cw_lt(), zero_cw_lt()];

        let r = random_block(rng);
        entries[0].cs[off] = r;
        entries[1].cs[off] = r;
        xor_bytes(&mut entries[1].cs[off], &g[0][off].0);
        xor_bytes(&mut entries[1].cs[off], &g[1][off].0);

        let c = random_bit(rng);
        entries[0].ct[off] = c;
        entries[1].ct[off] = c ^ g[0][off].1 ^ g[1][off].1;

        let w: u64 = rng.random();
        entries[1].cv[off] = w;
        entries[0].cv[off] = branch_value(a)
            .wrapping_sub(vs[0])
            .wrapping_sub(g[0][off].2)
            .wrapping_add(vs[1])
            .wrapping_add(g[1][off].2)
            .wrapping_add(w);

        entries[0].cs[on] = random_block(rng);
        entries[1].cs[on] = random_block(rng);

        let c = random_bit(rng);
        entries[0].ct[on] = c;
        entries[1].ct[on] = c ^ g[0][on].1 ^ g[1][on].1 ^ 1;

        let w: u64 = rng.random();
        entries[1].cv[on] = w;
        entries[0].cv[on] = if last {
            equal_value
                .wrapping_sub(vs[0])
                .wrapping_sub(g[0][on].2)
                .wrapping_add(vs[1])
                .wrapping_add(g[1][on].2)
                .wrapping_add(w)
        } else {
            rng.random()
        };

        for party in 0..2 {
            let entry = &entries[party];
            let mut next_seed = g[party][on].0;
            xor_bytes(&mut next_seed, &entry.cs[on]);
            seeds[party] = next_seed;
            vs[party] = vs[party]
                .wrapping_add(g[party][on].2)
                .wrapping_add(entry.cv[on]);
            let t = ts[party] as usize;
            ts[party] = (g[party][on].1 ^ entry.ct[on]) & 1;
            cw[t][level as usize - 1] = entry.clone();
        }
    }
    debug!(num_bits = n, ?relation, "generated interval keys");

    let [mut k0, mut k1] = keys;
    k0.cw = cw.clone();
    k1.cw = cw;
    Ok((k0, k1))
}

/// Key set for `num_parties` parties: the XOR of all shares is `beta` at
/// `alpha` and 0 elsewhere.
pub fn gen_eq_mp<R: Rng + ?Sized>(
    fss: &Fss,
    rng: &mut R,
    num_parties: usize,
    alpha: u64,
    beta: MpWord,
) -> Result<Vec<FssKeyEqMP>> {
    fss.check_input(alpha)?;
    let layout = fss.mp_layout(num_parties)?;
    if layout.prf_blocks > fss.prf().max_blocks() {
        return Err(FssError::PrfFanOut {
            requested: layout.prf_blocks,
            available: fss.prf().max_blocks(),
        });
    }
    let (delta, gamma_star) = fss.split_mp_input(alpha, &layout);

    // column j of a bucket says which parties hold its seed: even weight
    // cancels across parties, odd weight survives
    let (odd, even): (Vec<u64>, Vec<u64>) =
        (0..1u64 << num_parties).partition(|col| col.count_ones() % 2 == 1);

    let mut sigma = vec![vec![Vec::with_capacity(layout.slots); layout.buckets]; num_parties];
    let mut target_seeds = vec![ZERO_BLOCK; layout.slots];

    for gamma in 0..layout.buckets {
        let mut columns = if gamma == gamma_star {
            odd.clone()
        } else {
            even.clone()
        };
        columns.shuffle(rng);

        for (slot, col) in columns.iter().enumerate() {
            let mut seed = random_block(rng);
            while seed == ZERO_BLOCK {
                seed = random_block(rng);
            }
            for (party, buckets) in sigma.iter_mut().enumerate() {
                let held = (col >> party) & 1 == 1;
                buckets[gamma].push(if held { seed } else { ZERO_BLOCK });
            }
            if gamma == gamma_star {
                target_seeds[slot] = seed;
            }
        }
    }

    let mut cw: Vec<Vec<MpWord>> = (0..layout.slots - 1)
        .map(|_| (0..layout.output_len).map(|_| rng.random()).collect())
        .collect();

    let mut last: Vec<MpWord> = vec![0; layout.output_len];
    last[delta] = beta;
    let mut scratch = Scratch::with_blocks(layout.prf_blocks);
    for seed in &target_seeds {
        let expanded = fss.prf().expand(seed, layout.prf_blocks, &mut scratch)?;
        for (acc, chunk) in last.iter_mut().zip(expanded.chunks_exact(fss.slot_bytes())) {
            *acc ^= read_word(chunk);
        }
    }
    for row in &cw {
        for (acc, value) in last.iter_mut().zip(row) {
            *acc ^= value;
        }
    }
    cw.push(last);
    debug!(
        num_parties,
        slots = layout.slots,
        output_len = layout.output_len,
        "generated multi-party equality keys"
    );

    Ok(sigma
        .into_iter()
        .map(|party_sigma| FssKeyEqMP {
            num_parties,
            sigma: party_sigma,
            cw: cw.clone(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn relation_truth_table() {
        assert!(Relation::LessThan.holds(1, 2));
        assert!(!Relation::LessThan.holds(2, 2));
        assert!(Relation::LessOrEqual.holds(2, 2));
        assert!(Relation::GreaterThan.holds(3, 2));
        assert!(!Relation::GreaterThan.holds(2, 2));
        assert!(Relation::GreaterOrEqual.holds(2, 2));
    }

    #[test]
    fn key_count_covers_multi_party_fan_out() {
        assert_eq!(prf_key_count(32, None).unwrap(), DEFAULT_PRF_BLOCKS);
        assert_eq!(prf_key_count(4, Some(3)).unwrap(), DEFAULT_PRF_BLOCKS);
        assert_eq!(prf_key_count(8, Some(3)).unwrap(), 8);
        assert!(prf_key_count(8, Some(1)).is_err());
    }

    #[test]
    fn point_function_keys_share_public_parts() {
        let mut rng = StdRng::seed_from_u64(21);
        let fss = Fss::new(&prf_keys(&mut rng, 4), 10).unwrap();
        let (k0, k1) = gen_pf(&fss, &mut rng, 700, 3).unwrap();

        assert_eq!(k0.cw.len(), 10);
        assert_eq!(k0.cw, k1.cw);
        assert_eq!(k0.final_cw, k1.final_cw);
        assert_eq!(k0.t_init ^ k1.t_init, 1);
        assert_ne!(k0.s_init, k1.s_init);
        assert!(gen_pf(&fss, &mut rng, 1 << 10, 3).is_err());
    }

    #[test]
    fn interval_keys_have_control_indexed_tables() {
        let mut rng = StdRng::seed_from_u64(22);
        let fss = Fss::new(&prf_keys(&mut rng, 4), 6).unwrap();
        let (k0, k1) = gen_lt(&fss, &mut rng, 17, 1, Relation::GreaterThan).unwrap();

        assert_eq!(k0.cw[0].len(), 5);
        assert_eq!(k0.cw[1].len(), 5);
        assert_eq!(k0.cw, k1.cw);

        // alpha = 0b010001 starts with 0: the 1-branch is off-path and shared
        assert_eq!(k0.s[1], k1.s[1]);
        assert_eq!(k0.t[1], k1.t[1]);
        assert_eq!(k0.t[0] ^ k1.t[0], 1);
    }

    #[test]
    fn multi_party_target_bucket_uses_odd_columns() {
        let mut rng = StdRng::seed_from_u64(23);
        let fss = Fss::new(&prf_keys(&mut rng, 4), 6).unwrap();
        let keys = gen_eq_mp(&fss, &mut rng, 3, 9, 1).unwrap();
        let layout = fss.mp_layout(3).unwrap();
        let (_, gamma_star) = fss.split_mp_input(9, &layout);

        for gamma in 0..layout.buckets {
            for slot in 0..layout.slots {
                let holders = keys
                    .iter()
                    .filter(|k| k.sigma[gamma][slot] != ZERO_BLOCK)
                    .count();
                assert_eq!(holders % 2 == 1, gamma == gamma_star, "gamma {gamma} slot {slot}");
            }
        }
        assert!(keys.iter().all(|k| k.cw == keys[0].cw));
    }
}
