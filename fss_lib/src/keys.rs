//! Key shares consumed by the evaluators.
//!
//! Keys come from a dealer and are never mutated during evaluation.

use serde::{Deserialize, Serialize};

use crate::prf::Block;

/// Evaluating party in the two-server schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Party {
    Zero,
    One,
}

impl Party {
    pub fn index(self) -> usize {
        match self {
            Party::Zero => 0,
            Party::One => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Party::Zero),
            1 => Some(Party::One),
            _ => None,
        }
    }
}

/// Per-level correction word of the point-function tree.
///
/// `seed` corrects both expanded child seeds; `t_left`/`t_right` correct the
/// control bytes that follow each of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionWord {
    pub seed: Block,
    pub t_left: u8,
    pub t_right: u8,
}

/// One party's share of a two-party point function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FssKeyEq2P {
    pub s_init: Block,
    pub t_init: u8,
    /// One entry per domain bit.
    pub cw: Vec<CorrectionWord>,
    pub final_cw: i64,
}

/// Interval correction entry for one (control bit, level) pair, holding one
/// correction per value of the domain bit at that level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CWLt {
    pub cs: [Block; 2],
    pub ct: [u8; 2],
    pub cv: [u64; 2],
}

/// One party's share of a two-party interval function.
///
/// `s`, `t` and `v` hold the two initial branches selected by the first
/// domain bit. `cw[t][level - 1]` is the entry used at `level` while the
/// current control bit is `t`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerKeyLt {
    pub s: [Block; 2],
    pub t: [u8; 2],
    pub v: [u64; 2],
    pub cw: [Vec<CWLt>; 2],
}

/// One party's share of an N-party equality function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FssKeyEqMP {
    pub num_parties: usize,
    /// `sigma[gamma]` holds `2^(num_parties - 1)` seeds for bucket `gamma`.
    /// An all-zero seed marks an empty slot.
    pub sigma: Vec<Vec<Block>>,
    /// `cw[slot][position]`, shared by every party.
    pub cw: Vec<Vec<u32>>,
}
