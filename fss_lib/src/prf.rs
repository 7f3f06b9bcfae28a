//! Fixed-key PRF used for seed expansion.
//!
//! Block `i` of an expansion is `AES_{k_i}(seed) ^ seed`, a Matyas–Meyer–Oseas
//! compression over a public, fixed permutation per block index.

use std::fmt;

use aes::Aes128;
use aes::cipher::{BlockEncrypt, KeyInit, generic_array::GenericArray};

use crate::error::{FssError, Result};

pub const BLOCK_SIZE: usize = 16;
/// Blocks produced by the densest evaluator per tree level.
pub const DEFAULT_PRF_BLOCKS: usize = 4;

pub type Block = [u8; BLOCK_SIZE];

pub const ZERO_BLOCK: Block = [0u8; BLOCK_SIZE];

#[inline(always)]
pub fn xor_bytes(a: &mut Block, b: &Block) {
    for i in 0..BLOCK_SIZE {
        a[i] ^= b[i];
    }
}

/// Reusable buffers for [`FixedKeyPrf::expand`].
///
/// A `Scratch` belongs to exactly one evaluation at a time. Concurrent
/// evaluations must each own a separate instance.
#[derive(Debug, Clone)]
pub struct Scratch {
    temp: Block,
    out: Vec<u8>,
}

impl Scratch {
    pub fn new() -> Self {
        Self::with_blocks(DEFAULT_PRF_BLOCKS)
    }

    pub fn with_blocks(num_blocks: usize) -> Self {
        Self {
            temp: ZERO_BLOCK,
            out: vec![0u8; num_blocks * BLOCK_SIZE],
        }
    }

    /// Number of blocks the output buffer holds without growing.
    pub fn capacity_blocks(&self) -> usize {
        self.out.len() / BLOCK_SIZE
    }

    // Growth keeps the buffer; every expansion rewrites the prefix it returns.
    fn reserve_blocks(&mut self, num_blocks: usize) {
        let needed = num_blocks * BLOCK_SIZE;
        if self.out.len() < needed {
            self.out.resize(needed, 0);
        }
    }
}

impl Default for Scratch {
    fn default() -> Self {
        Self::new()
    }
}

/// One AES-128 instance per output block index.
#[derive(Clone)]
pub struct FixedKeyPrf {
    keys: Vec<Block>,
    ciphers: Vec<Aes128>,
}

impl FixedKeyPrf {
    /// Instantiates one cipher per key. Every key must be exactly 16 bytes.
    pub fn new<K: AsRef<[u8]>>(keys: &[K]) -> Result<Self> {
        let mut stored = Vec::with_capacity(keys.len());
        let mut ciphers = Vec::with_capacity(keys.len());
        for (index, key) in keys.iter().enumerate() {
            let key = key.as_ref();
            let block: Block = key.try_into().map_err(|_| FssError::InvalidPrfKey {
                index,
                len: key.len(),
            })?;
            ciphers.push(Aes128::new(GenericArray::from_slice(&block)));
            stored.push(block);
        }
        Ok(Self {
            keys: stored,
            ciphers,
        })
    }

    pub fn keys(&self) -> &[Block] {
        &self.keys
    }

    /// Largest `num_blocks` an expansion can request.
    pub fn max_blocks(&self) -> usize {
        self.ciphers.len()
    }

    /// Expands `seed` into `num_blocks * BLOCK_SIZE` bytes written into
    /// `scratch`, growing it first when needed. Returns the written prefix.
    pub fn expand<'s>(
        &self,
        seed: &Block,
        num_blocks: usize,
        scratch: &'s mut Scratch,
    ) -> Result<&'s [u8]> {
        if num_blocks > self.ciphers.len() {
            return Err(FssError::PrfFanOut {
                requested: num_blocks,
                available: self.ciphers.len(),
            });
        }
        scratch.reserve_blocks(num_blocks);

        for (i, cipher) in self.ciphers[..num_blocks].iter().enumerate() {
            let mut block = GenericArray::clone_from_slice(seed);
            cipher.encrypt_block(&mut block);
            scratch.temp.copy_from_slice(&block);
            xor_bytes(&mut scratch.temp, seed);
            scratch.out[i * BLOCK_SIZE..(i + 1) * BLOCK_SIZE].copy_from_slice(&scratch.temp);
        }
        Ok(&scratch.out[..num_blocks * BLOCK_SIZE])
    }
}

impl fmt::Debug for FixedKeyPrf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedKeyPrf")
            .field("num_ciphers", &self.ciphers.len())
            .finish()
    }
}
