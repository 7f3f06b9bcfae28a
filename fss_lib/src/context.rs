use std::f64::consts::SQRT_2;

use tracing::debug;

use crate::bits::native_width;
use crate::error::{FssError, Result};
use crate::prf::{BLOCK_SIZE, DEFAULT_PRF_BLOCKS, FixedKeyPrf};

/// Output word of the multi-party equality scheme.
pub type MpWord = u32;

/// Bytes per multi-party output slot (`M`).
pub const MP_SLOT_BYTES: usize = std::mem::size_of::<MpWord>();

/// Largest party count the multi-party scheme accepts.
pub const MAX_PARTIES: usize = 16;

/// Evaluation context shared by every evaluator of one server process.
///
/// Immutable after construction; scratch space lives in
/// [`crate::prf::Scratch`] values owned by the callers.
#[derive(Debug, Clone)]
pub struct Fss {
    prf: FixedKeyPrf,
    native_width: u32,
    num_bits: u32,
    slot_bytes: usize,
}

/// Table shapes of the multi-party equality scheme for one party count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpLayout {
    /// `2^(num_parties - 1)` seed slots per bucket.
    pub slots: usize,
    /// `mu`, output positions per slot.
    pub output_len: usize,
    /// Number of `gamma` buckets.
    pub buckets: usize,
    /// Low bits of the input forming `delta`.
    pub delta_bits: u32,
    /// PRF blocks needed to cover `output_len` slots.
    pub prf_blocks: usize,
}

impl MpLayout {
    pub fn new(num_bits: u32, num_parties: usize, slot_bytes: usize) -> Result<Self> {
        if !(2..=MAX_PARTIES).contains(&num_parties) {
            return Err(FssError::InvalidPartyCount(num_parties));
        }
        let too_wide = || FssError::InvalidDomainBits {
            num_bits,
            native_width: native_width(),
        };
        let slots = 1usize << (num_parties - 1);

        let delta_bits = num_bits / 2;
        let buckets = 1usize
            .checked_shl(num_bits - delta_bits)
            .ok_or_else(too_wide)?;

        // mu = ceil(2^(num_bits / 2) * 2^((num_parties - 1) / 2)), exponents in halves
        let halves = num_bits as usize + num_parties - 1;
        if halves / 2 + 1 >= usize::BITS as usize {
            return Err(too_wide());
        }
        let whole = 1usize << (halves / 2);
        let output_len = if halves % 2 == 0 {
            whole
        } else {
            (whole as f64 * SQRT_2).ceil() as usize
        };

        let prf_blocks = (slot_bytes * output_len).div_ceil(BLOCK_SIZE);
        Ok(Self {
            slots,
            output_len,
            buckets,
            delta_bits,
            prf_blocks,
        })
    }
}

impl Fss {
    /// Server-side initialisation from the dealer's PRF keys.
    pub fn new<K: AsRef<[u8]>>(prf_keys: &[K], num_bits: u32) -> Result<Self> {
        let native_width = native_width();
        if num_bits == 0 || num_bits > native_width {
            return Err(FssError::InvalidDomainBits {
                num_bits,
                native_width,
            });
        }
        if prf_keys.len() < DEFAULT_PRF_BLOCKS {
            return Err(FssError::TooFewPrfKeys {
                provided: prf_keys.len(),
                required: DEFAULT_PRF_BLOCKS,
            });
        }
        let prf = FixedKeyPrf::new(prf_keys)?;
        debug!(
            num_bits,
            native_width,
            num_ciphers = prf.max_blocks(),
            "initialised FSS context"
        );
        Ok(Self {
            prf,
            native_width,
            num_bits,
            slot_bytes: MP_SLOT_BYTES,
        })
    }

    pub fn prf(&self) -> &FixedKeyPrf {
        &self.prf
    }

    pub fn native_width(&self) -> u32 {
        self.native_width
    }

    pub fn num_bits(&self) -> u32 {
        self.num_bits
    }

    pub fn slot_bytes(&self) -> usize {
        self.slot_bytes
    }

    pub fn bit_at(&self, x: u64, level: u32) -> u8 {
        crate::bits::bit_at(x, level, self.native_width, self.num_bits)
    }

    /// Rejects points outside `[0, 2^num_bits)`.
    pub fn check_input(&self, x: u64) -> Result<()> {
        if self.num_bits < u64::BITS && x >> self.num_bits != 0 {
            return Err(FssError::InputOutOfDomain {
                x,
                num_bits: self.num_bits,
            });
        }
        Ok(())
    }

    /// Table shapes for `num_parties` parties over this context's domain.
    pub fn mp_layout(&self, num_parties: usize) -> Result<MpLayout> {
        MpLayout::new(self.num_bits, num_parties, self.slot_bytes)
    }

    /// Splits `x` into (`delta`, `gamma`) for the multi-party scheme.
    pub fn split_mp_input(&self, x: u64, layout: &MpLayout) -> (usize, usize) {
        let delta = x & ((1u64 << layout.delta_bits) - 1);
        let gamma = x >> layout.delta_bits;
        (delta as usize, gamma as usize)
    }
}
