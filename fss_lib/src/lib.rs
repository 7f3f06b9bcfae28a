//! Function secret sharing evaluation over AES-based GGM trees.
//!
//! Two-party point functions and interval functions share their outputs
//! additively; the N-party equality scheme shares them by XOR. Servers build
//! one [`Fss`] context from the dealer's public PRF keys and evaluate their
//! key shares against it.

pub mod bits;
pub mod context;
pub mod dealer;
pub mod error;
pub mod eval;
pub mod keys;
pub mod prf;
pub mod update;

pub use bits::bit_at;
pub use context::{Fss, MAX_PARTIES, MP_SLOT_BYTES, MpLayout, MpWord};
pub use dealer::Relation;
pub use error::{FssError, Result};
pub use keys::{CWLt, CorrectionWord, FssKeyEq2P, FssKeyEqMP, Party, ServerKeyLt};
pub use prf::{BLOCK_SIZE, Block, DEFAULT_PRF_BLOCKS, FixedKeyPrf, Scratch};
pub use update::{Record, combine_interval, combine_records, combine_shares, combine_xor};
