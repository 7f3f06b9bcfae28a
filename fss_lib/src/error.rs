use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FssError {
    #[error("PRF key {index} has length {len}, expected 16 bytes")]
    InvalidPrfKey { index: usize, len: usize },

    #[error("Got {provided} PRF keys, need at least {required}")]
    TooFewPrfKeys { provided: usize, required: usize },

    #[error("Domain width {num_bits} not in 1..={native_width}")]
    InvalidDomainBits { num_bits: u32, native_width: u32 },

    #[error("PRF expansion needs {requested} blocks but only {available} cipher instances exist")]
    PrfFanOut { requested: usize, available: usize },

    #[error("Input {x} outside the {num_bits}-bit domain")]
    InputOutOfDomain { x: u64, num_bits: u32 },

    #[error("Malformed key: {what} has length {actual}, expected {expected}")]
    KeyShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid party count {0}")]
    InvalidPartyCount(usize),

    #[error("Record shares have {left} and {right} entries")]
    RecordCountMismatch { left: usize, right: usize },

    #[error("Record shares disagree at position {index}: id {left} vs {right}")]
    RecordShareMismatch { index: usize, left: u64, right: u64 },
}

pub type Result<T> = std::result::Result<T, FssError>;
