use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use fss_lib::Party;

use crate::error::{Error, Result};

pub const KEYS_DIR: &str = "keys";
pub const DATA_DIR: &str = "data";
pub const RESULTS_DIR: &str = "results";

/// Domain width used when the dealer is not told otherwise.
pub const DEFAULT_NUM_BITS: u32 = 32;

pub const DEFAULT_RECORD_COUNT: u64 = 1000;
pub const INCOME_RANGE: RangeInclusive<i64> = -10_000..=100_000;

/// Maps the numeric server id (`SERVER_ID`) to its party.
pub fn party_from_server_id(server_id: usize) -> Result<Party> {
    Party::from_index(server_id).ok_or(Error::InvalidServerId(server_id))
}

/// File layout of one deployment, rooted at a working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// PRF keys and domain width, public to every server.
    pub fn params(&self) -> PathBuf {
        self.root.join(KEYS_DIR).join("params.json")
    }

    pub fn party_key(&self, party: Party) -> PathBuf {
        self.root
            .join(KEYS_DIR)
            .join(format!("fss_key_party{}.json", party.index()))
    }

    pub fn records(&self, party: Party) -> PathBuf {
        self.root
            .join(DATA_DIR)
            .join(format!("data{}.csv", party.index()))
    }

    pub fn result(&self, party: Party) -> PathBuf {
        self.root
            .join(RESULTS_DIR)
            .join(format!("party{}.json", party.index()))
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new(".")
    }
}
