use std::path::PathBuf;

use fss_lib::FssError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("FSS error: {0}")]
    Fss(#[from] FssError),

    #[error("Invalid server id {0}, expected 0 or 1")]
    InvalidServerId(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
