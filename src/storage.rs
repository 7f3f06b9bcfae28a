//! On-disk form of keys, record shares and result shares.
//!
//! Keys and scalar shares are JSON, record tables are CSV with an
//! `id,value` header.

use std::fs::{self, File};
use std::path::Path;

use fss_lib::{Block, Fss, Record};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// Public parameters every server initialises its context from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicParams {
    pub prf_keys: Vec<Block>,
    pub num_bits: u32,
}

impl PublicParams {
    /// Server-side evaluation context for these parameters.
    pub fn context(&self) -> Result<Fss> {
        Ok(Fss::new(&self.prf_keys, self.num_bits)?)
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |source| Error::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn create(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }
    File::create(path).map_err(io_err(path))
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = create(path)?;
    serde_json::to_writer_pretty(file, value).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "wrote");
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(io_err(path))?;
    serde_json::from_reader(file).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_records(path: &Path, records: &[Record]) -> Result<()> {
    let csv_err = |source| Error::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_writer(create(path)?);
    for record in records {
        writer.serialize(record).map_err(csv_err)?;
    }
    writer.flush().map_err(io_err(path))?;
    info!(path = %path.display(), records = records.len(), "wrote records");
    Ok(())
}

pub fn read_records(path: &Path) -> Result<Vec<Record>> {
    let csv_err = |source| Error::Csv {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_err(path))?;
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);
    reader
        .deserialize::<Record>()
        .map(|row| row.map_err(csv_err))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("fss-storage-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn records_accept_income_column_name() {
        let dir = temp_dir().join("alias");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("data.csv");
        fs::write(&path, "id,annual_income\n1,100\n2,-5\n").unwrap();

        let records = read_records(&path).unwrap();
        assert_eq!(records, vec![Record::new(1, 100), Record::new(2, -5)]);

        write_records(&path, &records).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("id,value\n"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_reports_path() {
        let path = temp_dir().join("does-not-exist.json");
        let err = read_json::<i64>(&path).unwrap_err();
        assert!(matches!(err, Error::Io { path: p, .. } if p == path));
    }
}
