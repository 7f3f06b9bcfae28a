use std::time::Instant;

use fss_lib::FssKeyEq2P;
use fss_update::config::{self, Paths};
use fss_update::storage::{self, PublicParams};
use fss_update::Result;
use tracing::info;

/// Adds this server's point-function share to every record of its table.
pub fn run_update(paths: &Paths, server_id: usize) -> Result<()> {
    let party = config::party_from_server_id(server_id)?;
    let params: PublicParams = storage::read_json(&paths.params())?;
    let fss = params.context()?;
    let key: FssKeyEq2P = storage::read_json(&paths.party_key(party))?;

    let records_path = paths.records(party);
    let mut records = storage::read_records(&records_path)?;

    let start = Instant::now();
    fss.secure_update(party, &key, &mut records)?;
    info!(
        server_id,
        records = records.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "applied update share"
    );

    storage::write_records(&records_path, &records)
}

/// Evaluates this server's key at `x` and persists the scalar share.
pub fn run_query(paths: &Paths, server_id: usize, x: u64) -> Result<()> {
    let party = config::party_from_server_id(server_id)?;
    let params: PublicParams = storage::read_json(&paths.params())?;
    let fss = params.context()?;
    let key: FssKeyEq2P = storage::read_json(&paths.party_key(party))?;

    let share = fss.evaluate_pf(party, &key, x)?;
    info!(server_id, x, "evaluated query share");
    storage::write_json(&paths.result(party), &share)
}
