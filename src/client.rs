use std::path::Path;

use fss_lib::{dealer, combine_records, combine_shares, Fss, Party, Record, DEFAULT_PRF_BLOCKS};
use fss_update::config::{Paths, INCOME_RANGE};
use fss_update::storage::{self, PublicParams};
use fss_update::Result;
use rand::Rng;
use tracing::{info, warn};

/// Writes `count` random records as two additive shares, one per server.
pub fn run_gen_data(paths: &Paths, count: u64) -> Result<()> {
    let mut rng = rand::rng();
    let mut share0 = Vec::with_capacity(count as usize);
    let mut share1 = Vec::with_capacity(count as usize);

    for id in 0..count {
        let value = rng.random_range(INCOME_RANGE);
        let mask: i64 = rng.random();
        share0.push(Record::new(id, value.wrapping_sub(mask)));
        share1.push(Record::new(id, mask));
    }

    storage::write_records(&paths.records(Party::Zero), &share0)?;
    storage::write_records(&paths.records(Party::One), &share1)
}

/// Deals the public parameters and one point-function key per server.
pub fn run_gen_key(paths: &Paths, id: u64, delta: i64, num_bits: u32) -> Result<()> {
    let mut rng = rand::rng();
    let prf_keys = dealer::prf_keys(&mut rng, DEFAULT_PRF_BLOCKS);
    let fss = Fss::new(&prf_keys, num_bits)?;

    if delta == 0 {
        warn!("delta is 0, keys encode the zero function");
    }
    let (k0, k1) = dealer::gen_pf(&fss, &mut rng, id, delta)?;
    info!(num_bits, "generated update keys");

    storage::write_json(&paths.params(), &PublicParams { prf_keys, num_bits })?;
    storage::write_json(&paths.party_key(Party::Zero), &k0)?;
    storage::write_json(&paths.party_key(Party::One), &k1)
}

/// Prints the sum of both servers' persisted query shares.
pub fn run_restore(paths: &Paths) -> Result<()> {
    let share0: i64 = storage::read_json(&paths.result(Party::Zero))?;
    let share1: i64 = storage::read_json(&paths.result(Party::One))?;
    println!("====> answer is {}", combine_shares(share0, share1));
    Ok(())
}

/// Recombines both record shares, for auditing an applied update.
pub fn run_reconcile(paths: &Paths, out: Option<&Path>) -> Result<()> {
    let share0 = storage::read_records(&paths.records(Party::Zero))?;
    let share1 = storage::read_records(&paths.records(Party::One))?;
    let table = combine_records(&share0, &share1)?;

    match out {
        Some(path) => storage::write_records(path, &table)?,
        None => {
            for record in &table {
                println!("{} : {}", record.id, record.value);
            }
        }
    }
    Ok(())
}
