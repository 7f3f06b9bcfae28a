use std::fs;
use std::path::PathBuf;

use fss_lib::{dealer, combine_records, combine_shares, FssKeyEq2P, Party, Record};
use fss_update::config::Paths;
use fss_update::storage::{self, PublicParams};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn workspace() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("fss-update-{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn persisted_shares_combine() {
    let dir = workspace();
    let paths = Paths::new(&dir);

    storage::write_json(&paths.result(Party::Zero), &5i64).unwrap();
    storage::write_json(&paths.result(Party::One), &-3i64).unwrap();

    let share0: i64 = storage::read_json(&paths.result(Party::Zero)).unwrap();
    let share1: i64 = storage::read_json(&paths.result(Party::One)).unwrap();
    assert_eq!(combine_shares(share0, share1), 2);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn update_round_trip_through_files() {
    let dir = workspace();
    let paths = Paths::new(&dir);
    let mut rng = StdRng::seed_from_u64(7);

    // dealer side
    let prf_keys = dealer::prf_keys(&mut rng, 4);
    let params = PublicParams {
        prf_keys,
        num_bits: 32,
    };
    let fss = params.context().unwrap();
    let (k0, k1) = dealer::gen_pf(&fss, &mut rng, 1, 50).unwrap();
    storage::write_json(&paths.params(), &params).unwrap();
    storage::write_json(&paths.party_key(Party::Zero), &k0).unwrap();
    storage::write_json(&paths.party_key(Party::One), &k1).unwrap();

    storage::write_records(
        &paths.records(Party::Zero),
        &[Record::new(1, 100), Record::new(2, 200)],
    )
    .unwrap();
    storage::write_records(&paths.records(Party::One), &[Record::new(1, 0), Record::new(2, 0)])
        .unwrap();

    // each server works only from its own files
    for party in [Party::Zero, Party::One] {
        let params: PublicParams = storage::read_json(&paths.params()).unwrap();
        let fss = params.context().unwrap();
        let key: FssKeyEq2P = storage::read_json(&paths.party_key(party)).unwrap();
        let mut records = storage::read_records(&paths.records(party)).unwrap();
        fss.secure_update(party, &key, &mut records).unwrap();
        storage::write_records(&paths.records(party), &records).unwrap();
    }

    let share0 = storage::read_records(&paths.records(Party::Zero)).unwrap();
    let share1 = storage::read_records(&paths.records(Party::One)).unwrap();
    assert_eq!(
        combine_records(&share0, &share1).unwrap(),
        vec![Record::new(1, 150), Record::new(2, 200)]
    );

    // PIR-style query on the same keys
    let y0 = fss.evaluate_pf(Party::Zero, &k0, 1).unwrap();
    let y1 = fss.evaluate_pf(Party::One, &k1, 1).unwrap();
    assert_eq!(combine_shares(y0, y1), 50);

    fs::remove_dir_all(&dir).unwrap();
}
