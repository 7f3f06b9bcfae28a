//! Oblivious "add delta at record ID" over additively shared record tables,
//! plus the combiners that reconstruct disclosed answers.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::{Fss, MpWord};
use crate::error::{FssError, Result};
use crate::keys::{FssKeyEq2P, Party};
use crate::prf::Scratch;

/// One row of a party's record table. `value` is that party's additive
/// share of the row's field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    #[serde(alias = "annual_income")]
    pub value: i64,
}

impl Record {
    pub fn new(id: u64, value: i64) -> Self {
        Self { id, value }
    }
}

impl Fss {
    /// Adds this party's point-function share at each record's id to the
    /// record's value, in place and in order.
    ///
    /// All shares are computed before any record is touched, so a rejected
    /// key or out-of-domain id leaves `records` unchanged.
    pub fn secure_update(&self, party: Party, key: &FssKeyEq2P, records: &mut [Record]) -> Result<()> {
        let shares: Vec<i64> = records
            .par_iter()
            .map_init(Scratch::new, |scratch, record| {
                self.evaluate_pf_with(scratch, party, key, record.id)
            })
            .collect::<Result<_>>()?;

        for (record, share) in records.iter_mut().zip(shares) {
            record.value = record.value.wrapping_add(share);
        }
        debug!(?party, records = records.len(), "applied secure update");
        Ok(())
    }
}

/// Sum of two parties' point-function (or update) shares.
pub fn combine_shares(share0: i64, share1: i64) -> i64 {
    share0.wrapping_add(share1)
}

/// Sum of two parties' interval shares.
pub fn combine_interval(share0: u64, share1: u64) -> u64 {
    share0.wrapping_add(share1)
}

/// XOR of every party's multi-party equality share.
pub fn combine_xor(shares: &[MpWord]) -> MpWord {
    shares.iter().fold(0, |acc, share| acc ^ share)
}

/// Reconstructs the plaintext table from two parties' record shares.
pub fn combine_records(left: &[Record], right: &[Record]) -> Result<Vec<Record>> {
    if left.len() != right.len() {
        return Err(FssError::RecordCountMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    left.iter()
        .zip(right)
        .enumerate()
        .map(|(index, (l, r))| {
            if l.id != r.id {
                return Err(FssError::RecordShareMismatch {
                    index,
                    left: l.id,
                    right: r.id,
                });
            }
            Ok(Record::new(l.id, combine_shares(l.value, r.value)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::dealer;

    fn setup(num_bits: u32, seed: u64) -> (Fss, StdRng) {
        let mut rng = StdRng::seed_from_u64(seed);
        let keys = dealer::prf_keys(&mut rng, 4);
        (Fss::new(&keys, num_bits).unwrap(), rng)
    }

    #[test]
    fn combines_scalar_shares() {
        assert_eq!(combine_shares(5, -3), 2);
        assert_eq!(combine_shares(i64::MAX, 1), i64::MIN);
        assert_eq!(combine_interval(u64::MAX, 2), 1);
        assert_eq!(combine_xor(&[0b1100, 0b1010, 0b0110]), 0);
        assert_eq!(combine_xor(&[]), 0);
    }

    #[test]
    fn secure_update_targets_one_record() {
        let (fss, mut rng) = setup(16, 31);
        let (k0, k1) = dealer::gen_pf(&fss, &mut rng, 1, 50).unwrap();

        let mut share0 = vec![Record::new(1, 100), Record::new(2, 200)];
        let mut share1 = vec![Record::new(1, 0), Record::new(2, 0)];
        fss.secure_update(Party::Zero, &k0, &mut share0).unwrap();
        fss.secure_update(Party::One, &k1, &mut share1).unwrap();

        assert_eq!(share0[0].id, 1);
        assert_eq!(share0[1].id, 2);
        let combined = combine_records(&share0, &share1).unwrap();
        assert_eq!(combined, vec![Record::new(1, 150), Record::new(2, 200)]);
    }

    #[test]
    fn secure_update_on_randomly_shared_table() {
        let (fss, mut rng) = setup(10, 32);
        let plain: Vec<Record> = (0..200).map(|id| Record::new(id, id as i64 * 7 - 300)).collect();
        let mut share0 = Vec::with_capacity(plain.len());
        let mut share1 = Vec::with_capacity(plain.len());
        for record in &plain {
            let mask: i64 = rand::Rng::random(&mut rng);
            share0.push(Record::new(record.id, record.value.wrapping_sub(mask)));
            share1.push(Record::new(record.id, mask));
        }

        let (k0, k1) = dealer::gen_pf(&fss, &mut rng, 123, -1000).unwrap();
        fss.secure_update(Party::Zero, &k0, &mut share0).unwrap();
        fss.secure_update(Party::One, &k1, &mut share1).unwrap();

        let combined = combine_records(&share0, &share1).unwrap();
        for (after, before) in combined.iter().zip(&plain) {
            let delta = if before.id == 123 { -1000 } else { 0 };
            assert_eq!(after.value, before.value + delta, "id {}", before.id);
        }
    }

    #[test]
    fn secure_update_rejects_without_touching_records() {
        let (fss, mut rng) = setup(4, 33);
        let (k0, _) = dealer::gen_pf(&fss, &mut rng, 2, 9).unwrap();
        let mut records = vec![Record::new(2, 10), Record::new(16, 20)];
        let original = records.clone();

        assert_eq!(
            fss.secure_update(Party::Zero, &k0, &mut records).unwrap_err(),
            FssError::InputOutOfDomain { x: 16, num_bits: 4 }
        );
        assert_eq!(records, original);
    }

    #[test]
    fn record_share_mismatches() {
        let left = vec![Record::new(1, 1), Record::new(2, 2)];
        assert_eq!(
            combine_records(&left, &left[..1]).unwrap_err(),
            FssError::RecordCountMismatch { left: 2, right: 1 }
        );
        let right = vec![Record::new(1, 1), Record::new(3, 2)];
        assert_eq!(
            combine_records(&left, &right).unwrap_err(),
            FssError::RecordShareMismatch {
                index: 1,
                left: 2,
                right: 3
            }
        );
    }
}
