//! Property tests for threshold sharing of the root key

use quickcheck::{Arbitrary, Gen, TestResult};
use quickcheck_macros::quickcheck;
use shardkeep::domain::SharingParams;
use shardkeep::sharing;

/// Wrapper for 32-byte secrets that encode a field element
#[derive(Clone, Debug)]
struct ValidSecret([u8; 32]);

impl Arbitrary for ValidSecret {
    fn arbitrary(g: &mut Gen) -> Self {
        let mut bytes = [0u8; 32];
        for byte in &mut bytes {
            *byte = u8::arbitrary(g);
        }
        // Little-endian: clearing the top bits keeps the value below the field modulus
        bytes[31] &= 0x3f;
        ValidSecret(bytes)
    }
}

/// Wrapper for valid threshold and share count pairs
#[derive(Clone, Copy, Debug)]
struct ValidParams {
    threshold: u8,
    num_shares: u8,
}

impl Arbitrary for ValidParams {
    fn arbitrary(g: &mut Gen) -> Self {
        // Keep it reasonable for testing
        let num_shares = (u8::arbitrary(g) % 12) + 1; // 1..=12
        let threshold = (u8::arbitrary(g) % num_shares) + 1; // 1..=num_shares

        ValidParams {
            threshold,
            num_shares,
        }
    }
}

impl ValidParams {
    fn params(self) -> SharingParams {
        SharingParams::from_raw(self.threshold, self.num_shares).unwrap()
    }
}

/// Deterministic shuffle of `0..len` driven by `seed`
fn shuffled(len: usize, seed: u64) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..len).collect();
    let mut seed = seed;
    for i in 0..indices.len() {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let range = u64::try_from(indices.len() - i).unwrap();
        let j = usize::try_from(seed % range).unwrap() + i;
        indices.swap(i, j);
    }
    indices
}

/// Any selection of exactly `t` shares recovers the secret
#[quickcheck]
fn prop_random_threshold_selection_recovers(
    secret: ValidSecret,
    params: ValidParams,
    selection_seed: u64,
) -> bool {
    let params = params.params();
    let Ok(shares) = sharing::split(&secret.0, params) else {
        return false;
    };

    let selected: Vec<_> = shuffled(shares.len(), selection_seed)
        .into_iter()
        .take(params.t())
        .map(|idx| shares[idx].clone())
        .collect();

    sharing::recover(&selected, params.threshold())
        .is_ok_and(|recovered| recovered.as_slice() == secret.0)
}

/// `t - 1` distinct shares never recover anything
#[quickcheck]
fn prop_insufficient_shares_fail(secret: ValidSecret, params: ValidParams) -> TestResult {
    if params.threshold < 2 {
        return TestResult::discard();
    }
    let params = params.params();
    let shares = sharing::split(&secret.0, params).unwrap();

    let insufficient = &shares[..params.t() - 1];
    TestResult::from_bool(sharing::recover(insufficient, params.threshold()).is_err())
}

/// Padding a short set with repeats of one share does not reach the threshold
#[quickcheck]
fn prop_repeated_shares_do_not_count(secret: ValidSecret, params: ValidParams) -> TestResult {
    if params.threshold < 2 {
        return TestResult::discard();
    }
    let params = params.params();
    let shares = sharing::split(&secret.0, params).unwrap();

    let mut padded = shares[..params.t() - 1].to_vec();
    padded.extend(std::iter::repeat_n(shares[0].clone(), params.t()));
    TestResult::from_bool(sharing::recover(&padded, params.threshold()).is_err())
}

/// Shares are fresh per split: splitting twice deals different values
#[quickcheck]
fn prop_split_is_randomised(secret: ValidSecret, params: ValidParams) -> TestResult {
    if params.threshold < 2 {
        return TestResult::discard();
    }
    let params = params.params();
    let first = sharing::split(&secret.0, params).unwrap();
    let second = sharing::split(&secret.0, params).unwrap();

    TestResult::from_bool(first[0].value() != second[0].value())
}
