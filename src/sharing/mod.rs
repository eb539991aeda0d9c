//! Threshold secret sharing of the root key
//!
//! Shamir's scheme over the scalar field of the BLS12-381 prime-order group.
//! The root key is a 32-byte little-endian scalar encoding; it becomes the
//! constant term of a random polynomial of degree `t - 1`, and custodian
//! shares are the polynomial's values at identifiers `1..=n`.
//!
//! Reconstruction always uses exactly `t` shares with their real
//! identifiers. Nothing in this module interpolates from fewer than `t`
//! shares, so `t - 1` shares carry no information about the key.
//!
//! # Examples
//!
//! ```rust
//! use shardkeep::domain::SharingParams;
//! use shardkeep::sharing;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let params = SharingParams::from_raw(3, 5)?;
//! let key = sharing::generate_root_key();
//!
//! let shares = sharing::split(key.as_bytes(), params)?;
//! assert_eq!(shares.len(), 5);
//!
//! let recovered = sharing::recover(&shares[2..], params.threshold())?;
//! assert_eq!(key.as_bytes(), recovered.as_slice());
//!
//! assert!(sharing::recover(&shares[..2], params.threshold()).is_err());
//! # Ok(())
//! # }
//! ```

mod error;
mod share;

use std::collections::BTreeMap;

use blstrs::Scalar;
use ff::{Field, PrimeField};
use rand_core::{CryptoRng, OsRng, RngCore};
use zeroize::Zeroizing;

pub use error::SharingError;
pub use share::Share;

use crate::domain::{ShareId, SharingParams, Threshold};
use crate::state::RootKey;

/// Length of the root key and of its scalar encoding
pub const ROOT_KEY_LEN: usize = 32;

/// Length of a share value
pub const SHARE_VALUE_LEN: usize = 32;

/// Generates a fresh root key
///
/// The key is the encoding of a uniformly random scalar, so it always fits
/// the field and can be split without rejection.
#[must_use]
pub fn generate_root_key() -> RootKey {
    let scalar = Scalar::random(OsRng);
    RootKey::from_bytes(scalar.to_repr())
}

/// Splits `secret` into `n` shares recoverable by any `t` of them
///
/// # Errors
/// Returns `InvalidParameters` if the secret is not 32 bytes or does not
/// encode a canonical field element
pub fn split(secret: &[u8], params: SharingParams) -> Result<Vec<Share>, SharingError> {
    split_with_rng(secret, params, &mut OsRng)
}

/// [`split`] with a caller-supplied random source
///
/// # Errors
/// See [`split`]
pub fn split_with_rng<R: RngCore + CryptoRng>(
    secret: &[u8],
    params: SharingParams,
    rng: &mut R,
) -> Result<Vec<Share>, SharingError> {
    let constant = decode_secret(secret)?;

    let mut coefficients = Vec::with_capacity(params.t());
    coefficients.push(constant);
    for _ in 1..params.t() {
        coefficients.push(Scalar::random(&mut *rng));
    }

    let shares = (0..params.n())
        .map(|position| {
            let id = ShareId::for_position(position)?;
            let x = Scalar::from(u64::from(*id));
            Ok(Share::from_scalar(id, &evaluate(&coefficients, x)))
        })
        .collect();

    coefficients.fill(Scalar::ZERO);
    shares
}

/// Reconstructs the secret from at least `threshold` distinct shares
///
/// Shares repeating an identifier are ignored after the first. Every distinct
/// share must decode; the lowest `threshold` identifiers are interpolated.
///
/// # Errors
/// - `InsufficientShares` if fewer than `threshold` distinct identifiers are present
/// - `MalformedShare` if any distinct share fails to decode as a field element
pub fn recover(shares: &[Share], threshold: Threshold) -> Result<Zeroizing<Vec<u8>>, SharingError> {
    let mut distinct: BTreeMap<ShareId, &Share> = BTreeMap::new();
    for share in shares {
        distinct.entry(share.id()).or_insert(share);
    }

    let needed = usize::from(*threshold);
    if distinct.len() < needed {
        return Err(SharingError::InsufficientShares {
            needed,
            got: distinct.len(),
        });
    }

    let points = distinct
        .values()
        .map(|share| Ok((share.id(), share.scalar()?)))
        .collect::<Result<Vec<_>, SharingError>>()?;

    let secret = interpolate_at_zero(&points[..needed])?;
    Ok(Zeroizing::new(secret.to_repr().to_vec()))
}

/// Checks that a share decodes as a field element
///
/// # Errors
/// Returns `MalformedShare` if it does not
pub fn validate_share(share: &Share) -> Result<(), SharingError> {
    share.scalar().map(|_| ())
}

fn decode_secret(secret: &[u8]) -> Result<Scalar, SharingError> {
    let repr: [u8; ROOT_KEY_LEN] = secret.try_into().map_err(|_| {
        SharingError::InvalidParameters(format!(
            "secret must be {ROOT_KEY_LEN} bytes (got {})",
            secret.len()
        ))
    })?;
    Option::from(Scalar::from_repr(repr)).ok_or_else(|| {
        SharingError::InvalidParameters("secret does not fit the scalar field".to_string())
    })
}

/// Horner evaluation of the polynomial at `x`
fn evaluate(coefficients: &[Scalar], x: Scalar) -> Scalar {
    coefficients
        .iter()
        .rev()
        .fold(Scalar::ZERO, |acc, coefficient| acc * x + *coefficient)
}

/// Lagrange interpolation at zero over points with distinct identifiers
///
/// `secret = sum_j y_j * prod_{m != j} x_m / (x_m - x_j)`
fn interpolate_at_zero(points: &[(ShareId, Scalar)]) -> Result<Scalar, SharingError> {
    let mut secret = Scalar::ZERO;

    for (j, (id_j, y_j)) in points.iter().enumerate() {
        let x_j = Scalar::from(u64::from(**id_j));
        let mut numerator = Scalar::ONE;
        let mut denominator = Scalar::ONE;

        for (m, (id_m, _)) in points.iter().enumerate() {
            if m == j {
                continue;
            }
            let x_m = Scalar::from(u64::from(**id_m));
            numerator *= x_m;
            denominator *= x_m - x_j;
        }

        let inverse: Option<Scalar> = denominator.invert().into();
        let inverse = inverse.ok_or(SharingError::MalformedShare { id: **id_j })?;
        secret += *y_j * numerator * inverse;
    }

    Ok(secret)
}
