//! Operator break-glass paths
//!
//! `export` pulls every custodian's share and renders it as a mnemonic for
//! offline storage. `restore` takes such mnemonics back and re-seeds the
//! custodians they were dealt to, so a deployment that lost more than
//! `n - t` custodians can recover on its next restart.

use anyhow::{Context, Result, anyhow, bail};
use futures::stream::{FuturesUnordered, StreamExt};

use crate::codec::{self, ShareMnemonic};
use crate::custodian::{self, CustodianClient};
use crate::domain::Threshold;
use crate::settings::CustodyConfig;
use crate::sharing::{self, Share};
use crate::state::RootKey;

/// Pulls all available shares and encodes them as mnemonics, ordered by share id
///
/// # Errors
/// Returns an error if fewer than `t` custodians returned a valid share, or
/// the returned shares do not reconstruct a key
pub async fn export_shares<C: CustodianClient>(
    client: &C,
    config: &CustodyConfig,
) -> Result<Vec<ShareMnemonic>> {
    let timeout = config.call_timeout;
    let mut in_flight: FuturesUnordered<_> = config
        .directory
        .iter()
        .map(|custodian| async move {
            let result =
                custodian::with_timeout(custodian, timeout, client.pull_share(custodian)).await;
            (custodian, result)
        })
        .collect();

    let mut shares: Vec<Share> = Vec::with_capacity(config.directory.len());
    while let Some((custodian, result)) = in_flight.next().await {
        match result {
            Ok(Some(share)) if sharing::validate_share(&share).is_ok() => {
                if shares.iter().all(|held| held.id() != share.id()) {
                    shares.push(share);
                }
            }
            Ok(Some(_)) => {
                tracing::warn!(custodian = custodian.id(), "Custodian returned a malformed share");
            }
            Ok(None) => tracing::warn!(custodian = custodian.id(), "Custodian holds no share"),
            Err(e) => tracing::warn!(custodian = custodian.id(), error = %e, "Skipping custodian"),
        }
    }
    drop(in_flight);

    let threshold = config.params.threshold();
    if shares.len() < config.params.t() {
        bail!(
            "Insufficient shares: need at least {}, but only {} custodians answered",
            *threshold,
            shares.len()
        );
    }
    verify_reconstructs(&shares, threshold)?;

    shares.sort_by_key(Share::id);
    shares
        .iter()
        .map(|share| {
            codec::encode_share(share, threshold)
                .with_context(|| format!("Failed to encode share {}", share.id()))
        })
        .collect()
}

/// Decodes share mnemonics and pushes each share to the custodian it belongs to
///
/// At least `t` mnemonics are required so the set can be checked to
/// reconstruct a key before any custodian is overwritten. Returns the number
/// of custodians that accepted their share.
///
/// # Errors
/// Returns an error if a mnemonic is invalid, thresholds disagree, the shares
/// do not reconstruct a key, or any custodian refuses its share
pub async fn restore_shares<C: CustodianClient>(
    client: &C,
    config: &CustodyConfig,
    mnemonics: &[String],
) -> Result<usize> {
    if mnemonics.is_empty() {
        bail!("No shares provided");
    }

    let expected = config.params.threshold();
    let mut shares: Vec<Share> = Vec::with_capacity(mnemonics.len());
    for (idx, mnemonic) in mnemonics.iter().enumerate() {
        let (threshold, share) = codec::decode_share(mnemonic)
            .with_context(|| format!("Failed to parse share #{}", idx + 1))?;

        if threshold != expected {
            bail!(
                "Share #{} has inconsistent threshold: expected {}, got {}",
                idx + 1,
                *expected,
                *threshold
            );
        }
        if shares.iter().any(|held| held.id() == share.id()) {
            bail!("Share #{} repeats share id {}", idx + 1, share.id());
        }
        shares.push(share);
    }

    if shares.len() < config.params.t() {
        bail!(
            "Insufficient shares: need at least {}, but only {} provided",
            *expected,
            shares.len()
        );
    }
    verify_reconstructs(&shares, expected)?;

    let mut failures = Vec::new();
    let mut restored = 0;
    for share in &shares {
        let custodian = config
            .directory
            .for_share(share.id())
            .ok_or_else(|| anyhow!("No custodian is configured for share {}", share.id()))?;

        let result = custodian::with_timeout(
            custodian,
            config.call_timeout,
            client.push_share(custodian, share),
        )
        .await;
        match result {
            Ok(()) => {
                restored += 1;
                tracing::info!(custodian = custodian.id(), share_id = %share.id(), "Share restored");
            }
            Err(e) => {
                tracing::warn!(custodian = custodian.id(), error = %e, "Share not restored");
                failures.push(e.to_string());
            }
        }
    }

    if !failures.is_empty() {
        bail!(
            "{restored} of {} shares restored; failures: {}",
            shares.len(),
            failures.join("; ")
        );
    }
    Ok(restored)
}

fn verify_reconstructs(shares: &[Share], threshold: Threshold) -> Result<()> {
    let secret = sharing::recover(shares, threshold).context("Shares do not combine into a key")?;
    RootKey::from_slice(&secret)
        .map(drop)
        .ok_or_else(|| anyhow!("Recovered key has the wrong length"))
}
