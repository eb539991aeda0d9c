//! Quorum reconstruction of the root key after a restart
//!
//! ```text
//! Idle --poll--> Polling --t valid shares--> Reconstructing --> Installed
//!                   |
//!                   +--directory exhausted below t--> Exhausted (poll again later)
//! ```
//!
//! A pass asks every custodian for its share concurrently and stops as soon
//! as `t` valid shares with distinct identifiers are in hand. Unreachable,
//! refusing, empty and malformed custodians are skipped for the pass. A
//! reconstruction failure after reaching threshold is fatal, unlike running
//! out of custodians.

use std::collections::{BTreeMap, BTreeSet};

use futures::stream::{FuturesUnordered, StreamExt};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::custodian::{self, CustodianClient};
use crate::domain::ShareId;
use crate::settings::CustodyConfig;
use crate::sharing::{self, Share, SharingError};
use crate::state::{RootKey, RootKeyState};

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("root key reconstruction failed after reaching threshold: {0}")]
    Reconstruction(#[source] SharingError),
}

impl RecoveryError {
    /// Installing a wrong key would silently corrupt the secret store, so
    /// every recovery error stops the process
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPhase {
    Idle,
    Polling,
    Reconstructing,
    Installed,
    Exhausted,
}

/// Result of one polling pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// The root key was reconstructed and installed
    Installed,
    /// Not yet recovered: fewer than `threshold` valid shares this pass
    Exhausted { collected: usize, threshold: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    Added,
    /// This custodian already contributed in this pass
    DuplicateCustodian,
    /// Another custodian already returned a share with this identifier
    DuplicateShareId,
}

/// Shares collected during one pass, keyed by custodian id
#[derive(Debug, Default)]
pub struct RecoveryProgress {
    shares: BTreeMap<String, Share>,
    ids: BTreeSet<ShareId>,
}

impl RecoveryProgress {
    pub fn record(&mut self, custodian: &str, share: Share) -> Recorded {
        if self.shares.contains_key(custodian) {
            return Recorded::DuplicateCustodian;
        }
        if !self.ids.insert(share.id()) {
            return Recorded::DuplicateShareId;
        }
        self.shares.insert(custodian.to_string(), share);
        Recorded::Added
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.shares.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    #[must_use]
    pub fn shares(&self) -> Vec<Share> {
        self.shares.values().cloned().collect()
    }
}

pub struct RecoveryCoordinator<C> {
    config: CustodyConfig,
    client: C,
    state: RootKeyState,
    phase: Mutex<RecoveryPhase>,
}

impl<C: CustodianClient> RecoveryCoordinator<C> {
    pub fn new(config: CustodyConfig, client: C, state: RootKeyState) -> Self {
        Self {
            config,
            client,
            state,
            phase: Mutex::new(RecoveryPhase::Idle),
        }
    }

    pub async fn phase(&self) -> RecoveryPhase {
        *self.phase.lock().await
    }

    /// Runs one polling pass with fresh progress
    ///
    /// Passes are serialised; once installed, further calls return
    /// `Installed` without contacting custodians.
    ///
    /// # Errors
    /// Returns `Reconstruction` if `t` shares were collected but did not
    /// combine into a key
    pub async fn poll(&self) -> Result<RecoveryOutcome, RecoveryError> {
        let mut phase = self.phase.lock().await;
        if *phase == RecoveryPhase::Installed {
            return Ok(RecoveryOutcome::Installed);
        }
        *phase = RecoveryPhase::Polling;

        let threshold = self.config.params.t();
        let progress = self.collect(threshold).await;

        if progress.len() < threshold {
            *phase = RecoveryPhase::Exhausted;
            tracing::info!(
                collected = progress.len(),
                threshold,
                "Not enough custodian shares this pass; root key not recovered yet"
            );
            return Ok(RecoveryOutcome::Exhausted {
                collected: progress.len(),
                threshold,
            });
        }

        *phase = RecoveryPhase::Reconstructing;
        let key = match reconstruct(&progress, self.config.params.threshold()) {
            Ok(key) => key,
            Err(e) => {
                *phase = RecoveryPhase::Idle;
                tracing::error!(error = %e, "Root key reconstruction failed");
                return Err(RecoveryError::Reconstruction(e));
            }
        };

        self.state.set(key);
        *phase = RecoveryPhase::Installed;
        tracing::info!(threshold, "Root key recovered from custodians");
        Ok(RecoveryOutcome::Installed)
    }

    /// Polls custodians until `threshold` valid shares are held or all have answered
    async fn collect(&self, threshold: usize) -> RecoveryProgress {
        let timeout = self.config.call_timeout;
        let mut progress = RecoveryProgress::default();

        let mut in_flight: FuturesUnordered<_> = self
            .config
            .directory
            .iter()
            .map(|custodian| async move {
                let result =
                    custodian::with_timeout(custodian, timeout, self.client.pull_share(custodian))
                        .await;
                (custodian, result)
            })
            .collect();

        while let Some((custodian, result)) = in_flight.next().await {
            let share = match result {
                Ok(Some(share)) => share,
                Ok(None) => {
                    tracing::info!(custodian = custodian.id(), "Custodian holds no share");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(custodian = custodian.id(), error = %e, "Skipping custodian");
                    continue;
                }
            };

            if let Err(e) = sharing::validate_share(&share) {
                tracing::warn!(custodian = custodian.id(), error = %e, "Excluding malformed share");
                continue;
            }

            let share_id = share.id();
            match progress.record(custodian.id(), share) {
                Recorded::Added => {
                    tracing::debug!(custodian = custodian.id(), %share_id, "Share collected");
                }
                Recorded::DuplicateCustodian => {}
                Recorded::DuplicateShareId => {
                    tracing::warn!(
                        custodian = custodian.id(),
                        %share_id,
                        "Share identifier already collected from another custodian"
                    );
                }
            }

            if progress.len() == threshold {
                break;
            }
        }

        progress
    }
}

fn reconstruct(
    progress: &RecoveryProgress,
    threshold: crate::domain::Threshold,
) -> Result<RootKey, SharingError> {
    let secret = sharing::recover(&progress.shares(), threshold)?;
    RootKey::from_slice(&secret).ok_or_else(|| {
        SharingError::InvalidParameters("reconstructed secret has the wrong length".to_string())
    })
}
