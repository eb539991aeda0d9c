//! First-run generation and distribution of the root key
//!
//! ```text
//! Idle --prepare--> Splitting --> Distributing --distribute (all acked)--> Completed
//!                                     ^    |
//!                                     +----+ distribute (some pending)
//! ```
//!
//! The key is installed into [`RootKeyState`] as soon as it is split; the
//! node does not wait for custodians before serving. Each distribution pass
//! only contacts custodians that have not acknowledged yet. Once all `n`
//! have, the bootstrap marker is written; failing to write it is fatal.

use std::collections::BTreeSet;

use futures::stream::{FuturesUnordered, StreamExt};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::custodian::{self, CustodianClient};
use crate::marker::{BootstrapMarker, MarkerError};
use crate::settings::CustodyConfig;
use crate::sharing::{self, Share, SharingError};
use crate::state::RootKeyState;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to split root key: {0}")]
    Sharing(#[from] SharingError),

    #[error("freshly dealt shares do not reconstruct the root key")]
    SanityCheckFailed,

    #[error("all custodians acknowledged but the bootstrap marker could not be written: {0}")]
    MarkerWriteFailed(#[source] MarkerError),

    #[error("distribution requested before a root key was prepared")]
    NotPrepared,
}

impl BootstrapError {
    /// Whether the process must stop rather than retry
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MarkerWriteFailed(_) | Self::SanityCheckFailed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapPhase {
    Idle,
    Splitting,
    Distributing,
    Completed,
}

/// Result of one distribution pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// Every custodian holds its share and the marker is written
    Completed,
    /// Some custodians have not acknowledged; run another pass later
    Pending { acknowledged: usize, total: usize },
}

/// Custodians that have confirmed receipt of their share in this attempt
#[derive(Debug, Default, Clone)]
pub struct BootstrapProgress {
    acknowledged: BTreeSet<String>,
}

impl BootstrapProgress {
    /// Records an acknowledgement. Returns `false` if it was already recorded.
    pub fn acknowledge(&mut self, custodian: &str) -> bool {
        self.acknowledged.insert(custodian.to_string())
    }

    #[must_use]
    pub fn contains(&self, custodian: &str) -> bool {
        self.acknowledged.contains(custodian)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.acknowledged.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.acknowledged.is_empty()
    }
}

struct BootstrapRun {
    phase: BootstrapPhase,
    shares: Vec<Share>,
    progress: BootstrapProgress,
}

pub struct BootstrapCoordinator<C, M> {
    config: CustodyConfig,
    client: C,
    marker: M,
    state: RootKeyState,
    run: Mutex<BootstrapRun>,
}

impl<C: CustodianClient, M: BootstrapMarker> BootstrapCoordinator<C, M> {
    pub fn new(config: CustodyConfig, client: C, marker: M, state: RootKeyState) -> Self {
        Self {
            config,
            client,
            marker,
            state,
            run: Mutex::new(BootstrapRun {
                phase: BootstrapPhase::Idle,
                shares: Vec::new(),
                progress: BootstrapProgress::default(),
            }),
        }
    }

    pub async fn phase(&self) -> BootstrapPhase {
        self.run.lock().await.phase
    }

    pub async fn progress(&self) -> BootstrapProgress {
        self.run.lock().await.progress.clone()
    }

    /// Generates, splits and installs a fresh root key
    ///
    /// Does nothing once a key has been prepared by this coordinator.
    ///
    /// # Errors
    /// Returns an error if the split fails or does not reconstruct the key
    pub async fn prepare(&self) -> Result<(), BootstrapError> {
        let mut run = self.run.lock().await;
        if run.phase != BootstrapPhase::Idle {
            return Ok(());
        }
        run.phase = BootstrapPhase::Splitting;

        let params = self.config.params;
        let key = sharing::generate_root_key();
        let dealt = sharing::split(key.as_bytes(), params).and_then(|shares| {
            let recovered = sharing::recover(&shares[..params.t()], params.threshold())?;
            Ok((shares, recovered))
        });
        let (shares, recovered) = match dealt {
            Ok(dealt) => dealt,
            Err(e) => {
                run.phase = BootstrapPhase::Idle;
                return Err(e.into());
            }
        };
        if recovered.as_slice() != key.as_bytes() {
            run.phase = BootstrapPhase::Idle;
            return Err(BootstrapError::SanityCheckFailed);
        }

        self.state.set(key);
        run.shares = shares;
        run.phase = BootstrapPhase::Distributing;
        tracing::info!(
            shares = params.n(),
            threshold = params.t(),
            "Root key generated and split"
        );
        Ok(())
    }

    /// Runs one distribution pass to every custodian that has not acknowledged
    ///
    /// # Errors
    /// Returns `NotPrepared` before [`prepare`](Self::prepare), and
    /// `MarkerWriteFailed` if the final marker write fails
    pub async fn distribute(&self) -> Result<BootstrapOutcome, BootstrapError> {
        let mut guard = self.run.lock().await;
        let run = &mut *guard;
        match run.phase {
            BootstrapPhase::Idle | BootstrapPhase::Splitting => {
                return Err(BootstrapError::NotPrepared);
            }
            BootstrapPhase::Completed => return Ok(BootstrapOutcome::Completed),
            BootstrapPhase::Distributing => {}
        }

        let timeout = self.config.call_timeout;
        let shares = &run.shares;
        let progress = &mut run.progress;

        let mut in_flight: FuturesUnordered<_> = self
            .config
            .directory
            .iter()
            .zip(shares.iter())
            .filter(|(custodian, _)| !progress.contains(custodian.id()))
            .map(|(custodian, share)| async move {
                let result = custodian::with_timeout(
                    custodian,
                    timeout,
                    self.client.push_share(custodian, share),
                )
                .await;
                (custodian, share.id(), result)
            })
            .collect();

        while let Some((custodian, share_id, result)) = in_flight.next().await {
            match result {
                Ok(()) => {
                    progress.acknowledge(custodian.id());
                    tracing::info!(custodian = custodian.id(), %share_id, "Share acknowledged");
                }
                Err(e) => {
                    tracing::warn!(custodian = custodian.id(), error = %e, "Share not delivered");
                }
            }
        }
        drop(in_flight);

        let total = self.config.params.n();
        if progress.len() < total {
            tracing::info!(
                acknowledged = progress.len(),
                total,
                "Distribution pass finished with custodians pending"
            );
            return Ok(BootstrapOutcome::Pending {
                acknowledged: progress.len(),
                total,
            });
        }

        self.marker
            .write()
            .map_err(BootstrapError::MarkerWriteFailed)?;
        run.phase = BootstrapPhase::Completed;
        tracing::info!(total, "All custodians hold their share; bootstrap complete");
        Ok(BootstrapOutcome::Completed)
    }

    /// [`prepare`](Self::prepare) followed by one distribution pass
    ///
    /// # Errors
    /// See [`prepare`](Self::prepare) and [`distribute`](Self::distribute)
    pub async fn run(&self) -> Result<BootstrapOutcome, BootstrapError> {
        self.prepare().await?;
        self.distribute().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_idempotent() {
        let mut progress = BootstrapProgress::default();
        assert!(progress.acknowledge("keeper-1"));
        assert!(!progress.acknowledge("keeper-1"));
        assert!(progress.acknowledge("keeper-2"));
        assert_eq!(progress.len(), 2);
        assert!(progress.contains("keeper-2"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(BootstrapError::SanityCheckFailed.is_fatal());
        assert!(!BootstrapError::NotPrepared.is_fatal());
        assert!(
            !BootstrapError::Sharing(SharingError::InvalidParameters("t > n".into())).is_fatal()
        );
    }
}
