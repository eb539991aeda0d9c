//! Startup: bootstrap on first run, recover on restart
//!
//! The bootstrap marker alone decides the path. Either loop retries on the
//! configured interval until it reaches its terminal state, and gives up
//! cleanly when `shutdown` resolves. Transient progress lives inside the
//! coordinators dropped here, so an interrupted attempt leaves nothing behind.

use std::future::Future;

use crate::bootstrap::{BootstrapCoordinator, BootstrapOutcome};
use crate::custodian::CustodianClient;
use crate::error::Result;
use crate::marker::BootstrapMarker;
use crate::recovery::{RecoveryCoordinator, RecoveryOutcome};
use crate::settings::CustodyConfig;
use crate::state::RootKeyState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupPath {
    /// First run: a new key was generated and every custodian holds a share
    Bootstrapped,
    /// Restart: the key was reconstructed from custodian shares
    Recovered,
    /// Shutdown was requested before the path finished
    Interrupted,
}

/// Runs the startup path selected by the bootstrap marker
///
/// After `Bootstrapped` or `Recovered` the root key is installed in `state`.
/// On `Interrupted` after a bootstrap began, the key is installed but not
/// every custodian has confirmed its share.
///
/// # Errors
/// Returns an error if the marker cannot be read, parameters are invalid, or
/// a fatal bootstrap/recovery condition occurs
pub async fn run<C, M>(
    config: CustodyConfig,
    client: C,
    marker: M,
    state: RootKeyState,
    shutdown: impl Future<Output = ()>,
) -> Result<StartupPath>
where
    C: CustodianClient,
    M: BootstrapMarker,
{
    tokio::pin!(shutdown);
    let retry_interval = config.retry_interval;

    if marker.is_present()? {
        tracing::info!("Bootstrap marker present; recovering root key from custodians");
        let coordinator = RecoveryCoordinator::new(config, client, state);
        loop {
            let outcome = tokio::select! {
                () = &mut shutdown => return Ok(StartupPath::Interrupted),
                outcome = coordinator.poll() => outcome?,
            };
            if outcome == RecoveryOutcome::Installed {
                return Ok(StartupPath::Recovered);
            }
            tokio::select! {
                () = &mut shutdown => return Ok(StartupPath::Interrupted),
                () = tokio::time::sleep(retry_interval) => {}
            }
        }
    }

    tracing::info!("No bootstrap marker; generating and distributing a new root key");
    let coordinator = BootstrapCoordinator::new(config, client, marker, state);
    coordinator.prepare().await?;
    loop {
        let outcome = tokio::select! {
            () = &mut shutdown => return Ok(StartupPath::Interrupted),
            outcome = coordinator.distribute() => outcome?,
        };
        if outcome == BootstrapOutcome::Completed {
            return Ok(StartupPath::Bootstrapped);
        }
        tokio::select! {
            () = &mut shutdown => return Ok(StartupPath::Interrupted),
            () = tokio::time::sleep(retry_interval) => {}
        }
    }
}
