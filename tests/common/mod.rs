//! Scripted in-memory custodian fleet shared by the integration tests

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use shardkeep::custodian::{CustodianClient, CustodianDirectory, CustodianError, CustodianRecord};
use shardkeep::domain::{ShareId, SharingParams};
use shardkeep::marker::{BootstrapMarker, MarkerError};
use shardkeep::settings::CustodyConfig;
use shardkeep::sharing::{self, Share};
use shardkeep::state::RootKey;

/// How one custodian answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Healthy,
    /// Every call fails as unreachable
    Down,
    /// Every call is refused
    Reject,
    /// Pushes succeed; pulls return bytes that are not a field element
    Malformed,
    /// Pushes succeed; pulls report no stored share
    Absent,
    /// Healthy, but only after the given delay
    Slow(Duration),
}

#[derive(Default)]
pub struct Fleet {
    stored: Mutex<BTreeMap<String, Share>>,
    behavior: Mutex<BTreeMap<String, Behavior>>,
    pushes: AtomicUsize,
    pulls: AtomicUsize,
}

impl Fleet {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, custodian: &str, behavior: Behavior) {
        self.behavior
            .lock()
            .unwrap()
            .insert(custodian.to_string(), behavior);
    }

    pub fn store(&self, custodian: &str, share: Share) {
        self.stored
            .lock()
            .unwrap()
            .insert(custodian.to_string(), share);
    }

    pub fn stored(&self, custodian: &str) -> Option<Share> {
        self.stored.lock().unwrap().get(custodian).cloned()
    }

    pub fn stored_shares(&self) -> Vec<Share> {
        self.stored.lock().unwrap().values().cloned().collect()
    }

    pub fn pushes(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }

    pub fn pulls(&self) -> usize {
        self.pulls.load(Ordering::SeqCst)
    }

    fn behavior(&self, custodian: &str) -> Behavior {
        self.behavior
            .lock()
            .unwrap()
            .get(custodian)
            .copied()
            .unwrap_or(Behavior::Healthy)
    }

    async fn gate(&self, custodian: &CustodianRecord) -> Result<Behavior, CustodianError> {
        match self.behavior(custodian.id()) {
            Behavior::Down => Err(CustodianError::unreachable(custodian, "connection refused")),
            Behavior::Reject => Err(CustodianError::rejected(custodian, "403 Forbidden")),
            Behavior::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(Behavior::Healthy)
            }
            other => Ok(other),
        }
    }
}

#[async_trait]
impl CustodianClient for Fleet {
    async fn push_share(
        &self,
        custodian: &CustodianRecord,
        share: &Share,
    ) -> Result<(), CustodianError> {
        self.pushes.fetch_add(1, Ordering::SeqCst);
        self.gate(custodian).await?;
        self.store(custodian.id(), share.clone());
        Ok(())
    }

    async fn pull_share(&self, custodian: &CustodianRecord) -> Result<Option<Share>, CustodianError> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        match self.gate(custodian).await? {
            Behavior::Absent => Ok(None),
            Behavior::Malformed => {
                let id = self
                    .stored(custodian.id())
                    .map_or_else(|| ShareId::new(1).unwrap(), |share| share.id());
                Ok(Some(Share::from_bytes(id, &[0xff; 32]).unwrap()))
            }
            _ => Ok(self.stored(custodian.id())),
        }
    }
}

/// Marker whose write always fails
#[derive(Debug, Default)]
pub struct FailingMarker;

impl BootstrapMarker for FailingMarker {
    fn is_present(&self) -> Result<bool, MarkerError> {
        Ok(false)
    }

    fn write(&self) -> Result<(), MarkerError> {
        Err(MarkerError::Write {
            path: PathBuf::from("/nonexistent/shardkeep.bootstrap.marker"),
            source: io::Error::other("disk full"),
        })
    }
}

pub fn custodian_id(position: usize) -> String {
    format!("keeper-{}", position + 1)
}

/// `t`-of-`n` custody over `keeper-1..=keeper-n` with short timings
pub fn config(t: u8, n: u8) -> CustodyConfig {
    let records = (0..usize::from(n))
        .map(|position| {
            let url = Url::parse(&format!("https://keeper-{}.test:8443", position + 1)).unwrap();
            CustodianRecord::new(custodian_id(position), url)
        })
        .collect();
    CustodyConfig::new(
        SharingParams::from_raw(t, n).unwrap(),
        CustodianDirectory::new(records).unwrap(),
    )
    .unwrap()
    .with_call_timeout(Duration::from_millis(200))
    .with_retry_interval(Duration::from_millis(10))
}

/// Deals a fresh key to every custodian in `config`, as a finished bootstrap would
pub fn seed(fleet: &Fleet, config: &CustodyConfig) -> RootKey {
    let key = sharing::generate_root_key();
    let shares = sharing::split(key.as_bytes(), config.params).unwrap();
    for (custodian, share) in config.directory.iter().zip(shares) {
        fleet.store(custodian.id(), share);
    }
    key
}
