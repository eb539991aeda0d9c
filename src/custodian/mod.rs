//! Custodians: the independent nodes holding one share of the root key each
//!
//! [`CustodianClient`] is the stateless conduit the coordinators use to hand
//! a share to a custodian and to ask for it back. The production client
//! speaks HTTPS with mutual TLS ([`HttpCustodianClient`]); identity issuance
//! and certificate validation belong to whoever provisions the TLS material.

mod directory;
mod http;
pub mod wire;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use directory::{CustodianDirectory, CustodianRecord, DirectoryError};
pub use http::{HttpCustodianClient, TlsMaterial};

use crate::sharing::Share;

/// Per-custodian failure. Always contained to that custodian for the current pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustodianError {
    /// Connection failure, transport error or timeout
    #[error("custodian {custodian} is unreachable: {reason}")]
    Unreachable { custodian: String, reason: String },

    /// The custodian refused the request
    #[error("custodian {custodian} rejected the request: {reason}")]
    Rejected { custodian: String, reason: String },

    /// The custodian answered with something that is not a valid response
    #[error("protocol error from custodian {custodian}: {reason}")]
    Protocol { custodian: String, reason: String },
}

impl CustodianError {
    pub fn unreachable(custodian: &CustodianRecord, reason: impl ToString) -> Self {
        Self::Unreachable {
            custodian: custodian.id().to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn rejected(custodian: &CustodianRecord, reason: impl ToString) -> Self {
        Self::Rejected {
            custodian: custodian.id().to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn protocol(custodian: &CustodianRecord, reason: impl ToString) -> Self {
        Self::Protocol {
            custodian: custodian.id().to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Request/response conduit to one custodian at a time
#[async_trait]
pub trait CustodianClient: Send + Sync {
    /// Delivers `share` for the custodian to store as its current share
    async fn push_share(
        &self,
        custodian: &CustodianRecord,
        share: &Share,
    ) -> Result<(), CustodianError>;

    /// Asks the custodian for its stored share; `Ok(None)` if it holds none
    async fn pull_share(&self, custodian: &CustodianRecord) -> Result<Option<Share>, CustodianError>;
}

#[async_trait]
impl<C: CustodianClient + ?Sized> CustodianClient for Arc<C> {
    async fn push_share(
        &self,
        custodian: &CustodianRecord,
        share: &Share,
    ) -> Result<(), CustodianError> {
        (**self).push_share(custodian, share).await
    }

    async fn pull_share(&self, custodian: &CustodianRecord) -> Result<Option<Share>, CustodianError> {
        (**self).pull_share(custodian).await
    }
}

/// Bounds a custodian call; a timed-out custodian counts as unreachable
pub(crate) async fn with_timeout<T>(
    custodian: &CustodianRecord,
    timeout: Duration,
    call: impl Future<Output = Result<T, CustodianError>>,
) -> Result<T, CustodianError> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(CustodianError::unreachable(
            custodian,
            format!("no response within {timeout:?}"),
        )),
    }
}
