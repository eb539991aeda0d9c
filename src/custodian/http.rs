//! HTTPS custodian client with mutual TLS

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Certificate, Client, Identity};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;
use zeroize::Zeroizing;

use super::wire::{
    CONTRIBUTE_PATH, SHARD_PATH, ShardContributionRequest, ShardContributionResponse,
    ShardRequest, ShardResponse,
};
use super::{CustodianClient, CustodianError, CustodianRecord};
use crate::sharing::Share;

/// PEM material authenticating this node to custodians and custodians to it
pub struct TlsMaterial {
    /// Client certificate chain followed by its private key
    pub identity_pem: Zeroizing<Vec<u8>>,
    /// Trust anchor for custodian certificates
    pub ca_pem: Vec<u8>,
}

/// [`CustodianClient`] over HTTPS
#[derive(Debug, Clone)]
pub struct HttpCustodianClient {
    http: Client,
}

impl HttpCustodianClient {
    /// Builds a client that presents `tls.identity_pem` and trusts only `tls.ca_pem`
    ///
    /// Plain `http` is refused, so share material only leaves this node over a
    /// mutually authenticated channel.
    ///
    /// # Errors
    /// Returns an error if the PEM material is invalid
    pub fn new(tls: &TlsMaterial, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .use_rustls_tls()
            .https_only(true)
            .tls_built_in_root_certs(false)
            .identity(Identity::from_pem(&tls.identity_pem)?)
            .add_root_certificate(Certificate::from_pem(&tls.ca_pem)?)
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }

    async fn post<B, R>(
        &self,
        custodian: &CustodianRecord,
        path: &str,
        body: &B,
    ) -> Result<R, CustodianError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = endpoint(custodian, path)?;
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| CustodianError::unreachable(custodian, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CustodianError::rejected(custodian, format!("HTTP {status}")));
        }

        let bytes = Zeroizing::new(
            response
                .bytes()
                .await
                .map_err(|e| CustodianError::unreachable(custodian, e))?
                .to_vec(),
        );
        if bytes.is_empty() {
            return Err(CustodianError::protocol(custodian, "empty response body"));
        }
        serde_json::from_slice(&bytes).map_err(|e| CustodianError::protocol(custodian, e))
    }
}

fn endpoint(custodian: &CustodianRecord, path: &str) -> Result<Url, CustodianError> {
    let url = custodian
        .endpoint()
        .join(path)
        .map_err(|e| CustodianError::protocol(custodian, format!("bad endpoint: {e}")))?;
    if url.scheme() != "https" {
        return Err(CustodianError::protocol(
            custodian,
            format!("refusing to send over {}", url.scheme()),
        ));
    }
    Ok(url)
}

#[async_trait]
impl CustodianClient for HttpCustodianClient {
    async fn push_share(
        &self,
        custodian: &CustodianRecord,
        share: &Share,
    ) -> Result<(), CustodianError> {
        let request = ShardContributionRequest::new(custodian.id(), share);
        let response: ShardContributionResponse =
            self.post(custodian, CONTRIBUTE_PATH, &request).await?;
        match response.err {
            Some(err) => Err(CustodianError::rejected(custodian, err)),
            None => Ok(()),
        }
    }

    async fn pull_share(&self, custodian: &CustodianRecord) -> Result<Option<Share>, CustodianError> {
        let response: ShardResponse = self.post(custodian, SHARD_PATH, &ShardRequest {}).await?;
        if let Some(err) = response.err.as_deref() {
            return Err(CustodianError::rejected(custodian, err));
        }
        response
            .share()
            .map_err(|reason| CustodianError::protocol(custodian, reason))
    }
}
