//! JSON bodies of the custodian API
//!
//! `contribute` carries one share to a custodian; `shard` asks a custodian for
//! the share it holds. Share values travel hex-encoded and are wiped when
//! the body is dropped.

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::domain::ShareId;
use crate::sharing::Share;

/// Path of the share contribution endpoint, relative to the custodian API root
pub const CONTRIBUTE_PATH: &str = "v1/store/contribute";

/// Path of the share retrieval endpoint, relative to the custodian API root
pub const SHARD_PATH: &str = "v1/store/shard";

#[derive(Serialize, Deserialize)]
pub struct ShardContributionRequest {
    pub keeper_id: String,
    pub id: ShareId,
    pub shard: String,
}

impl ShardContributionRequest {
    #[must_use]
    pub fn new(keeper_id: &str, share: &Share) -> Self {
        Self {
            keeper_id: keeper_id.to_string(),
            id: share.id(),
            shard: hex::encode(share.value()),
        }
    }
}

impl Drop for ShardContributionRequest {
    fn drop(&mut self) {
        self.shard.zeroize();
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ShardContributionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ShardRequest {}

#[derive(Default, Serialize, Deserialize)]
pub struct ShardResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}

impl ShardResponse {
    /// Decodes the carried share
    ///
    /// `Ok(None)` means the custodian holds nothing, which is not an error.
    ///
    /// # Errors
    /// Returns a description of the problem if the body is not a well-formed share
    pub fn share(&self) -> Result<Option<Share>, String> {
        let shard = match self.shard.as_deref() {
            None | Some("") => return Ok(None),
            Some(shard) => shard,
        };
        let id = self.id.ok_or_else(|| "share without identifier".to_string())?;
        let id = ShareId::new(id).map_err(|e| e.to_string())?;
        let value = zeroize::Zeroizing::new(
            hex::decode(shard).map_err(|e| format!("share is not hex: {e}"))?,
        );
        Share::from_bytes(id, &value)
            .map(Some)
            .map_err(|e| e.to_string())
    }
}

impl Drop for ShardResponse {
    fn drop(&mut self) {
        if let Some(shard) = self.shard.as_mut() {
            shard.zeroize();
        }
    }
}
