//! Custodian directory: which custodians exist and where to reach them

use std::collections::{BTreeMap, HashSet};

use thiserror::Error;
use url::Url;

use crate::domain::{ShareId, SharingParams};
use crate::sharing::SharingError;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("custodian directory is not a JSON object of id to URL: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("custodian directory is empty")]
    Empty,

    #[error("custodian id {0:?} appears more than once")]
    DuplicateId(String),

    #[error("custodian id must not be empty")]
    EmptyId,

    #[error("custodian {id:?} endpoint must use https, got {scheme:?}")]
    InsecureEndpoint { id: String, scheme: String },
}

/// One custodian: a stable identifier and its API root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustodianRecord {
    id: String,
    endpoint: Url,
}

impl CustodianRecord {
    pub fn new(id: impl Into<String>, endpoint: Url) -> Self {
        Self {
            id: id.into(),
            endpoint,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Ordered set of custodians
///
/// Directory order is significant only for dealing: the custodian at
/// position `i` receives share identifier `i + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustodianDirectory {
    records: Vec<CustodianRecord>,
}

impl CustodianDirectory {
    /// Builds a directory, keeping the given order
    ///
    /// # Errors
    /// Returns an error if the list is empty, an id is empty or repeated, or
    /// an endpoint is not `https`
    pub fn new(records: Vec<CustodianRecord>) -> Result<Self, DirectoryError> {
        if records.is_empty() {
            return Err(DirectoryError::Empty);
        }
        let mut seen = HashSet::new();
        for record in &records {
            if record.id.is_empty() {
                return Err(DirectoryError::EmptyId);
            }
            if !seen.insert(record.id.as_str()) {
                return Err(DirectoryError::DuplicateId(record.id.clone()));
            }
            if record.endpoint.scheme() != "https" {
                return Err(DirectoryError::InsecureEndpoint {
                    id: record.id.clone(),
                    scheme: record.endpoint.scheme().to_string(),
                });
            }
        }
        Ok(Self { records })
    }

    /// Parses `{"custodian-id": "https://host:port", ...}`
    ///
    /// Custodians are ordered by id so every restart deals the same way.
    ///
    /// # Errors
    /// Returns an error if the JSON is not an object of URLs or is empty
    pub fn from_json(json: &str) -> Result<Self, DirectoryError> {
        let map: BTreeMap<String, Url> = serde_json::from_str(json)?;
        Self::new(
            map.into_iter()
                .map(|(id, endpoint)| CustodianRecord::new(id, endpoint))
                .collect(),
        )
    }

    /// Checks that there is exactly one custodian per share
    ///
    /// # Errors
    /// Returns `InvalidParameters` if the directory size differs from `n`
    pub fn check_params(&self, params: SharingParams) -> Result<(), SharingError> {
        if self.records.len() != params.n() {
            return Err(SharingError::InvalidParameters(format!(
                "{} custodians configured but share count is {}",
                self.records.len(),
                params.n()
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CustodianRecord> {
        self.records.iter()
    }

    /// The custodian dealt share `id`
    #[must_use]
    pub fn for_share(&self, id: ShareId) -> Option<&CustodianRecord> {
        self.records.get(id.position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_orders_by_id() {
        let directory = CustodianDirectory::from_json(
            r#"{"keeper-2": "https://localhost:8444", "keeper-1": "https://localhost:8443"}"#,
        )
        .unwrap();
        let ids: Vec<&str> = directory.iter().map(CustodianRecord::id).collect();
        assert_eq!(ids, vec!["keeper-1", "keeper-2"]);
        assert_eq!(
            directory.for_share(ShareId::new(2).unwrap()).unwrap().id(),
            "keeper-2"
        );
    }

    #[test]
    fn test_from_json_rejects_bad_urls() {
        let result = CustodianDirectory::from_json(r#"{"keeper-1": "not a url"}"#);
        assert!(matches!(result, Err(DirectoryError::InvalidJson(_))));
    }

    #[test]
    fn test_empty_directory_is_rejected() {
        assert!(matches!(
            CustodianDirectory::from_json("{}"),
            Err(DirectoryError::Empty)
        ));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let url = Url::parse("https://localhost:8443").unwrap();
        let result = CustodianDirectory::new(vec![
            CustodianRecord::new("a", url.clone()),
            CustodianRecord::new("a", url),
        ]);
        assert!(matches!(result, Err(DirectoryError::DuplicateId(id)) if id == "a"));
    }

    #[test]
    fn test_plaintext_endpoints_are_rejected() {
        let result = CustodianDirectory::from_json(
            r#"{"keeper-1": "https://k1:8443", "keeper-2": "http://k2:8080"}"#,
        );
        assert!(matches!(
            result,
            Err(DirectoryError::InsecureEndpoint { id, scheme }) if id == "keeper-2" && scheme == "http"
        ));
    }

    #[test]
    fn test_size_must_match_share_count() {
        let directory =
            CustodianDirectory::from_json(r#"{"a": "https://a:1", "b": "https://b:1"}"#).unwrap();
        assert!(directory.check_params(SharingParams::from_raw(2, 2).unwrap()).is_ok());
        assert!(matches!(
            directory.check_params(SharingParams::from_raw(2, 3).unwrap()),
            Err(SharingError::InvalidParameters(_))
        ));
    }
}
