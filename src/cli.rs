use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::custodian::CustodianDirectory;
use crate::domain::{ShareCount, SharingParams, Threshold};
use crate::settings::{CustodyConfig, Settings, SettingsError, TlsPaths};

/// Parses a threshold in `1..=254`
fn validate_threshold(s: &str) -> Result<Threshold, String> {
    let value: u8 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    Threshold::new(value).map_err(|e| e.to_string())
}

fn validate_share_count(s: &str) -> Result<ShareCount, String> {
    let value: u8 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    ShareCount::new(value).map_err(|e| e.to_string())
}

#[derive(Parser)]
#[command(name = "shardkeep")]
#[command(version)]
#[command(about = "Root key custody through threshold shares held by independent custodians")]
pub struct Cli {
    #[command(flatten)]
    pub custody: CustodyArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bootstrap or recover the root key, then hold it until interrupted
    Serve,
    /// Print every custodian's share as a mnemonic for offline backup
    Export,
    /// Read share mnemonics from stdin and push them back to their custodians
    Restore,
}

/// Deployment settings shared by every subcommand
#[derive(Args, Debug)]
pub struct CustodyArgs {
    /// Number of shares, one per custodian
    #[arg(long, env = "SHARDKEEP_SHAMIR_SHARES", default_value = "3", value_parser = validate_share_count)]
    pub shares: ShareCount,

    /// Minimum number of shares needed to reconstruct the root key
    #[arg(long, env = "SHARDKEEP_SHAMIR_THRESHOLD", default_value = "2", value_parser = validate_threshold)]
    pub threshold: Threshold,

    /// JSON object mapping custodian id to its API URL
    #[arg(long, env = "SHARDKEEP_CUSTODIANS")]
    pub custodians: String,

    /// Directory holding the bootstrap marker [default: ~/.shardkeep/data]
    #[arg(long, env = "SHARDKEEP_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Client certificate (PEM) presented to custodians
    #[arg(long, env = "SHARDKEEP_TLS_CERT")]
    pub tls_cert: Option<PathBuf>,

    /// Private key (PEM) for the client certificate
    #[arg(long, env = "SHARDKEEP_TLS_KEY")]
    pub tls_key: Option<PathBuf>,

    /// CA bundle (PEM) that custodian certificates must chain to
    #[arg(long, env = "SHARDKEEP_TLS_CA")]
    pub tls_ca: Option<PathBuf>,

    /// Per-request custodian timeout in milliseconds
    #[arg(long, env = "SHARDKEEP_REQUEST_TIMEOUT_MS", default_value_t = 5000)]
    pub request_timeout_ms: u64,

    /// Delay between bootstrap or recovery passes in milliseconds
    #[arg(long, env = "SHARDKEEP_RETRY_INTERVAL_MS", default_value_t = 5000)]
    pub retry_interval_ms: u64,
}

impl CustodyArgs {
    /// Validates the arguments into runtime settings
    ///
    /// # Errors
    /// Returns an error if the parameters, custodian directory or TLS paths are invalid
    pub fn into_settings(self) -> Result<Settings, SettingsError> {
        let params = SharingParams::new(self.threshold, self.shares)?;
        let directory = CustodianDirectory::from_json(&self.custodians)?;
        let custody = CustodyConfig::new(params, directory)?
            .with_call_timeout(Duration::from_millis(self.request_timeout_ms))
            .with_retry_interval(Duration::from_millis(self.retry_interval_ms));

        Ok(Settings {
            custody,
            data_dir: self.data_dir.unwrap_or_else(Settings::default_data_dir),
            tls: TlsPaths::from_parts(self.tls_cert, self.tls_key, self.tls_ca)?,
        })
    }
}
