//! Root key custody for a secret store
//!
//! On first start a fresh root key is generated, split into `n` shares of
//! which any `t` recover it, and each share is delivered to its own
//! custodian. A marker file then records that bootstrap finished. On every
//! later start the key is rebuilt in memory from `t` custodian shares and is
//! never written to disk.

#[cfg(feature = "cli")]
pub mod cli;
pub mod bootstrap;
pub mod codec;
pub mod commands;
pub mod custodian;
pub mod domain;
pub mod error;
pub mod marker;
pub mod recovery;
pub mod settings;
pub mod sharing;
pub mod startup;
pub mod state;

pub use error::{Error, Result};
