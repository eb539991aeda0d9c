//! Domain types for threshold custody of the root key
//!
//! Validated newtypes shared by the sharing engine, the coordinators and the
//! operator tooling:
//! - [`Threshold`] - Minimum distinct shares required for reconstruction (1..=254)
//! - [`ShareCount`] - Total number of shares, one per custodian (1..=254)
//! - [`ShareId`] - Share identifier, the polynomial's x-coordinate (1..=254)
//! - [`SharingParams`] - Validated threshold and share count pair

mod params;
mod share_count;
mod share_id;
mod threshold;

pub use params::SharingParams;
pub use share_count::ShareCount;
pub use share_id::ShareId;
pub use threshold::Threshold;
