//! Property-based tests for shardkeep
//!
//! This test suite uses quickcheck to verify correctness across random keys,
//! sharing parameters, and share selections.
//!
//! Run with: cargo test --test proptests

#[path = "proptests/sharing.rs"]
mod sharing;

#[path = "proptests/codec.rs"]
mod codec;
