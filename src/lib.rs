//! # vault-otp
//!
//! `vault-otp` walks a key prefix in HashiCorp Vault, reads every secret
//! record below it and turns the ones holding a TOTP secret into current
//! authentication codes.
//!
//! ## Traversal
//!
//! The namespace shape is not known up front. Directories (keys ending in `/`)
//! are listed and every child becomes either another listing or a leaf read.
//! Each listing and each read runs as its own task, so round trips to Vault
//! overlap. A single dispatcher owns the work queues and decides completion
//! from an outstanding-work counter; see [`harvest`].
//!
//! ## Records
//!
//! A leaf becomes a [`otp::Record`] when it carries a secret (the field name is
//! configurable) or a preset `code`. Malformed numeric fields fall back to
//! their defaults, undecodable secrets drop the record. Failures are logged
//! per key and never abort the run: an unreachable subtree just yields fewer
//! codes.

pub mod cli;
pub mod harvest;
pub mod otp;
pub mod vault;

pub use harvest::{HarvestConfig, ResultSet, harvest};

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
