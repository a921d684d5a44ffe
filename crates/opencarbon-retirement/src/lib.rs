//! # opencarbon-retirement
//!
//! **Burn pipeline and merkle-anchored proof of retirement.**
//!
//! Retiring credits is irreversible, so every burn leaves a certificate a
//! third party can check without trusting this process:
//!
//! - **AnchorEpoch**: incremental merkle tree over retirement leaves,
//!   duplicating the last node on odd levels
//! - **RetirementService**: debits the holder, anchors the canonical leaf,
//!   mints the certificate (leaf hash, epoch root, inclusion proof), and
//!   seals epochs at capacity or on sweep
//!
//! Certificates are self-contained: `verify_inclusion` needs nothing but
//! the record.

pub mod merkle;
pub mod service;

pub use merkle::{AnchorEpoch, compute_proof, compute_root};
pub use service::RetirementService;
