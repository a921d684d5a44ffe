//! # opencarbon-types
//!
//! Shared types, errors, and configuration for the **OpenCarbon** registry
//! and settlement core.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`BatchId`], [`OrderId`], [`RequestId`], [`CertificateId`], [`EntryId`], [`EpochId`], [`TokenTicker`], [`HolderAddress`], [`TxHash`], [`Cid`]
//! - **Hashing**: [`Digest`] with the chain [`Digest::GENESIS`] constant
//! - **Batch model**: [`Batch`], [`BatchSpec`], [`TokenState`]
//! - **Order model**: [`PreAuthOrder`], [`OrderSpec`], [`OrderSide`], [`OrderStatus`], [`SettlementNotice`]
//! - **Request model**: [`TokenizationRequest`], [`RequestSpec`], [`IssuerName`], [`RequestStatus`]
//! - **Retirement model**: [`RetirementRecord`], [`MerkleProof`], [`SealedEpoch`]
//! - **Audit model**: [`AuditLogEntry`], [`AuditEventType`]
//! - **Configuration**: [`CoreConfig`], [`SettlementTiming`], [`AnchorPolicy`]
//! - **Errors**: [`RegistryError`] with `OC_ERR_` prefix codes, [`ErrorKind`]
//! - **Constants**: system-wide defaults and domain prefixes

pub mod audit;
pub mod batch;
pub mod config;
pub mod constants;
pub mod digest;
pub mod error;
pub mod ids;
pub mod order;
pub mod request;
pub mod retirement;

// Re-export all primary types at crate root for ergonomic imports:
//   use opencarbon_types::{Batch, TokenState, RetirementRecord, ...};

pub use audit::*;
pub use batch::*;
pub use config::*;
pub use digest::*;
pub use error::*;
pub use ids::*;
pub use order::*;
pub use request::*;
pub use retirement::*;

// Constants are accessed via `opencarbon_types::constants::FOO`
// (not re-exported to avoid name collisions).
