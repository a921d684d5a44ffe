//! # opencarbon-core
//!
//! **The assembled registry and settlement core.**
//!
//! Everything below this crate is a synchronous component over a store
//! trait. This crate wires them together and adds the async rim:
//!
//! - **RegistryCore**: the facade. Batch lifecycle, tokenization
//!   workflow, retirement with merkle anchoring, pre-auth settlement,
//!   balances, and the shared audit trail behind one lock
//! - **CoreStores**: the backing stores, swappable for recovery tests
//! - **SettlementWorker** (internal): the background task that executes
//!   fills after the pre-auth delay and runs the periodic expiry sweep
//!
//! ```no_run
//! use opencarbon_core::RegistryCore;
//! use opencarbon_types::CoreConfig;
//!
//! # #[tokio::main]
//! # async fn main() -> opencarbon_types::Result<()> {
//! let core = RegistryCore::new(CoreConfig::default())?;
//! core.verify_audit_chain()?;
//! core.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod registry_core;

mod worker;

pub use registry_core::{CoreStores, RegistryCore};
