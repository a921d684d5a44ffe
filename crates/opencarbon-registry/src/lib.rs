//! # opencarbon-registry
//!
//! **Batch registry, uniqueness policy, and tokenization workflow.**
//!
//! The registry side of OpenCarbon: everything between "someone asked to
//! tokenize credits" and "a live batch exists with credits delivered".
//!
//! - **BatchRegistry**: batch records, the lifecycle state machine,
//!   issuance accounting, MRV attachments
//! - **UniquenessGuard**: ticker-level duplicate-tokenization policy
//! - **TokenizationWorkflow**: request intake and the approve/reject
//!   decision; approval mints, issues, and credits as one logical unit
//!
//! All operations append to the shared audit trail passed in by the caller.

pub mod registry;
pub mod uniqueness;
pub mod workflow;

pub use registry::BatchRegistry;
pub use uniqueness::UniquenessGuard;
pub use workflow::TokenizationWorkflow;
