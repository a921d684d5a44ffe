//! # opencarbon-audit
//!
//! Append-only hash-chained audit trail.
//!
//! Every state mutation in the core appends exactly one [`AuditLogEntry`]
//! here. The chain invariant: each entry's `prev_hash` equals the prior
//! entry's `payload_hash`, starting from the all-zero genesis digest.
//! [`AuditTrail::verify`] walks the whole chain and reports the first
//! broken link.
//!
//! The trail is generic over [`opencarbon_store::AuditStore`]; it derives
//! chain position from the store's tail, so swapping in a durable store
//! resumes the chain across restarts.

pub mod trail;

pub use opencarbon_types::AuditLogEntry;
pub use trail::AuditTrail;
