//! Audit log entry model and canonical payload hashing.
//!
//! Entries form a hash chain: each entry's `prev_hash` is the prior entry's
//! `payload_hash`, and the first entry links to [`Digest::GENESIS`]. The
//! payload hash covers a canonical JSON encoding of exactly five fields in
//! a fixed order, so any replica can recompute and verify the chain.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{Digest, EntryId};

// ---------------------------------------------------------------------------
// AuditEventType
// ---------------------------------------------------------------------------

/// What kind of mutation an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    /// A batch was created.
    Issuance,
    /// A batch moved between lifecycle states.
    StateChange,
    /// An MRV document reference was attached to a batch.
    MrvAttached,
    /// Issued-supply accounting was bumped (credits delivered to a holder).
    CreditsDelivered,
    /// A retirement certificate was anchored in the open epoch.
    RetirementAnchored,
    /// An anchoring epoch was closed.
    EpochSealed,
    /// A pre-auth order was accepted.
    PreauthReceived,
    /// A pre-auth order settled.
    SettlementExecuted,
    /// A pre-auth order was cancelled by its owner.
    PreauthRevoked,
    /// A pre-auth order passed its expiry unsettled.
    PreauthExpired,
    /// A tokenization request was submitted.
    TokenRequest,
    /// A tokenization request was approved (batch minted).
    TokenApproved,
    /// A tokenization request was rejected.
    TokenRejected,
}

impl AuditEventType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Issuance => "ISSUANCE",
            Self::StateChange => "STATE_CHANGE",
            Self::MrvAttached => "MRV_ATTACHED",
            Self::CreditsDelivered => "CREDITS_DELIVERED",
            Self::RetirementAnchored => "RETIREMENT_ANCHORED",
            Self::EpochSealed => "EPOCH_SEALED",
            Self::PreauthReceived => "PREAUTH_RECEIVED",
            Self::SettlementExecuted => "SETTLEMENT_EXECUTED",
            Self::PreauthRevoked => "PREAUTH_REVOKED",
            Self::PreauthExpired => "PREAUTH_EXPIRED",
            Self::TokenRequest => "TOKEN_REQUEST",
            Self::TokenApproved => "TOKEN_APPROVED",
            Self::TokenRejected => "TOKEN_REJECTED",
        }
    }
}

impl fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Canonical payload
// ---------------------------------------------------------------------------

/// The exact bytes covered by `payload_hash`: canonical JSON of these five
/// fields in declaration order. Timestamps render as RFC 3339 UTC with
/// microsecond precision so the encoding is stable across replicas.
#[derive(Serialize)]
struct CanonicalPayload<'a> {
    event_type: &'a str,
    entity_id: &'a str,
    description: &'a str,
    prev_hash: String,
    timestamp: String,
}

/// Hash the canonical payload for an entry.
///
/// # Panics
/// Panics if JSON encoding fails. The chain cannot be extended past a hash
/// failure, so this is fatal.
#[must_use]
pub fn hash_payload(
    event_type: AuditEventType,
    entity_id: &str,
    description: &str,
    prev_hash: Digest,
    timestamp: DateTime<Utc>,
) -> Digest {
    let payload = CanonicalPayload {
        event_type: event_type.as_str(),
        entity_id,
        description,
        prev_hash: prev_hash.to_hex(),
        timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
    };
    let bytes = serde_json::to_vec(&payload).expect("audit payload is valid JSON");
    Digest::sha256(&bytes)
}

// ---------------------------------------------------------------------------
// AuditLogEntry
// ---------------------------------------------------------------------------

/// One link in the append-only audit chain. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: EntryId,
    /// Monotonic position assigned at append; 0 is the first entry.
    pub sequence: u64,
    pub event_type: AuditEventType,
    /// ID of the touched entity (batch, order, request, certificate, epoch).
    pub entity_id: String,
    pub description: String,
    /// `payload_hash` of the previous entry; [`Digest::GENESIS`] for the
    /// first.
    pub prev_hash: Digest,
    pub payload_hash: Digest,
    pub timestamp: DateTime<Utc>,
}

impl AuditLogEntry {
    /// Recompute the payload hash from stored fields. Equal to
    /// `payload_hash` iff the entry is untampered.
    #[must_use]
    pub fn compute_payload_hash(&self) -> Digest {
        hash_payload(
            self.event_type,
            &self.entity_id,
            &self.description,
            self.prev_hash,
            self.timestamp,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
