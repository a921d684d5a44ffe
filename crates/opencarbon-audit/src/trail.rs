//! The audit trail: append, query, verify.

use chrono::Utc;
use opencarbon_store::AuditStore;
use opencarbon_types::{
    AuditEventType, AuditLogEntry, Digest, EntryId, RegistryError, Result, hash_payload,
};

/// Append-only hash-chained log of every state mutation in the core.
///
/// Each entry's `prev_hash` is the prior entry's `payload_hash`; the first
/// entry links to [`Digest::GENESIS`]. Sequence numbers are assigned here,
/// monotonically from 0. The trail keeps no chain state of its own: the
/// link and sequence for the next append are derived from the store's tail,
/// so a durable store resumes its chain across restarts.
#[derive(Debug)]
pub struct AuditTrail<S: AuditStore> {
    store: S,
}

impl<S: AuditStore> AuditTrail<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Append one entry and return it.
    ///
    /// # Panics
    /// Panics if the canonical payload cannot be hashed; the chain cannot
    /// be extended past a hash failure.
    pub fn append(
        &mut self,
        event_type: AuditEventType,
        entity_id: impl Into<String>,
        description: impl Into<String>,
    ) -> AuditLogEntry {
        let entity_id = entity_id.into();
        let description = description.into();
        let (sequence, prev_hash) = match self.store.tail() {
            Some(tail) => (tail.sequence + 1, tail.payload_hash),
            None => (0, Digest::GENESIS),
        };
        let timestamp = Utc::now();
        let payload_hash = hash_payload(event_type, &entity_id, &description, prev_hash, timestamp);

        let entry = AuditLogEntry {
            id: EntryId::new(),
            sequence,
            event_type,
            entity_id,
            description,
            prev_hash,
            payload_hash,
            timestamp,
        };
        self.store.append(entry.clone());
        tracing::info!(
            sequence,
            event = %event_type,
            entity = %entry.entity_id,
            hash = %payload_hash.short(),
            "Audit entry appended"
        );
        entry
    }

    /// The link the next entry will carry: the tail's payload hash, or
    /// [`Digest::GENESIS`] for an empty chain.
    #[must_use]
    pub fn tail_hash(&self) -> Digest {
        self.store
            .tail()
            .map_or(Digest::GENESIS, |tail| tail.payload_hash)
    }

    /// All entries, most recent first (descending sequence).
    #[must_use]
    pub fn entries(&self) -> Vec<AuditLogEntry> {
        let mut all = self.store.all();
        all.sort_by(|a, b| b.sequence.cmp(&a.sequence));
        all
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Walk the whole chain front to back.
    ///
    /// Checks, per entry: contiguous sequence numbers, the prev link
    /// against the running hash, and the payload hash against a recompute
    /// from stored fields.
    pub fn verify(&self) -> Result<()> {
        let mut expected_sequence = 0u64;
        let mut prev = Digest::GENESIS;
        for entry in self.store.all() {
            if entry.sequence != expected_sequence {
                return Err(RegistryError::ChainCorrupted {
                    sequence: entry.sequence,
                    reason: format!("sequence gap: expected {expected_sequence}"),
                });
            }
            if entry.prev_hash != prev {
                return Err(RegistryError::ChainCorrupted {
                    sequence: entry.sequence,
                    reason: format!(
                        "prev link mismatch: expected {}, found {}",
                        prev.short(),
                        entry.prev_hash.short()
                    ),
                });
            }
            let recomputed = entry.compute_payload_hash();
            if recomputed != entry.payload_hash {
                return Err(RegistryError::ChainCorrupted {
                    sequence: entry.sequence,
                    reason: "payload hash does not recompute from stored fields".to_string(),
                });
            }
            prev = entry.payload_hash;
            expected_sequence += 1;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
