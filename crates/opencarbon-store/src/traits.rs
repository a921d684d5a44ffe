//! Repository traits, one per entity type.
//!
//! Components are generic over these, so a durable backend can replace the
//! in-memory stores without touching component logic. All methods are
//! synchronous: every store sits behind the facade's single lock, and a
//! durable implementation is expected to be a write-through cache or an
//! embedded store with synchronous commits.
//!
//! Listing order contract: `all()` returns ascending creation order.
//! Entity IDs are UUIDv7, so the natural key order of the backing map *is*
//! creation order; callers reverse for newest-first views.

use opencarbon_types::{
    AuditLogEntry, Batch, BatchId, CertificateId, OrderId, PreAuthOrder, RequestId,
    RetirementRecord, SealedEpoch, TokenTicker, TokenizationRequest,
};

/// Storage for carbon batches.
pub trait BatchStore {
    /// Insert or replace a batch by id.
    fn put(&mut self, batch: Batch);

    fn get(&self, id: BatchId) -> Option<Batch>;

    /// Whether any batch carries this (canonical uppercase) ticker.
    fn contains_ticker(&self, ticker: &TokenTicker) -> bool;

    /// All batches in ascending creation order.
    fn all(&self) -> Vec<Batch>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Storage for pre-auth orders.
pub trait OrderStore {
    fn put(&mut self, order: PreAuthOrder);

    fn get(&self, id: OrderId) -> Option<PreAuthOrder>;

    /// All orders in ascending creation order.
    fn all(&self) -> Vec<PreAuthOrder>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Storage for tokenization requests.
pub trait RequestStore {
    fn put(&mut self, request: TokenizationRequest);

    fn get(&self, id: RequestId) -> Option<TokenizationRequest>;

    /// All requests in ascending creation order.
    fn all(&self) -> Vec<TokenizationRequest>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Storage for retirement certificates and sealed epoch summaries.
///
/// Records are append-only; there is no update path.
pub trait RetirementStore {
    fn append(&mut self, record: RetirementRecord);

    fn get(&self, id: CertificateId) -> Option<RetirementRecord>;

    /// All records in ascending creation order.
    fn all(&self) -> Vec<RetirementRecord>;

    fn append_sealed(&mut self, epoch: SealedEpoch);

    /// Sealed epoch summaries in sealing order.
    fn sealed(&self) -> Vec<SealedEpoch>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Storage for the audit chain.
///
/// Append-only. The trail derives the next sequence number and prev link
/// from `tail()`, so the store itself carries no chain state.
pub trait AuditStore {
    fn append(&mut self, entry: AuditLogEntry);

    /// The most recently appended entry, if any.
    fn tail(&self) -> Option<AuditLogEntry>;

    /// All entries in append (ascending sequence) order.
    fn all(&self) -> Vec<AuditLogEntry>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
