//! In-memory store implementations backed by `BTreeMap`.
//!
//! UUIDv7 keys make the map's natural order equal creation order, which is
//! what the `all()` contract requires.

use std::collections::BTreeMap;

use opencarbon_types::{
    AuditLogEntry, Batch, BatchId, CertificateId, OrderId, PreAuthOrder, RequestId,
    RetirementRecord, SealedEpoch, TokenTicker, TokenizationRequest,
};

use crate::{AuditStore, BatchStore, OrderStore, RequestStore, RetirementStore};

// ---------------------------------------------------------------------------
// MemoryBatchStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryBatchStore {
    batches: BTreeMap<BatchId, Batch>,
}

impl MemoryBatchStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BatchStore for MemoryBatchStore {
    fn put(&mut self, batch: Batch) {
        self.batches.insert(batch.id, batch);
    }

    fn get(&self, id: BatchId) -> Option<Batch> {
        self.batches.get(&id).cloned()
    }

    fn contains_ticker(&self, ticker: &TokenTicker) -> bool {
        self.batches.values().any(|b| b.token_ticker == *ticker)
    }

    fn all(&self) -> Vec<Batch> {
        self.batches.values().cloned().collect()
    }

    fn len(&self) -> usize {
        self.batches.len()
    }
}

// ---------------------------------------------------------------------------
// MemoryOrderStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    orders: BTreeMap<OrderId, PreAuthOrder>,
}

impl MemoryOrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderStore for MemoryOrderStore {
    fn put(&mut self, order: PreAuthOrder) {
        self.orders.insert(order.id, order);
    }

    fn get(&self, id: OrderId) -> Option<PreAuthOrder> {
        self.orders.get(&id).cloned()
    }

    fn all(&self) -> Vec<PreAuthOrder> {
        self.orders.values().cloned().collect()
    }

    fn len(&self) -> usize {
        self.orders.len()
    }
}

// ---------------------------------------------------------------------------
// MemoryRequestStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryRequestStore {
    requests: BTreeMap<RequestId, TokenizationRequest>,
}

impl MemoryRequestStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RequestStore for MemoryRequestStore {
    fn put(&mut self, request: TokenizationRequest) {
        self.requests.insert(request.id, request);
    }

    fn get(&self, id: RequestId) -> Option<TokenizationRequest> {
        self.requests.get(&id).cloned()
    }

    fn all(&self) -> Vec<TokenizationRequest> {
        self.requests.values().cloned().collect()
    }

    fn len(&self) -> usize {
        self.requests.len()
    }
}

// ---------------------------------------------------------------------------
// MemoryRetirementStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryRetirementStore {
    records: BTreeMap<CertificateId, RetirementRecord>,
    sealed: Vec<SealedEpoch>,
}

impl MemoryRetirementStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RetirementStore for MemoryRetirementStore {
    fn append(&mut self, record: RetirementRecord) {
        self.records.insert(record.certificate_id, record);
    }

    fn get(&self, id: CertificateId) -> Option<RetirementRecord> {
        self.records.get(&id).cloned()
    }

    fn all(&self) -> Vec<RetirementRecord> {
        self.records.values().cloned().collect()
    }

    fn append_sealed(&mut self, epoch: SealedEpoch) {
        self.sealed.push(epoch);
    }

    fn sealed(&self) -> Vec<SealedEpoch> {
        self.sealed.clone()
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

// ---------------------------------------------------------------------------
// MemoryAuditStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    entries: Vec<AuditLogEntry>,
}

impl MemoryAuditStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditStore for MemoryAuditStore {
    fn append(&mut self, entry: AuditLogEntry) {
        self.entries.push(entry);
    }

    fn tail(&self) -> Option<AuditLogEntry> {
        self.entries.last().cloned()
    }

    fn all(&self) -> Vec<AuditLogEntry> {
        self.entries.clone()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
