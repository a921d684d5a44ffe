//! Batch registry: creation, lifecycle transitions, and issuance accounting.
//!
//! The registry owns all `Batch` records and is the only component that
//! mutates them. Lifecycle moves go through [`BatchRegistry::transition`],
//! which enforces the adjacency table on `TokenState`; everything else is
//! an illegal move regardless of caller.

use chrono::Utc;
use opencarbon_audit::AuditTrail;
use opencarbon_store::{AuditStore, BatchStore};
use opencarbon_types::{
    AuditEventType, Batch, BatchId, BatchSpec, RegistryError, Result, TokenState, TokenTicker,
    TxHash, constants,
};
use rust_decimal::Decimal;

/// Owns batch records and their lifecycle.
#[derive(Debug)]
pub struct BatchRegistry<S: BatchStore> {
    store: S,
}

impl<S: BatchStore> BatchRegistry<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Register a new batch.
    ///
    /// 1. Validate the spec (ticker, project reference, supply, state)
    /// 2. Canonicalize the ticker to uppercase
    /// 3. Assign id, timestamps, zero issuance; anchor immediately if the
    ///    batch starts `ISSUED`
    /// 4. Append an `ISSUANCE` audit entry
    ///
    /// # Errors
    /// Returns `InvalidBatchSpec` when validation fails.
    pub fn create_batch<A: AuditStore>(
        &mut self,
        audit: &mut AuditTrail<A>,
        spec: BatchSpec,
    ) -> Result<Batch> {
        Self::validate_spec(&spec)?;

        let id = BatchId::new();
        let ticker = TokenTicker::new(spec.token_ticker.as_str());
        let anchor_tx_hash =
            (spec.initial_state == TokenState::Issued).then(|| Self::anchor_reference(id, &ticker));

        let batch = Batch {
            id,
            project_id: spec.project_id,
            token_ticker: ticker,
            total_tons: spec.total_tons,
            issued_tons: Decimal::ZERO,
            state: spec.initial_state,
            metadata_cid: spec.metadata_cid,
            mrv_reports: spec.mrv_reports,
            anchor_tx_hash,
            created_at: Utc::now(),
        };
        self.store.put(batch.clone());

        audit.append(
            AuditEventType::Issuance,
            id.to_string(),
            format!(
                "Created batch {} [{}] with {} t capacity",
                batch.token_ticker, batch.state, batch.total_tons
            ),
        );
        tracing::info!(
            batch = %id,
            ticker = %batch.token_ticker,
            state = %batch.state,
            total_tons = %batch.total_tons,
            "Batch created"
        );
        Ok(batch)
    }

    /// Move a batch to `target`.
    ///
    /// The first arrival at `ISSUED` assigns the anchor reference; it is
    /// never overwritten afterwards.
    ///
    /// # Errors
    /// - `BatchNotFound` for unknown ids
    /// - `InvalidTransition` when the adjacency table forbids the move
    pub fn transition<A: AuditStore>(
        &mut self,
        audit: &mut AuditTrail<A>,
        id: BatchId,
        target: TokenState,
        reason: &str,
    ) -> Result<Batch> {
        let mut batch = self.store.get(id).ok_or(RegistryError::BatchNotFound(id))?;
        let from = batch.state;
        if !from.can_transition_to(target) {
            tracing::warn!(batch = %id, from = %from, to = %target, "Transition rejected");
            return Err(RegistryError::InvalidTransition { from, to: target });
        }

        batch.state = target;
        if target == TokenState::Issued && batch.anchor_tx_hash.is_none() {
            batch.anchor_tx_hash = Some(Self::anchor_reference(id, &batch.token_ticker));
        }
        self.store.put(batch.clone());

        audit.append(
            AuditEventType::StateChange,
            id.to_string(),
            format!(
                "Batch {} moved from {from} to {target}. Reason: {reason}",
                batch.token_ticker
            ),
        );
        tracing::info!(batch = %id, from = %from, to = %target, reason, "Batch transitioned");
        Ok(batch)
    }

    /// Bump `issued_tons` after credits are delivered to a holder.
    ///
    /// # Errors
    /// - `BatchNotFound` for unknown ids
    /// - `InvalidBatchSpec` for non-positive tons
    /// - `IssuanceExceedsSupply` when the bump would pass `total_tons`
    pub fn record_issuance<A: AuditStore>(
        &mut self,
        audit: &mut AuditTrail<A>,
        id: BatchId,
        tons: Decimal,
    ) -> Result<Batch> {
        if tons <= Decimal::ZERO {
            return Err(RegistryError::InvalidBatchSpec {
                reason: "issued tons must be positive".to_string(),
            });
        }
        let mut batch = self.store.get(id).ok_or(RegistryError::BatchNotFound(id))?;
        let remaining = batch.remaining_supply();
        if tons > remaining {
            tracing::warn!(batch = %id, requested = %tons, remaining = %remaining, "Issuance rejected");
            return Err(RegistryError::IssuanceExceedsSupply {
                requested: tons,
                remaining,
            });
        }

        batch.issued_tons += tons;
        self.store.put(batch.clone());

        audit.append(
            AuditEventType::CreditsDelivered,
            id.to_string(),
            format!(
                "Delivered {tons} t of {} ({}/{} issued)",
                batch.token_ticker, batch.issued_tons, batch.total_tons
            ),
        );
        tracing::info!(batch = %id, tons = %tons, issued = %batch.issued_tons, "Issuance recorded");
        Ok(batch)
    }

    /// Append an MRV document reference to a batch.
    ///
    /// # Errors
    /// - `BatchNotFound` for unknown ids
    /// - `InvalidBatchSpec` for an empty reference or a full report list
    pub fn attach_mrv_report<A: AuditStore>(
        &mut self,
        audit: &mut AuditTrail<A>,
        id: BatchId,
        reference: &str,
    ) -> Result<Batch> {
        if reference.trim().is_empty() {
            return Err(RegistryError::InvalidBatchSpec {
                reason: "MRV reference must not be empty".to_string(),
            });
        }
        let mut batch = self.store.get(id).ok_or(RegistryError::BatchNotFound(id))?;
        if batch.mrv_reports.len() >= constants::MAX_MRV_REPORTS_PER_BATCH {
            return Err(RegistryError::InvalidBatchSpec {
                reason: format!(
                    "MRV report limit reached ({})",
                    constants::MAX_MRV_REPORTS_PER_BATCH
                ),
            });
        }

        batch.mrv_reports.push(reference.trim().to_string());
        self.store.put(batch.clone());

        audit.append(
            AuditEventType::MrvAttached,
            id.to_string(),
            format!(
                "Attached MRV report #{} to batch {}",
                batch.mrv_reports.len(),
                batch.token_ticker
            ),
        );
        Ok(batch)
    }

    #[must_use]
    pub fn get(&self, id: BatchId) -> Option<Batch> {
        self.store.get(id)
    }

    /// All batches, most recent first.
    #[must_use]
    pub fn list(&self) -> Vec<Batch> {
        let mut all = self.store.all();
        all.reverse();
        all
    }

    /// Whether any batch carries this ticker. The uniqueness guard's
    /// backing query.
    #[must_use]
    pub fn contains_ticker(&self, ticker: &TokenTicker) -> bool {
        self.store.contains_ticker(ticker)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    fn validate_spec(spec: &BatchSpec) -> Result<()> {
        let ticker = spec.token_ticker.as_str().trim();
        if ticker.is_empty() {
            return Err(RegistryError::InvalidBatchSpec {
                reason: "token ticker must not be empty".to_string(),
            });
        }
        if ticker.len() > constants::MAX_TICKER_LEN {
            return Err(RegistryError::InvalidBatchSpec {
                reason: format!(
                    "token ticker exceeds {} characters",
                    constants::MAX_TICKER_LEN
                ),
            });
        }
        if spec.project_id.trim().is_empty() {
            return Err(RegistryError::InvalidBatchSpec {
                reason: "project reference must not be empty".to_string(),
            });
        }
        if spec.total_tons <= Decimal::ZERO {
            return Err(RegistryError::InvalidBatchSpec {
                reason: "total_tons must be positive".to_string(),
            });
        }
        if !matches!(spec.initial_state, TokenState::Draft | TokenState::Issued) {
            return Err(RegistryError::InvalidBatchSpec {
                reason: format!(
                    "initial state must be DRAFT or ISSUED, got {}",
                    spec.initial_state
                ),
            });
        }
        if spec.mrv_reports.len() > constants::MAX_MRV_REPORTS_PER_BATCH {
            return Err(RegistryError::InvalidBatchSpec {
                reason: format!(
                    "MRV report limit is {}",
                    constants::MAX_MRV_REPORTS_PER_BATCH
                ),
            });
        }
        Ok(())
    }

    /// Deterministic anchor reference for a batch reaching `ISSUED`.
    fn anchor_reference(id: BatchId, ticker: &TokenTicker) -> TxHash {
        TxHash::deterministic(
            constants::MINT_TX_DOMAIN,
            &[id.0.as_bytes(), ticker.as_str().as_bytes()],
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use opencarbon_store::{MemoryAuditStore, MemoryBatchStore};

    fn setup() -> (BatchRegistry<MemoryBatchStore>, AuditTrail<MemoryAuditStore>) {
        (
            BatchRegistry::new(MemoryBatchStore::new()),
            AuditTrail::new(MemoryAuditStore::new()),
        )
    }

    #[test]
    fn create_draft_batch() {
        let (mut registry, mut audit) = setup();
        let batch = registry
            .create_batch(&mut audit, BatchSpec::dummy("AMZ-F23"))
            .unwrap();

        assert_eq!(batch.state, TokenState::Draft);
        assert_eq!(batch.issued_tons, Decimal::ZERO);
        assert!(batch.anchor_tx_hash.is_none());
        assert_eq!(registry.len(), 1);
        assert_eq!(audit.len(), 1);
        assert_eq!(audit.entries()[0].event_type, AuditEventType::Issuance);
    }

    #[test]
    fn create_issued_batch_is_anchored() {
        let (mut registry, mut audit) = setup();
        let mut spec = BatchSpec::dummy("SOL-P24");
        spec.initial_state = TokenState::Issued;
        let batch = registry.create_batch(&mut audit, spec).unwrap();

        let anchor = batch.anchor_tx_hash.expect("issued batch must be anchored");
        assert_eq!(anchor.as_str().len(), 64);
    }

    #[test]
    fn ticker_is_canonicalized() {
        let (mut registry, mut audit) = setup();
        let mut spec = BatchSpec::dummy("ignored");
        spec.token_ticker = TokenTicker("amz-f23".to_string());
        let batch = registry.create_batch(&mut audit, spec).unwrap();
        assert_eq!(batch.token_ticker.as_str(), "AMZ-F23");
        assert!(registry.contains_ticker(&TokenTicker::new("AMZ-F23")));
    }

    #[test]
    fn spec_validation() {
        let (mut registry, mut audit) = setup();

        let mut spec = BatchSpec::dummy("");
        assert!(registry.create_batch(&mut audit, spec).is_err());

        spec = BatchSpec::dummy("WAY-TOO-LONG-TICKER-SYMBOL");
        assert!(registry.create_batch(&mut audit, spec).is_err());

        spec = BatchSpec::dummy("AMZ-F23");
        spec.total_tons = Decimal::ZERO;
        assert!(registry.create_batch(&mut audit, spec).is_err());

        spec = BatchSpec::dummy("AMZ-F23");
        spec.project_id = "  ".to_string();
        assert!(registry.create_batch(&mut audit, spec).is_err());

        spec = BatchSpec::dummy("AMZ-F23");
        spec.initial_state = TokenState::Authorized;
        let err = registry.create_batch(&mut audit, spec).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidBatchSpec { .. }));

        // Nothing was stored, nothing was audited.
        assert!(registry.is_empty());
        assert!(audit.is_empty());
    }

    #[test]
    fn full_lifecycle_walk() {
        let (mut registry, mut audit) = setup();
        let batch = registry
            .create_batch(&mut audit, BatchSpec::dummy("AMZ-F23"))
            .unwrap();
        let id = batch.id;

        for (target, reason) in [
            (TokenState::Issued, "anchored"),
            (TokenState::Authorized, "compliance cleared"),
            (TokenState::Locked, "bulk retirement window"),
            (TokenState::Retired, "fully consumed"),
        ] {
            let updated = registry.transition(&mut audit, id, target, reason).unwrap();
            assert_eq!(updated.state, target);
        }

        // Terminal: no way out.
        let err = registry
            .transition(&mut audit, id, TokenState::Authorized, "revive")
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::InvalidTransition {
                from: TokenState::Retired,
                to: TokenState::Authorized
            }
        ));
        audit.verify().unwrap();
    }

    #[test]
    fn illegal_transition_rejected() {
        let (mut registry, mut audit) = setup();
        let batch = registry
            .create_batch(&mut audit, BatchSpec::dummy("AMZ-F23"))
            .unwrap();

        let err = registry
            .transition(&mut audit, batch.id, TokenState::Retired, "skip ahead")
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidTransition { .. }));
        // Rejected moves are not audited.
        assert_eq!(audit.len(), 1);
        assert_eq!(registry.get(batch.id).unwrap().state, TokenState::Draft);
    }

    #[test]
    fn transition_unknown_batch() {
        let (mut registry, mut audit) = setup();
        let err = registry
            .transition(&mut audit, BatchId::new(), TokenState::Issued, "x")
            .unwrap_err();
        assert!(matches!(err, RegistryError::BatchNotFound(_)));
    }

    #[test]
    fn anchor_assigned_once_on_issue() {
        let (mut registry, mut audit) = setup();
        let batch = registry
            .create_batch(&mut audit, BatchSpec::dummy("AMZ-F23"))
            .unwrap();
        assert!(batch.anchor_tx_hash.is_none());

        let issued = registry
            .transition(&mut audit, batch.id, TokenState::Issued, "anchored")
            .unwrap();
        let anchor = issued.anchor_tx_hash.clone().unwrap();

        // Later transitions keep the original reference.
        let authorized = registry
            .transition(&mut audit, batch.id, TokenState::Authorized, "cleared")
            .unwrap();
        assert_eq!(authorized.anchor_tx_hash, Some(anchor));
    }

    #[test]
    fn issuance_accounting() {
        let (mut registry, mut audit) = setup();
        let mut spec = BatchSpec::dummy("AMZ-F23");
        spec.total_tons = Decimal::new(1_000, 0);
        let batch = registry.create_batch(&mut audit, spec).unwrap();

        let after = registry
            .record_issuance(&mut audit, batch.id, Decimal::new(600, 0))
            .unwrap();
        assert_eq!(after.issued_tons, Decimal::new(600, 0));
        assert_eq!(after.remaining_supply(), Decimal::new(400, 0));

        let err = registry
            .record_issuance(&mut audit, batch.id, Decimal::new(401, 0))
            .unwrap_err();
        match err {
            RegistryError::IssuanceExceedsSupply {
                requested,
                remaining,
            } => {
                assert_eq!(requested, Decimal::new(401, 0));
                assert_eq!(remaining, Decimal::new(400, 0));
            }
            other => panic!("wrong error: {other}"),
        }

        // Exact fill is fine.
        let full = registry
            .record_issuance(&mut audit, batch.id, Decimal::new(400, 0))
            .unwrap();
        assert_eq!(full.remaining_supply(), Decimal::ZERO);
    }

    #[test]
    fn attach_mrv_report_appends() {
        let (mut registry, mut audit) = setup();
        let batch = registry
            .create_batch(&mut audit, BatchSpec::dummy("AMZ-F23"))
            .unwrap();
        let before = batch.mrv_reports.len();

        let updated = registry
            .attach_mrv_report(&mut audit, batch.id, "https://mrv.example/report-2.pdf")
            .unwrap();
        assert_eq!(updated.mrv_reports.len(), before + 1);
        assert!(
            registry
                .attach_mrv_report(&mut audit, batch.id, "   ")
                .is_err()
        );
    }

    #[test]
    fn list_is_newest_first() {
        let (mut registry, mut audit) = setup();
        registry
            .create_batch(&mut audit, BatchSpec::dummy("AAA-1"))
            .unwrap();
        registry
            .create_batch(&mut audit, BatchSpec::dummy("BBB-2"))
            .unwrap();

        let list = registry.list();
        assert_eq!(list[0].token_ticker.as_str(), "BBB-2");
        assert_eq!(list[1].token_ticker.as_str(), "AAA-1");
    }
}
