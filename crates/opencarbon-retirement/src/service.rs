//! Retirement pipeline: burn credits, anchor the leaf, mint the
//! certificate.
//!
//! The service owns the open anchoring epoch. Retirement debits the
//! holder's ledger balance first; everything after the debit is
//! infallible, so a failed retirement never leaves a partial burn. Epochs
//! seal automatically at leaf capacity and, when configured, on the
//! periodic sweep.

use chrono::Utc;
use opencarbon_audit::AuditTrail;
use opencarbon_registry::BatchRegistry;
use opencarbon_store::{AuditStore, BalanceStore, BatchStore, RetirementStore};
use opencarbon_types::{
    AnchorPolicy, AuditEventType, BatchId, CertificateId, Cid, Digest, EpochId, HolderAddress,
    RegistryError, Result, RetirementRecord, SealedEpoch, TxHash, canonical_leaf, constants,
};
use rust_decimal::Decimal;

use crate::merkle::AnchorEpoch;

/// Owns retirement certificates and the open anchoring epoch.
#[derive(Debug)]
pub struct RetirementService<S: RetirementStore> {
    store: S,
    epoch: AnchorEpoch,
    policy: AnchorPolicy,
}

impl<S: RetirementStore> RetirementService<S> {
    /// Open the service over a store, resuming after the last sealed epoch.
    ///
    /// Records already appended to the open (unsealed) epoch are replayed
    /// into it, so proofs for subsequent leaves stay consistent across a
    /// restart.
    #[must_use]
    pub fn new(store: S, policy: AnchorPolicy) -> Self {
        let open_id = store
            .sealed()
            .last()
            .map_or(EpochId(0), |sealed| sealed.epoch_id.next());
        let mut epoch = AnchorEpoch::new(open_id);
        for record in store.all() {
            if record.epoch_id == open_id {
                epoch.push(record.leaf_hash);
            }
        }
        Self {
            store,
            epoch,
            policy,
        }
    }

    /// Burn credits and anchor the retirement.
    ///
    /// 1. Validate amount and purpose
    /// 2. The batch must exist and be in a retirable state
    /// 3. Debit the holder's ledger balance (the wallet-facing constraint)
    /// 4. Derive the burn reference, hash the canonical leaf, append it to
    ///    the open epoch
    /// 5. Mint the certificate with the epoch root and inclusion proof at
    ///    this moment, persist it, append `RETIREMENT_ANCHORED`
    /// 6. Seal the epoch if it reached leaf capacity
    ///
    /// # Errors
    /// - `InvalidRetirement` for a non-positive amount or empty purpose
    /// - `BatchNotFound` for unknown batches
    /// - `RetirementNotAllowed` unless the batch is `AUTHORIZED` or `LOCKED`
    /// - `InsufficientBalance` when the holder cannot cover the burn
    pub fn retire<A: AuditStore, B: BatchStore, L: BalanceStore>(
        &mut self,
        audit: &mut AuditTrail<A>,
        registry: &BatchRegistry<B>,
        ledger: &mut L,
        batch_id: BatchId,
        holder: &HolderAddress,
        amount: Decimal,
        purpose: &str,
    ) -> Result<RetirementRecord> {
        if amount <= Decimal::ZERO {
            return Err(RegistryError::InvalidRetirement {
                reason: "amount must be positive".to_string(),
            });
        }
        let purpose = purpose.trim();
        if purpose.is_empty() {
            return Err(RegistryError::InvalidRetirement {
                reason: "purpose must not be empty".to_string(),
            });
        }
        let batch = registry
            .get(batch_id)
            .ok_or(RegistryError::BatchNotFound(batch_id))?;
        if !batch.state.allows_retirement() {
            tracing::warn!(batch = %batch_id, state = %batch.state, "Retirement rejected");
            return Err(RegistryError::RetirementNotAllowed { state: batch.state });
        }
        ledger.debit(holder, &batch.token_ticker, amount)?;

        // Past the debit nothing can fail.
        let certificate_id = CertificateId::new();
        let tx_hash = Self::burn_reference(certificate_id, batch_id, holder, amount);
        let leaf_string = canonical_leaf(&tx_hash, batch_id, amount, holder);
        let leaf_hash = Digest::sha256(leaf_string.as_bytes());

        let leaf_index = self.epoch.push(leaf_hash);
        let merkle_root = self
            .epoch
            .root()
            .expect("epoch root exists after a leaf was pushed");
        let proof = self
            .epoch
            .proof(leaf_index)
            .expect("proof exists for a leaf just pushed");

        let record = RetirementRecord {
            certificate_id,
            batch_id,
            holder_address: holder.clone(),
            amount,
            purpose: purpose.to_string(),
            tx_hash,
            leaf_hash,
            merkle_root,
            proof,
            epoch_id: self.epoch.id(),
            document_cid: Cid::from_digest(&Digest::sha256(
                format!("{leaf_string}:{purpose}").as_bytes(),
            )),
            timestamp: Utc::now(),
        };
        self.store.append(record.clone());

        audit.append(
            AuditEventType::RetirementAnchored,
            certificate_id.to_string(),
            format!(
                "Burned {amount} t of {} for {holder}; leaf {leaf_index} in {}",
                batch.token_ticker,
                self.epoch.id()
            ),
        );
        tracing::info!(
            certificate = %certificate_id,
            batch = %batch_id,
            holder = %holder,
            amount = %amount,
            epoch = %self.epoch.id(),
            leaf_index,
            "Retirement anchored"
        );

        if self.epoch.leaf_count() >= self.policy.max_leaves_per_epoch {
            self.seal_epoch(audit);
        }
        Ok(record)
    }

    /// Seal the open epoch and start the next one. No-op on an empty
    /// epoch: an epoch without leaves is never sealed.
    pub fn seal_epoch<A: AuditStore>(&mut self, audit: &mut AuditTrail<A>) -> Option<SealedEpoch> {
        let root = self.epoch.root()?;
        let sealed = SealedEpoch {
            epoch_id: self.epoch.id(),
            root,
            leaf_count: self.epoch.leaf_count(),
            sealed_at: Utc::now(),
        };
        self.store.append_sealed(sealed.clone());

        audit.append(
            AuditEventType::EpochSealed,
            sealed.epoch_id.to_string(),
            format!(
                "Sealed {} with {} leaves; root {}",
                sealed.epoch_id,
                sealed.leaf_count,
                root.short()
            ),
        );
        tracing::info!(
            epoch = %sealed.epoch_id,
            leaves = sealed.leaf_count,
            root = %root.short(),
            "Epoch sealed"
        );

        self.epoch = AnchorEpoch::new(sealed.epoch_id.next());
        Some(sealed)
    }

    /// Seal on sweep when the policy asks for it.
    pub fn sweep<A: AuditStore>(&mut self, audit: &mut AuditTrail<A>) -> Option<SealedEpoch> {
        if self.policy.seal_on_sweep {
            self.seal_epoch(audit)
        } else {
            None
        }
    }

    #[must_use]
    pub fn find(&self, id: CertificateId) -> Option<RetirementRecord> {
        self.store.get(id)
    }

    /// All certificates, most recent first.
    #[must_use]
    pub fn records(&self) -> Vec<RetirementRecord> {
        let mut all = self.store.all();
        all.reverse();
        all
    }

    /// Certificates held by one address, most recent first.
    #[must_use]
    pub fn records_for(&self, holder: &HolderAddress) -> Vec<RetirementRecord> {
        self.records()
            .into_iter()
            .filter(|record| record.holder_address == *holder)
            .collect()
    }

    /// Recompute a stored certificate's leaf and check its inclusion
    /// proof. `None` for unknown certificates.
    #[must_use]
    pub fn verify(&self, id: CertificateId) -> Option<bool> {
        self.store.get(id).map(|record| record.verify_inclusion())
    }

    #[must_use]
    pub fn sealed_epochs(&self) -> Vec<SealedEpoch> {
        self.store.sealed()
    }

    #[must_use]
    pub fn open_epoch_id(&self) -> EpochId {
        self.epoch.id()
    }

    #[must_use]
    pub fn open_leaf_count(&self) -> usize {
        self.epoch.leaf_count()
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

    /// Deterministic burn reference. The certificate id salts the hash, so
    /// two otherwise identical burns never share a reference (or a leaf).
    fn burn_reference(
        certificate_id: CertificateId,
        batch_id: BatchId,
        holder: &HolderAddress,
        amount: Decimal,
    ) -> TxHash {
        TxHash::deterministic(
            constants::BURN_TX_DOMAIN,
            &[
                certificate_id.0.as_bytes(),
                batch_id.0.as_bytes(),
                holder.as_str().as_bytes(),
                amount.to_string().as_bytes(),
            ],
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
