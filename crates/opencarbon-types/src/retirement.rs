//! Retirement certificate model and merkle inclusion proofs.
//!
//! Every retirement burns credits and anchors one leaf in the open
//! anchoring epoch. The record is immutable: it carries the leaf hash, the
//! epoch root at the moment of inclusion, and the proof binding the two, so
//! a verifier needs nothing but the record itself.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BatchId, CertificateId, Cid, Digest, EpochId, HolderAddress, TxHash};

// ---------------------------------------------------------------------------
// Merkle inclusion proof
// ---------------------------------------------------------------------------

/// Sibling path from a leaf to an epoch root.
///
/// Trees duplicate the last node on odd levels, so every leaf has a sibling
/// at every level and the parity walk below is total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Position of the leaf in the epoch at inclusion time.
    pub leaf_index: usize,
    /// Bottom-up sibling digests. Empty for a single-leaf tree.
    pub siblings: Vec<Digest>,
}

impl MerkleProof {
    /// Walk the path: at each level the accumulated digest sits left when
    /// the running index is even, right when odd.
    #[must_use]
    pub fn verify(&self, leaf: Digest, root: Digest) -> bool {
        let mut acc = leaf;
        let mut index = self.leaf_index;
        for sibling in &self.siblings {
            acc = if index % 2 == 0 {
                Digest::combine(&acc, sibling)
            } else {
                Digest::combine(sibling, &acc)
            };
            index /= 2;
        }
        acc == root
    }
}

// ---------------------------------------------------------------------------
// Canonical leaf encoding
// ---------------------------------------------------------------------------

/// Canonical leaf string: `"{txHash}:{batchId}:{amount}:{holderAddress}"`.
///
/// Hashed with plain SHA-256 (no domain prefix); external verifiers
/// reproduce it from certificate fields alone.
#[must_use]
pub fn canonical_leaf(
    tx_hash: &TxHash,
    batch_id: BatchId,
    amount: Decimal,
    holder: &HolderAddress,
) -> String {
    format!("{tx_hash}:{batch_id}:{amount}:{holder}")
}

// ---------------------------------------------------------------------------
// RetirementRecord
// ---------------------------------------------------------------------------

/// Proof-of-retirement certificate. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetirementRecord {
    pub certificate_id: CertificateId,
    pub batch_id: BatchId,
    pub holder_address: HolderAddress,
    /// Tons CO2e burned. Strictly positive.
    pub amount: Decimal,
    /// Stated reason for the retirement (offset claim).
    pub purpose: String,
    /// Deterministic burn reference.
    pub tx_hash: TxHash,
    /// SHA-256 of [`canonical_leaf`].
    pub leaf_hash: Digest,
    /// Root of the anchoring epoch at the moment this leaf was included.
    pub merkle_root: Digest,
    pub proof: MerkleProof,
    pub epoch_id: EpochId,
    /// Content address of the certificate document.
    pub document_cid: Cid,
    pub timestamp: DateTime<Utc>,
}

impl RetirementRecord {
    /// Re-derive the canonical leaf string from record fields.
    #[must_use]
    pub fn leaf_string(&self) -> String {
        canonical_leaf(
            &self.tx_hash,
            self.batch_id,
            self.amount,
            &self.holder_address,
        )
    }

    /// Recompute the leaf hash from record fields.
    #[must_use]
    pub fn compute_leaf_hash(&self) -> Digest {
        Digest::sha256(self.leaf_string().as_bytes())
    }

    /// Full verification: leaf recomputes and the proof binds it to the
    /// stored root.
    #[must_use]
    pub fn verify_inclusion(&self) -> bool {
        let leaf = self.compute_leaf_hash();
        leaf == self.leaf_hash && self.proof.verify(leaf, self.merkle_root)
    }
}

// ---------------------------------------------------------------------------
// SealedEpoch
// ---------------------------------------------------------------------------

/// Summary of a closed anchoring epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedEpoch {
    pub epoch_id: EpochId,
    pub root: Digest,
    pub leaf_count: usize,
    pub sealed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
