//! Anchoring epochs: incremental merkle trees over retirement leaves.
//!
//! Each retirement appends one leaf to the open epoch; the root and the
//! leaf's inclusion proof are computed immediately so the certificate can
//! carry both. Odd levels duplicate their last node, which keeps every
//! leaf's sibling path total and makes [`MerkleProof::verify`]'s parity
//! walk sound at every index.

use opencarbon_types::{Digest, EpochId, MerkleProof};

/// An open anchoring epoch accumulating retirement leaves.
#[derive(Debug, Clone)]
pub struct AnchorEpoch {
    id: EpochId,
    leaves: Vec<Digest>,
}

impl AnchorEpoch {
    #[must_use]
    pub fn new(id: EpochId) -> Self {
        Self {
            id,
            leaves: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> EpochId {
        self.id
    }

    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Append a leaf and return its index within the epoch.
    pub fn push(&mut self, leaf: Digest) -> usize {
        self.leaves.push(leaf);
        self.leaves.len() - 1
    }

    /// Current root. `None` while the epoch has no leaves; for a single
    /// leaf the root is the leaf hash itself.
    #[must_use]
    pub fn root(&self) -> Option<Digest> {
        compute_root(&self.leaves)
    }

    /// Inclusion proof for the leaf at `leaf_index` against the current
    /// root. `None` when the index is out of range.
    #[must_use]
    pub fn proof(&self, leaf_index: usize) -> Option<MerkleProof> {
        compute_proof(&self.leaves, leaf_index)
    }
}

// ---------------------------------------------------------------------------
// Tree construction
// ---------------------------------------------------------------------------

/// Root over `leaves`, duplicating the last node on odd levels.
#[must_use]
pub fn compute_root(leaves: &[Digest]) -> Option<Digest> {
    if leaves.is_empty() {
        return None;
    }
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = next_level(&level);
    }
    Some(level[0])
}

/// Sibling path for `leaf_index` against the root over `leaves`.
#[must_use]
pub fn compute_proof(leaves: &[Digest], leaf_index: usize) -> Option<MerkleProof> {
    if leaf_index >= leaves.len() {
        return None;
    }
    let mut siblings = Vec::new();
    let mut level = leaves.to_vec();
    let mut index = leaf_index;
    while level.len() > 1 {
        let sibling_index = if index % 2 == 0 { index + 1 } else { index - 1 };
        // The duplicated last node is its own sibling.
        let sibling = level.get(sibling_index).copied().unwrap_or(level[index]);
        siblings.push(sibling);
        level = next_level(&level);
        index /= 2;
    }
    Some(MerkleProof {
        leaf_index,
        siblings,
    })
}

fn next_level(level: &[Digest]) -> Vec<Digest> {
    level
        .chunks(2)
        .map(|pair| {
            let right = pair.get(1).unwrap_or(&pair[0]);
            Digest::combine(&pair[0], right)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(n: u8) -> Digest {
        Digest::sha256(&[n])
    }

    fn epoch_with(n: u8) -> AnchorEpoch {
        let mut epoch = AnchorEpoch::new(EpochId(0));
        for i in 0..n {
            epoch.push(leaf(i));
        }
        epoch
    }

    #[test]
    fn empty_epoch_has_no_root() {
        let epoch = AnchorEpoch::new(EpochId(0));
        assert!(epoch.is_empty());
        assert!(epoch.root().is_none());
        assert!(epoch.proof(0).is_none());
    }

    #[test]
    fn single_leaf_root_is_leaf() {
        let epoch = epoch_with(1);
        assert_eq!(epoch.root(), Some(leaf(0)));
        let proof = epoch.proof(0).unwrap();
        assert!(proof.siblings.is_empty());
        assert!(proof.verify(leaf(0), epoch.root().unwrap()));
    }

    #[test]
    fn two_leaf_root() {
        let epoch = epoch_with(2);
        assert_eq!(epoch.root(), Some(Digest::combine(&leaf(0), &leaf(1))));
    }

    #[test]
    fn three_leaf_root_duplicates_last() {
        // Level 0: a b c  ->  Level 1: H(a,b) H(c,c)  ->  root.
        let epoch = epoch_with(3);
        let ab = Digest::combine(&leaf(0), &leaf(1));
        let cc = Digest::combine(&leaf(2), &leaf(2));
        assert_eq!(epoch.root(), Some(Digest::combine(&ab, &cc)));
    }

    #[test]
    fn five_leaf_root_by_hand() {
        let epoch = epoch_with(5);
        let ab = Digest::combine(&leaf(0), &leaf(1));
        let cd = Digest::combine(&leaf(2), &leaf(3));
        let ee = Digest::combine(&leaf(4), &leaf(4));
        let abcd = Digest::combine(&ab, &cd);
        let eeee = Digest::combine(&ee, &ee);
        assert_eq!(epoch.root(), Some(Digest::combine(&abcd, &eeee)));
    }

    #[test]
    fn every_proof_verifies_at_every_size() {
        for size in 1..=9u8 {
            let epoch = epoch_with(size);
            let root = epoch.root().unwrap();
            for index in 0..usize::from(size) {
                let proof = epoch.proof(index).unwrap();
                assert!(
                    proof.verify(leaf(index as u8), root),
                    "size {size}, index {index}"
                );
            }
        }
    }

    #[test]
    fn proof_rejects_wrong_leaf_and_wrong_root() {
        let epoch = epoch_with(4);
        let root = epoch.root().unwrap();
        let proof = epoch.proof(2).unwrap();
        assert!(proof.verify(leaf(2), root));
        assert!(!proof.verify(leaf(3), root));
        assert!(!proof.verify(leaf(2), leaf(0)));
    }

    #[test]
    fn earlier_proofs_do_not_survive_new_leaves() {
        // Proofs bind to the root at inclusion time. After the epoch grows
        // the old root changes, and certificates keep the old pair.
        let mut epoch = epoch_with(2);
        let old_root = epoch.root().unwrap();
        let old_proof = epoch.proof(0).unwrap();
        assert!(old_proof.verify(leaf(0), old_root));

        epoch.push(leaf(7));
        let new_root = epoch.root().unwrap();
        assert_ne!(old_root, new_root);
        assert!(!old_proof.verify(leaf(0), new_root));
        // The fresh proof for the same leaf verifies against the new root.
        assert!(epoch.proof(0).unwrap().verify(leaf(0), new_root));
    }

    #[test]
    fn push_returns_sequential_indexes() {
        let mut epoch = AnchorEpoch::new(EpochId(3));
        assert_eq!(epoch.push(leaf(0)), 0);
        assert_eq!(epoch.push(leaf(1)), 1);
        assert_eq!(epoch.push(leaf(2)), 2);
        assert_eq!(epoch.leaf_count(), 3);
        assert_eq!(epoch.id(), EpochId(3));
    }
}
