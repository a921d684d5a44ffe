//! Integration test: retirement anchoring
//!
//! RETIRE → ANCHOR → VERIFY
//!
//! Epoch capacity rollover, proof verification as epochs grow, and the
//! atomicity of failed retirements, all through the facade.

use opencarbon_core::RegistryCore;
use opencarbon_types::*;
use rust_decimal::Decimal;

fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

fn capped_config(max_leaves: usize) -> CoreConfig {
    let mut config = CoreConfig::default();
    config.anchoring.max_leaves_per_epoch = max_leaves;
    config
}

/// An `AUTHORIZED` batch whose full supply sits in `holder`'s wallet.
fn authorized_batch(
    core: &RegistryCore,
    ticker: &str,
    holder: &HolderAddress,
    tons: i64,
) -> Batch {
    let mut spec = BatchSpec::dummy(ticker);
    spec.initial_state = TokenState::Issued;
    spec.total_tons = dec(tons);
    let batch = core.create_batch(spec).unwrap();
    core.credit_holder(holder, &batch.token_ticker, dec(tons))
        .unwrap();
    core.transition_batch(batch.id, TokenState::Authorized, "registry review passed")
        .unwrap()
}

#[tokio::test]
async fn epochs_roll_at_capacity_and_all_proofs_hold() {
    let core = RegistryCore::new(capped_config(3)).unwrap();
    let alice = HolderAddress::new("rAlice");
    let batch = authorized_batch(&core, "AMZ-F23", &alice, 10_000);

    let mut records = Vec::new();
    for i in 0..8i64 {
        let record = core
            .retire(batch.id, &alice, dec(10 + i), &format!("offset tranche {i}"))
            .unwrap();
        records.push(record);
    }

    // Eight leaves at capacity 3: epochs 0 and 1 sealed, epoch 2 open.
    let sealed = core.sealed_epochs();
    assert_eq!(sealed.len(), 2);
    assert_eq!(sealed[0].epoch_id, EpochId(0));
    assert_eq!(sealed[1].epoch_id, EpochId(1));
    assert!(sealed.iter().all(|epoch| epoch.leaf_count == 3));
    assert_ne!(sealed[0].root, sealed[1].root);

    let expected_epochs = [0u64, 0, 0, 1, 1, 1, 2, 2];
    for (record, expected) in records.iter().zip(expected_epochs) {
        assert_eq!(record.epoch_id, EpochId(expected));
        assert_eq!(
            core.verify_certificate(record.certificate_id),
            Some(true),
            "Certificate {} must verify",
            record.certificate_id
        );
    }

    // 10 + 11 + .. + 17 tons burned.
    assert_eq!(core.balance(&alice, &batch.token_ticker), dec(10_000 - 108));
    let listed = core.list_retirements();
    assert_eq!(listed.len(), 8);
    assert_eq!(listed[0].amount, dec(17), "Listings are newest first");
    assert_eq!(core.retirements_for(&alice).len(), 8);

    core.verify_audit_chain().unwrap();
    core.shutdown().await;
}

#[tokio::test]
async fn roots_commit_to_leaf_order() {
    let core = RegistryCore::new(CoreConfig::default()).unwrap();
    let alice = HolderAddress::new("rAlice");
    let batch = authorized_batch(&core, "MNGRV24", &alice, 1_000);

    let first = core.retire(batch.id, &alice, dec(100), "offset A").unwrap();
    let second = core.retire(batch.id, &alice, dec(200), "offset B").unwrap();

    assert_eq!(
        first.merkle_root, first.leaf_hash,
        "A single leaf is its own root"
    );
    assert!(first.proof.siblings.is_empty());
    assert_eq!(second.proof.leaf_index, 1);
    assert_eq!(second.proof.siblings, vec![first.leaf_hash]);
    assert_eq!(
        second.merkle_root,
        Digest::combine(&first.leaf_hash, &second.leaf_hash),
        "Two-leaf root hashes the pair in order"
    );

    assert_eq!(core.verify_certificate(first.certificate_id), Some(true));
    assert_eq!(core.verify_certificate(second.certificate_id), Some(true));
    assert_eq!(
        core.verify_certificate(CertificateId::new()),
        None,
        "Unknown certificates verify to None"
    );

    core.shutdown().await;
}

#[tokio::test]
async fn failed_retirement_leaves_no_trace() {
    let core = RegistryCore::new(CoreConfig::default()).unwrap();
    let alice = HolderAddress::new("rAlice");
    let batch = authorized_batch(&core, "AMZ-F23", &alice, 500);

    let audit_len = core.audit_log().len();
    let err = core
        .retire(batch.id, &alice, dec(800), "overdraw")
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::InsufficientBalance { needed, available }
            if needed == dec(800) && available == dec(500)
    ));

    assert_eq!(core.balance(&alice, &batch.token_ticker), dec(500));
    assert!(core.list_retirements().is_empty());
    assert_eq!(
        core.audit_log().len(),
        audit_len,
        "A refused burn appends nothing"
    );
    core.verify_audit_chain().unwrap();
    core.shutdown().await;
}
