//! Integration test: settlement worker
//!
//! SUBMIT → (pre-auth delay) → FILL
//!
//! Drives the async half of the core on tokio's paused clock: scheduled
//! fills, revocation before the fill, lazy expiry at fill time, the
//! periodic sweep, re-enqueue over existing stores, and shutdown. Order
//! expiry is wall time, so the expiry tests let a few real milliseconds
//! pass while the fake clock stands still.

use std::time::Duration;

use chrono::Utc;
use opencarbon_core::{CoreStores, RegistryCore};
use opencarbon_store::OrderStore;
use opencarbon_types::*;
use rust_decimal::Decimal;

fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

fn timed_config(fill_delay_ms: u64, sweep_interval_ms: u64) -> CoreConfig {
    let mut config = CoreConfig::default();
    config.settlement = SettlementTiming {
        fill_delay_ms,
        sweep_interval_ms,
    };
    config
}

#[tokio::test(start_paused = true)]
async fn order_fills_after_preauth_delay() {
    let core = RegistryCore::new(timed_config(3_000, 60_000)).unwrap();
    let mut notices = core.take_settlement_notices().unwrap();
    assert!(
        core.take_settlement_notices().is_none(),
        "Receiver is handed out once"
    );

    let start = tokio::time::Instant::now();
    let order = core
        .submit_order(OrderSpec::dummy("rAlice", "AMZ-F23"))
        .unwrap();
    assert_eq!(order.status, OrderStatus::Active);

    let notice = notices.recv().await.unwrap();
    assert!(
        start.elapsed() >= Duration::from_secs(3),
        "Fill waits out the pre-auth delay"
    );
    assert_eq!(notice.order_id, order.id);
    assert_eq!(notice.owner, HolderAddress::new("rAlice"));
    assert_eq!(notice.delta, dec(100), "Buy fills credit the owner");

    assert_eq!(core.get_order(order.id).unwrap().status, OrderStatus::Filled);

    let mut events: Vec<_> = core
        .audit_log()
        .into_iter()
        .map(|entry| entry.event_type)
        .collect();
    events.reverse();
    assert_eq!(
        events,
        vec![
            AuditEventType::PreauthReceived,
            AuditEventType::SettlementExecuted,
        ]
    );
    core.verify_audit_chain().unwrap();
    core.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn revoked_order_is_never_filled() {
    let core = RegistryCore::new(timed_config(3_000, 60_000)).unwrap();
    let mut notices = core.take_settlement_notices().unwrap();

    let order = core
        .submit_order(OrderSpec::dummy("rAlice", "AMZ-F23"))
        .unwrap();
    let revoked = core.revoke_order(order.id).unwrap();
    assert_eq!(revoked.status, OrderStatus::Revoked);

    // Past the pre-auth delay the fill job finds a terminal order.
    tokio::time::sleep(Duration::from_secs(4)).await;

    assert_eq!(core.get_order(order.id).unwrap().status, OrderStatus::Revoked);
    assert!(
        notices.try_recv().is_err(),
        "No settlement notice for a revoked order"
    );

    let err = core.revoke_order(order.id).unwrap_err();
    assert!(matches!(
        err,
        RegistryError::OrderNotActive {
            status: OrderStatus::Revoked
        }
    ));

    let events: Vec<_> = core
        .audit_log()
        .into_iter()
        .map(|entry| entry.event_type)
        .collect();
    assert!(!events.contains(&AuditEventType::SettlementExecuted));
    assert!(events.contains(&AuditEventType::PreauthRevoked));
    core.verify_audit_chain().unwrap();
    core.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn expired_order_lazily_expires_at_fill_time() {
    let core = RegistryCore::new(timed_config(3_000, 600_000)).unwrap();
    let mut notices = core.take_settlement_notices().unwrap();

    let mut spec = OrderSpec::dummy("rAlice", "AMZ-F23");
    spec.expiry = Utc::now() + chrono::Duration::milliseconds(30);
    let order = core.submit_order(spec).unwrap();

    // Let the wall-clock expiry pass, then the fake pre-auth delay.
    std::thread::sleep(Duration::from_millis(60));
    tokio::time::sleep(Duration::from_secs(4)).await;

    assert_eq!(core.get_order(order.id).unwrap().status, OrderStatus::Expired);
    assert!(notices.try_recv().is_err());

    let events: Vec<_> = core
        .audit_log()
        .into_iter()
        .map(|entry| entry.event_type)
        .collect();
    assert!(events.contains(&AuditEventType::PreauthExpired));
    assert!(!events.contains(&AuditEventType::SettlementExecuted));
    core.verify_audit_chain().unwrap();
    core.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn stale_orders_expire_on_sweep() {
    // Fill scheduled far out; the sweep gets there first.
    let core = RegistryCore::new(timed_config(600_000, 1_000)).unwrap();
    let mut notices = core.take_settlement_notices().unwrap();

    let mut spec = OrderSpec::dummy("rBob", "AMZ-F23");
    spec.expiry = Utc::now() + chrono::Duration::milliseconds(30);
    let order = core.submit_order(spec).unwrap();

    std::thread::sleep(Duration::from_millis(60));
    tokio::time::sleep(Duration::from_millis(1_500)).await;

    assert_eq!(core.get_order(order.id).unwrap().status, OrderStatus::Expired);
    assert!(notices.try_recv().is_err());

    let events: Vec<_> = core
        .audit_log()
        .into_iter()
        .map(|entry| entry.event_type)
        .collect();
    assert!(events.contains(&AuditEventType::PreauthExpired));
    core.verify_audit_chain().unwrap();
    core.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn active_orders_reenqueue_on_restart() {
    let mut stores = CoreStores::default();
    let order = PreAuthOrder::dummy("rAlice", "AMZ-F23");
    let order_id = order.id;
    stores.orders.put(order);

    let mut settled = PreAuthOrder::dummy("rBob", "AMZ-F23");
    settled.status = OrderStatus::Filled;
    let settled_id = settled.id;
    stores.orders.put(settled);

    let core = RegistryCore::with_stores(timed_config(3_000, 60_000), stores).unwrap();
    let mut notices = core.take_settlement_notices().unwrap();

    let notice = notices.recv().await.unwrap();
    assert_eq!(notice.order_id, order_id, "Only the ACTIVE order is re-enqueued");
    assert_eq!(core.get_order(order_id).unwrap().status, OrderStatus::Filled);

    // The already-settled order produced no second notice.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(notices.try_recv().is_err());
    assert_eq!(
        core.get_order(settled_id).unwrap().status,
        OrderStatus::Filled
    );
    core.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_abandons_pending_fills() {
    let core = RegistryCore::new(timed_config(3_000, 60_000)).unwrap();
    let mut notices = core.take_settlement_notices().unwrap();

    let order = core
        .submit_order(OrderSpec::dummy("rAlice", "AMZ-F23"))
        .unwrap();
    core.shutdown().await;

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(
        core.get_order(order.id).unwrap().status,
        OrderStatus::Active,
        "Abandoned fills leave the order ACTIVE"
    );
    assert!(notices.try_recv().is_err());

    // Submitting after shutdown still records the order; it never fills.
    let late = core
        .submit_order(OrderSpec::dummy("rBob", "AMZ-F23"))
        .unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(core.get_order(late.id).unwrap().status, OrderStatus::Active);
}

#[tokio::test(start_paused = true)]
async fn sweep_seals_epoch_when_policy_enabled() {
    let mut config = timed_config(600_000, 1_000);
    config.anchoring = AnchorPolicy {
        max_leaves_per_epoch: 1_024,
        seal_on_sweep: true,
    };
    let core = RegistryCore::new(config).unwrap();
    let alice = HolderAddress::new("rAlice");

    let mut spec = BatchSpec::dummy("AMZ-F23");
    spec.initial_state = TokenState::Issued;
    let batch = core.create_batch(spec).unwrap();
    core.transition_batch(batch.id, TokenState::Authorized, "registry review passed")
        .unwrap();
    core.credit_holder(&alice, &batch.token_ticker, dec(1_000))
        .unwrap();

    let record = core
        .retire(batch.id, &alice, dec(75), "offset claim Q3")
        .unwrap();
    assert_eq!(record.epoch_id, EpochId(0));
    assert!(core.sealed_epochs().is_empty());

    tokio::time::sleep(Duration::from_millis(1_500)).await;

    let sealed = core.sealed_epochs();
    assert_eq!(sealed.len(), 1);
    assert_eq!(sealed[0].epoch_id, EpochId(0));
    assert_eq!(sealed[0].leaf_count, 1);
    assert_eq!(sealed[0].root, record.leaf_hash);

    let second = core
        .retire(batch.id, &alice, dec(25), "offset claim Q4")
        .unwrap();
    assert_eq!(
        second.epoch_id,
        EpochId(1),
        "Retirements land in the next epoch after a seal"
    );
    assert_eq!(
        core.verify_certificate(record.certificate_id),
        Some(true),
        "Certificates stay verifiable after their epoch seals"
    );
    core.shutdown().await;
}
