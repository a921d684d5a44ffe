//! Pre-auth settlement engine.
//!
//! Orders arrive with a delegated-authorization token and settle later,
//! driven by the background worker. The engine itself is synchronous; the
//! worker calls [`SettlementEngine::fill`] when a job comes due and
//! [`SettlementEngine::sweep_expired`] on its periodic tick.
//!
//! Fill is idempotent by construction: a terminal order produces a no-op
//! outcome with no audit entry and no notice, so a revoked or already
//! settled order can be "filled" any number of times without side effects.

use chrono::{DateTime, Utc};
use opencarbon_audit::AuditTrail;
use opencarbon_store::{AuditStore, OrderStore};
use opencarbon_types::{
    AuditEventType, HolderAddress, OrderId, OrderSpec, OrderStatus, PreAuthOrder, RegistryError,
    Result, SettlementNotice, TokenTicker,
};
use rust_decimal::Decimal;

/// What a fill attempt did.
#[derive(Debug, Clone, PartialEq)]
pub enum FillOutcome {
    /// Order settled; forward exactly this one notice.
    Filled(SettlementNotice),
    /// Order was already terminal. Nothing happened.
    AlreadyTerminal(OrderStatus),
    /// Order was past expiry; it is now `EXPIRED`.
    Expired,
}

/// Owns pre-auth orders and their settlement.
#[derive(Debug)]
pub struct SettlementEngine<S: OrderStore> {
    store: S,
}

impl<S: OrderStore> SettlementEngine<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Accept a pre-auth order. The order is stored `ACTIVE`; scheduling
    /// the fill job is the caller's business.
    ///
    /// # Errors
    /// Returns `InvalidOrderSpec` when validation fails.
    pub fn submit<A: AuditStore>(
        &mut self,
        audit: &mut AuditTrail<A>,
        spec: OrderSpec,
    ) -> Result<PreAuthOrder> {
        Self::validate_spec(&spec)?;

        let order = PreAuthOrder {
            id: OrderId::new(),
            owner: spec.owner,
            side: spec.side,
            ticker: TokenTicker::new(spec.ticker.as_str()),
            amount: spec.amount,
            limit_price: spec.limit_price,
            expiry: spec.expiry,
            signature: spec.signature,
            status: OrderStatus::Active,
            created_at: Utc::now(),
        };
        self.store.put(order.clone());

        audit.append(
            AuditEventType::PreauthReceived,
            order.id.to_string(),
            format!(
                "Pre-auth {} {} t of {} from {}",
                order.side, order.amount, order.ticker, order.owner
            ),
        );
        tracing::info!(
            order = %order.id,
            owner = %order.owner,
            side = %order.side,
            ticker = %order.ticker,
            amount = %order.amount,
            expiry = %order.expiry,
            "Pre-auth order accepted"
        );
        Ok(order)
    }

    /// Execute a due fill.
    ///
    /// Terminal orders no-op; active-but-expired orders flip to `EXPIRED`
    /// (lazy expiry); active unexpired orders settle and produce the one
    /// notice for the wallet-facing layer.
    ///
    /// # Errors
    /// Returns `OrderNotFound` for unknown ids.
    pub fn fill<A: AuditStore>(
        &mut self,
        audit: &mut AuditTrail<A>,
        id: OrderId,
        now: DateTime<Utc>,
    ) -> Result<FillOutcome> {
        let mut order = self.store.get(id).ok_or(RegistryError::OrderNotFound(id))?;

        if order.status.is_terminal() {
            tracing::debug!(order = %id, status = %order.status, "Fill no-op on terminal order");
            return Ok(FillOutcome::AlreadyTerminal(order.status));
        }

        if order.is_expired(now) {
            order.mark_expired()?;
            self.store.put(order.clone());
            audit.append(
                AuditEventType::PreauthExpired,
                id.to_string(),
                format!(
                    "Order expired unfilled ({} {} t of {})",
                    order.side, order.amount, order.ticker
                ),
            );
            tracing::info!(order = %id, expiry = %order.expiry, "Order expired at fill time");
            return Ok(FillOutcome::Expired);
        }

        order.mark_filled()?;
        self.store.put(order.clone());

        let notice = SettlementNotice {
            order_id: order.id,
            owner: order.owner.clone(),
            side: order.side,
            ticker: order.ticker.clone(),
            amount: order.amount,
            delta: order.side.signed(order.amount),
            executed_at: now,
        };
        audit.append(
            AuditEventType::SettlementExecuted,
            id.to_string(),
            format!(
                "Settled {} {} t of {} for {} (delta {})",
                order.side, order.amount, order.ticker, order.owner, notice.delta
            ),
        );
        tracing::info!(
            order = %id,
            owner = %order.owner,
            delta = %notice.delta,
            "Order settled"
        );
        Ok(FillOutcome::Filled(notice))
    }

    /// Cancel an order before settlement.
    ///
    /// # Errors
    /// - `OrderNotFound` for unknown ids
    /// - `OrderNotActive` when the order already reached a terminal status
    pub fn revoke<A: AuditStore>(
        &mut self,
        audit: &mut AuditTrail<A>,
        id: OrderId,
    ) -> Result<PreAuthOrder> {
        let mut order = self.store.get(id).ok_or(RegistryError::OrderNotFound(id))?;
        order.mark_revoked()?;
        self.store.put(order.clone());

        audit.append(
            AuditEventType::PreauthRevoked,
            id.to_string(),
            format!("Pre-auth revoked by {} before settlement", order.owner),
        );
        tracing::info!(order = %id, owner = %order.owner, "Order revoked");
        Ok(order)
    }

    /// Expire every `ACTIVE` order past its expiry. Returns how many
    /// flipped.
    pub fn sweep_expired<A: AuditStore>(
        &mut self,
        audit: &mut AuditTrail<A>,
        now: DateTime<Utc>,
    ) -> usize {
        let mut swept = 0;
        for mut order in self.store.all() {
            if order.status != OrderStatus::Active || !order.is_expired(now) {
                continue;
            }
            if order.mark_expired().is_err() {
                continue;
            }
            self.store.put(order.clone());
            audit.append(
                AuditEventType::PreauthExpired,
                order.id.to_string(),
                format!(
                    "Order expired unfilled ({} {} t of {})",
                    order.side, order.amount, order.ticker
                ),
            );
            swept += 1;
        }
        if swept > 0 {
            tracing::info!(swept, "Sweep expired stale orders");
        }
        swept
    }

    #[must_use]
    pub fn get(&self, id: OrderId) -> Option<PreAuthOrder> {
        self.store.get(id)
    }

    /// All orders, most recent first.
    #[must_use]
    pub fn list(&self) -> Vec<PreAuthOrder> {
        let mut all = self.store.all();
        all.reverse();
        all
    }

    /// One owner's orders, most recent first.
    #[must_use]
    pub fn list_for(&self, owner: &HolderAddress) -> Vec<PreAuthOrder> {
        self.list()
            .into_iter()
            .filter(|order| order.owner == *owner)
            .collect()
    }

    /// IDs of all `ACTIVE` orders, oldest first. The worker re-enqueues
    /// these on start.
    #[must_use]
    pub fn active_order_ids(&self) -> Vec<OrderId> {
        self.store
            .all()
            .into_iter()
            .filter(|order| order.status == OrderStatus::Active)
            .map(|order| order.id)
            .collect()
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

    fn validate_spec(spec: &OrderSpec) -> Result<()> {
        if spec.amount <= Decimal::ZERO {
            return Err(RegistryError::InvalidOrderSpec {
                reason: "amount must be positive".to_string(),
            });
        }
        if spec.limit_price <= Decimal::ZERO {
            return Err(RegistryError::InvalidOrderSpec {
                reason: "limit price must be positive".to_string(),
            });
        }
        if spec.expiry <= Utc::now() {
            return Err(RegistryError::InvalidOrderSpec {
                reason: "expiry must be in the future".to_string(),
            });
        }
        if spec.signature.trim().is_empty() {
            return Err(RegistryError::InvalidOrderSpec {
                reason: "pre-auth signature must not be empty".to_string(),
            });
        }
        if spec.ticker.as_str().trim().is_empty() {
            return Err(RegistryError::InvalidOrderSpec {
                reason: "ticker must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
