//! The `RegistryCore` facade.
//!
//! One struct wires every component behind a single lock: batch registry,
//! uniqueness guard, tokenization workflow, retirement service, settlement
//! engine, balance ledger, and the shared audit trail. Callers get a
//! synchronous request/response API; the only async pieces are the
//! background settlement worker and `shutdown`.
//!
//! Locking: all state sits in one `Mutex<CoreState>` taken per operation.
//! Components mutate shared records (a fill and a retirement both touch
//! the audit trail), so the coarse lock is what makes cross-component
//! operations atomic. The mutex poisons if an audit payload ever fails to
//! serialize, and the core then refuses further writes.

use std::sync::{Arc, Mutex, MutexGuard};

use opencarbon_audit::AuditTrail;
use opencarbon_registry::{BatchRegistry, TokenizationWorkflow, UniquenessGuard};
use opencarbon_retirement::RetirementService;
use opencarbon_settlement::SettlementEngine;
use opencarbon_store::{
    BalanceStore, MemoryAuditStore, MemoryBalanceLedger, MemoryBatchStore, MemoryOrderStore,
    MemoryRequestStore, MemoryRetirementStore,
};
use opencarbon_types::{
    AuditLogEntry, Batch, BatchId, BatchSpec, CertificateId, CoreConfig, HolderAddress, OrderId,
    OrderSpec, PreAuthOrder, RegistryError, RequestId, RequestSpec, Result, RetirementRecord,
    SealedEpoch, SettlementNotice, TokenState, TokenTicker, TokenizationRequest, constants,
};
use rust_decimal::Decimal;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::worker::SettlementWorker;

// ---------------------------------------------------------------------------
// CoreStores
// ---------------------------------------------------------------------------

/// Backing stores for a core instance.
///
/// `Default` gives empty in-memory stores. Pre-populated stores exercise
/// the recovery paths: the audit trail resumes from its tail, the
/// retirement service replays the open epoch, and active orders get their
/// fill jobs re-enqueued.
#[derive(Debug, Default)]
pub struct CoreStores {
    pub batches: MemoryBatchStore,
    pub orders: MemoryOrderStore,
    pub requests: MemoryRequestStore,
    pub retirements: MemoryRetirementStore,
    pub audit: MemoryAuditStore,
    pub ledger: MemoryBalanceLedger,
}

// ---------------------------------------------------------------------------
// CoreState
// ---------------------------------------------------------------------------

/// Everything behind the lock.
#[derive(Debug)]
pub(crate) struct CoreState {
    pub(crate) registry: BatchRegistry<MemoryBatchStore>,
    pub(crate) guard: UniquenessGuard,
    pub(crate) workflow: TokenizationWorkflow<MemoryRequestStore>,
    pub(crate) retirement: RetirementService<MemoryRetirementStore>,
    pub(crate) settlement: SettlementEngine<MemoryOrderStore>,
    pub(crate) ledger: MemoryBalanceLedger,
    pub(crate) audit: AuditTrail<MemoryAuditStore>,
}

/// A scheduled fill, due at `due`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FillJob {
    pub(crate) order_id: OrderId,
    pub(crate) due: Instant,
}

// ---------------------------------------------------------------------------
// RegistryCore
// ---------------------------------------------------------------------------

/// The registry and settlement core.
///
/// Construction spawns the settlement worker, so a tokio runtime must be
/// current. Dropping the core without [`RegistryCore::shutdown`] closes
/// the job channel and the worker exits on its own.
#[derive(Debug)]
pub struct RegistryCore {
    state: Arc<Mutex<CoreState>>,
    config: CoreConfig,
    jobs_tx: mpsc::UnboundedSender<FillJob>,
    shutdown_tx: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
    notices: Mutex<Option<mpsc::UnboundedReceiver<SettlementNotice>>>,
}

impl RegistryCore {
    /// Start a core with empty in-memory stores.
    ///
    /// # Errors
    /// Returns `Configuration` when the config fails validation.
    pub fn new(config: CoreConfig) -> Result<Self> {
        Self::with_stores(config, CoreStores::default())
    }

    /// Start a core over existing stores.
    ///
    /// # Errors
    /// Returns `Configuration` when the config fails validation.
    pub fn with_stores(config: CoreConfig, stores: CoreStores) -> Result<Self> {
        config.validate()?;

        let state = Arc::new(Mutex::new(CoreState {
            registry: BatchRegistry::new(stores.batches),
            guard: UniquenessGuard::new(),
            workflow: TokenizationWorkflow::new(stores.requests),
            retirement: RetirementService::new(stores.retirements, config.anchoring.clone()),
            settlement: SettlementEngine::new(stores.orders),
            ledger: stores.ledger,
            audit: AuditTrail::new(stores.audit),
        }));

        let (jobs_tx, jobs_rx) = mpsc::unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Orders that were ACTIVE in the store get their fill jobs back.
        let active = state
            .lock()
            .expect("core state lock poisoned")
            .settlement
            .active_order_ids();
        if !active.is_empty() {
            tracing::info!(count = active.len(), "Re-enqueuing active orders");
        }
        let due = Instant::now() + config.settlement.fill_delay();
        for order_id in active {
            let _ = jobs_tx.send(FillJob { order_id, due });
        }

        let worker = SettlementWorker::new(
            Arc::clone(&state),
            jobs_rx,
            shutdown_rx,
            notice_tx,
            config.settlement.sweep_interval(),
        );
        let handle = tokio::spawn(worker.run());

        tracing::info!(
            version = constants::VERSION,
            fill_delay_ms = config.settlement.fill_delay_ms,
            sweep_interval_ms = config.settlement.sweep_interval_ms,
            "{} core started",
            constants::CORE_NAME
        );
        Ok(Self {
            state,
            config,
            jobs_tx,
            shutdown_tx,
            worker: Mutex::new(Some(handle)),
            notices: Mutex::new(Some(notice_rx)),
        })
    }

    #[must_use]
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    // -----------------------------------------------------------------
    // Registry
    // -----------------------------------------------------------------

    /// Register a batch. Uniqueness is deliberately not enforced here;
    /// draft creation stays open while issuer flows go through
    /// [`RegistryCore::check_uniqueness`] or the approval workflow.
    pub fn create_batch(&self, spec: BatchSpec) -> Result<Batch> {
        let mut state = self.lock();
        let state = &mut *state;
        state.registry.create_batch(&mut state.audit, spec)
    }

    /// Move a batch through its lifecycle state machine.
    pub fn transition_batch(
        &self,
        batch_id: BatchId,
        target: TokenState,
        reason: &str,
    ) -> Result<Batch> {
        let mut state = self.lock();
        let state = &mut *state;
        state
            .registry
            .transition(&mut state.audit, batch_id, target, reason)
    }

    /// Append an MRV document reference to a batch.
    pub fn attach_mrv_report(&self, batch_id: BatchId, reference: &str) -> Result<Batch> {
        let mut state = self.lock();
        let state = &mut *state;
        state
            .registry
            .attach_mrv_report(&mut state.audit, batch_id, reference)
    }

    /// Whether `ticker` is already registered. `true` means a duplicate
    /// exists; the vintage is accepted and ignored by policy.
    #[must_use]
    pub fn check_uniqueness(&self, ticker: &TokenTicker, vintage: &str) -> bool {
        let state = self.lock();
        state.guard.is_duplicate(&state.registry, ticker, vintage)
    }

    #[must_use]
    pub fn get_batch(&self, batch_id: BatchId) -> Option<Batch> {
        self.lock().registry.get(batch_id)
    }

    /// All batches, most recent first.
    #[must_use]
    pub fn list_batches(&self) -> Vec<Batch> {
        self.lock().registry.list()
    }

    // -----------------------------------------------------------------
    // Retirement
    // -----------------------------------------------------------------

    /// Burn `amount` tons of the batch's credits held by `holder` and
    /// anchor a retirement certificate.
    pub fn retire(
        &self,
        batch_id: BatchId,
        holder: &HolderAddress,
        amount: Decimal,
        purpose: &str,
    ) -> Result<RetirementRecord> {
        let mut state = self.lock();
        let state = &mut *state;
        state.retirement.retire(
            &mut state.audit,
            &state.registry,
            &mut state.ledger,
            batch_id,
            holder,
            amount,
            purpose,
        )
    }

    /// All retirement certificates, most recent first.
    #[must_use]
    pub fn list_retirements(&self) -> Vec<RetirementRecord> {
        self.lock().retirement.records()
    }

    /// One holder's certificates, most recent first.
    #[must_use]
    pub fn retirements_for(&self, holder: &HolderAddress) -> Vec<RetirementRecord> {
        self.lock().retirement.records_for(holder)
    }

    #[must_use]
    pub fn find_certificate(&self, id: CertificateId) -> Option<RetirementRecord> {
        self.lock().retirement.find(id)
    }

    /// Recompute a certificate's leaf and check its inclusion proof.
    /// `None` for unknown certificates.
    #[must_use]
    pub fn verify_certificate(&self, id: CertificateId) -> Option<bool> {
        self.lock().retirement.verify(id)
    }

    #[must_use]
    pub fn sealed_epochs(&self) -> Vec<SealedEpoch> {
        self.lock().retirement.sealed_epochs()
    }

    // -----------------------------------------------------------------
    // Settlement
    // -----------------------------------------------------------------

    /// Accept a pre-auth order and schedule its fill after the configured
    /// delay.
    pub fn submit_order(&self, spec: OrderSpec) -> Result<PreAuthOrder> {
        let order = {
            let mut state = self.lock();
            let state = &mut *state;
            state.settlement.submit(&mut state.audit, spec)?
        };
        let due = Instant::now() + self.config.settlement.fill_delay();
        if self
            .jobs_tx
            .send(FillJob {
                order_id: order.id,
                due,
            })
            .is_err()
        {
            tracing::warn!(order = %order.id, "Worker not running; fill job dropped");
        }
        Ok(order)
    }

    /// Cancel an order before its fill executes. The pending fill job
    /// later finds the terminal status and no-ops.
    pub fn revoke_order(&self, order_id: OrderId) -> Result<PreAuthOrder> {
        let mut state = self.lock();
        let state = &mut *state;
        state.settlement.revoke(&mut state.audit, order_id)
    }

    #[must_use]
    pub fn get_order(&self, order_id: OrderId) -> Option<PreAuthOrder> {
        self.lock().settlement.get(order_id)
    }

    /// All orders, most recent first.
    #[must_use]
    pub fn list_orders(&self) -> Vec<PreAuthOrder> {
        self.lock().settlement.list()
    }

    /// One owner's orders, most recent first.
    #[must_use]
    pub fn orders_for(&self, owner: &HolderAddress) -> Vec<PreAuthOrder> {
        self.lock().settlement.list_for(owner)
    }

    /// Hand out the settlement notice receiver. The first caller gets it;
    /// afterwards `None`.
    #[must_use]
    pub fn take_settlement_notices(&self) -> Option<mpsc::UnboundedReceiver<SettlementNotice>> {
        self.notices
            .lock()
            .expect("notice receiver lock poisoned")
            .take()
    }

    // -----------------------------------------------------------------
    // Tokenization workflow
    // -----------------------------------------------------------------

    /// File a tokenization request.
    pub fn submit_request(&self, spec: RequestSpec) -> Result<TokenizationRequest> {
        let mut state = self.lock();
        let state = &mut *state;
        state.workflow.submit(&mut state.audit, spec)
    }

    /// Approve a pending request: uniqueness check, mint, issuance,
    /// ledger credit, and status flip as one locked unit.
    pub fn approve_request(&self, request_id: RequestId) -> Result<TokenizationRequest> {
        let mut state = self.lock();
        let state = &mut *state;
        state.workflow.approve(
            &mut state.audit,
            &mut state.registry,
            &state.guard,
            &mut state.ledger,
            request_id,
        )
    }

    /// Reject a pending request.
    pub fn reject_request(&self, request_id: RequestId, reason: &str) -> Result<TokenizationRequest> {
        let mut state = self.lock();
        let state = &mut *state;
        state.workflow.reject(&mut state.audit, request_id, reason)
    }

    #[must_use]
    pub fn get_request(&self, request_id: RequestId) -> Option<TokenizationRequest> {
        self.lock().workflow.get(request_id)
    }

    /// All requests, most recent first.
    #[must_use]
    pub fn list_requests(&self) -> Vec<TokenizationRequest> {
        self.lock().workflow.list()
    }

    /// Requests filed by one address, most recent first.
    #[must_use]
    pub fn requests_for(&self, requester: &HolderAddress) -> Vec<TokenizationRequest> {
        self.lock().workflow.list_for(requester)
    }

    // -----------------------------------------------------------------
    // Ledger
    // -----------------------------------------------------------------

    /// Available credits for a (holder, ticker) pair.
    #[must_use]
    pub fn balance(&self, holder: &HolderAddress, ticker: &TokenTicker) -> Decimal {
        self.lock().ledger.available(holder, ticker)
    }

    /// All non-zero holdings of a holder, sorted by ticker.
    #[must_use]
    pub fn holdings(&self, holder: &HolderAddress) -> Vec<(TokenTicker, Decimal)> {
        self.lock().ledger.holdings(holder)
    }

    /// Wallet-layer deposit sync: add credits to a holder's balance.
    ///
    /// # Errors
    /// Returns `InvalidDeposit` for a non-positive amount.
    pub fn credit_holder(
        &self,
        holder: &HolderAddress,
        ticker: &TokenTicker,
        amount: Decimal,
    ) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(RegistryError::InvalidDeposit {
                reason: "amount must be positive".to_string(),
            });
        }
        self.lock().ledger.credit(holder, ticker, amount);
        Ok(())
    }

    // -----------------------------------------------------------------
    // Audit
    // -----------------------------------------------------------------

    /// The audit log, most recent first.
    #[must_use]
    pub fn audit_log(&self) -> Vec<AuditLogEntry> {
        self.lock().audit.entries()
    }

    /// Walk the full chain.
    ///
    /// # Errors
    /// Returns `ChainCorrupted` on the first broken link or payload
    /// mismatch.
    pub fn verify_audit_chain(&self) -> Result<()> {
        self.lock().audit.verify()
    }

    // -----------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------

    /// Stop the settlement worker and wait for it to exit. Pending fill
    /// jobs are abandoned; the orders stay `ACTIVE` and are re-enqueued
    /// on the next start over the same stores.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let handle = self
            .worker
            .lock()
            .expect("worker handle lock poisoned")
            .take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                tracing::warn!(error = %err, "Settlement worker did not stop cleanly");
            }
            tracing::info!("{} core stopped", constants::CORE_NAME);
        }
    }

    fn lock(&self) -> MutexGuard<'_, CoreState> {
        self.state.lock().expect("core state lock poisoned")
    }
}
