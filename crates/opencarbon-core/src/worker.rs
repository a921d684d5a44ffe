//! Background settlement worker.
//!
//! One task owns the async side of the core: it holds each accepted
//! order's fill job until the pre-auth delay runs out and executes the
//! fill, runs the periodic sweep that expires stale orders (and seals
//! anchor epochs when the policy says so), and exits on shutdown or when
//! the job channel closes.
//!
//! Jobs carry a fixed delay, so arrival order is due order and a plain
//! queue suffices. The state lock is a std mutex, taken only inside
//! synchronous blocks and never held across an await.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use opencarbon_settlement::FillOutcome;
use opencarbon_types::{RegistryError, SettlementNotice};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use crate::registry_core::{CoreState, FillJob};

pub(crate) struct SettlementWorker {
    state: Arc<Mutex<CoreState>>,
    jobs_rx: mpsc::UnboundedReceiver<FillJob>,
    shutdown_rx: watch::Receiver<bool>,
    notice_tx: mpsc::UnboundedSender<SettlementNotice>,
    sweep_interval: Duration,
    pending: VecDeque<FillJob>,
}

impl SettlementWorker {
    pub(crate) fn new(
        state: Arc<Mutex<CoreState>>,
        jobs_rx: mpsc::UnboundedReceiver<FillJob>,
        shutdown_rx: watch::Receiver<bool>,
        notice_tx: mpsc::UnboundedSender<SettlementNotice>,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            state,
            jobs_rx,
            shutdown_rx,
            notice_tx,
            sweep_interval,
            pending: VecDeque::new(),
        }
    }

    pub(crate) async fn run(mut self) {
        let mut sweep = tokio::time::interval(self.sweep_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Push the first tick out a full interval.
        sweep.reset();

        tracing::debug!("Settlement worker started");
        loop {
            if *self.shutdown_rx.borrow() {
                break;
            }
            tokio::select! {
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        break;
                    }
                }
                job = self.jobs_rx.recv() => {
                    match job {
                        Some(job) => self.pending.push_back(job),
                        // All senders gone: the core was dropped.
                        None => break,
                    }
                }
                () = Self::next_due(self.pending.front()) => {
                    if let Some(job) = self.pending.pop_front() {
                        self.fill(job);
                    }
                }
                _ = sweep.tick() => {
                    self.sweep();
                }
            }
        }
        if !self.pending.is_empty() {
            tracing::debug!(count = self.pending.len(), "Abandoning pending fill jobs");
        }
        tracing::debug!("Settlement worker stopped");
    }

    /// Resolves when the front job comes due; never resolves while the
    /// queue is empty.
    async fn next_due(job: Option<&FillJob>) {
        match job {
            Some(job) => tokio::time::sleep_until(job.due).await,
            None => std::future::pending().await,
        }
    }

    fn fill(&self, job: FillJob) {
        let outcome = {
            let mut state = self.state.lock().expect("core state lock poisoned");
            let state = &mut *state;
            state
                .settlement
                .fill(&mut state.audit, job.order_id, Utc::now())
        };
        match outcome {
            Ok(FillOutcome::Filled(notice)) => {
                tracing::info!(
                    order = %notice.order_id,
                    owner = %notice.owner,
                    delta = %notice.delta,
                    "Order filled"
                );
                let _ = self.notice_tx.send(notice);
            }
            Ok(FillOutcome::AlreadyTerminal(status)) => {
                tracing::debug!(order = %job.order_id, status = %status, "Fill skipped");
            }
            Ok(FillOutcome::Expired) => {
                tracing::info!(order = %job.order_id, "Order expired before fill");
            }
            Err(RegistryError::OrderNotFound(id)) => {
                tracing::warn!(order = %id, "Fill job for unknown order");
            }
            Err(err) => {
                tracing::warn!(order = %job.order_id, error = %err, "Fill failed");
            }
        }
    }

    fn sweep(&self) {
        let mut state = self.state.lock().expect("core state lock poisoned");
        let state = &mut *state;
        let swept = state.settlement.sweep_expired(&mut state.audit, Utc::now());
        if swept > 0 {
            tracing::info!(count = swept, "Swept expired orders");
        }
        if let Some(sealed) = state.retirement.sweep(&mut state.audit) {
            tracing::info!(epoch = %sealed.epoch_id, root = %sealed.root.short(), "Epoch sealed by sweep");
        }
    }
}
