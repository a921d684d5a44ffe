//! Tokenization workflow: request intake and the approve/reject decision.
//!
//! Approval is the one operation that spans components. It mints a batch,
//! records the issuance, credits the requester's ledger balance, and flips
//! the request status as one logical unit. Every fallible check runs before
//! the first mutation, so a rejected approval leaves no trace beyond its
//! error.

use chrono::Utc;
use opencarbon_audit::AuditTrail;
use opencarbon_store::{AuditStore, BalanceStore, BatchStore, RequestStore};
use opencarbon_types::{
    AuditEventType, BatchSpec, HolderAddress, RegistryError, RequestId, RequestSpec, RequestStatus,
    Result, TokenState, TokenTicker, TokenizationRequest, constants,
};
use rust_decimal::Decimal;

use crate::registry::BatchRegistry;
use crate::uniqueness::UniquenessGuard;

/// Owns tokenization requests and drives their approval lifecycle.
#[derive(Debug)]
pub struct TokenizationWorkflow<S: RequestStore> {
    store: S,
}

impl<S: RequestStore> TokenizationWorkflow<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// File a new tokenization request. The request always enters `PENDING`,
    /// whatever the spec claims.
    ///
    /// # Errors
    /// Returns `InvalidRequestSpec` when validation fails.
    pub fn submit<A: AuditStore>(
        &mut self,
        audit: &mut AuditTrail<A>,
        spec: RequestSpec,
    ) -> Result<TokenizationRequest> {
        Self::validate_spec(&spec)?;

        let request = TokenizationRequest {
            id: RequestId::new(),
            requester_address: spec.requester_address,
            issuer_name: spec.issuer_name,
            project_name: spec.project_name,
            vintage: spec.vintage,
            amount: spec.amount,
            token_ticker: TokenTicker::new(spec.token_ticker.as_str()),
            documents_cid: spec.documents_cid,
            status: RequestStatus::Pending,
            timestamp: Utc::now(),
        };
        self.store.put(request.clone());

        audit.append(
            AuditEventType::TokenRequest,
            request.id.to_string(),
            format!(
                "Request from {} for {} t of {} via {}",
                request.requester_address, request.amount, request.token_ticker,
                request.issuer_name
            ),
        );
        tracing::info!(
            request = %request.id,
            requester = %request.requester_address,
            ticker = %request.token_ticker,
            amount = %request.amount,
            "Tokenization request submitted"
        );
        Ok(request)
    }

    /// Approve a pending request.
    ///
    /// 1. Load the request; it must be `PENDING`
    /// 2. Run the uniqueness guard against the registry
    /// 3. Mint an `ISSUED` batch sized to the requested amount
    /// 4. Record full issuance on the new batch
    /// 5. Credit the requester's ledger balance
    /// 6. Flip the request to `APPROVED` and audit the decision
    ///
    /// Steps 1-2 are the only fallible ones in practice; submit-time
    /// validation guarantees 3-4 succeed for any stored request, so a
    /// failure never strands a half-approved request.
    ///
    /// # Errors
    /// - `RequestNotFound` for unknown ids
    /// - `RequestNotPending` when the request was already decided
    /// - `DuplicateTicker` when the guard reports a collision
    pub fn approve<A: AuditStore, B: BatchStore, L: BalanceStore>(
        &mut self,
        audit: &mut AuditTrail<A>,
        registry: &mut BatchRegistry<B>,
        guard: &UniquenessGuard,
        ledger: &mut L,
        request_id: RequestId,
    ) -> Result<TokenizationRequest> {
        let mut request = self
            .store
            .get(request_id)
            .ok_or(RegistryError::RequestNotFound(request_id))?;
        if request.status != RequestStatus::Pending {
            return Err(RegistryError::RequestNotPending {
                status: request.status,
            });
        }
        if guard.is_duplicate(registry, &request.token_ticker, &request.vintage) {
            tracing::warn!(
                request = %request.id,
                ticker = %request.token_ticker,
                "Approval rejected: duplicate ticker"
            );
            return Err(RegistryError::DuplicateTicker(request.token_ticker.clone()));
        }

        let batch = registry.create_batch(
            audit,
            BatchSpec {
                project_id: request.id.to_string(),
                token_ticker: request.token_ticker.clone(),
                total_tons: request.amount,
                initial_state: TokenState::Issued,
                metadata_cid: request.documents_cid.clone(),
                mrv_reports: Vec::new(),
            },
        )?;
        registry.record_issuance(audit, batch.id, request.amount)?;
        ledger.credit(&request.requester_address, &batch.token_ticker, request.amount);

        request.status = RequestStatus::Approved;
        self.store.put(request.clone());

        audit.append(
            AuditEventType::TokenApproved,
            request.id.to_string(),
            format!(
                "Approved {} t of {} for {}; minted batch {}",
                request.amount, batch.token_ticker, request.requester_address, batch.id
            ),
        );
        tracing::info!(
            request = %request.id,
            batch = %batch.id,
            ticker = %batch.token_ticker,
            amount = %request.amount,
            "Tokenization request approved"
        );
        Ok(request)
    }

    /// Reject a pending request. An empty reason is allowed.
    ///
    /// # Errors
    /// - `RequestNotFound` for unknown ids
    /// - `RequestNotPending` when the request was already decided
    pub fn reject<A: AuditStore>(
        &mut self,
        audit: &mut AuditTrail<A>,
        request_id: RequestId,
        reason: &str,
    ) -> Result<TokenizationRequest> {
        let mut request = self
            .store
            .get(request_id)
            .ok_or(RegistryError::RequestNotFound(request_id))?;
        if request.status != RequestStatus::Pending {
            return Err(RegistryError::RequestNotPending {
                status: request.status,
            });
        }

        request.status = RequestStatus::Rejected;
        self.store.put(request.clone());

        let detail = if reason.trim().is_empty() {
            "no reason given"
        } else {
            reason
        };
        audit.append(
            AuditEventType::TokenRejected,
            request.id.to_string(),
            format!("Rejected request for {}: {detail}", request.token_ticker),
        );
        tracing::info!(request = %request.id, reason = detail, "Tokenization request rejected");
        Ok(request)
    }

    #[must_use]
    pub fn get(&self, id: RequestId) -> Option<TokenizationRequest> {
        self.store.get(id)
    }

    /// All requests, most recent first.
    #[must_use]
    pub fn list(&self) -> Vec<TokenizationRequest> {
        let mut all = self.store.all();
        all.reverse();
        all
    }

    /// Requests filed by one address, most recent first.
    #[must_use]
    pub fn list_for(&self, requester: &HolderAddress) -> Vec<TokenizationRequest> {
        self.list()
            .into_iter()
            .filter(|request| request.requester_address == *requester)
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

    fn validate_spec(spec: &RequestSpec) -> Result<()> {
        if spec.requester_address.as_str().trim().is_empty() {
            return Err(RegistryError::InvalidRequestSpec {
                reason: "requester address must not be empty".to_string(),
            });
        }
        if spec.project_name.trim().is_empty() {
            return Err(RegistryError::InvalidRequestSpec {
                reason: "project name must not be empty".to_string(),
            });
        }
        if spec.vintage.trim().is_empty() {
            return Err(RegistryError::InvalidRequestSpec {
                reason: "vintage must not be empty".to_string(),
            });
        }
        if spec.amount <= Decimal::ZERO {
            return Err(RegistryError::InvalidRequestSpec {
                reason: "amount must be positive".to_string(),
            });
        }
        let ticker = spec.token_ticker.as_str().trim();
        if ticker.is_empty() {
            return Err(RegistryError::InvalidRequestSpec {
                reason: "token ticker must not be empty".to_string(),
            });
        }
        if ticker.len() > constants::MAX_TICKER_LEN {
            return Err(RegistryError::InvalidRequestSpec {
                reason: format!(
                    "token ticker exceeds {} characters",
                    constants::MAX_TICKER_LEN
                ),
            });
        }
        if spec.documents_cid.as_str().trim().is_empty() {
            return Err(RegistryError::InvalidRequestSpec {
                reason: "documents CID must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
