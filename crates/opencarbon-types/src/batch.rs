//! Carbon batch model: the registry's primary record and its lifecycle
//! state machine.
//!
//! A batch is a quantity of credits from one project/vintage under one
//! ticker. The state machine below is the single source of truth for legal
//! lifecycle moves; `BatchRegistry::transition` enforces it.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BatchId, Cid, TokenTicker, TxHash};

// ---------------------------------------------------------------------------
// TokenState
// ---------------------------------------------------------------------------

/// Lifecycle state of a carbon batch.
///
/// Main line: DRAFT → ISSUED → AUTHORIZED. From AUTHORIZED a batch can be
/// suspended (and reinstated), locked for bulk retirement (and unlocked),
/// or revoked. LOCKED → RETIRED completes the lifecycle; SUSPENDED can also
/// end in REVOKED.
///
/// `RETIRED` and `REVOKED` are terminal. Credits can only be burned while
/// the batch is `AUTHORIZED` or `LOCKED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenState {
    /// Registered off-chain, not yet anchored.
    Draft,
    /// Anchored; awaiting compliance authorization.
    Issued,
    /// Live: tradable and retirable.
    Authorized,
    /// Temporarily pulled from circulation by compliance.
    Suspended,
    /// Frozen for bulk retirement or dispute review.
    Locked,
    /// Fully consumed. Terminal.
    Retired,
    /// Invalidated by compliance. Terminal.
    Revoked,
}

impl TokenState {
    /// The lifecycle adjacency table. Everything not matched here is an
    /// illegal move.
    #[must_use]
    pub fn can_transition_to(&self, target: TokenState) -> bool {
        matches!(
            (self, target),
            (Self::Draft, Self::Issued)
                | (Self::Issued, Self::Authorized)
                | (Self::Authorized, Self::Suspended | Self::Locked | Self::Revoked)
                | (Self::Suspended, Self::Authorized | Self::Revoked)
                | (Self::Locked, Self::Retired | Self::Authorized)
        )
    }

    /// No transitions leave this state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Retired | Self::Revoked)
    }

    /// Whether holders may burn credits of a batch in this state.
    #[must_use]
    pub fn allows_retirement(&self) -> bool {
        matches!(self, Self::Authorized | Self::Locked)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Issued => "ISSUED",
            Self::Authorized => "AUTHORIZED",
            Self::Suspended => "SUSPENDED",
            Self::Locked => "LOCKED",
            Self::Retired => "RETIRED",
            Self::Revoked => "REVOKED",
        }
    }
}

impl fmt::Display for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// A registered carbon credit batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    /// Provenance reference. For workflow-minted batches this is the
    /// originating tokenization request id.
    pub project_id: String,
    pub token_ticker: TokenTicker,
    /// Capacity of the batch in tons CO2e. Strictly positive.
    pub total_tons: Decimal,
    /// Tons delivered to holders so far. `0 <= issued_tons <= total_tons`.
    pub issued_tons: Decimal,
    pub state: TokenState,
    /// Content address of the batch metadata document. May be empty for
    /// exploratory drafts.
    pub metadata_cid: Cid,
    /// Ordered MRV (monitoring/reporting/verification) document references.
    pub mrv_reports: Vec<String>,
    /// Anchoring transaction reference. Assigned exactly once, when the
    /// batch first reaches `ISSUED`.
    pub anchor_tx_hash: Option<TxHash>,
    pub created_at: DateTime<Utc>,
}

impl Batch {
    #[must_use]
    pub fn can_transition_to(&self, target: TokenState) -> bool {
        self.state.can_transition_to(target)
    }

    /// Tons not yet delivered to holders.
    #[must_use]
    pub fn remaining_supply(&self) -> Decimal {
        self.total_tons - self.issued_tons
    }
}

/// Input for creating a batch. IDs, timestamps, issuance accounting, and
/// anchor references are assigned by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSpec {
    pub project_id: String,
    pub token_ticker: TokenTicker,
    pub total_tons: Decimal,
    /// Must be `DRAFT` or `ISSUED`; later states are reachable only via
    /// transitions.
    pub initial_state: TokenState,
    pub metadata_cid: Cid,
    pub mrv_reports: Vec<String>,
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

#[cfg(any(test, feature = "test-helpers"))]
impl BatchSpec {
    /// A valid draft-state spec for tests.
    #[must_use]
    pub fn dummy(ticker: &str) -> Self {
        Self {
            project_id: "proj-forest-01".to_string(),
            token_ticker: TokenTicker::new(ticker),
            total_tons: Decimal::new(10_000, 0),
            initial_state: TokenState::Draft,
            metadata_cid: Cid::new("QmBatchMetadata0000000000000000000000000000000"),
            mrv_reports: vec!["https://mrv.example/report-1.pdf".to_string()],
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use TokenState::{Authorized, Draft, Issued, Locked, Retired, Revoked, Suspended};

    const ALL: [TokenState; 7] = [Draft, Issued, Authorized, Suspended, Locked, Retired, Revoked];

    fn allowed(from: TokenState) -> Vec<TokenState> {
        ALL.iter()
            .copied()
            .filter(|target| from.can_transition_to(*target))
            .collect()
    }

    #[test]
    fn adjacency_table_is_exact() {
        assert_eq!(allowed(Draft), vec![Issued]);
        assert_eq!(allowed(Issued), vec![Authorized]);
        assert_eq!(allowed(Authorized), vec![Suspended, Locked, Revoked]);
        assert_eq!(allowed(Suspended), vec![Authorized, Revoked]);
        assert_eq!(allowed(Locked), vec![Authorized, Retired]);
        assert_eq!(allowed(Retired), vec![]);
        assert_eq!(allowed(Revoked), vec![]);
    }

    #[test]
    fn no_self_loops() {
        for state in ALL {
            assert!(!state.can_transition_to(state), "{state} loops to itself");
        }
    }

    #[test]
    fn terminal_states() {
        assert!(Retired.is_terminal());
        assert!(Revoked.is_terminal());
        for state in [Draft, Issued, Authorized, Suspended, Locked] {
            assert!(!state.is_terminal(), "{state} must not be terminal");
        }
    }

    #[test]
    fn retirement_window() {
        assert!(Authorized.allows_retirement());
        assert!(Locked.allows_retirement());
        for state in [Draft, Issued, Suspended, Retired, Revoked] {
            assert!(!state.allows_retirement(), "{state} must not allow retirement");
        }
    }

    #[test]
    fn state_serializes_screaming() {
        let json = serde_json::to_string(&Authorized).unwrap();
        assert_eq!(json, "\"AUTHORIZED\"");
        let back: TokenState = serde_json::from_str("\"SUSPENDED\"").unwrap();
        assert_eq!(back, Suspended);
    }

    #[test]
    fn display_matches_serde() {
        for state in ALL {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{state}\""));
        }
    }

    #[test]
    fn remaining_supply() {
        let spec = BatchSpec::dummy("AMZ-F23");
        let batch = Batch {
            id: BatchId::new(),
            project_id: spec.project_id,
            token_ticker: spec.token_ticker,
            total_tons: Decimal::new(10_000, 0),
            issued_tons: Decimal::new(2_500, 0),
            state: Issued,
            metadata_cid: spec.metadata_cid,
            mrv_reports: spec.mrv_reports,
            anchor_tx_hash: None,
            created_at: Utc::now(),
        };
        assert_eq!(batch.remaining_supply(), Decimal::new(7_500, 0));
    }
}
