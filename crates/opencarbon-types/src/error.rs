//! Error types for the OpenCarbon registry core.
//!
//! All errors use the `OC_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Registry / batch errors
//! - 2xx: Retirement / ledger errors
//! - 3xx: Settlement / pre-auth order errors
//! - 4xx: Tokenization workflow errors
//! - 5xx: Audit chain errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{BatchId, OrderId, OrderStatus, RequestId, RequestStatus, TokenState, TokenTicker};

/// Central error enum for all registry core operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    // =================================================================
    // Registry / Batch Errors (1xx)
    // =================================================================
    /// The requested batch does not exist.
    #[error("OC_ERR_100: Batch not found: {0}")]
    BatchNotFound(BatchId),

    /// The lifecycle adjacency table forbids this move.
    #[error("OC_ERR_101: Invalid transition: {from} -> {to}")]
    InvalidTransition { from: TokenState, to: TokenState },

    /// The batch spec failed validation (empty fields, non-positive
    /// supply, unreachable initial state).
    #[error("OC_ERR_102: Invalid batch spec: {reason}")]
    InvalidBatchSpec { reason: String },

    /// Recording this issuance would push `issued_tons` past `total_tons`.
    #[error("OC_ERR_103: Issuance exceeds supply: requested {requested}, remaining {remaining}")]
    IssuanceExceedsSupply {
        requested: Decimal,
        remaining: Decimal,
    },

    // =================================================================
    // Retirement / Ledger Errors (2xx)
    // =================================================================
    /// Not enough available balance to perform the operation.
    #[error("OC_ERR_200: Insufficient available balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Decimal, available: Decimal },

    /// The batch's lifecycle state does not permit burning credits.
    #[error("OC_ERR_201: Retirement not allowed in state {state}")]
    RetirementNotAllowed { state: TokenState },

    /// The retirement request failed validation (non-positive amount,
    /// empty purpose).
    #[error("OC_ERR_202: Invalid retirement: {reason}")]
    InvalidRetirement { reason: String },

    /// A wallet-layer deposit sync failed validation.
    #[error("OC_ERR_203: Invalid deposit: {reason}")]
    InvalidDeposit { reason: String },

    // =================================================================
    // Settlement / Pre-Auth Order Errors (3xx)
    // =================================================================
    /// The requested order does not exist.
    #[error("OC_ERR_300: Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order spec failed validation (non-positive values, past
    /// expiry, missing authorization token).
    #[error("OC_ERR_301: Invalid order: {reason}")]
    InvalidOrderSpec { reason: String },

    /// The order is already in a terminal status.
    #[error("OC_ERR_302: Order not active: {status}")]
    OrderNotActive { status: OrderStatus },

    // =================================================================
    // Tokenization Workflow Errors (4xx)
    // =================================================================
    /// The requested tokenization request does not exist.
    #[error("OC_ERR_400: Request not found: {0}")]
    RequestNotFound(RequestId),

    /// The request has already been decided.
    #[error("OC_ERR_401: Request not pending: {status}")]
    RequestNotPending { status: RequestStatus },

    /// The request spec failed validation (empty fields, non-positive
    /// amount).
    #[error("OC_ERR_402: Invalid request: {reason}")]
    InvalidRequestSpec { reason: String },

    /// The ticker is already registered; one batch per ticker, ever.
    #[error("OC_ERR_403: Ticker already registered: {0}")]
    DuplicateTicker(TokenTicker),

    // =================================================================
    // Audit Chain Errors (5xx)
    // =================================================================
    /// A chain walk found a broken link or a payload hash mismatch.
    #[error("OC_ERR_500: Audit chain corrupted at sequence {sequence}: {reason}")]
    ChainCorrupted { sequence: u64, reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("OC_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Configuration error (zero intervals, zero epoch capacity).
    #[error("OC_ERR_901: Configuration error: {0}")]
    Configuration(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, RegistryError>;

// ---------------------------------------------------------------------------
// Coarse taxonomy
// ---------------------------------------------------------------------------

/// Coarse error class for API boundaries. Every recoverable failure maps
/// onto exactly one kind; callers branch on this without matching the full
/// enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    InvalidTransition,
    InvalidState,
    InvalidSpec,
    InsufficientBalance,
    Duplicate,
    Corrupted,
    Internal,
}

impl RegistryError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BatchNotFound(_) | Self::OrderNotFound(_) | Self::RequestNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::RetirementNotAllowed { .. }
            | Self::OrderNotActive { .. }
            | Self::RequestNotPending { .. } => ErrorKind::InvalidState,
            Self::InvalidBatchSpec { .. }
            | Self::InvalidRetirement { .. }
            | Self::InvalidDeposit { .. }
            | Self::InvalidOrderSpec { .. }
            | Self::InvalidRequestSpec { .. } => ErrorKind::InvalidSpec,
            Self::InsufficientBalance { .. } | Self::IssuanceExceedsSupply { .. } => {
                ErrorKind::InsufficientBalance
            }
            Self::DuplicateTicker(_) => ErrorKind::Duplicate,
            Self::ChainCorrupted { .. } => ErrorKind::Corrupted,
            Self::Internal(_) | Self::Configuration(_) => ErrorKind::Internal,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = RegistryError::BatchNotFound(BatchId::new());
        let msg = format!("{err}");
        assert!(msg.starts_with("OC_ERR_100"), "Got: {msg}");
    }

    #[test]
    fn insufficient_balance_display() {
        let err = RegistryError::InsufficientBalance {
            needed: Decimal::new(100, 0),
            available: Decimal::new(50, 0),
        };
        let msg = format!("{err}");
        assert!(msg.contains("OC_ERR_200"));
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
    }

    #[test]
    fn invalid_transition_display() {
        let err = RegistryError::InvalidTransition {
            from: TokenState::Draft,
            to: TokenState::Retired,
        };
        let msg = format!("{err}");
        assert!(msg.contains("OC_ERR_101"));
        assert!(msg.contains("DRAFT"));
        assert!(msg.contains("RETIRED"));
    }

    #[test]
    fn all_errors_have_oc_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(RegistryError::OrderNotActive {
                status: OrderStatus::Filled,
            }),
            Box::new(RegistryError::DuplicateTicker(TokenTicker::new("AMZ-F23"))),
            Box::new(RegistryError::ChainCorrupted {
                sequence: 3,
                reason: "link mismatch".into(),
            }),
            Box::new(RegistryError::Internal("test".into())),
            Box::new(RegistryError::Configuration("zero sweep interval".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("OC_ERR_"),
                "Error missing OC_ERR_ prefix: {msg}"
            );
        }
    }

    #[test]
    fn kinds_cover_the_taxonomy() {
        assert_eq!(
            RegistryError::BatchNotFound(BatchId::new()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            RegistryError::InvalidTransition {
                from: TokenState::Draft,
                to: TokenState::Locked
            }
            .kind(),
            ErrorKind::InvalidTransition
        );
        assert_eq!(
            RegistryError::RequestNotPending {
                status: RequestStatus::Approved
            }
            .kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(
            RegistryError::InvalidOrderSpec {
                reason: "empty signature".into()
            }
            .kind(),
            ErrorKind::InvalidSpec
        );
        assert_eq!(
            RegistryError::DuplicateTicker(TokenTicker::new("X")).kind(),
            ErrorKind::Duplicate
        );
    }
}
