//! Tokenization request model.
//!
//! A request is an application, bound to an onboarded issuer, to mint a new
//! batch. Approval atomically mints the batch and credits the requester.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Cid, HolderAddress, RequestId, TokenTicker};

// ---------------------------------------------------------------------------
// IssuerName
// ---------------------------------------------------------------------------

/// Issuers onboarded to process tokenization requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssuerName {
    #[serde(rename = "Toucan Protocol")]
    ToucanProtocol,
    #[serde(rename = "Flowcarbon")]
    Flowcarbon,
    #[serde(rename = "KlimaDAO")]
    KlimaDao,
    #[serde(rename = "Moss.Earth")]
    MossEarth,
    #[serde(rename = "Celo Carbon")]
    CeloCarbon,
}

impl IssuerName {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToucanProtocol => "Toucan Protocol",
            Self::Flowcarbon => "Flowcarbon",
            Self::KlimaDao => "KlimaDAO",
            Self::MossEarth => "Moss.Earth",
            Self::CeloCarbon => "Celo Carbon",
        }
    }
}

impl fmt::Display for IssuerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RequestStatus
// ---------------------------------------------------------------------------

/// Approval status. `PENDING` is the only non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TokenizationRequest
// ---------------------------------------------------------------------------

/// An application to mint a new carbon batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenizationRequest {
    pub id: RequestId,
    pub requester_address: HolderAddress,
    pub issuer_name: IssuerName,
    pub project_name: String,
    /// Vintage year as supplied by the requester. Free-form: the duplicate
    /// policy ignores it.
    pub vintage: String,
    /// Tons CO2e to mint. Strictly positive.
    pub amount: Decimal,
    pub token_ticker: TokenTicker,
    /// Content address of the supporting documents bundle.
    pub documents_cid: Cid,
    pub status: RequestStatus,
    pub timestamp: DateTime<Utc>,
}

/// Input for submitting a request. ID, status (forced `PENDING`), and
/// timestamp are assigned by the workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSpec {
    pub requester_address: HolderAddress,
    pub issuer_name: IssuerName,
    pub project_name: String,
    pub vintage: String,
    pub amount: Decimal,
    pub token_ticker: TokenTicker,
    pub documents_cid: Cid,
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

#[cfg(any(test, feature = "test-helpers"))]
impl RequestSpec {
    /// A valid pending-able spec for tests.
    #[must_use]
    pub fn dummy(requester: &str, ticker: &str) -> Self {
        Self {
            requester_address: HolderAddress::new(requester),
            issuer_name: IssuerName::ToucanProtocol,
            project_name: "Mangrove Restoration Belt".to_string(),
            vintage: "2024".to_string(),
            amount: Decimal::new(5_000, 0),
            token_ticker: TokenTicker::new(ticker),
            documents_cid: Cid::new("QmRequestDocs000000000000000000000000000000000"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
