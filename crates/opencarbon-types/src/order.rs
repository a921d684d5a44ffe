//! Pre-authorized order model.
//!
//! A pre-auth order carries an opaque delegated-authorization token that
//! lets the settlement engine execute later without further holder
//! interaction. Orders are settled asynchronously by the background worker.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{HolderAddress, OrderId, RegistryError, Result, TokenTicker};

// ---------------------------------------------------------------------------
// OrderSide
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Signed balance delta of `amount` for the order owner: buys add
    /// credits, sells remove them.
    #[must_use]
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            Self::Buy => amount,
            Self::Sell => -amount,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// OrderStatus
// ---------------------------------------------------------------------------

/// Settlement status of a pre-auth order. `ACTIVE` is the only
/// non-terminal status; every transition leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Awaiting the background fill.
    Active,
    /// Settled. Terminal.
    Filled,
    /// Passed its expiry before settlement. Terminal.
    Expired,
    /// Cancelled by the owner before settlement. Terminal.
    Revoked,
}

impl OrderStatus {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Filled => "FILLED",
            Self::Expired => "EXPIRED",
            Self::Revoked => "REVOKED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PreAuthOrder
// ---------------------------------------------------------------------------

/// An order pre-authorized for deferred settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreAuthOrder {
    pub id: OrderId,
    pub owner: HolderAddress,
    pub side: OrderSide,
    pub ticker: TokenTicker,
    /// Tons CO2e. Strictly positive.
    pub amount: Decimal,
    /// Per-ton limit. Strictly positive.
    pub limit_price: Decimal,
    /// Must be strictly in the future at submission.
    pub expiry: DateTime<Utc>,
    /// Opaque delegated-authorization token. Verified upstream; the core
    /// only requires it to be present.
    pub signature: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl PreAuthOrder {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry
    }

    /// `ACTIVE` → `FILLED`.
    pub fn mark_filled(&mut self) -> Result<()> {
        self.require_active()?;
        self.status = OrderStatus::Filled;
        Ok(())
    }

    /// `ACTIVE` → `REVOKED`.
    pub fn mark_revoked(&mut self) -> Result<()> {
        self.require_active()?;
        self.status = OrderStatus::Revoked;
        Ok(())
    }

    /// `ACTIVE` → `EXPIRED`.
    pub fn mark_expired(&mut self) -> Result<()> {
        self.require_active()?;
        self.status = OrderStatus::Expired;
        Ok(())
    }

    fn require_active(&self) -> Result<()> {
        if self.status == OrderStatus::Active {
            Ok(())
        } else {
            Err(RegistryError::OrderNotActive {
                status: self.status,
            })
        }
    }
}

/// Input for submitting a pre-auth order. ID, status, and creation time
/// are assigned by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSpec {
    pub owner: HolderAddress,
    pub side: OrderSide,
    pub ticker: TokenTicker,
    pub amount: Decimal,
    pub limit_price: Decimal,
    pub expiry: DateTime<Utc>,
    pub signature: String,
}

// ---------------------------------------------------------------------------
// SettlementNotice
// ---------------------------------------------------------------------------

/// Emitted exactly once per filled order, for the wallet-facing layer to
/// apply the balance movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementNotice {
    pub order_id: OrderId,
    pub owner: HolderAddress,
    pub side: OrderSide,
    pub ticker: TokenTicker,
    pub amount: Decimal,
    /// Signed credit delta for the owner (`+amount` buy, `-amount` sell).
    pub delta: Decimal,
    pub executed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

#[cfg(any(test, feature = "test-helpers"))]
impl OrderSpec {
    /// A valid buy spec expiring one hour out.
    #[must_use]
    pub fn dummy(owner: &str, ticker: &str) -> Self {
        Self {
            owner: HolderAddress::new(owner),
            side: OrderSide::Buy,
            ticker: TokenTicker::new(ticker),
            amount: Decimal::new(100, 0),
            limit_price: Decimal::new(125, 1),
            expiry: Utc::now() + chrono::Duration::hours(1),
            signature: format!("dtok-{:016x}", rand::random::<u64>()),
        }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl PreAuthOrder {
    /// An `ACTIVE` order built from [`OrderSpec::dummy`].
    #[must_use]
    pub fn dummy(owner: &str, ticker: &str) -> Self {
        let spec = OrderSpec::dummy(owner, ticker);
        Self {
            id: OrderId::new(),
            owner: spec.owner,
            side: spec.side,
            ticker: spec.ticker,
            amount: spec.amount,
            limit_price: spec.limit_price,
            expiry: spec.expiry,
            signature: spec.signature,
            status: OrderStatus::Active,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
