//! Wallet-facing balance bookkeeping.
//!
//! Tracks per-(holder, ticker) available credits. The ledger is the
//! constraint injected into retirement (burns debit it) and the target of
//! approval credits. Settlement fills do not touch it; they emit notices
//! for the external wallet layer, which syncs funds in via `credit`.
//!
//! All mutations are atomic: either the full operation succeeds or the
//! balance is unchanged.

use std::collections::HashMap;

use opencarbon_types::{HolderAddress, RegistryError, Result, TokenTicker};
use rust_decimal::Decimal;

/// Per-(holder, ticker) credit bookkeeping.
pub trait BalanceStore {
    /// Add credits. Infallible; deposits cannot be rejected.
    fn credit(&mut self, holder: &HolderAddress, ticker: &TokenTicker, amount: Decimal);

    /// Remove credits.
    ///
    /// # Errors
    /// Returns `InsufficientBalance` if available < amount.
    fn debit(
        &mut self,
        holder: &HolderAddress,
        ticker: &TokenTicker,
        amount: Decimal,
    ) -> Result<()>;

    /// Available credits for a (holder, ticker) pair. Zero if unknown.
    fn available(&self, holder: &HolderAddress, ticker: &TokenTicker) -> Decimal;

    /// All non-zero holdings of a holder, sorted by ticker.
    fn holdings(&self, holder: &HolderAddress) -> Vec<(TokenTicker, Decimal)>;
}

/// In-memory [`BalanceStore`].
#[derive(Debug, Default)]
pub struct MemoryBalanceLedger {
    balances: HashMap<(HolderAddress, TokenTicker), Decimal>,
}

impl MemoryBalanceLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BalanceStore for MemoryBalanceLedger {
    fn credit(&mut self, holder: &HolderAddress, ticker: &TokenTicker, amount: Decimal) {
        let entry = self
            .balances
            .entry((holder.clone(), ticker.clone()))
            .or_default();
        *entry += amount;
        tracing::debug!(
            holder = %holder,
            ticker = %ticker,
            amount = %amount,
            balance = %entry,
            "Ledger credit"
        );
    }

    fn debit(
        &mut self,
        holder: &HolderAddress,
        ticker: &TokenTicker,
        amount: Decimal,
    ) -> Result<()> {
        let available = self.available(holder, ticker);
        if available < amount {
            return Err(RegistryError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        let entry = self
            .balances
            .entry((holder.clone(), ticker.clone()))
            .or_default();
        *entry -= amount;
        tracing::debug!(
            holder = %holder,
            ticker = %ticker,
            amount = %amount,
            balance = %entry,
            "Ledger debit"
        );
        Ok(())
    }

    fn available(&self, holder: &HolderAddress, ticker: &TokenTicker) -> Decimal {
        self.balances
            .get(&(holder.clone(), ticker.clone()))
            .copied()
            .unwrap_or_default()
    }

    fn holdings(&self, holder: &HolderAddress) -> Vec<(TokenTicker, Decimal)> {
        let mut out: Vec<(TokenTicker, Decimal)> = self
            .balances
            .iter()
            .filter(|((h, _), amount)| h == holder && **amount != Decimal::ZERO)
            .map(|((_, ticker), amount)| (ticker.clone(), *amount))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
