//! Duplicate-tokenization guard.
//!
//! Policy: a ticker that already exists in the registry must not be
//! tokenized again, regardless of vintage. Callers pass the vintage so
//! the decision is visible in logs, but it carries no weight.

use crate::registry::BatchRegistry;
use opencarbon_store::BatchStore;
use opencarbon_types::TokenTicker;

/// Ticker-level uniqueness policy over the batch registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct UniquenessGuard;

impl UniquenessGuard {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Whether tokenizing `ticker` would collide with an existing batch.
    ///
    /// The `vintage` parameter does not affect the outcome: two requests
    /// for the same ticker collide even across vintages.
    #[must_use]
    pub fn is_duplicate<S: BatchStore>(
        &self,
        registry: &BatchRegistry<S>,
        ticker: &TokenTicker,
        vintage: &str,
    ) -> bool {
        let duplicate = registry.contains_ticker(ticker);
        tracing::debug!(ticker = %ticker, vintage, duplicate, "Uniqueness check");
        duplicate
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
