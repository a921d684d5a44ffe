//! # opencarbon-store
//!
//! Repository traits and in-memory implementations for the OpenCarbon core.
//!
//! Every component (registry, workflow, retirement, settlement, audit) is
//! generic over one of the traits defined here, so the in-memory stores can
//! be swapped for a durable backend without touching component logic. The
//! facade wires the memory implementations by default.
//!
//! - **Entity stores**: [`BatchStore`], [`OrderStore`], [`RequestStore`],
//!   [`RetirementStore`], [`AuditStore`] with [`memory`] implementations
//! - **Balances**: [`BalanceStore`] + [`MemoryBalanceLedger`], the
//!   wallet-facing bookkeeping injected into retirement and approval

pub mod ledger;
pub mod memory;
pub mod traits;

pub use ledger::{BalanceStore, MemoryBalanceLedger};
pub use memory::{
    MemoryAuditStore, MemoryBatchStore, MemoryOrderStore, MemoryRequestStore,
    MemoryRetirementStore,
};
pub use traits::{AuditStore, BatchStore, OrderStore, RequestStore, RetirementStore};
