//! # opencarbon-settlement
//!
//! **Async pre-auth order settlement.**
//!
//! Holders sign an order once; the core settles it later without further
//! interaction. This crate is the synchronous half of that story:
//!
//! - **SettlementEngine**: accepts pre-auth orders, executes due fills,
//!   revokes, and sweeps stale orders to `EXPIRED`
//! - **FillOutcome**: what a fill attempt did, so the worker can forward
//!   exactly one `SettlementNotice` per settled order and stay silent on
//!   terminal no-ops
//!
//! The background worker that schedules fills lives in `opencarbon-core`;
//! the engine itself never spawns tasks or sleeps.

pub mod engine;

pub use engine::{FillOutcome, SettlementEngine};
