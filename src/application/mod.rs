//! Application layer containing the core business logic orchestration.
//!
//! This module defines the `Engine`, the primary entry point for the order
//! lifecycle, plus the services it is composed of: the wallet `Ledger`, the
//! gig `Catalog`, the `DisputeResolver`, the `Reputation` aggregator and the
//! gig-creation `SessionStore`. Mutations serialize on per-key critical
//! sections from `LockRegistry`; locks are always taken order first, wallet
//! second.

pub mod catalog;
pub mod disputes;
pub mod engine;
pub mod ledger;
pub mod locks;
pub mod payout;
pub mod reputation;
pub mod sessions;
pub mod users;

pub(crate) mod ids;
