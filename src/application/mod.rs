//! Application layer containing the core business logic orchestration.
//!
//! `EscrowService` is the inbound entry point: it classifies chat events
//! and routes them to the `CreationFlow` wizard or the `LifecycleEngine`.
//! Both produce notification intents; actual delivery happens behind the
//! `NotificationDispatcher` port.

pub mod engine;
pub mod payout;
pub mod service;
pub mod wizard;
