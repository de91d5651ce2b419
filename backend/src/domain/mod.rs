//! # Domain Module
//!
//! Business logic for the points tracker backend: identifier resolution,
//! wallet reconciliation, reserved-points and earnings-breakdown
//! computation, and the idempotent award write path. Services depend only on
//! the storage traits, so they run unchanged against SQLite or test doubles.

pub mod award_service;
pub mod breakdown_service;
pub mod child_service;
pub mod errors;
pub mod fallback;
pub mod identity_service;
pub mod models;
pub mod reward_service;
pub mod wallet_service;

pub use award_service::*;
pub use breakdown_service::*;
pub use child_service::*;
pub use errors::*;
pub use fallback::*;
pub use identity_service::*;
pub use reward_service::*;
pub use wallet_service::*;
