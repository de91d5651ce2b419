//! # Storage Layer
//!
//! Persistence for the points backend: the store traits the domain layer
//! depends on, and their SQLite implementations.

pub mod sqlite;
pub mod traits;

pub use sqlite::*;
pub use traits::*;
