//! Shared types for the taller back-office
//!
//! Data models exchanged between the server and its clients, plus the
//! ID/time/normalization utilities both sides agree on.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.

pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
