//! Order Model
//!
//! The deposit/balance/status triple is owned by the reconciliation
//! protocol; after every mutation the invariant holds:
//! `balance == max(0, total - deposit)` and
//! `status == "completado"` iff `balance == 0`.

use serde::{Deserialize, Serialize};

/// Order lifecycle status. Wire values are Spanish, lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum OrderStatus {
    Pendiente,
    Completado,
    Cancelado,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pendiente => "pendiente",
            OrderStatus::Completado => "completado",
            OrderStatus::Cancelado => "cancelado",
        }
    }
}

/// Order entity (work order for a client)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub client_id: i64,
    pub service_id: i64,
    /// YYYY-MM-DD
    pub start_date: String,
    /// YYYY-MM-DD
    pub expected_end_date: String,
    pub details: String,
    pub quantity: i64,
    pub total: f64,
    pub deposit: f64,
    pub balance: f64,
    pub status: OrderStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create order payload.
///
/// The service may be given by id or by free-text name (resolved through
/// the find-or-create resolver). `deposit` is registered as an initial
/// payment, not written directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreate {
    pub client_id: i64,
    pub service_id: Option<i64>,
    pub service_name: Option<String>,
    pub start_date: String,
    pub expected_end_date: String,
    #[serde(default)]
    pub details: String,
    pub quantity: Option<i64>,
    pub total: f64,
    #[serde(default)]
    pub deposit: f64,
}

/// Update order payload (direct edits; deposit/balance only move through
/// payments, balance is recomputed from the stored deposit)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    pub start_date: Option<String>,
    pub expected_end_date: Option<String>,
    pub details: Option<String>,
    pub quantity: Option<i64>,
    pub total: Option<f64>,
    pub status: Option<OrderStatus>,
}
