//! Payment Model
//!
//! Append-only ledger per order; payments are immutable after creation.

use serde::{Deserialize, Serialize};

/// Accepted payment methods. Wire values are Spanish, lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum PaymentMethod {
    Efectivo,
    Transferencia,
    Qr,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Efectivo => "efectivo",
            PaymentMethod::Transferencia => "transferencia",
            PaymentMethod::Qr => "qr",
        }
    }
}

/// Payment entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    /// Effective payment time (UTC millis)
    pub date: i64,
    pub created_at: i64,
}

/// Register payment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCreate {
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    /// Effective payment time; defaults to now
    pub date: Option<i64>,
}
