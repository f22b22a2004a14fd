//! Cash Journal Models
//!
//! Manual ingreso/egreso records plus the append-only daily closure
//! snapshot. Closures are archival: written once, never mutated.

use serde::{Deserialize, Serialize};

/// Journal entry kind. Wire values are Spanish, lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum JournalType {
    Ingreso,
    Egreso,
}

/// Manual cash-flow record, independent of orders/payments
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct JournalEntry {
    pub id: i64,
    #[serde(rename = "type")]
    #[cfg_attr(feature = "db", sqlx(rename = "type"))]
    pub entry_type: JournalType,
    pub amount: f64,
    pub concept: String,
    /// Business date, YYYY-MM-DD (local to the configured timezone)
    pub date: String,
    pub notes: Option<String>,
    pub created_at: i64,
}

/// Create journal entry payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntryCreate {
    #[serde(rename = "type")]
    pub entry_type: JournalType,
    pub amount: f64,
    pub concept: String,
    pub date: String,
    pub notes: Option<String>,
}

/// One income line of a day summary/closure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeLine {
    /// "payment" (derived from an order payment) or "manual" (journal)
    pub source: String,
    pub amount: f64,
    pub concept: String,
    pub order_id: Option<i64>,
    pub order_name: Option<String>,
    pub payment_id: Option<i64>,
    pub journal_id: Option<i64>,
}

/// One expense line of a day summary/closure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseLine {
    pub amount: f64,
    pub concept: String,
    pub journal_id: Option<i64>,
}

/// Reconciled totals of a day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalTotals {
    pub ingresos: f64,
    pub egresos: f64,
    pub neto: f64,
}

/// Day summary as served to the dashboard (not yet closed)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalDaySummary {
    pub date: String,
    pub ingresos: Vec<IncomeLine>,
    pub egresos: Vec<ExpenseLine>,
    pub totals: JournalTotals,
}

/// Append-only daily closure snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalDayClosure {
    pub id: i64,
    pub date: String,
    pub ingresos: Vec<IncomeLine>,
    pub egresos: Vec<ExpenseLine>,
    pub totals: JournalTotals,
    pub created_at: i64,
}
