//! Service Model

use serde::{Deserialize, Serialize};

/// Service catalog entry.
///
/// `normalized_name` (trim + strip accents + lowercase) is the dedup key
/// used by the find-or-create resolver; UNIQUE at store level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub normalized_name: String,
    pub price: Option<f64>,
    pub active: bool,
    pub created_at: i64,
    pub updated_at: Option<i64>,
}

/// Create service payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCreate {
    pub name: String,
    pub price: Option<f64>,
}

/// Update service payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceUpdate {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub active: Option<bool>,
}
