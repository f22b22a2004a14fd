//! Client Model

use serde::{Deserialize, Serialize};

/// Client entity. Phone is the natural dedup key (UNIQUE at store level).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub created_at: i64,
    pub updated_at: Option<i64>,
}

/// Create client payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientCreate {
    pub name: String,
    pub phone: String,
}

/// Update client payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
}
