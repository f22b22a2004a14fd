//! Access List Model
//!
//! Keyed by lowercased email; consulted on sign-in to admit or reject a
//! session.

use serde::{Deserialize, Serialize};

/// Session role. Admins see the full back office; employees get the
/// day-to-day surface (orders, payments, journal entries).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
        }
    }
}

/// Access-list entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AccessEntry {
    pub email: String,
    pub role: Role,
    pub active: bool,
    pub display_name: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: i64,
    pub updated_at: Option<i64>,
}

/// Create access entry payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessCreate {
    pub email: String,
    pub role: Role,
    pub display_name: Option<String>,
    pub password: String,
}

/// Update access entry payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessUpdate {
    pub role: Option<Role>,
    pub active: Option<bool>,
    pub display_name: Option<String>,
    pub password: Option<String>,
}
