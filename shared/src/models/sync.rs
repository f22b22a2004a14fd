//! Sync Notification Payload
//!
//! Published on every mutation so clients can invalidate their cached
//! collection lists instead of holding live store subscriptions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncPayload {
    /// Resource type ("client", "service", "orders", "payment", "journal")
    pub resource: String,
    /// Monotonic per-resource version
    pub version: u64,
    /// "created" | "updated" | "deleted"
    pub action: String,
    /// Resource ID
    pub id: String,
}
