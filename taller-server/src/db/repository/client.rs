//! Client Repository
//!
//! Phone is the dedup key: UNIQUE index at store level, so concurrent
//! find-or-create submissions of the same phone cannot fork duplicates.

use super::{RepoError, RepoResult};
use shared::models::{Client, ClientCreate, ClientUpdate};
use sqlx::SqlitePool;

const CLIENT_SELECT: &str = "SELECT id, name, phone, created_at, updated_at FROM clients";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Client>> {
    let sql = format!("{} ORDER BY created_at DESC", CLIENT_SELECT);
    let rows = sqlx::query_as::<_, Client>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Client>> {
    let sql = format!("{} WHERE id = ?", CLIENT_SELECT);
    let row = sqlx::query_as::<_, Client>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Exact-match phone lookup; first match or None
pub async fn find_by_phone(pool: &SqlitePool, phone: &str) -> RepoResult<Option<Client>> {
    let sql = format!("{} WHERE phone = ? LIMIT 1", CLIENT_SELECT);
    let row = sqlx::query_as::<_, Client>(&sql)
        .bind(phone.trim())
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: ClientCreate) -> RepoResult<Client> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    let phone = data.phone.trim().to_string();
    sqlx::query("INSERT INTO clients (id, name, phone, created_at) VALUES (?1, ?2, ?3, ?4)")
        .bind(id)
        .bind(data.name.trim())
        .bind(&phone)
        .bind(now)
        .execute(pool)
        .await
        .map_err(|e| match RepoError::from(e) {
            RepoError::Duplicate(_) => {
                RepoError::Duplicate(format!("Client with phone {phone} already exists"))
            }
            other => other,
        })?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create client".into()))
}

/// Find-or-create resolver keyed by phone.
///
/// A lost creation race degrades to a re-select of the winner's row.
pub async fn get_or_create_by_phone(
    pool: &SqlitePool,
    name: &str,
    phone: &str,
) -> RepoResult<(Client, bool)> {
    if let Some(existing) = find_by_phone(pool, phone).await? {
        return Ok((existing, false));
    }
    match create(
        pool,
        ClientCreate {
            name: name.to_string(),
            phone: phone.to_string(),
        },
    )
    .await
    {
        Ok(client) => Ok((client, true)),
        Err(RepoError::Duplicate(_)) => {
            let winner = find_by_phone(pool, phone)
                .await?
                .ok_or_else(|| RepoError::Database("Client vanished after duplicate".into()))?;
            Ok((winner, false))
        }
        Err(e) => Err(e),
    }
}

pub async fn update(pool: &SqlitePool, id: i64, data: ClientUpdate) -> RepoResult<Client> {
    let now = shared::util::now_millis();
    let phone = data.phone.map(|p| p.trim().to_string());
    let rows = sqlx::query(
        "UPDATE clients SET name = COALESCE(?1, name), phone = COALESCE(?2, phone), updated_at = ?3 WHERE id = ?4",
    )
    .bind(data.name)
    .bind(&phone)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::Duplicate(format!(
            "Client with phone {} already exists",
            phone.as_deref().unwrap_or("")
        )),
        other => other,
    })?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Client {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Client {id} not found")))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let order_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE client_id = ?")
            .bind(id)
            .fetch_one(pool)
            .await?;
    if order_count > 0 {
        return Err(RepoError::Validation(format!(
            "Client {id} has {order_count} order(s) and cannot be deleted"
        )));
    }
    let rows = sqlx::query("DELETE FROM clients WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
