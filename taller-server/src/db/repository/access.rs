//! Access List Repository
//!
//! Keyed by lowercased email. Consulted on every sign-in; inactive or
//! missing entries are rejected by the auth layer.

use super::{RepoError, RepoResult};
use shared::models::AccessEntry;
use shared::util::normalize_email;
use sqlx::SqlitePool;

const ACCESS_SELECT: &str =
    "SELECT email, role, active, display_name, password_hash, created_at, updated_at FROM access";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<AccessEntry>> {
    let sql = format!("{} ORDER BY email ASC", ACCESS_SELECT);
    let rows = sqlx::query_as::<_, AccessEntry>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> RepoResult<Option<AccessEntry>> {
    let sql = format!("{} WHERE email = ?", ACCESS_SELECT);
    let row = sqlx::query_as::<_, AccessEntry>(&sql)
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn count(pool: &SqlitePool) -> RepoResult<i64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM access")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

pub async fn create(
    pool: &SqlitePool,
    email: &str,
    role: shared::models::Role,
    display_name: Option<&str>,
    password_hash: &str,
) -> RepoResult<AccessEntry> {
    let email = normalize_email(email);
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO access (email, role, active, display_name, password_hash, created_at) VALUES (?1, ?2, 1, ?3, ?4, ?5)",
    )
    .bind(&email)
    .bind(role)
    .bind(display_name)
    .bind(password_hash)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => {
            RepoError::Duplicate(format!("Access entry for {email} already exists"))
        }
        other => other,
    })?;
    find_by_email(pool, &email)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create access entry".into()))
}

pub async fn update(
    pool: &SqlitePool,
    email: &str,
    role: Option<shared::models::Role>,
    active: Option<bool>,
    display_name: Option<&str>,
    password_hash: Option<&str>,
) -> RepoResult<AccessEntry> {
    let email = normalize_email(email);
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE access SET role = COALESCE(?1, role), active = COALESCE(?2, active), display_name = COALESCE(?3, display_name), password_hash = COALESCE(?4, password_hash), updated_at = ?5 WHERE email = ?6",
    )
    .bind(role)
    .bind(active)
    .bind(display_name)
    .bind(password_hash)
    .bind(now)
    .bind(&email)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Access entry {email} not found")));
    }
    find_by_email(pool, &email)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Access entry {email} not found")))
}

pub async fn delete(pool: &SqlitePool, email: &str) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM access WHERE email = ?")
        .bind(normalize_email(email))
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
