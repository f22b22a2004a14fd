//! Service Repository
//!
//! Free-text service names resolve through `normalized_name` (trim,
//! strip accents, lowercase). The UNIQUE index turns the concurrent
//! create race into a harmless re-select.

use super::{RepoError, RepoResult};
use shared::models::{Service, ServiceCreate, ServiceUpdate};
use shared::util::normalize_name;
use sqlx::SqlitePool;

const SERVICE_SELECT: &str =
    "SELECT id, name, normalized_name, price, active, created_at, updated_at FROM services";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Service>> {
    let sql = format!("{} ORDER BY name ASC", SERVICE_SELECT);
    let rows = sqlx::query_as::<_, Service>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Service>> {
    fetch_by_id(pool, id).await
}

/// Fetch by id on any executor (pool or caller-owned transaction)
pub async fn fetch_by_id<'e, E>(db: E, id: i64) -> RepoResult<Option<Service>>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let sql = format!("{} WHERE id = ?", SERVICE_SELECT);
    let row = sqlx::query_as::<_, Service>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

/// Exact match on the dedup key
pub async fn fetch_by_normalized<'e, E>(db: E, norm: &str) -> RepoResult<Option<Service>>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let sql = format!("{} WHERE normalized_name = ? LIMIT 1", SERVICE_SELECT);
    let row = sqlx::query_as::<_, Service>(&sql)
        .bind(norm)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

/// Insert one service row; `Duplicate` carries a friendly message
async fn insert<'e, E>(db: E, name: &str, norm: &str, price: Option<f64>) -> RepoResult<Service>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO services (id, name, normalized_name, price, active, created_at) VALUES (?1, ?2, ?3, ?4, 1, ?5)",
    )
    .bind(id)
    .bind(name)
    .bind(norm)
    .bind(price)
    .bind(now)
    .execute(db)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => {
            RepoError::Duplicate(format!("Service \"{name}\" already exists"))
        }
        other => other,
    })?;
    Ok(Service {
        id,
        name: name.to_string(),
        normalized_name: norm.to_string(),
        price,
        active: true,
        created_at: now,
        updated_at: None,
    })
}

pub async fn create(pool: &SqlitePool, data: ServiceCreate) -> RepoResult<Service> {
    let name = data.name.trim().to_string();
    let norm = normalize_name(&name);
    if norm.is_empty() {
        return Err(RepoError::Validation("Service name must not be empty".into()));
    }
    insert(pool, &name, &norm, data.price).await
}

/// Find-or-create resolver: maps a free-text name to a canonical service.
///
/// Returns `(service, created)`; an existing match is returned untouched.
/// A lost creation race degrades to a re-select of the winner's row.
pub async fn get_or_create_by_name(
    pool: &SqlitePool,
    raw_name: &str,
    default_price: Option<f64>,
) -> RepoResult<(Service, bool)> {
    let name = raw_name.trim();
    let norm = normalize_name(name);
    if norm.is_empty() {
        return Err(RepoError::Validation("Service name must not be empty".into()));
    }
    if let Some(existing) = fetch_by_normalized(pool, &norm).await? {
        return Ok((existing, false));
    }
    match insert(pool, name, &norm, default_price).await {
        Ok(service) => Ok((service, true)),
        Err(RepoError::Duplicate(_)) => {
            let winner = fetch_by_normalized(pool, &norm)
                .await?
                .ok_or_else(|| RepoError::Database("Service vanished after duplicate".into()))?;
            Ok((winner, false))
        }
        Err(e) => Err(e),
    }
}

/// Find-or-create inside a caller-owned transaction (order creation).
/// The transaction holds the write lock by insert time, so a lost race
/// surfaces as `Duplicate` and resolves with a re-select on the same
/// snapshot.
pub async fn resolve_in_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    raw_name: &str,
    default_price: Option<f64>,
) -> RepoResult<Service> {
    let name = raw_name.trim();
    let norm = normalize_name(name);
    if norm.is_empty() {
        return Err(RepoError::Validation("Service name must not be empty".into()));
    }
    if let Some(existing) = fetch_by_normalized(&mut **tx, &norm).await? {
        return Ok(existing);
    }
    match insert(&mut **tx, name, &norm, default_price).await {
        Ok(service) => Ok(service),
        Err(RepoError::Duplicate(_)) => fetch_by_normalized(&mut **tx, &norm)
            .await?
            .ok_or_else(|| RepoError::Database("Service vanished after duplicate".into())),
        Err(e) => Err(e),
    }
}

pub async fn update(pool: &SqlitePool, id: i64, data: ServiceUpdate) -> RepoResult<Service> {
    let now = shared::util::now_millis();
    let name = data.name.map(|n| n.trim().to_string());
    let norm = name.as_deref().map(normalize_name);
    if let Some(n) = &norm
        && n.is_empty()
    {
        return Err(RepoError::Validation("Service name must not be empty".into()));
    }
    let rows = sqlx::query(
        "UPDATE services SET name = COALESCE(?1, name), normalized_name = COALESCE(?2, normalized_name), price = COALESCE(?3, price), active = COALESCE(?4, active), updated_at = ?5 WHERE id = ?6",
    )
    .bind(&name)
    .bind(&norm)
    .bind(data.price)
    .bind(data.active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::Duplicate(format!(
            "Service \"{}\" already exists",
            name.as_deref().unwrap_or("")
        )),
        other => other,
    })?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Service {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Service {id} not found")))
}

/// Soft delete: orders keep their service reference
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE services SET active = 0, updated_at = ? WHERE id = ? AND active = 1")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
