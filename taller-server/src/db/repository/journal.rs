//! Journal Repository
//!
//! Manual cash-flow records (ingreso/egreso), independent of orders.

use super::{RepoError, RepoResult};
use crate::utils::time::parse_date;
use shared::models::{JournalEntry, JournalEntryCreate};
use sqlx::SqlitePool;

const JOURNAL_SELECT: &str =
    "SELECT id, type, amount, concept, date, notes, created_at FROM journal";

pub async fn create(pool: &SqlitePool, data: JournalEntryCreate) -> RepoResult<JournalEntry> {
    if !data.amount.is_finite() || data.amount <= 0.0 {
        return Err(RepoError::Validation(format!(
            "amount must be positive, got {}",
            data.amount
        )));
    }
    parse_date(&data.date)?;
    let concept = data.concept.trim();
    if concept.is_empty() {
        return Err(RepoError::Validation("concept must not be empty".into()));
    }

    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO journal (id, type, amount, concept, date, notes, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(id)
    .bind(data.entry_type)
    .bind(data.amount)
    .bind(concept)
    .bind(&data.date)
    .bind(&data.notes)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create journal entry".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<JournalEntry>> {
    let sql = format!("{} WHERE id = ?", JOURNAL_SELECT);
    let row = sqlx::query_as::<_, JournalEntry>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// List entries, newest business date first; optional inclusive range
pub async fn find_all(
    pool: &SqlitePool,
    from: Option<&str>,
    to: Option<&str>,
) -> RepoResult<Vec<JournalEntry>> {
    if let Some(d) = from {
        parse_date(d)?;
    }
    if let Some(d) = to {
        parse_date(d)?;
    }
    let rows = match (from, to) {
        (Some(from), Some(to)) => {
            let sql = format!(
                "{} WHERE date >= ? AND date <= ? ORDER BY date DESC, created_at DESC",
                JOURNAL_SELECT
            );
            sqlx::query_as::<_, JournalEntry>(&sql)
                .bind(from)
                .bind(to)
                .fetch_all(pool)
                .await?
        }
        _ => {
            let sql = format!("{} ORDER BY date DESC, created_at DESC", JOURNAL_SELECT);
            sqlx::query_as::<_, JournalEntry>(&sql).fetch_all(pool).await?
        }
    };
    Ok(rows)
}

/// All entries of one business date, insertion order
pub async fn find_by_date(pool: &SqlitePool, date: &str) -> RepoResult<Vec<JournalEntry>> {
    parse_date(date)?;
    let sql = format!("{} WHERE date = ? ORDER BY created_at ASC", JOURNAL_SELECT);
    let rows = sqlx::query_as::<_, JournalEntry>(&sql)
        .bind(date)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM journal WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
