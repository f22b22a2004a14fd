//! Journal Day Closure Repository
//!
//! Append-only archive. Line items are stored as JSON text; rows are
//! written once at close time and never updated.

use super::{RepoError, RepoResult};
use shared::models::{ExpenseLine, IncomeLine, JournalDayClosure, JournalTotals};
use sqlx::SqlitePool;

/// Raw row; JSON columns decoded on the way out
#[derive(Debug, sqlx::FromRow)]
struct JournalDayRow {
    id: i64,
    date: String,
    ingresos: String,
    egresos: String,
    totals: String,
    created_at: i64,
}

impl JournalDayRow {
    fn decode(self) -> RepoResult<JournalDayClosure> {
        let ingresos: Vec<IncomeLine> = serde_json::from_str(&self.ingresos)
            .map_err(|e| RepoError::Database(format!("Corrupt ingresos JSON: {e}")))?;
        let egresos: Vec<ExpenseLine> = serde_json::from_str(&self.egresos)
            .map_err(|e| RepoError::Database(format!("Corrupt egresos JSON: {e}")))?;
        let totals: JournalTotals = serde_json::from_str(&self.totals)
            .map_err(|e| RepoError::Database(format!("Corrupt totals JSON: {e}")))?;
        Ok(JournalDayClosure {
            id: self.id,
            date: self.date,
            ingresos,
            egresos,
            totals,
            created_at: self.created_at,
        })
    }
}

const DAY_SELECT: &str =
    "SELECT id, date, ingresos, egresos, totals, created_at FROM journal_days";

pub async fn insert(
    pool: &SqlitePool,
    date: &str,
    ingresos: &[IncomeLine],
    egresos: &[ExpenseLine],
    totals: &JournalTotals,
) -> RepoResult<JournalDayClosure> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    let ingresos_json = serde_json::to_string(ingresos)
        .map_err(|e| RepoError::Database(format!("Failed to encode ingresos: {e}")))?;
    let egresos_json = serde_json::to_string(egresos)
        .map_err(|e| RepoError::Database(format!("Failed to encode egresos: {e}")))?;
    let totals_json = serde_json::to_string(totals)
        .map_err(|e| RepoError::Database(format!("Failed to encode totals: {e}")))?;

    sqlx::query(
        "INSERT INTO journal_days (id, date, ingresos, egresos, totals, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(id)
    .bind(date)
    .bind(&ingresos_json)
    .bind(&egresos_json)
    .bind(&totals_json)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => {
            RepoError::Duplicate(format!("Day {date} is already closed"))
        }
        other => other,
    })?;

    find_by_date(pool, date)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create day closure".into()))
}

pub async fn find_by_date(pool: &SqlitePool, date: &str) -> RepoResult<Option<JournalDayClosure>> {
    let sql = format!("{} WHERE date = ? LIMIT 1", DAY_SELECT);
    let row = sqlx::query_as::<_, JournalDayRow>(&sql)
        .bind(date)
        .fetch_optional(pool)
        .await?;
    row.map(JournalDayRow::decode).transpose()
}

pub async fn find_all(pool: &SqlitePool, limit: i32, offset: i32) -> RepoResult<Vec<JournalDayClosure>> {
    let sql = format!("{} ORDER BY date DESC LIMIT ? OFFSET ?", DAY_SELECT);
    let rows = sqlx::query_as::<_, JournalDayRow>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(JournalDayRow::decode).collect()
}
