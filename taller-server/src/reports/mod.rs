//! Financial Reports
//!
//! Date-range aggregations for the dashboard cards/charts plus the CSV
//! ledger export. PDF receipts are a client concern and stay out.

use std::collections::BTreeMap;

use chrono_tz::Tz;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::repository::{RepoError, journal as journal_repo, payment as payment_repo};
use crate::orders::money;
use crate::utils::time::{local_date_of_millis, local_day_bounds_millis, parse_date};
use crate::utils::{AppError, AppResult};
use shared::models::{JournalTotals, JournalType};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodTotal {
    pub method: String,
    pub amount: f64,
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayIncome {
    pub date: String,
    pub amount: f64,
}

/// Everything the reports page needs for one date range
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub from: String,
    pub to: String,
    pub payments_total: f64,
    pub payments_by_method: Vec<MethodTotal>,
    pub orders_by_status: Vec<StatusCount>,
    pub journal: JournalTotals,
    pub income_by_day: Vec<DayIncome>,
}

fn range_bounds(from: &str, to: &str, tz: Tz) -> AppResult<(i64, i64)> {
    let from_date = parse_date(from)?;
    let to_date = parse_date(to)?;
    if from_date > to_date {
        return Err(AppError::validation(format!(
            "from ({from}) must not be after to ({to})"
        )));
    }
    let (start, _) = local_day_bounds_millis(from_date, tz);
    let (_, end) = local_day_bounds_millis(to_date, tz);
    Ok((start, end))
}

pub async fn summary(pool: &SqlitePool, from: &str, to: &str, tz: Tz) -> AppResult<ReportSummary> {
    let (start, end) = range_bounds(from, to, tz)?;

    // Payment-derived income, grouped by method and by local day
    let payments = payment_repo::find_by_time_range(pool, start, end).await?;
    let mut by_method: BTreeMap<&'static str, (Vec<f64>, i64)> = BTreeMap::new();
    let mut by_day: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut all_amounts: Vec<f64> = Vec::with_capacity(payments.len());
    for p in &payments {
        let slot = by_method.entry(p.payment_method.as_str()).or_default();
        slot.0.push(p.amount);
        slot.1 += 1;
        by_day
            .entry(local_date_of_millis(p.date, tz).format("%Y-%m-%d").to_string())
            .or_default()
            .push(p.amount);
        all_amounts.push(p.amount);
    }
    let payments_by_method = by_method
        .into_iter()
        .map(|(method, (amounts, count))| MethodTotal {
            method: method.to_string(),
            amount: money::sum(&amounts),
            count,
        })
        .collect();
    let income_by_day = by_day
        .into_iter()
        .map(|(date, amounts)| DayIncome {
            date,
            amount: money::sum(&amounts),
        })
        .collect();

    // Orders opened in the range, by status
    let status_rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*) FROM orders WHERE created_at >= ? AND created_at < ? GROUP BY status ORDER BY status",
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
    .map_err(RepoError::from)?;
    let orders_by_status = status_rows
        .into_iter()
        .map(|(status, count)| StatusCount { status, count })
        .collect();

    // Manual journal totals over the same dates
    let entries = journal_repo::find_all(pool, Some(from), Some(to)).await?;
    let mut ingresos: Vec<f64> = Vec::new();
    let mut egresos: Vec<f64> = Vec::new();
    for e in &entries {
        match e.entry_type {
            JournalType::Ingreso => ingresos.push(e.amount),
            JournalType::Egreso => egresos.push(e.amount),
        }
    }
    let total_ingresos = money::sum(&ingresos);
    let total_egresos = money::sum(&egresos);

    Ok(ReportSummary {
        from: from.to_string(),
        to: to.to_string(),
        payments_total: money::sum(&all_amounts),
        payments_by_method,
        orders_by_status,
        journal: JournalTotals {
            ingresos: total_ingresos,
            egresos: total_egresos,
            neto: money::to_f64(
                money::to_decimal(total_ingresos) - money::to_decimal(total_egresos),
            ),
        },
        income_by_day,
    })
}

/// One CSV ledger row: payments and manual journal entries interleaved
/// by date
#[derive(Debug, Serialize)]
struct LedgerRow<'a> {
    date: String,
    kind: &'a str,
    concept: String,
    method: Option<&'a str>,
    amount: f64,
    order_id: Option<i64>,
    reference_id: i64,
}

/// Export the range's cash movements as CSV (payments + journal).
pub async fn export_ledger_csv(
    pool: &SqlitePool,
    from: &str,
    to: &str,
    tz: Tz,
) -> AppResult<String> {
    let (start, end) = range_bounds(from, to, tz)?;

    let mut writer = csv::WriterBuilder::new().from_writer(vec![]);

    let payments = payment_repo::find_by_time_range(pool, start, end).await?;
    for p in &payments {
        let concept = match p.notes.as_deref() {
            Some(n) if !n.trim().is_empty() => n.to_string(),
            _ => format!("Pago {}", p.payment_method.as_str()),
        };
        writer
            .serialize(LedgerRow {
                date: local_date_of_millis(p.date, tz).format("%Y-%m-%d").to_string(),
                kind: "ingreso",
                concept,
                method: Some(p.payment_method.as_str()),
                amount: p.amount,
                order_id: Some(p.order_id),
                reference_id: p.id,
            })
            .map_err(|e| AppError::internal(format!("CSV encoding failed: {e}")))?;
    }

    let entries = journal_repo::find_all(pool, Some(from), Some(to)).await?;
    for e in &entries {
        let kind = match e.entry_type {
            JournalType::Ingreso => "ingreso",
            JournalType::Egreso => "egreso",
        };
        writer
            .serialize(LedgerRow {
                date: e.date.clone(),
                kind,
                concept: e.concept.clone(),
                method: None,
                amount: e.amount,
                order_id: None,
                reference_id: e.id,
            })
            .map_err(|e| AppError::internal(format!("CSV encoding failed: {e}")))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::internal(format!("CSV encoding failed: {e}")))?;
    String::from_utf8(bytes).map_err(|e| AppError::internal(format!("CSV is not UTF-8: {e}")))
}
