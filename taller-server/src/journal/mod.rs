//! Cash Journal
//!
//! Server-side rendition of the daily cash reconciliation: the day's
//! income is payment-derived lines plus manual ingreso entries, expenses
//! are manual egreso entries. Closing a day writes an append-only
//! snapshot to `journal_days`.

use chrono_tz::Tz;
use sqlx::SqlitePool;

use crate::db::repository::{journal as journal_repo, journal_day as journal_day_repo};
use crate::orders::money;
use crate::utils::time::{local_day_bounds_millis, parse_date, validate_not_future_date};
use crate::utils::{AppError, AppResult};
use shared::models::{
    ExpenseLine, IncomeLine, JournalDayClosure, JournalDaySummary, JournalTotals, JournalType,
};

/// Payment joined with its order's service name and details, for income
/// line labeling
#[derive(Debug, sqlx::FromRow)]
struct PaymentIncomeRow {
    payment_id: i64,
    order_id: i64,
    amount: f64,
    payment_method: String,
    notes: Option<String>,
    service_name: String,
    details: String,
}

async fn payment_income_rows(
    pool: &SqlitePool,
    from_millis: i64,
    to_millis: i64,
) -> AppResult<Vec<PaymentIncomeRow>> {
    let rows = sqlx::query_as::<_, PaymentIncomeRow>(
        r#"
        SELECT
            p.id AS payment_id,
            p.order_id AS order_id,
            p.amount AS amount,
            p.payment_method AS payment_method,
            p.notes AS notes,
            s.name AS service_name,
            o.details AS details
        FROM payments p
        JOIN orders o ON o.id = p.order_id
        JOIN services s ON s.id = o.service_id
        WHERE p.date >= ? AND p.date < ?
        ORDER BY p.date ASC, p.created_at ASC
        "#,
    )
    .bind(from_millis)
    .bind(to_millis)
    .fetch_all(pool)
    .await
    .map_err(crate::db::repository::RepoError::from)?;
    Ok(rows)
}

/// Reconciled view of one business date: payment income + manual lines.
pub async fn day_summary(pool: &SqlitePool, date: &str, tz: Tz) -> AppResult<JournalDaySummary> {
    let parsed = parse_date(date)?;
    let (start, end) = local_day_bounds_millis(parsed, tz);

    let mut ingresos: Vec<IncomeLine> = Vec::new();

    for row in payment_income_rows(pool, start, end).await? {
        let order_name = if row.details.is_empty() {
            row.service_name.clone()
        } else {
            format!("{} - {}", row.service_name, row.details)
        };
        let concept = match row.notes.as_deref() {
            Some(n) if !n.trim().is_empty() => n.to_string(),
            _ => format!("Pago {}", row.payment_method),
        };
        ingresos.push(IncomeLine {
            source: "payment".to_string(),
            amount: row.amount,
            concept,
            order_id: Some(row.order_id),
            order_name: Some(order_name),
            payment_id: Some(row.payment_id),
            journal_id: None,
        });
    }

    let mut egresos: Vec<ExpenseLine> = Vec::new();
    for entry in journal_repo::find_by_date(pool, date).await? {
        match entry.entry_type {
            JournalType::Ingreso => ingresos.push(IncomeLine {
                source: "manual".to_string(),
                amount: entry.amount,
                concept: entry.concept,
                order_id: None,
                order_name: None,
                payment_id: None,
                journal_id: Some(entry.id),
            }),
            JournalType::Egreso => egresos.push(ExpenseLine {
                amount: entry.amount,
                concept: entry.concept,
                journal_id: Some(entry.id),
            }),
        }
    }

    let total_ingresos =
        money::sum(&ingresos.iter().map(|l| l.amount).collect::<Vec<_>>());
    let total_egresos =
        money::sum(&egresos.iter().map(|l| l.amount).collect::<Vec<_>>());

    Ok(JournalDaySummary {
        date: date.to_string(),
        ingresos,
        egresos,
        totals: JournalTotals {
            ingresos: total_ingresos,
            egresos: total_egresos,
            neto: money::to_f64(money::to_decimal(total_ingresos) - money::to_decimal(total_egresos)),
        },
    })
}

/// Close one business date: snapshot the summary into the append-only
/// archive. A date can be closed exactly once.
pub async fn close_day(pool: &SqlitePool, date: &str, tz: Tz) -> AppResult<JournalDayClosure> {
    validate_not_future_date(date, tz)?;

    if journal_day_repo::find_by_date(pool, date).await?.is_some() {
        return Err(AppError::Conflict(format!("Day {date} is already closed")));
    }

    let summary = day_summary(pool, date, tz).await?;
    let closure = journal_day_repo::insert(
        pool,
        &summary.date,
        &summary.ingresos,
        &summary.egresos,
        &summary.totals,
    )
    .await?;

    tracing::info!(
        date,
        ingresos = closure.totals.ingresos,
        egresos = closure.totals.egresos,
        neto = closure.totals.neto,
        "Journal day closed"
    );
    Ok(closure)
}
