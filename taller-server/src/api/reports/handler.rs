//! Report API Handlers

use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::reports;
use crate::utils::AppResult;

#[derive(Deserialize)]
pub struct RangeQuery {
    pub from: String,
    pub to: String,
}

/// GET /api/reports/summary?from&to
pub async fn summary(
    State(state): State<ServerState>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<reports::ReportSummary>> {
    let report = reports::summary(
        &state.pool,
        &query.from,
        &query.to,
        state.config.timezone,
    )
    .await?;
    Ok(Json(report))
}

/// GET /api/reports/ledger.csv?from&to — cash-movement export
pub async fn ledger_csv(
    State(state): State<ServerState>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Response> {
    let csv = reports::export_ledger_csv(
        &state.pool,
        &query.from,
        &query.to,
        state.config.timezone,
    )
    .await?;

    let filename = format!("ledger_{}_{}.csv", query.from, query.to);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    )
        .into_response())
}
