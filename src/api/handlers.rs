//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::quote::{ScenarioTable, YearRecord};

use super::AppState;
use super::types::{CashFlowQuery, ErrorResponse, QuoteResponse};

/// Returns the inputs and the full result record.
///
/// `GET /quote` → 200 + `QuoteResponse` JSON
pub async fn get_quote(State(state): State<Arc<AppState>>) -> Json<QuoteResponse> {
    Json(QuoteResponse {
        inputs: state.inputs.clone(),
        result: state.result.clone(),
    })
}

/// Returns year records, optionally filtered by year range.
///
/// `GET /cashflow` → 200 + `Vec<YearRecord>` JSON
/// `GET /cashflow?from=N&to=M` → filtered range (inclusive)
/// `GET /cashflow?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_cashflow(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CashFlowQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(u32::MAX);

    if from > to {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("`from` ({from}) must be <= `to` ({to})"),
            }),
        ));
    }

    let records: Vec<YearRecord> = state
        .result
        .years
        .iter()
        .filter(|r| r.year >= from && r.year <= to)
        .cloned()
        .collect();

    Ok(Json(records))
}

/// Returns the sensitivity table computed at startup.
///
/// `GET /sensitivity` → 200 + `ScenarioTable` JSON
pub async fn get_sensitivity(State(state): State<Arc<AppState>>) -> Json<ScenarioTable> {
    Json(state.sensitivity.clone())
}
