//! REST API exposing a computed quote.
//!
//! Provides three GET endpoints:
//! - `/quote`: inputs and the full result record
//! - `/cashflow`: year-by-year table with optional range filtering
//! - `/sensitivity`: horizon x financing scenario table

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::quote::{QuoteResult, ScenarioTable};
use crate::types::QuoteInputs;

pub use types::{CashFlowQuery, ErrorResponse, QuoteResponse};

/// Immutable application state shared across all request handlers.
///
/// Built once after the quote is computed and wrapped in `Arc`; requests
/// never re-run the engine.
pub struct AppState {
    /// Inputs the quote was computed from.
    pub inputs: QuoteInputs,
    pub result: QuoteResult,
    pub sensitivity: ScenarioTable,
}

/// Builds the axum router with all API routes.
///
/// # Arguments
///
/// * `state` - Shared application state
///
/// # Returns
///
/// Configured `Router` ready to serve.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/quote", get(handlers::get_quote))
        .route("/cashflow", get(handlers::get_cashflow))
        .route("/sensitivity", get(handlers::get_sensitivity))
        .with_state(state)
}

/// Binds to the given address and serves the API until the server stops.
///
/// # Errors
///
/// Returns [`QuoteError::Io`](crate::QuoteError::Io) if the listener cannot
/// bind to `addr` or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> crate::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
