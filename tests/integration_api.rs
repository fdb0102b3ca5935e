//! Integration tests for the REST API feature.

#![cfg(feature = "api")]

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::util::ServiceExt;

use pv_quote::QuoteEngine;
use pv_quote::api::{AppState, router};
use pv_quote::carbon::CarbonCalculator;
use pv_quote::quote::sensitivity_analysis;

/// Quote the reference project with carbon accounting and return the API state.
fn build_api_state() -> Arc<AppState> {
    let inputs = common::medellin_inputs();
    let engine = QuoteEngine::with_carbon(Arc::new(CarbonCalculator::default()));
    let result = engine.quote(&inputs).expect("reference quote");
    let sensitivity = sensitivity_analysis(&engine, &inputs);
    Arc::new(AppState {
        inputs,
        result,
        sensitivity,
    })
}

async fn get(uri: &str) -> (StatusCode, serde_json::Value) {
    let app = router(build_api_state());
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn quote_includes_carbon_offsets() {
    let (status, json) = get("/quote").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["inputs"]["site"]["monthly_load_kwh"], 700.0);
    let carbon = &json["result"]["carbon"];
    assert_eq!(carbon["region"], "colombia");
    assert!(carbon["annual_tonnes"].as_f64().unwrap_or(0.0) > 0.0);
}

#[tokio::test]
async fn cashflow_years_are_consistent_with_result() {
    let (_, quote) = get("/quote").await;
    let (status, years) = get("/cashflow").await;
    assert_eq!(status, StatusCode::OK);

    let years = years.as_array().cloned().unwrap_or_default();
    let flows = quote["result"]["cash_flows"].as_array().cloned().unwrap_or_default();
    assert_eq!(years.len(), flows.len());
    for (record, flow) in years.iter().zip(&flows) {
        assert_eq!(record["net_flow"], *flow);
    }
}

#[tokio::test]
async fn cashflow_open_ended_range() {
    let (status, json) = get("/cashflow?from=20").await;
    assert_eq!(status, StatusCode::OK);
    let rows = json.as_array().cloned().unwrap_or_default();
    assert_eq!(rows.len(), 6); // years 20..=25
}

#[tokio::test]
async fn sensitivity_rows_carry_labels() {
    let (status, json) = get("/sensitivity").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Sensitivity Analysis");
    assert_eq!(json["rows"][0]["scenario"]["label"], "10 years, financed");
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = router(build_api_state());
    let req = Request::builder()
        .uri("/nope")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
