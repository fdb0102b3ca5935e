//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::quote::QuoteResult;
use crate::types::QuoteInputs;

/// Inputs and result of the served quote.
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub inputs: QuoteInputs,
    pub result: QuoteResult,
}

/// Optional year range for the cash-flow endpoint.
#[derive(Debug, Deserialize)]
pub struct CashFlowQuery {
    /// First year (inclusive).
    pub from: Option<u32>,
    /// Last year (inclusive).
    pub to: Option<u32>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
