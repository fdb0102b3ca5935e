//! Error types for the quotation engine.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::config::ConfigError;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, QuoteError>;

/// A single violated input constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputError {
    /// Dotted field path (e.g., `"site.monthly_load_kwh"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl InputError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// No inverter configuration exists for the requested capacity.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("no inverter fits a {capacity_kwp:.2} kWp array (max AC {max_ac_kw} kW)")]
pub struct SizingFailure {
    pub capacity_kwp: f64,
    pub max_ac_kw: u32,
}

/// Errors produced while building or exporting a quote.
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("invalid input: {}", join_violations(.0))]
    InvalidInput(Vec<InputError>),
    #[error("sizing failure: {0}")]
    Sizing(#[from] SizingFailure),
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn join_violations(errors: &[InputError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_lists_all_violations() {
        let err = QuoteError::InvalidInput(vec![
            InputError::new("site.tariff", "must be > 0"),
            InputError::new("site.hsp", "must have 12 monthly values, got 11"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("site.tariff: must be > 0"));
        assert!(msg.contains("site.hsp"));
    }

    #[test]
    fn sizing_failure_converts() {
        let err: QuoteError = SizingFailure {
            capacity_kwp: 1.2,
            max_ac_kw: 1,
        }
        .into();
        assert!(matches!(err, QuoteError::Sizing(_)));
        assert!(err.to_string().contains("1.20 kWp"));
    }

    #[test]
    fn config_errors_propagate_with_question_mark() {
        fn load(name: &str) -> Result<crate::config::ProjectConfig> {
            Ok(crate::config::ProjectConfig::from_preset(name)?)
        }
        assert!(load("medellin_residential").is_ok());
        let err = load("atlantis").expect_err("unknown preset");
        assert!(matches!(err, QuoteError::Config(_)));
        assert!(err.to_string().contains("atlantis"));
    }
}
