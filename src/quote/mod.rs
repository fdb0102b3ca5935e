//! Quotation entry point and scenario runner.

pub mod engine;
pub mod sensitivity;

pub use engine::{QuoteEngine, QuoteResult, YearRecord};
pub use sensitivity::{
    Scenario, ScenarioOutcome, ScenarioTable, run_scenarios, sensitivity_analysis,
    size_comparison,
};
