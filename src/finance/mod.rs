//! Financing, cash flow and investment metrics.

pub mod cashflow;
/// Amortizing loan terms.
pub mod loan;
pub mod metrics;

pub use cashflow::{CashFlow, CashFlowModel, SavingsMode, YearFlow};
pub use loan::FinancingPlan;
pub use metrics::{FinancialMetrics, irr, lcoe, npv, payback_period};
