//! Solar-PV quotation engine.
//!
//! Sizes a photovoltaic system from site and consumption inputs, selects
//! an inverter configuration, projects multi-year cash flows and derives
//! NPV, IRR, payback and LCOE. The entry point is [`quote::QuoteEngine`].

#[cfg(feature = "api")]
pub mod api;
pub mod carbon;
pub mod config;
pub mod error;
/// Loan, cash-flow and investment-metric modules.
pub mod finance;
pub mod io;
pub mod logging;
pub mod quote;
pub mod report;
pub mod system;
pub mod types;

pub use error::{QuoteError, Result};
pub use quote::{QuoteEngine, QuoteResult};
pub use types::QuoteInputs;
