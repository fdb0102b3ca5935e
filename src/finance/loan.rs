//! Amortizing loan used to finance part of the project cost.

use serde::Serialize;

use crate::types::FinancingTerms;

/// Resolved financing for a given project cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancingPlan {
    /// Share of the cost financed (0..=100, zero when financing is off).
    pub percent_financed: f64,
    pub annual_rate: f64,
    pub term_years: u32,
    /// Amount borrowed.
    pub financed_amount: f64,
    /// Amount paid up front.
    pub down_payment: f64,
    /// Fixed monthly installment.
    pub monthly_payment: f64,
}

impl FinancingPlan {
    /// Resolves `terms` against a total project cost.
    pub fn new(total_cost: f64, terms: &FinancingTerms) -> Self {
        let percent = terms.effective_percent();
        let financed_amount = total_cost * percent / 100.0;
        let down_payment = total_cost * (1.0 - percent / 100.0);
        let term_years = if percent > 0.0 { terms.term_years } else { 0 };
        let monthly_payment = monthly_payment(financed_amount, terms.annual_rate, term_years * 12);
        Self {
            percent_financed: percent,
            annual_rate: terms.annual_rate,
            term_years,
            financed_amount,
            down_payment,
            monthly_payment,
        }
    }

    /// Loan payments falling in 0-based operating year `year`.
    pub fn annual_installment(&self, year: u32) -> f64 {
        if year < self.term_years {
            self.monthly_payment * 12.0
        } else {
            0.0
        }
    }
}

/// Standard annuity payment for `principal` over `months` at a nominal
/// annual rate.
pub fn monthly_payment(principal: f64, annual_rate: f64, months: u32) -> f64 {
    if principal <= 0.0 || months == 0 {
        return 0.0;
    }
    let r = annual_rate / 12.0;
    let n = f64::from(months);
    if r == 0.0 {
        return principal / n;
    }
    principal * r / (1.0 - (1.0 + r).powf(-n))
}
