//! Year-by-year free cash flow of a PV project.
//!
//! Year 0 carries the negative down payment. Each operating year then adds
//! indexed energy savings, subtracts maintenance and loan installments and
//! adds any tax benefits.

use serde::Serialize;
use tracing::debug;

use crate::system::GenerationModel;
use crate::types::TaxBenefits;

use super::loan::FinancingPlan;

/// Share of CAPEX deductible from income tax, received in operating year 2.
pub const INCOME_DEDUCTION_SHARE: f64 = 0.175;
/// Share of CAPEX depreciated in each of the first three operating years.
pub const ACCELERATED_DEPRECIATION_SHARE: f64 = 0.33;
const ACCELERATED_DEPRECIATION_YEARS: u32 = 3;

/// How energy savings are valued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavingsMode {
    /// Net billing against the grid, month by month.
    GridTied,
    /// Battery-backed system assumed to cover all consumption.
    OffGrid,
}

/// Breakdown of one operating year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearFlow {
    /// Operating year, 1-based.
    pub year: u32,
    /// Degraded generation (kWh).
    pub generation_kwh: f64,
    /// Indexed savings after the commissioning-delay adjustment.
    pub savings: f64,
    pub maintenance: f64,
    pub loan_payment: f64,
    pub tax_benefit: f64,
    /// `savings - maintenance - loan_payment + tax_benefit`.
    pub net: f64,
}

/// Everything the cash-flow build needs, borrowed from the quote.
#[derive(Debug, Clone)]
pub struct CashFlowModel<'a> {
    pub generation: &'a GenerationModel,
    pub financing: &'a FinancingPlan,
    pub tax: &'a TaxBenefits,
    pub mode: SavingsMode,
    pub monthly_load_kwh: f64,
    pub tariff: f64,
    pub surplus_price: f64,
    pub indexation_rate: f64,
    pub maintenance_fraction: f64,
    /// Total project cost used for tax benefits.
    pub capex: f64,
    pub horizon_years: u32,
    pub commissioning_delay: bool,
}

/// Immutable cash-flow series with its per-year breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashFlow {
    series: Vec<f64>,
    years: Vec<YearFlow>,
}

impl CashFlow {
    /// Net flows, index 0 is the initial outlay. Length is horizon + 1.
    pub fn series(&self) -> &[f64] {
        &self.series
    }

    /// Operating-year breakdown, length horizon.
    pub fn years(&self) -> &[YearFlow] {
        &self.years
    }

    /// Savings in the first operating year.
    pub fn first_year_savings(&self) -> f64 {
        self.years.first().map_or(0.0, |y| y.savings)
    }

    /// Maintenance costs by operating year.
    pub fn maintenance(&self) -> Vec<f64> {
        self.years.iter().map(|y| y.maintenance).collect()
    }

    /// Running sum of the series.
    pub fn cumulative(&self) -> Vec<f64> {
        self.series
            .iter()
            .scan(0.0, |acc, cf| {
                *acc += cf;
                Some(*acc)
            })
            .collect()
    }
}

impl CashFlowModel<'_> {
    /// Savings for one year of monthly generation, before indexation.
    fn base_savings(&self, monthly_generation: &[f64; 12]) -> f64 {
        match self.mode {
            SavingsMode::OffGrid => 12.0 * self.monthly_load_kwh * self.tariff,
            SavingsMode::GridTied => monthly_generation
                .iter()
                .map(|&generation| {
                    if generation >= self.monthly_load_kwh {
                        self.monthly_load_kwh * self.tariff
                            + (generation - self.monthly_load_kwh) * self.surplus_price
                    } else {
                        generation * self.tariff
                    }
                })
                .sum(),
        }
    }

    fn tax_benefit(&self, year: u32) -> f64 {
        let mut benefit = 0.0;
        if self.tax.income_deduction && year == 1 {
            benefit += INCOME_DEDUCTION_SHARE * self.capex * (1.0 + self.indexation_rate);
        }
        if self.tax.accelerated_depreciation && year < ACCELERATED_DEPRECIATION_YEARS {
            benefit += ACCELERATED_DEPRECIATION_SHARE * self.capex;
        }
        benefit
    }

    /// Runs the operating years and returns the finished series.
    pub fn build(&self) -> CashFlow {
        let horizon = self.horizon_years as usize;
        let mut series = Vec::with_capacity(horizon + 1);
        let mut years = Vec::with_capacity(horizon);
        series.push(-self.financing.down_payment);

        for i in 0..self.horizon_years {
            let monthly = self.generation.monthly_for_year(i);
            let mut savings =
                self.base_savings(&monthly) * (1.0 + self.indexation_rate).powi(i as i32);
            if self.commissioning_delay && i == 0 {
                savings *= 0.5;
            }
            let maintenance = self.maintenance_fraction * savings;
            let loan_payment = self.financing.annual_installment(i);
            let tax_benefit = self.tax_benefit(i);
            let net = savings - maintenance - loan_payment + tax_benefit;

            series.push(net);
            years.push(YearFlow {
                year: i + 1,
                generation_kwh: monthly.iter().sum(),
                savings,
                maintenance,
                loan_payment,
                tax_benefit,
                net,
            });
        }

        debug!(
            horizon = self.horizon_years,
            initial = series[0],
            first_year = years.first().map_or(0.0, |y| y.net),
            "cash flow built"
        );
        CashFlow { series, years }
    }
}
