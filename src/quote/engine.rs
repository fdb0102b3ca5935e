//! Quotation pipeline: sizing, inverter, generation, cash flow and metrics.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::carbon::{CarbonCalculator, CarbonResult, legacy_tree_estimate};
use crate::error::{QuoteError, Result};
use crate::finance::metrics::irr;
use crate::finance::{CashFlow, CashFlowModel, FinancialMetrics, FinancingPlan, SavingsMode};
use crate::system::cost::{
    capacity_kwp, panels_for_load, pv_cost, scaled_panel_count, size_battery, total_cost,
};
use crate::system::generation::performance_ratio;
use crate::system::inverter::clipping_loss;
use crate::system::{GenerationModel, InverterPlan, recommend_inverter};
use crate::types::QuoteInputs;

/// One row of the year-by-year audit table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearRecord {
    /// 0 is the initial outlay.
    pub year: u32,
    pub generation_kwh: f64,
    pub savings: f64,
    pub maintenance: f64,
    pub loan_payment: f64,
    pub tax_benefit: f64,
    pub net_flow: f64,
    pub cumulative: f64,
    pub discounted_flow: f64,
    /// NPV of the series truncated at this year.
    pub partial_npv: f64,
    /// IRR of the series truncated at this year, if defined.
    pub partial_irr: Option<f64>,
}

/// Everything a quotation produces.
///
/// This is the stable outbound record consumed by reports, exports and the
/// API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteResult {
    pub panel_count: u32,
    pub capacity_kwp: f64,
    pub roof_area_m2: f64,
    pub performance_ratio: f64,
    pub hsp: Vec<f64>,

    pub inverter: InverterPlan,
    /// Formatted plan, e.g. `"2x6kW"`.
    pub inverter_plan: String,
    pub ac_power_kw: u32,
    pub dc_ac_ratio: f64,
    pub clipping_loss: f64,

    /// First-year monthly generation (kWh).
    pub monthly_generation: [f64; 12],
    pub annual_generation_kwh: f64,
    pub lifetime_generation_kwh: f64,

    pub pv_cost: f64,
    pub battery_cost: f64,
    /// Nominal battery capacity (kWh), zero without a battery.
    pub battery_nominal_kwh: f64,
    pub total_cost: f64,

    pub financed_amount: f64,
    pub down_payment: f64,
    pub monthly_payment: f64,

    pub horizon_years: u32,
    pub first_year_savings: f64,
    /// Net flows, index 0 is the initial outlay.
    pub cash_flows: Vec<f64>,
    pub years: Vec<YearRecord>,
    #[serde(flatten)]
    pub metrics: FinancialMetrics,

    /// Trees equivalent to the first-year offset on the Colombian grid.
    pub legacy_trees: f64,
    pub carbon: Option<CarbonResult>,
}

/// Entry point of the quotation pipeline.
///
/// The engine is stateless apart from the optional carbon calculator, which
/// is shared read-only between quotes.
#[derive(Debug, Clone, Default)]
pub struct QuoteEngine {
    carbon: Option<Arc<CarbonCalculator>>,
}

impl QuoteEngine {
    /// Engine without carbon reporting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine that attaches a [`CarbonResult`] to every quote.
    pub fn with_carbon(calculator: Arc<CarbonCalculator>) -> Self {
        Self {
            carbon: Some(calculator),
        }
    }

    pub fn carbon(&self) -> Option<&CarbonCalculator> {
        self.carbon.as_deref()
    }

    /// Runs the full pipeline for `inputs`.
    ///
    /// # Errors
    ///
    /// * [`QuoteError::InvalidInput`] listing every violated constraint.
    /// * [`QuoteError::Sizing`] when no inverter fits the array.
    pub fn quote(&self, inputs: &QuoteInputs) -> Result<QuoteResult> {
        let violations = inputs.validate();
        if !violations.is_empty() {
            return Err(QuoteError::InvalidInput(violations));
        }
        let site = &inputs.site;
        let params = &inputs.params;

        let pr = performance_ratio(params.performance_ratio_base, site.climate, site.roof);
        let panel_count = match inputs.system.panel_count {
            Some(requested) => scaled_panel_count(requested, inputs.system.capacity_scale),
            None => panels_for_load(
                site.monthly_load_kwh,
                &site.hsp,
                pr,
                site.panel_wattage_w,
                inputs.system.capacity_scale,
            ),
        };
        let capacity = capacity_kwp(panel_count, site.panel_wattage_w);
        debug!(panel_count, capacity_kwp = capacity, performance_ratio = pr, "array sized");

        let inverter = recommend_inverter(capacity)?;
        let clipping = clipping_loss(inverter.dc_ac_ratio);
        let generation =
            GenerationModel::new(capacity, &site.hsp, pr, clipping, params.degradation_rate);

        let battery = inputs
            .battery
            .enabled
            .then(|| size_battery(site.monthly_load_kwh, &inputs.battery));
        let pv = pv_cost(capacity, site.roof);
        let battery_cost = battery.as_ref().map_or(0.0, |b| b.cost);
        let total = total_cost(pv, battery_cost);
        let financing = FinancingPlan::new(total, &inputs.financing);
        debug!(pv_cost = pv, battery_cost, total_cost = total, "costed");

        let mode = if battery.is_some() {
            SavingsMode::OffGrid
        } else {
            SavingsMode::GridTied
        };
        let cash_flow = CashFlowModel {
            generation: &generation,
            financing: &financing,
            tax: &inputs.tax,
            mode,
            monthly_load_kwh: site.monthly_load_kwh,
            tariff: site.tariff,
            surplus_price: site.surplus_price,
            indexation_rate: site.indexation_rate,
            maintenance_fraction: params.maintenance_fraction,
            capex: total,
            horizon_years: site.horizon_years,
            commissioning_delay: params.commissioning_delay,
        }
        .build();

        let lifetime_kwh = generation.lifetime_kwh(site.horizon_years);
        let metrics = FinancialMetrics::compute(
            cash_flow.series(),
            site.discount_rate,
            financing.down_payment,
            &cash_flow.maintenance(),
            lifetime_kwh,
        );
        let annual_kwh = generation.annual_kwh();
        let carbon = self
            .carbon
            .as_ref()
            .map(|c| c.calculate(annual_kwh, &site.region, site.horizon_years));

        info!(
            capacity_kwp = capacity,
            inverter = %inverter,
            total_cost = total,
            npv = metrics.npv,
            irr = ?metrics.irr,
            payback = ?metrics.payback_years,
            "quote computed"
        );

        Ok(QuoteResult {
            panel_count,
            capacity_kwp: capacity,
            roof_area_m2: f64::from(panel_count) * params.roof_area_per_panel_m2,
            performance_ratio: pr,
            hsp: site.hsp.clone(),
            inverter_plan: inverter.to_string(),
            ac_power_kw: inverter.total_ac_kw,
            dc_ac_ratio: inverter.dc_ac_ratio,
            clipping_loss: clipping,
            inverter,
            monthly_generation: *generation.monthly_kwh(),
            annual_generation_kwh: annual_kwh,
            lifetime_generation_kwh: lifetime_kwh,
            pv_cost: pv,
            battery_cost,
            battery_nominal_kwh: battery.as_ref().map_or(0.0, |b| b.nominal_kwh),
            total_cost: total,
            financed_amount: financing.financed_amount,
            down_payment: financing.down_payment,
            monthly_payment: financing.monthly_payment,
            horizon_years: site.horizon_years,
            first_year_savings: cash_flow.first_year_savings(),
            cash_flows: cash_flow.series().to_vec(),
            years: year_records(&cash_flow, site.discount_rate),
            metrics,
            legacy_trees: legacy_tree_estimate(annual_kwh),
            carbon,
        })
    }
}

/// Builds the audit table, year 0 included.
pub fn year_records(cash_flow: &CashFlow, discount_rate: f64) -> Vec<YearRecord> {
    let series = cash_flow.series();
    let cumulative = cash_flow.cumulative();
    let mut records = Vec::with_capacity(series.len());
    let mut discount = 1.0;
    let mut partial_npv = 0.0;

    for (k, &net) in series.iter().enumerate() {
        let discounted = net / discount;
        partial_npv += discounted;
        let detail = k.checked_sub(1).and_then(|i| cash_flow.years().get(i));
        records.push(YearRecord {
            year: k as u32,
            generation_kwh: detail.map_or(0.0, |d| d.generation_kwh),
            savings: detail.map_or(0.0, |d| d.savings),
            maintenance: detail.map_or(0.0, |d| d.maintenance),
            loan_payment: detail.map_or(0.0, |d| d.loan_payment),
            tax_benefit: detail.map_or(0.0, |d| d.tax_benefit),
            net_flow: net,
            cumulative: cumulative[k],
            discounted_flow: discounted,
            partial_npv,
            partial_irr: irr(&series[..=k]),
        });
        discount *= 1.0 + discount_rate;
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::medellin_inputs;

    #[test]
    fn medellin_reference_quote() {
        let result = QuoteEngine::new()
            .quote(&medellin_inputs())
            .expect("reference quote");
        assert_eq!(result.panel_count, 20);
        assert!((result.capacity_kwp - 12.0).abs() < 1e-12);
        assert_eq!(result.inverter_plan, "2x6kW");
        assert_eq!(result.ac_power_kw, 12);
        assert_eq!(result.clipping_loss, 0.0);
        assert!((result.performance_ratio - 0.75).abs() < 1e-12);
        assert!((result.monthly_generation[0] - 1269.45).abs() < 1e-6);
        let sum: f64 = result.monthly_generation.iter().sum();
        assert!((result.annual_generation_kwh - sum).abs() < 1e-9);
        assert_eq!(result.cash_flows.len(), 26);
        assert_eq!(result.cash_flows[0], -result.total_cost);
        assert_eq!(result.financed_amount, 0.0);
        assert!((result.roof_area_m2 - 52.0).abs() < 1e-9);
        assert_eq!(result.battery_nominal_kwh, 0.0);
        assert!(result.carbon.is_none());
        assert!(result.metrics.irr.is_some());
        assert!(result.metrics.payback_years.is_some());
    }

    #[test]
    fn total_cost_is_whole_currency() {
        let result = QuoteEngine::new().quote(&medellin_inputs()).expect("quote");
        assert_eq!(result.total_cost, result.total_cost.ceil());
        assert!(result.total_cost >= result.pv_cost + result.battery_cost);
    }

    #[test]
    fn invalid_inputs_are_rejected_before_computation() {
        let mut inputs = medellin_inputs();
        inputs.site.monthly_load_kwh = -5.0;
        inputs.site.hsp = vec![4.0; 11];
        let err = QuoteEngine::new().quote(&inputs).expect_err("must fail");
        match err {
            QuoteError::InvalidInput(v) => assert_eq!(v.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn huge_load_is_rejected_instead_of_overflowing() {
        let mut inputs = medellin_inputs();
        inputs.system.panel_count = None;
        inputs.site.monthly_load_kwh = 1e12;
        match QuoteEngine::new().quote(&inputs) {
            Err(QuoteError::InvalidInput(v)) => {
                assert_eq!(v.len(), 1);
                assert_eq!(v[0].field, "site.monthly_load_kwh");
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn tiny_array_is_a_sizing_failure() {
        let mut inputs = medellin_inputs();
        inputs.system.panel_count = Some(2);
        inputs.site.panel_wattage_w = 300.0;
        let err = QuoteEngine::new().quote(&inputs).expect_err("must fail");
        assert!(matches!(err, QuoteError::Sizing(_)));
    }

    #[test]
    fn odd_panel_request_is_rounded_up() {
        let mut inputs = medellin_inputs();
        inputs.system.panel_count = Some(21);
        let result = QuoteEngine::new().quote(&inputs).expect("quote");
        assert_eq!(result.panel_count, 22);
        assert!((result.capacity_kwp - 13.2).abs() < 1e-9);
    }

    #[test]
    fn sizing_from_load_yields_even_count() {
        let mut inputs = medellin_inputs();
        inputs.system.panel_count = None;
        let result = QuoteEngine::new().quote(&inputs).expect("quote");
        assert_eq!(result.panel_count % 2, 0);
        // 700 kWh / (mean HSP ~4.63 * 30 * 0.75) ~ 6.7 kWp -> 12 modules of 600 W
        assert_eq!(result.panel_count, 12);
    }

    #[test]
    fn battery_quote_uses_off_grid_savings() {
        let mut inputs = medellin_inputs();
        inputs.battery.enabled = true;
        let result = QuoteEngine::new().quote(&inputs).expect("quote");
        assert!(result.battery_nominal_kwh > 0.0);
        let expected = 12.0 * 700.0 * 800.0;
        assert!((result.first_year_savings - expected).abs() < 1e-6);
        assert!(result.battery_cost > 0.0);
    }

    #[test]
    fn financing_splits_cost() {
        let mut inputs = medellin_inputs();
        inputs.financing.enabled = true;
        let result = QuoteEngine::new().quote(&inputs).expect("quote");
        assert!((result.financed_amount + result.down_payment - result.total_cost).abs() < 1e-6);
        assert!(result.monthly_payment > 0.0);
        assert!((result.cash_flows[0] + result.down_payment).abs() < 1e-9);
    }

    #[test]
    fn carbon_is_attached_when_injected() {
        let engine = QuoteEngine::with_carbon(Arc::new(CarbonCalculator::default()));
        let result = engine.quote(&medellin_inputs()).expect("quote");
        let carbon = result.carbon.expect("carbon result");
        assert!((carbon.annual_kg - result.annual_generation_kwh * 0.126).abs() < 1e-6);
        assert!((carbon.trees - result.legacy_trees).abs() < 1e-9);
    }

    #[test]
    fn year_records_track_partial_metrics() {
        let inputs = medellin_inputs();
        let result = QuoteEngine::new().quote(&inputs).expect("quote");
        assert_eq!(result.years.len(), result.cash_flows.len());
        assert_eq!(result.years[0].year, 0);
        assert_eq!(result.years[0].partial_irr, None);
        let last = result.years.last().expect("rows");
        assert!((last.partial_npv - result.metrics.npv).abs() < 1e-3);
        assert_eq!(last.partial_irr, result.metrics.irr);
        assert!((last.cumulative - result.cash_flows.iter().sum::<f64>()).abs() < 1e-3);
    }

    #[test]
    fn quoting_is_deterministic() {
        let engine = QuoteEngine::new();
        let a = engine.quote(&medellin_inputs()).expect("quote");
        let b = engine.quote(&medellin_inputs()).expect("quote");
        assert_eq!(a, b);
    }
}
