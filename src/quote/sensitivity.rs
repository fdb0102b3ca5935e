//! Re-runs the engine over fixed scenario matrices for comparison tables.
//!
//! Each scenario is an independent descriptor applied to a copy of the base
//! inputs. A scenario that fails is logged and replaced by a placeholder
//! row, so a batch always yields one row per descriptor.

use serde::Serialize;
use tracing::warn;

use crate::types::QuoteInputs;

use super::engine::{QuoteEngine, QuoteResult};

/// Horizons compared by the financing matrix (years).
pub const SENSITIVITY_HORIZONS: [u32; 2] = [10, 20];
/// Capacity multipliers compared by the size matrix.
pub const SIZE_FACTORS: [f64; 3] = [0.8, 1.0, 1.2];

/// One variation of the base inputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scenario {
    pub label: String,
    /// Overrides the base horizon when set.
    pub horizon_years: Option<u32>,
    pub financed: bool,
    pub capacity_scale: f64,
}

impl Scenario {
    /// {10, 20 years} x {financed, unfinanced}.
    pub fn financing_matrix() -> Vec<Self> {
        SENSITIVITY_HORIZONS
            .iter()
            .flat_map(|&years| {
                [true, false].map(|financed| Self {
                    label: format!(
                        "{years} years, {}",
                        if financed { "financed" } else { "unfinanced" }
                    ),
                    horizon_years: Some(years),
                    financed,
                    capacity_scale: 1.0,
                })
            })
            .collect()
    }

    /// 0.8x, 1.0x and 1.2x of the sized capacity, financing off.
    pub fn size_matrix() -> Vec<Self> {
        SIZE_FACTORS
            .iter()
            .map(|&scale| Self {
                label: format!("{:.0}%", scale * 100.0),
                horizon_years: None,
                financed: false,
                capacity_scale: scale,
            })
            .collect()
    }

    /// Copy of `base` with this scenario's overrides applied.
    ///
    /// Financed scenarios reuse the base loan terms with financing switched
    /// on.
    pub fn apply(&self, base: &QuoteInputs) -> QuoteInputs {
        let mut inputs = base.clone();
        if let Some(years) = self.horizon_years {
            inputs.site.horizon_years = years;
        }
        inputs.financing.enabled = self.financed;
        inputs.system.capacity_scale = base.system.capacity_scale * self.capacity_scale;
        inputs
    }
}

/// Result row of one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioOutcome {
    pub scenario: Scenario,
    pub horizon_years: u32,
    pub panel_count: u32,
    pub capacity_kwp: f64,
    pub inverter_plan: String,
    pub total_cost: f64,
    pub first_year_savings: f64,
    pub npv: f64,
    pub irr: Option<f64>,
    pub payback_years: Option<f64>,
    pub lcoe: Option<f64>,
    /// Set when the scenario failed and this row is a placeholder.
    pub error: Option<String>,
}

impl ScenarioOutcome {
    fn from_result(scenario: Scenario, result: &QuoteResult) -> Self {
        Self {
            scenario,
            horizon_years: result.horizon_years,
            panel_count: result.panel_count,
            capacity_kwp: result.capacity_kwp,
            inverter_plan: result.inverter_plan.clone(),
            total_cost: result.total_cost,
            first_year_savings: result.first_year_savings,
            npv: result.metrics.npv,
            irr: result.metrics.irr,
            payback_years: result.metrics.payback_years,
            lcoe: result.metrics.lcoe,
            error: None,
        }
    }

    /// Zeroed row standing in for a failed scenario.
    pub fn placeholder(scenario: Scenario, horizon_years: u32, error: String) -> Self {
        Self {
            scenario,
            horizon_years,
            panel_count: 0,
            capacity_kwp: 0.0,
            inverter_plan: String::new(),
            total_cost: 0.0,
            first_year_savings: 0.0,
            npv: 0.0,
            irr: None,
            payback_years: None,
            lcoe: None,
            error: Some(error),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.error.is_some()
    }
}

/// Named set of scenario rows, rendered by [`crate::report`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioTable {
    pub title: String,
    pub rows: Vec<ScenarioOutcome>,
}

impl ScenarioTable {
    /// Number of scenarios that produced real results.
    pub fn succeeded(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_placeholder()).count()
    }
}

/// Runs every scenario against `base`, sequentially and independently.
pub fn run_scenarios(
    engine: &QuoteEngine,
    base: &QuoteInputs,
    scenarios: &[Scenario],
) -> Vec<ScenarioOutcome> {
    scenarios
        .iter()
        .map(|scenario| {
            let inputs = scenario.apply(base);
            match engine.quote(&inputs) {
                Ok(result) => ScenarioOutcome::from_result(scenario.clone(), &result),
                Err(e) => {
                    warn!(scenario = %scenario.label, error = %e, "scenario failed");
                    ScenarioOutcome::placeholder(
                        scenario.clone(),
                        inputs.site.horizon_years,
                        e.to_string(),
                    )
                }
            }
        })
        .collect()
}

/// Horizon x financing comparison.
pub fn sensitivity_analysis(engine: &QuoteEngine, base: &QuoteInputs) -> ScenarioTable {
    ScenarioTable {
        title: "Sensitivity Analysis".to_string(),
        rows: run_scenarios(engine, base, &Scenario::financing_matrix()),
    }
}

/// System-size comparison with financing disabled.
pub fn size_comparison(engine: &QuoteEngine, base: &QuoteInputs) -> ScenarioTable {
    ScenarioTable {
        title: "Size Comparison".to_string(),
        rows: run_scenarios(engine, base, &Scenario::size_matrix()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::medellin_inputs;

    #[test]
    fn financing_matrix_has_four_scenarios() {
        let matrix = Scenario::financing_matrix();
        assert_eq!(matrix.len(), 4);
        assert_eq!(matrix[0].label, "10 years, financed");
        assert_eq!(matrix[3].label, "20 years, unfinanced");
        assert!(matrix.iter().all(|s| s.capacity_scale == 1.0));
    }

    #[test]
    fn apply_does_not_touch_base() {
        let base = medellin_inputs();
        let scenario = &Scenario::financing_matrix()[0];
        let applied = scenario.apply(&base);
        assert!(applied.financing.enabled);
        assert_eq!(applied.site.horizon_years, 10);
        assert!(!base.financing.enabled);
        assert_eq!(base.site.horizon_years, 25);
    }

    #[test]
    fn sensitivity_rows_follow_horizons() {
        let table = sensitivity_analysis(&QuoteEngine::new(), &medellin_inputs());
        assert_eq!(table.rows.len(), 4);
        assert_eq!(table.succeeded(), 4);
        let horizons: Vec<u32> = table.rows.iter().map(|r| r.horizon_years).collect();
        assert_eq!(horizons, vec![10, 10, 20, 20]);
        // Longer horizon adds positive years to the same project.
        assert!(table.rows[3].npv > table.rows[1].npv);
    }

    #[test]
    fn size_comparison_scales_capacity() {
        let table = size_comparison(&QuoteEngine::new(), &medellin_inputs());
        let counts: Vec<u32> = table.rows.iter().map(|r| r.panel_count).collect();
        // 20 modules scaled by 0.8, 1.0, 1.2
        assert_eq!(counts, vec![16, 20, 24]);
        assert!(table.rows.iter().all(|r| r.panel_count % 2 == 0));
        assert!(table.rows.iter().all(|r| !r.scenario.financed));
    }

    #[test]
    fn failing_scenario_becomes_placeholder() {
        let mut base = medellin_inputs();
        // Every factor rounds back to 2 x 450 W = 0.9 kWp, below the smallest unit.
        base.system.panel_count = Some(2);
        base.site.panel_wattage_w = 450.0;
        let table = size_comparison(&QuoteEngine::new(), &base);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.succeeded(), 0);
        let row = &table.rows[0];
        assert!(row.is_placeholder());
        assert_eq!(row.npv, 0.0);
        assert_eq!(row.irr, None);
        assert!(row.error.as_deref().is_some_and(|e| e.contains("sizing")));
    }
}
