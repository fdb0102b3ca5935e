//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::process::{Command, Output};

use pv_quote::types::{
    BatterySpec, Climate, EngineParams, FinancingTerms, QuoteInputs, RoofType, SiteInputs,
    SystemSpec, TaxBenefits,
};

/// Medellín monthly peak sun hours, January first.
pub const MEDELLIN_HSP: [f64; 12] = [
    4.55, 4.75, 4.80, 4.55, 4.45, 4.70, 5.05, 5.05, 4.75, 4.35, 4.25, 4.35,
];

/// Reference residential quote: 700 kWh/month, 20 x 600 W = 12 kWp,
/// temperate climate, sheet-metal roof, 5% indexation, 10% discount,
/// 800 COP/kWh, no financing, no battery.
pub fn medellin_inputs() -> QuoteInputs {
    QuoteInputs {
        site: SiteInputs {
            monthly_load_kwh: 700.0,
            panel_wattage_w: 600.0,
            roof: RoofType::SheetMetal,
            climate: Climate::Temperate,
            hsp: MEDELLIN_HSP.to_vec(),
            tariff: 800.0,
            surplus_price: 300.0,
            discount_rate: 0.10,
            indexation_rate: 0.05,
            horizon_years: 25,
            region: "colombia".to_string(),
        },
        system: SystemSpec {
            panel_count: Some(20),
            capacity_scale: 1.0,
        },
        battery: BatterySpec::default(),
        financing: FinancingTerms::default(),
        tax: TaxBenefits::default(),
        params: EngineParams::default(),
    }
}

/// Runs the CLI binary with `args` and returns its output.
pub fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pv-quote"))
        .args(args)
        .output()
        .expect("pv-quote process should run")
}

/// Extracts the first numeric token after `label:` on the matching line.
///
/// Returns `None` for lines reporting `N/A`.
pub fn parse_metric(stdout: &str, label: &str) -> Option<f64> {
    let line = stdout
        .lines()
        .find(|line| line.trim_start().starts_with(label))
        .unwrap_or_else(|| panic!("missing line `{label}` in output: {stdout}"));
    let raw = line
        .split_once(':')
        .map(|(_, right)| right.trim())
        .unwrap_or_else(|| panic!("invalid format for line `{line}`"));
    let token = raw.split_whitespace().next().unwrap_or("");
    token.trim_end_matches('%').parse::<f64>().ok()
}
