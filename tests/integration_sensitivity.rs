mod common;

use pv_quote::QuoteEngine;
use pv_quote::quote::{Scenario, run_scenarios, sensitivity_analysis, size_comparison};

#[test]
fn sensitivity_table_covers_horizon_and_financing() {
    let engine = QuoteEngine::new();
    let table = sensitivity_analysis(&engine, &common::medellin_inputs());

    assert_eq!(table.rows.len(), 4);
    assert_eq!(table.succeeded(), 4);

    let horizons: Vec<u32> = table.rows.iter().map(|r| r.horizon_years).collect();
    assert_eq!(horizons, vec![10, 10, 20, 20]);

    // longer horizons only add positive operating years when unfinanced
    let unfinanced: Vec<f64> = table
        .rows
        .iter()
        .filter(|r| !r.scenario.financed)
        .map(|r| r.npv)
        .collect();
    assert!(unfinanced[1] > unfinanced[0]);
}

#[test]
fn scenarios_leave_base_inputs_untouched() {
    let engine = QuoteEngine::new();
    let base = common::medellin_inputs();
    let before = engine.quote(&base).expect("base quote");

    sensitivity_analysis(&engine, &base);
    size_comparison(&engine, &base);

    let after = engine.quote(&base).expect("base quote");
    assert_eq!(before, after);
    assert_eq!(base, common::medellin_inputs());
}

#[test]
fn size_comparison_scales_capacity() {
    let table = size_comparison(&QuoteEngine::new(), &common::medellin_inputs());
    let capacities: Vec<f64> = table.rows.iter().map(|r| r.capacity_kwp).collect();
    assert_eq!(capacities.len(), 3);
    assert!(capacities[0] < capacities[1] && capacities[1] < capacities[2]);
    assert!(table.rows.iter().all(|r| r.panel_count % 2 == 0));
}

#[test]
fn failed_scenario_becomes_placeholder() {
    let mut base = common::medellin_inputs();
    base.system.panel_count = Some(2);
    base.site.panel_wattage_w = 300.0;

    let outcomes = run_scenarios(&QuoteEngine::new(), &base, &Scenario::financing_matrix());
    assert_eq!(outcomes.len(), 4);
    for outcome in &outcomes {
        assert!(outcome.is_placeholder());
        assert_eq!(outcome.irr, None);
        assert_eq!(outcome.total_cost, 0.0);
    }
}
