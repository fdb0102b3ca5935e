//! Plain-text renderings of quotes and scenario tables.

use std::fmt;

use crate::carbon::CarbonResult;
use crate::finance::metrics::OrNa;
use crate::quote::{QuoteResult, ScenarioTable};
use crate::system::generation::MONTH_NAMES;

impl fmt::Display for QuoteResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Quote Summary ---")?;
        writeln!(
            f,
            "System:                {} x {:.0} W = {:.2} kWp",
            self.panel_count,
            self.capacity_kwp * 1000.0 / f64::from(self.panel_count.max(1)),
            self.capacity_kwp
        )?;
        writeln!(f, "Roof area:             {:.1} m²", self.roof_area_m2)?;
        writeln!(
            f,
            "Inverter:              {} ({} kW AC, DC/AC {:.2})",
            self.inverter_plan, self.ac_power_kw, self.dc_ac_ratio
        )?;
        writeln!(f, "Performance ratio:     {:.3}", self.performance_ratio)?;
        writeln!(f, "Clipping loss:         {:.1}%", self.clipping_loss * 100.0)?;
        writeln!(f, "Annual generation:     {:.0} kWh", self.annual_generation_kwh)?;
        writeln!(f, "Monthly generation:    {:.2} kWh avg", self.annual_generation_kwh / 12.0)?;
        for (name, kwh) in MONTH_NAMES.iter().zip(self.monthly_generation) {
            writeln!(f, "  {name}  {kwh:>10.2} kWh")?;
        }
        if self.battery_nominal_kwh > 0.0 {
            writeln!(
                f,
                "Battery:               {:.2} kWh nominal ({:.0})",
                self.battery_nominal_kwh, self.battery_cost
            )?;
        }
        writeln!(f, "PV cost:               {:.0}", self.pv_cost)?;
        writeln!(f, "Total cost:            {:.0}", self.total_cost)?;
        if self.financed_amount > 0.0 {
            writeln!(f, "Financed:              {:.0}", self.financed_amount)?;
            writeln!(f, "Monthly payment:       {:.0}", self.monthly_payment)?;
        }
        writeln!(f, "Down payment:          {:.0}", self.down_payment)?;
        writeln!(f, "Year-1 savings:        {:.0}", self.first_year_savings)?;
        writeln!(f, "Horizon:               {} years", self.horizon_years)?;
        writeln!(f, "{}", self.metrics)?;
        write!(f, "Trees equivalent:      {:.1}", self.legacy_trees)?;
        if let Some(carbon) = &self.carbon {
            write!(f, "\n{carbon}")?;
        }
        Ok(())
    }
}

impl fmt::Display for CarbonResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Carbon Offset ({}) ---", self.region)?;
        writeln!(f, "Emission factor:       {:.3} kg/kWh", self.emission_factor)?;
        writeln!(
            f,
            "CO2 avoided:           {:.2} t/yr, {:.2} t lifetime",
            self.annual_tonnes, self.lifetime_tonnes
        )?;
        writeln!(f, "Trees:                 {:.1}", self.trees)?;
        writeln!(f, "Cars off the road:     {:.2}", self.cars)?;
        writeln!(f, "Homes powered:         {:.2}", self.homes)?;
        writeln!(f, "Flights avoided:       {:.1}", self.flights)?;
        writeln!(f, "Plastic bottles:       {:.0}", self.bottles)?;
        writeln!(f, "Phone charges:         {:.0}", self.phone_charges)?;
        write!(
            f,
            "Certificate value:     {:.0}/yr, {:.0} lifetime",
            self.annual_certificate_value, self.lifetime_certificate_value
        )
    }
}

impl fmt::Display for ScenarioTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- {} ---", self.title)?;
        write!(
            f,
            "{:<22} {:>8} {:>16} {:>16} {:>9} {:>9}",
            "Scenario", "kWp", "Cost", "NPV", "IRR %", "Payback"
        )?;
        for row in &self.rows {
            writeln!(f)?;
            if let Some(error) = &row.error {
                write!(
                    f,
                    "{:<22} {:>8} {:>16} {:>16} {:>9} {:>9}  ({error})",
                    row.scenario.label, "N/A", "N/A", "N/A", "N/A", "N/A"
                )?;
                continue;
            }
            let irr_pct = row.irr.map(|r| r * 100.0);
            write!(
                f,
                "{:<22} {:>8.2} {:>16.0} {:>16.0} {:>9} {:>9}",
                row.scenario.label,
                row.capacity_kwp,
                row.total_cost,
                row.npv,
                OrNa(&irr_pct, 2).to_string(),
                OrNa(&row.payback_years, 2).to_string(),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::{QuoteEngine, Scenario, ScenarioOutcome, sensitivity_analysis};
    use crate::types::tests::medellin_inputs;

    #[test]
    fn summary_lists_headline_figures() {
        let result = QuoteEngine::new()
            .quote(&medellin_inputs())
            .expect("quote");
        let text = result.to_string();
        assert!(text.starts_with("--- Quote Summary ---"));
        assert!(text.contains("20 x 600 W = 12.00 kWp"));
        assert!(text.contains("2x6kW"));
        assert!(text.contains("Jan"));
        assert!(text.contains("IRR:"));
        assert!(!text.contains("Financed:"));
    }

    #[test]
    fn scenario_table_renders_every_row() {
        let table = sensitivity_analysis(&QuoteEngine::new(), &medellin_inputs());
        let text = table.to_string();
        assert!(text.starts_with("--- Sensitivity Analysis ---"));
        // title + header + 4 rows
        assert_eq!(text.lines().count(), 6);
        assert!(text.contains("20 years, unfinanced"));
    }

    #[test]
    fn placeholder_rows_show_na() {
        let scenario = Scenario::size_matrix().remove(0);
        let table = ScenarioTable {
            title: "Size Comparison".into(),
            rows: vec![ScenarioOutcome::placeholder(
                scenario,
                25,
                "sizing failure".into(),
            )],
        };
        let text = table.to_string();
        assert!(text.contains("N/A"));
        assert!(text.contains("(sizing failure)"));
    }
}
