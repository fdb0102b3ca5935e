//! CO2 offset estimation from annual generation and a regional grid factor.
//!
//! [`CarbonCalculator`] is immutable after construction and can be shared
//! across threads; the quote engine receives it by injection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// kg CO2 absorbed by one mature tree per year.
pub const KG_CO2_PER_TREE_YEAR: f64 = 21.77;
/// kg CO2 emitted by an average passenger car per year.
pub const KG_CO2_PER_CAR_YEAR: f64 = 4_600.0;
/// Annual consumption of an average household (kWh).
pub const KWH_PER_HOME_YEAR: f64 = 1_800.0;
/// kg CO2 of one short domestic flight per passenger.
pub const KG_CO2_PER_FLIGHT: f64 = 90.0;
/// kg CO2 to produce one 500 ml plastic bottle.
pub const KG_CO2_PER_BOTTLE: f64 = 0.0828;
/// kg CO2 of one full smartphone charge.
pub const KG_CO2_PER_PHONE_CHARGE: f64 = 0.00822;

/// Grid factor used for the legacy tree estimate (Colombian grid).
pub const LEGACY_TREE_FACTOR: f64 = 0.126;

/// Grid emission factors by region (kg CO2 per kWh).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionFactors {
    /// Factor applied to regions missing from `regions`.
    pub default_factor: f64,
    pub regions: BTreeMap<String, f64>,
}

impl Default for EmissionFactors {
    fn default() -> Self {
        let regions = [
            ("colombia", 0.126),
            ("zni", 0.65),
            ("mexico", 0.435),
            ("chile", 0.37),
            ("peru", 0.21),
            ("ecuador", 0.14),
        ]
        .into_iter()
        .map(|(name, factor)| (name.to_string(), factor))
        .collect();
        Self {
            default_factor: 0.126,
            regions,
        }
    }
}

/// Avoided emissions and their everyday equivalents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarbonResult {
    pub region: String,
    /// Emission factor applied (kg CO2/kWh).
    pub emission_factor: f64,
    pub annual_kg: f64,
    pub annual_tonnes: f64,
    pub lifetime_kg: f64,
    pub lifetime_tonnes: f64,
    pub trees: f64,
    pub cars: f64,
    pub homes: f64,
    pub flights: f64,
    pub bottles: f64,
    pub phone_charges: f64,
    /// Value of the avoided tonnes at the certificate price, per year.
    pub annual_certificate_value: f64,
    pub lifetime_certificate_value: f64,
}

/// Computes [`CarbonResult`]s from generation figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonCalculator {
    factors: EmissionFactors,
    /// Price of one tonne of certified CO2 reduction (currency/t).
    certificate_price: f64,
}

impl Default for CarbonCalculator {
    fn default() -> Self {
        Self::new(EmissionFactors::default(), 25_000.0)
    }
}

impl CarbonCalculator {
    pub fn new(factors: EmissionFactors, certificate_price: f64) -> Self {
        Self {
            factors,
            certificate_price,
        }
    }

    pub fn certificate_price(&self) -> f64 {
        self.certificate_price
    }

    /// Emission factor for `region`, matched case-insensitively.
    ///
    /// Unknown regions use the default factor.
    pub fn factor_for(&self, region: &str) -> f64 {
        let key = region.trim().to_lowercase();
        match self.factors.regions.get(&key) {
            Some(factor) => *factor,
            None => {
                warn!(
                    region,
                    default = self.factors.default_factor,
                    "unknown emission region, using default factor"
                );
                self.factors.default_factor
            }
        }
    }

    /// Avoided emissions for `annual_generation_kwh` over `lifetime_years`.
    ///
    /// Lifetime figures scale the first-year value linearly; degradation is
    /// not applied here.
    pub fn calculate(
        &self,
        annual_generation_kwh: f64,
        region: &str,
        lifetime_years: u32,
    ) -> CarbonResult {
        let factor = self.factor_for(region);
        let annual_kg = annual_generation_kwh * factor;
        let lifetime_kg = annual_kg * f64::from(lifetime_years);
        let annual_tonnes = annual_kg / 1000.0;
        let lifetime_tonnes = lifetime_kg / 1000.0;
        CarbonResult {
            region: region.to_string(),
            emission_factor: factor,
            annual_kg,
            annual_tonnes,
            lifetime_kg,
            lifetime_tonnes,
            trees: annual_kg / KG_CO2_PER_TREE_YEAR,
            cars: annual_kg / KG_CO2_PER_CAR_YEAR,
            homes: annual_generation_kwh / KWH_PER_HOME_YEAR,
            flights: annual_kg / KG_CO2_PER_FLIGHT,
            bottles: annual_kg / KG_CO2_PER_BOTTLE,
            phone_charges: annual_kg / KG_CO2_PER_PHONE_CHARGE,
            annual_certificate_value: annual_tonnes * self.certificate_price,
            lifetime_certificate_value: lifetime_tonnes * self.certificate_price,
        }
    }
}

/// Trees equivalent to one year of generation at the Colombian grid factor.
pub fn legacy_tree_estimate(annual_generation_kwh: f64) -> f64 {
    annual_generation_kwh * LEGACY_TREE_FACTOR / KG_CO2_PER_TREE_YEAR
}
