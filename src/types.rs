//! Core value types: site, system, financing and engine parameters.
//!
//! Everything here is plain data created fresh for each quotation. The
//! [`QuoteInputs::validate`] method is the single place where input
//! constraints are checked before any computation runs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InputError;
use crate::system::cost::target_panels;
use crate::system::generation::performance_ratio;

/// Longest analysis horizon the engine accepts (years).
pub const MAX_HORIZON_YEARS: u32 = 40;

/// Largest array the engine will quote, in modules.
pub const MAX_PANEL_COUNT: u32 = 10_000;

/// Roof mounting surface. Tile roofs carry an installation surcharge and
/// a small performance derate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoofType {
    SheetMetal,
    Tile,
}

impl fmt::Display for RoofType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SheetMetal => write!(f, "sheet metal"),
            Self::Tile => write!(f, "tile"),
        }
    }
}

/// Site climate class used for the performance-ratio adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Climate {
    /// Hot and clear; modules lose output to heat.
    Sunny,
    /// Frequent overcast.
    Cloudy,
    /// Mild highland climate, no adjustment.
    Temperate,
}

impl fmt::Display for Climate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sunny => write!(f, "sunny"),
            Self::Cloudy => write!(f, "cloudy"),
            Self::Temperate => write!(f, "temperate"),
        }
    }
}

/// Site, consumption and tariff inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteInputs {
    /// Monthly consumption (kWh/month), assumed constant across months.
    pub monthly_load_kwh: f64,
    /// Nameplate rating of one module (W).
    pub panel_wattage_w: f64,
    pub roof: RoofType,
    pub climate: Climate,
    /// Monthly peak sun hours, January first (kWh/m²/day).
    pub hsp: Vec<f64>,
    /// Electricity tariff (currency/kWh).
    pub tariff: f64,
    /// Price paid for surplus energy exported to the grid (currency/kWh).
    pub surplus_price: f64,
    /// Discount rate used for NPV and LCOE (fraction).
    pub discount_rate: f64,
    /// Annual tariff indexation (fraction).
    pub indexation_rate: f64,
    /// Analysis horizon (years).
    pub horizon_years: u32,
    /// Emission-factor region used by the carbon calculator.
    pub region: String,
}

/// How the PV array is sized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SystemSpec {
    /// Explicit module count. `None` sizes the array from consumption.
    pub panel_count: Option<u32>,
    /// Multiplier applied to the target capacity before rounding the panel
    /// count (used by the size comparison).
    pub capacity_scale: f64,
}

impl Default for SystemSpec {
    fn default() -> Self {
        Self {
            panel_count: None,
            capacity_scale: 1.0,
        }
    }
}

/// Battery bank economics. Only used when `enabled` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatterySpec {
    pub enabled: bool,
    /// Installed cost per nominal kWh (currency/kWh).
    pub cost_per_kwh: f64,
    /// Depth of discharge (0 < d <= 1). Out-of-range values fall back to 0.8.
    pub depth_of_discharge: f64,
    /// Round-trip efficiency (0 < eta <= 1).
    pub round_trip_efficiency: f64,
    /// Days of autonomy the bank must cover.
    pub autonomy_days: f64,
}

impl Default for BatterySpec {
    fn default() -> Self {
        Self {
            enabled: false,
            cost_per_kwh: 2_800_000.0,
            depth_of_discharge: 0.9,
            round_trip_efficiency: 0.92,
            autonomy_days: 1.0,
        }
    }
}

/// Loan terms. When `enabled` is false the whole cost is paid up front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FinancingTerms {
    pub enabled: bool,
    /// Share of the project cost that is financed (0..=100).
    pub percent_financed: f64,
    /// Nominal annual interest rate (fraction).
    pub annual_rate: f64,
    pub term_years: u32,
}

impl Default for FinancingTerms {
    fn default() -> Self {
        Self {
            enabled: false,
            percent_financed: 70.0,
            annual_rate: 0.15,
            term_years: 5,
        }
    }
}

impl FinancingTerms {
    /// Returns the share financed, or zero when financing is off.
    pub fn effective_percent(&self) -> f64 {
        if self.enabled {
            self.percent_financed
        } else {
            0.0
        }
    }
}

/// Optional fiscal incentives. Both may apply at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaxBenefits {
    /// Income-tax deduction of 17.5% of CAPEX, received in year 2.
    pub income_deduction: bool,
    /// Accelerated depreciation of 33% of CAPEX in each of years 1-3.
    pub accelerated_depreciation: bool,
}

/// Engine tunables with documented defaults, resolved once per quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineParams {
    /// Base performance ratio before climate and roof adjustments.
    pub performance_ratio_base: f64,
    /// Annual generation degradation (fraction per year).
    pub degradation_rate: f64,
    /// Maintenance cost as a share of each year's realised savings.
    pub maintenance_fraction: f64,
    /// Roof footprint per module including spacing (m²).
    pub roof_area_per_panel_m2: f64,
    /// First operating year covers only six months.
    pub commissioning_delay: bool,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            performance_ratio_base: 0.75,
            degradation_rate: 0.001,
            maintenance_fraction: 0.05,
            roof_area_per_panel_m2: 2.6,
            commissioning_delay: false,
        }
    }
}

/// Complete input bundle for one quotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteInputs {
    pub site: SiteInputs,
    pub system: SystemSpec,
    pub battery: BatterySpec,
    pub financing: FinancingTerms,
    pub tax: TaxBenefits,
    pub params: EngineParams,
}

impl QuoteInputs {
    /// Checks every input constraint and returns all violations.
    ///
    /// Returns an empty vector when the inputs are valid.
    pub fn validate(&self) -> Vec<InputError> {
        let mut errors = Vec::new();
        let s = &self.site;

        positive(&mut errors, "site.monthly_load_kwh", s.monthly_load_kwh);
        positive(&mut errors, "site.panel_wattage_w", s.panel_wattage_w);
        positive(&mut errors, "site.tariff", s.tariff);
        non_negative(&mut errors, "site.surplus_price", s.surplus_price);
        if !s.discount_rate.is_finite() || s.discount_rate <= -1.0 {
            errors.push(InputError::new("site.discount_rate", "must be > -1"));
        }
        if !s.indexation_rate.is_finite() || s.indexation_rate <= -1.0 {
            errors.push(InputError::new("site.indexation_rate", "must be > -1"));
        }
        if s.horizon_years == 0 || s.horizon_years > MAX_HORIZON_YEARS {
            errors.push(InputError::new(
                "site.horizon_years",
                format!("must be in 1..={MAX_HORIZON_YEARS}"),
            ));
        }
        if s.hsp.len() != 12 {
            errors.push(InputError::new(
                "site.hsp",
                format!("must have 12 monthly values, got {}", s.hsp.len()),
            ));
        } else if let Some(month) = s.hsp.iter().position(|h| !h.is_finite() || *h < 0.0) {
            errors.push(InputError::new(
                "site.hsp",
                format!("month {} must be a finite value >= 0", month + 1),
            ));
        }

        if self.system.panel_count == Some(0) {
            errors.push(InputError::new("system.panel_count", "must be > 0"));
        }
        positive(&mut errors, "system.capacity_scale", self.system.capacity_scale);

        let b = &self.battery;
        if b.enabled {
            positive(&mut errors, "battery.cost_per_kwh", b.cost_per_kwh);
            positive(&mut errors, "battery.autonomy_days", b.autonomy_days);
            if !(b.round_trip_efficiency > 0.0 && b.round_trip_efficiency <= 1.0) {
                errors.push(InputError::new(
                    "battery.round_trip_efficiency",
                    "must be in (0.0, 1.0]",
                ));
            }
        }

        let f = &self.financing;
        if f.enabled {
            if !(0.0..=100.0).contains(&f.percent_financed) {
                errors.push(InputError::new(
                    "financing.percent_financed",
                    "must be in [0, 100]",
                ));
            }
            non_negative(&mut errors, "financing.annual_rate", f.annual_rate);
            if f.term_years == 0 {
                errors.push(InputError::new("financing.term_years", "must be > 0"));
            }
        }

        let p = &self.params;
        if !(p.performance_ratio_base > 0.0 && p.performance_ratio_base <= 1.0) {
            errors.push(InputError::new(
                "params.performance_ratio_base",
                "must be in (0.0, 1.0]",
            ));
        }
        if !(0.0..1.0).contains(&p.degradation_rate) {
            errors.push(InputError::new(
                "params.degradation_rate",
                "must be in [0.0, 1.0)",
            ));
        }
        if !(0.0..=1.0).contains(&p.maintenance_fraction) {
            errors.push(InputError::new(
                "params.maintenance_fraction",
                "must be in [0.0, 1.0]",
            ));
        }
        positive(
            &mut errors,
            "params.roof_area_per_panel_m2",
            p.roof_area_per_panel_m2,
        );

        if let Some((field, modules)) = self.requested_modules() {
            if modules > f64::from(MAX_PANEL_COUNT) {
                errors.push(InputError::new(
                    field,
                    format!("sizes an array of {modules:.0} modules, limit is {MAX_PANEL_COUNT}"),
                ));
            }
        }

        errors
    }

    /// Unrounded module count the inputs ask for, with the field driving it.
    ///
    /// `None` when the inputs it depends on are themselves invalid.
    fn requested_modules(&self) -> Option<(&'static str, f64)> {
        let s = &self.site;
        let scale = self.system.capacity_scale;
        if !(scale.is_finite() && scale > 0.0) {
            return None;
        }
        if let Some(count) = self.system.panel_count {
            return Some(("system.panel_count", f64::from(count) * scale));
        }
        let sized = [s.monthly_load_kwh, s.panel_wattage_w]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0);
        if !sized || s.hsp.len() != 12 {
            return None;
        }
        let pr = performance_ratio(self.params.performance_ratio_base, s.climate, s.roof);
        target_panels(s.monthly_load_kwh, &s.hsp, pr, s.panel_wattage_w, scale)
            .map(|n| ("site.monthly_load_kwh", n))
    }
}

fn positive(errors: &mut Vec<InputError>, field: &str, value: f64) {
    if !(value.is_finite() && value > 0.0) {
        errors.push(InputError::new(field, "must be > 0"));
    }
}

fn non_negative(errors: &mut Vec<InputError>, field: &str, value: f64) {
    if !(value.is_finite() && value >= 0.0) {
        errors.push(InputError::new(field, "must be >= 0"));
    }
}
