//! TOML-based project configuration, presets and the city irradiance table.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::carbon::{CarbonCalculator, EmissionFactors};
use crate::error::InputError;
use crate::types::{
    BatterySpec, Climate, EngineParams, FinancingTerms, QuoteInputs, RoofType, SiteInputs,
    SystemSpec, TaxBenefits,
};

/// Built-in cities with monthly peak sun hours (kWh/m²/day), January first.
pub const CITIES: &[(&str, [f64; 12])] = &[
    (
        "medellin",
        [4.55, 4.75, 4.80, 4.55, 4.45, 4.70, 5.05, 5.05, 4.75, 4.35, 4.25, 4.35],
    ),
    (
        "bogota",
        [4.30, 4.35, 4.20, 3.90, 3.85, 4.00, 4.35, 4.40, 4.25, 3.95, 3.85, 4.05],
    ),
    (
        "cali",
        [4.70, 4.80, 4.75, 4.55, 4.50, 4.75, 5.10, 5.15, 4.90, 4.50, 4.40, 4.45],
    ),
    (
        "barranquilla",
        [5.60, 5.85, 6.00, 5.70, 5.20, 5.25, 5.55, 5.50, 5.05, 4.85, 4.95, 5.20],
    ),
    (
        "cartagena",
        [5.55, 5.80, 5.95, 5.60, 5.10, 5.20, 5.45, 5.40, 5.00, 4.80, 4.90, 5.15],
    ),
    (
        "bucaramanga",
        [4.60, 4.65, 4.50, 4.30, 4.40, 4.60, 4.90, 4.95, 4.70, 4.35, 4.25, 4.40],
    ),
    (
        "pereira",
        [4.40, 4.50, 4.45, 4.25, 4.20, 4.40, 4.75, 4.75, 4.50, 4.15, 4.05, 4.15],
    ),
];

/// Monthly HSP for a built-in city, matched case-insensitively.
pub fn city_hsp(name: &str) -> Option<&'static [f64; 12]> {
    let key = name.trim().to_lowercase();
    CITIES
        .iter()
        .find(|(city, _)| *city == key)
        .map(|(_, hsp)| hsp)
}

/// Top-level project configuration parsed from TOML.
///
/// Every section is optional and falls back to the Medellín residential
/// reference. Load with [`ProjectConfig::from_toml_file`] or pick one of the
/// [`ProjectConfig::PRESETS`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub system: SystemSpec,
    #[serde(default)]
    pub battery: BatterySpec,
    #[serde(default)]
    pub financing: FinancingTerms,
    #[serde(default)]
    pub tax: TaxBenefits,
    #[serde(default)]
    pub params: EngineParams,
    #[serde(default)]
    pub carbon: CarbonConfig,
}

/// Site, consumption and tariff parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Built-in city used to look up HSP when `hsp` is absent.
    pub city: Option<String>,
    /// Explicit monthly HSP. Takes precedence over `city`.
    pub hsp: Option<Vec<f64>>,
    /// Monthly consumption (kWh/month).
    pub monthly_load_kwh: f64,
    /// Module rating (W).
    pub panel_wattage_w: f64,
    /// `"sheet_metal"` or `"tile"`.
    pub roof: RoofType,
    /// `"sunny"`, `"cloudy"` or `"temperate"`.
    pub climate: Climate,
    /// Electricity tariff (currency/kWh).
    pub tariff: f64,
    /// Surplus sell price (currency/kWh).
    pub surplus_price: f64,
    pub discount_rate: f64,
    pub indexation_rate: f64,
    pub horizon_years: u32,
    /// Emission-factor region.
    pub region: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            city: Some("medellin".to_string()),
            hsp: None,
            monthly_load_kwh: 700.0,
            panel_wattage_w: 600.0,
            roof: RoofType::SheetMetal,
            climate: Climate::Temperate,
            tariff: 800.0,
            surplus_price: 300.0,
            discount_rate: 0.10,
            indexation_rate: 0.05,
            horizon_years: 25,
            region: "colombia".to_string(),
        }
    }
}

/// Carbon-offset reporting.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CarbonConfig {
    /// Attach a carbon result to the quote.
    pub enabled: bool,
    /// Price per certified tonne of CO2 (currency/t).
    pub certificate_price: f64,
    /// Factor for regions missing from the table (kg CO2/kWh).
    pub default_factor: f64,
    /// Extra or overriding region factors (kg CO2/kWh).
    pub factors: BTreeMap<String, f64>,
}

impl Default for CarbonConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            certificate_price: 25_000.0,
            default_factor: EmissionFactors::default().default_factor,
            factors: BTreeMap::new(),
        }
    }
}

impl CarbonConfig {
    /// Builds the calculator, layering configured factors over the defaults.
    pub fn calculator(&self) -> CarbonCalculator {
        let mut factors = EmissionFactors {
            default_factor: self.default_factor,
            ..EmissionFactors::default()
        };
        for (region, factor) in &self.factors {
            factors.regions.insert(region.to_lowercase(), *factor);
        }
        CarbonCalculator::new(factors, self.certificate_price)
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"site.horizon_years"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl From<InputError> for ConfigError {
    fn from(e: InputError) -> Self {
        Self {
            field: e.field,
            message: e.message,
        }
    }
}

impl ProjectConfig {
    /// Residential grid-tied reference: 20 x 600 W in Medellín, no financing.
    pub fn medellin_residential() -> Self {
        Self {
            site: SiteConfig::default(),
            system: SystemSpec {
                panel_count: Some(20),
                ..SystemSpec::default()
            },
            battery: BatterySpec::default(),
            financing: FinancingTerms::default(),
            tax: TaxBenefits::default(),
            params: EngineParams::default(),
            carbon: CarbonConfig::default(),
        }
    }

    /// Off-grid home in Bogotá with a battery bank, sized from consumption.
    pub fn bogota_battery() -> Self {
        Self {
            site: SiteConfig {
                city: Some("bogota".to_string()),
                monthly_load_kwh: 450.0,
                roof: RoofType::Tile,
                climate: Climate::Cloudy,
                tariff: 850.0,
                surplus_price: 250.0,
                horizon_years: 20,
                ..SiteConfig::default()
            },
            system: SystemSpec::default(),
            battery: BatterySpec {
                enabled: true,
                autonomy_days: 1.5,
                ..BatterySpec::default()
            },
            financing: FinancingTerms::default(),
            tax: TaxBenefits::default(),
            params: EngineParams::default(),
            carbon: CarbonConfig::default(),
        }
    }

    /// Financed commercial rooftop in Barranquilla with both tax incentives.
    pub fn barranquilla_commercial() -> Self {
        Self {
            site: SiteConfig {
                city: Some("barranquilla".to_string()),
                monthly_load_kwh: 9_000.0,
                climate: Climate::Sunny,
                tariff: 750.0,
                surplus_price: 250.0,
                ..SiteConfig::default()
            },
            system: SystemSpec::default(),
            battery: BatterySpec::default(),
            financing: FinancingTerms {
                enabled: true,
                percent_financed: 70.0,
                annual_rate: 0.14,
                term_years: 7,
            },
            tax: TaxBenefits {
                income_deduction: true,
                accelerated_depreciation: true,
            },
            params: EngineParams::default(),
            carbon: CarbonConfig::default(),
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &[
        "medellin_residential",
        "bogota_battery",
        "barranquilla_commercial",
    ];

    /// Loads a project from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "medellin_residential" => Ok(Self::medellin_residential()),
            "bogota_battery" => Ok(Self::bogota_battery()),
            "barranquilla_commercial" => Ok(Self::barranquilla_commercial()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a project from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "scenario".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a project from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid, contains unknown fields
    /// or an unknown enum value.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Monthly HSP from `site.hsp` or the built-in city table.
    fn resolve_hsp(&self) -> Result<Vec<f64>, ConfigError> {
        if let Some(hsp) = &self.site.hsp {
            return Ok(hsp.clone());
        }
        match &self.site.city {
            Some(city) => city_hsp(city).map(|h| h.to_vec()).ok_or_else(|| {
                let known: Vec<&str> = CITIES.iter().map(|(name, _)| *name).collect();
                ConfigError {
                    field: "site.city".to_string(),
                    message: format!("unknown city \"{city}\", available: {}", known.join(", ")),
                }
            }),
            None => Err(ConfigError {
                field: "site.hsp".to_string(),
                message: "either site.hsp or site.city must be set".to_string(),
            }),
        }
    }

    /// Resolves the engine inputs. Range checks are left to the engine.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if no irradiance source can be resolved.
    pub fn to_inputs(&self) -> Result<QuoteInputs, ConfigError> {
        let s = &self.site;
        Ok(QuoteInputs {
            site: SiteInputs {
                monthly_load_kwh: s.monthly_load_kwh,
                panel_wattage_w: s.panel_wattage_w,
                roof: s.roof,
                climate: s.climate,
                hsp: self.resolve_hsp()?,
                tariff: s.tariff,
                surplus_price: s.surplus_price,
                discount_rate: s.discount_rate,
                indexation_rate: s.indexation_rate,
                horizon_years: s.horizon_years,
                region: s.region.clone(),
            },
            system: self.system.clone(),
            battery: self.battery.clone(),
            financing: self.financing.clone(),
            tax: self.tax.clone(),
            params: self.params.clone(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        match self.to_inputs() {
            Ok(inputs) => errors.extend(inputs.validate().into_iter().map(ConfigError::from)),
            Err(e) => errors.push(e),
        }

        let c = &self.carbon;
        if !(c.certificate_price.is_finite() && c.certificate_price >= 0.0) {
            errors.push(ConfigError {
                field: "carbon.certificate_price".into(),
                message: "must be >= 0".into(),
            });
        }
        if !(c.default_factor.is_finite() && c.default_factor >= 0.0) {
            errors.push(ConfigError {
                field: "carbon.default_factor".into(),
                message: "must be >= 0".into(),
            });
        }
        for (region, factor) in &c.factors {
            if !(factor.is_finite() && *factor >= 0.0) {
                errors.push(ConfigError {
                    field: format!("carbon.factors.{region}"),
                    message: "must be >= 0".into(),
                });
            }
        }

        errors
    }
}
