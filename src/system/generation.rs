//! Monthly PV generation with performance ratio, clipping and degradation.

use crate::types::{Climate, RoofType};

/// Days per month; February uses 28.25 to average leap years.
pub const DAYS_IN_MONTH: [f64; 12] = [
    31.0, 28.25, 31.0, 30.0, 31.0, 30.0, 31.0, 31.0, 30.0, 31.0, 30.0, 31.0,
];

/// Three-letter month labels, January first.
pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const CLOUDY_DERATE: f64 = 0.05;
const SUNNY_HEAT_DERATE: f64 = 0.02;
const TILE_DERATE: f64 = 0.01;

/// Performance ratio after climate and roof adjustments.
pub fn performance_ratio(base: f64, climate: Climate, roof: RoofType) -> f64 {
    let climate_adj = match climate {
        Climate::Cloudy => CLOUDY_DERATE,
        Climate::Sunny => SUNNY_HEAT_DERATE,
        Climate::Temperate => 0.0,
    };
    let roof_adj = match roof {
        RoofType::Tile => TILE_DERATE,
        RoofType::SheetMetal => 0.0,
    };
    base - climate_adj - roof_adj
}

/// First-year generation model for a sized array.
///
/// # Examples
///
/// ```
/// use pv_quote::system::generation::GenerationModel;
///
/// let model = GenerationModel::new(10.0, &[5.0; 12], 0.8, 0.0, 0.0);
/// // January: 10 kWp * 5 h * 31 d * 0.8
/// assert!((model.monthly_kwh()[0] - 1240.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct GenerationModel {
    monthly_kwh: [f64; 12],
    degradation_rate: f64,
}

impl GenerationModel {
    /// Builds the base monthly vector.
    ///
    /// # Arguments
    ///
    /// * `capacity_kwp` - DC array capacity
    /// * `hsp` - Twelve monthly peak-sun-hour values (kWh/m²/day); missing
    ///   months count as zero
    /// * `performance_ratio` - Scalar PR applied to every month
    /// * `clipping_loss` - Uniform clipping derate (fraction)
    /// * `degradation_rate` - Annual output loss (fraction)
    pub fn new(
        capacity_kwp: f64,
        hsp: &[f64],
        performance_ratio: f64,
        clipping_loss: f64,
        degradation_rate: f64,
    ) -> Self {
        let mut monthly_kwh = [0.0; 12];
        for (month, kwh) in monthly_kwh.iter_mut().enumerate() {
            let sun = hsp.get(month).copied().unwrap_or(0.0);
            *kwh = capacity_kwp
                * sun
                * DAYS_IN_MONTH[month]
                * performance_ratio
                * (1.0 - clipping_loss);
        }
        Self {
            monthly_kwh,
            degradation_rate,
        }
    }

    /// Undegraded monthly generation (kWh).
    pub fn monthly_kwh(&self) -> &[f64; 12] {
        &self.monthly_kwh
    }

    /// Undegraded annual generation (kWh).
    pub fn annual_kwh(&self) -> f64 {
        self.monthly_kwh.iter().sum()
    }

    /// Degradation multiplier for 0-based operating year `year`.
    pub fn degradation_factor(&self, year: u32) -> f64 {
        (1.0 - self.degradation_rate).powi(year as i32)
    }

    /// Monthly generation for 0-based operating year `year`.
    pub fn monthly_for_year(&self, year: u32) -> [f64; 12] {
        let factor = self.degradation_factor(year);
        self.monthly_kwh.map(|kwh| kwh * factor)
    }

    /// Annual generation for 0-based operating year `year`.
    pub fn annual_for_year(&self, year: u32) -> f64 {
        self.annual_kwh() * self.degradation_factor(year)
    }

    /// Total generation over `horizon_years` operating years.
    pub fn lifetime_kwh(&self, horizon_years: u32) -> f64 {
        (0..horizon_years).map(|y| self.annual_for_year(y)).sum()
    }
}
