//! Installed-cost curve, battery bank sizing and array sizing.

use serde::Serialize;
use tracing::debug;

use crate::types::{BatterySpec, RoofType};

/// Capacity (kWp) where the cost curve switches from the power law to the
/// cubic fit.
pub const COST_BREAKPOINT_KWP: f64 = 20.0;

/// Upper end of the cubic fit; larger arrays are priced at this point.
pub const COST_FIT_MAX_KWP: f64 = 500.0;

/// Power-law coefficients for small arrays: `a * kWp^b`.
const SMALL_A: f64 = 7_587_000.0;
const SMALL_B: f64 = -0.14;

/// Cubic coefficients for arrays >= 20 kWp, lowest order first.
///
/// Equal to `1_900_000 + 0.028 * (500 - x)^3`, which keeps falling up to the
/// end of the fit range.
const LARGE_COEFFS: [f64; 4] = [5_400_000.0, -21_000.0, 42.0, -0.028];

/// Installation surcharge for tile roofs.
const TILE_SURCHARGE: f64 = 1.03;

/// DoD used when the supplied one is outside (0, 1].
const FALLBACK_DOD: f64 = 0.8;

/// Days per month used to turn monthly load into daily load.
const DAYS_PER_MONTH: f64 = 30.0;

/// Installed cost per kWp for an array of `capacity_kwp`.
///
/// The tile surcharge is not included here; see [`pv_cost`].
pub fn cost_per_kwp(capacity_kwp: f64) -> f64 {
    if capacity_kwp < COST_BREAKPOINT_KWP {
        SMALL_A * capacity_kwp.powf(SMALL_B)
    } else {
        let x = capacity_kwp.min(COST_FIT_MAX_KWP);
        let [c0, c1, c2, c3] = LARGE_COEFFS;
        c0 + x * (c1 + x * (c2 + x * c3))
    }
}

/// Installed PV cost for the array, including the tile surcharge.
pub fn pv_cost(capacity_kwp: f64, roof: RoofType) -> f64 {
    let base = cost_per_kwp(capacity_kwp) * capacity_kwp;
    match roof {
        RoofType::Tile => base * TILE_SURCHARGE,
        RoofType::SheetMetal => base,
    }
}

/// Sized battery bank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatteryBank {
    /// Average daily consumption (kWh).
    pub daily_consumption_kwh: f64,
    /// Energy the bank must deliver over the autonomy period (kWh).
    pub usable_kwh: f64,
    /// Nameplate capacity after the depth-of-discharge allowance (kWh).
    pub nominal_kwh: f64,
    /// Energy returned to the load after round-trip losses (kWh).
    pub deliverable_kwh: f64,
    /// Depth of discharge actually applied.
    pub depth_of_discharge: f64,
    pub cost: f64,
}

/// Sizes a battery bank for the given monthly load.
pub fn size_battery(monthly_load_kwh: f64, spec: &BatterySpec) -> BatteryBank {
    let dod = if spec.depth_of_discharge > 0.0 && spec.depth_of_discharge <= 1.0 {
        spec.depth_of_discharge
    } else {
        debug!(
            supplied = spec.depth_of_discharge,
            "depth of discharge out of range, using {FALLBACK_DOD}"
        );
        FALLBACK_DOD
    };
    let daily = monthly_load_kwh / DAYS_PER_MONTH;
    let usable = daily * spec.autonomy_days;
    let nominal = usable / dod;
    BatteryBank {
        daily_consumption_kwh: daily,
        usable_kwh: usable,
        nominal_kwh: nominal,
        deliverable_kwh: usable * spec.round_trip_efficiency,
        depth_of_discharge: dod,
        cost: nominal * spec.cost_per_kwh,
    }
}

/// Total project cost, always rounded up to the next currency unit.
pub fn total_cost(pv_cost: f64, battery_cost: f64) -> f64 {
    (pv_cost + battery_cost).ceil()
}

/// Largest even `u32`, the ceiling of [`round_to_even`].
const MAX_EVEN: u32 = u32::MAX - 1;

/// Rounds to the nearest integer and bumps odd results up by one.
///
/// Module counts must be even so strings can be split symmetrically. Values
/// beyond the `u32` range saturate at the largest even count.
pub fn round_to_even(value: f64) -> u32 {
    let n = value.round().clamp(0.0, f64::from(MAX_EVEN)) as u32;
    if n % 2 == 1 { n + 1 } else { n }
}

/// Array capacity (kWp) for an even module count.
pub fn capacity_kwp(panel_count: u32, panel_wattage_w: f64) -> f64 {
    f64::from(panel_count) * panel_wattage_w / 1000.0
}

/// Unrounded module count needed to cover `monthly_load_kwh`, scaled by
/// `scale`.
///
/// Required kWp is `load / (mean HSP * 30 * PR)`. Returns `None` when the
/// site yields no energy.
pub fn target_panels(
    monthly_load_kwh: f64,
    hsp: &[f64],
    performance_ratio: f64,
    panel_wattage_w: f64,
    scale: f64,
) -> Option<f64> {
    let mean_hsp = if hsp.is_empty() {
        0.0
    } else {
        hsp.iter().sum::<f64>() / hsp.len() as f64
    };
    let monthly_yield_per_kwp = mean_hsp * DAYS_PER_MONTH * performance_ratio;
    if monthly_yield_per_kwp <= 0.0 {
        return None;
    }
    let target_kwp = monthly_load_kwh / monthly_yield_per_kwp * scale;
    Some(target_kwp * 1000.0 / panel_wattage_w)
}

/// Even module count covering `monthly_load_kwh`. Never fewer than two.
pub fn panels_for_load(
    monthly_load_kwh: f64,
    hsp: &[f64],
    performance_ratio: f64,
    panel_wattage_w: f64,
    scale: f64,
) -> u32 {
    target_panels(monthly_load_kwh, hsp, performance_ratio, panel_wattage_w, scale)
        .map_or(2, |n| round_to_even(n).max(2))
}

/// Module count for an explicit request, scaled and rounded to even.
pub fn scaled_panel_count(requested: u32, scale: f64) -> u32 {
    round_to_even(f64::from(requested) * scale).max(2)
}
