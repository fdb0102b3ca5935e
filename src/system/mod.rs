//! PV system sizing: cost curve, inverter selection and generation.

/// Cost curve, battery sizing and module-count rounding.
pub mod cost;
pub mod generation;
/// Inverter catalog search and clipping table.
pub mod inverter;

pub use cost::{BatteryBank, round_to_even};
pub use generation::GenerationModel;
pub use inverter::{InverterPlan, SizeRegime, recommend_inverter};
