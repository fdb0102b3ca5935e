//! Inverter selection over a fixed catalog of AC ratings.
//!
//! The search enumerates multisets of catalog ratings in non-increasing
//! order, so each combination is visited once. The catalog holds ten
//! entries and combinations never exceed six units, which keeps the search
//! space to a few hundred candidates at most.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::SizingFailure;

/// Available inverter ratings (kW), ascending.
pub const CATALOG_KW: [u32; 10] = [3, 5, 6, 8, 10, 20, 30, 40, 50, 100];

/// Capacity (kWp) below which the unbounded small-system search applies.
const SMALL_LIMIT_KWP: f64 = 20.0;
/// Capacity (kWp) at which the large-system rules start.
const LARGE_LIMIT_KWP: f64 = 100.0;
/// Smallest unit allowed in medium and large systems (kW).
const MIN_UNIT_KW: u32 = 20;
/// Share of DC capacity every unit must reach in large systems.
const LARGE_UNIT_SHARE: f64 = 0.25;

/// Size regime driving which combinations are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeRegime {
    /// Any number of units of any rating.
    Small,
    /// Exactly two units of at least 20 kW.
    Medium,
    /// Two or three units, none undersized.
    Large,
}

impl SizeRegime {
    pub fn for_capacity(capacity_kwp: f64) -> Self {
        if capacity_kwp < SMALL_LIMIT_KWP {
            Self::Small
        } else if capacity_kwp < LARGE_LIMIT_KWP {
            Self::Medium
        } else {
            Self::Large
        }
    }
}

/// Allowed DC/AC margin for an array of `capacity_kwp`.
pub fn margin(capacity_kwp: f64) -> f64 {
    if capacity_kwp < 20.0 {
        0.20
    } else if capacity_kwp < 50.0 {
        0.25
    } else if capacity_kwp < 100.0 {
        0.30
    } else {
        0.35
    }
}

/// Inclusive AC power window `(min, max)` a valid configuration must hit.
pub fn power_window(capacity_kwp: f64) -> (f64, u32) {
    let min = capacity_kwp * (1.0 - margin(capacity_kwp));
    let max = capacity_kwp.max(0.0).floor() as u32;
    (min, max)
}

/// Chosen inverter configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InverterPlan {
    /// `(rating_kw, count)` groups, rating descending.
    pub groups: Vec<(u32, u32)>,
    /// Total AC power (kW).
    pub total_ac_kw: u32,
    /// DC capacity divided by AC power.
    pub dc_ac_ratio: f64,
    pub regime: SizeRegime,
    /// True when no combination met the margin and the single-unit fallback
    /// was used.
    pub fallback: bool,
}

impl InverterPlan {
    fn from_units(units: &[u32], capacity_kwp: f64, regime: SizeRegime, fallback: bool) -> Self {
        let mut groups: Vec<(u32, u32)> = Vec::new();
        for &rating in units {
            match groups.iter_mut().find(|(r, _)| *r == rating) {
                Some((_, count)) => *count += 1,
                None => groups.push((rating, 1)),
            }
        }
        groups.sort_by(|a, b| b.0.cmp(&a.0));
        let total_ac_kw: u32 = units.iter().sum();
        Self {
            groups,
            total_ac_kw,
            dc_ac_ratio: capacity_kwp / f64::from(total_ac_kw),
            regime,
            fallback,
        }
    }

    /// Number of inverter units.
    pub fn unit_count(&self) -> u32 {
        self.groups.iter().map(|(_, c)| c).sum()
    }
}

impl fmt::Display for InverterPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .groups
            .iter()
            .map(|(rating, count)| format!("{count}x{rating}kW"))
            .collect();
        write!(f, "{}", parts.join(" + "))
    }
}

/// Candidate multiset, ratings non-increasing.
#[derive(Debug, Clone)]
struct Candidate {
    units: Vec<u32>,
    total: u32,
}

impl Candidate {
    /// Ordering where `Greater` means preferable: higher total, then fewer
    /// units, then larger units first.
    fn preference(&self, other: &Self) -> Ordering {
        self.total
            .cmp(&other.total)
            .then_with(|| other.units.len().cmp(&self.units.len()))
            .then_with(|| self.units.cmp(&other.units))
    }
}

/// Per-regime search constraints.
struct SearchRules {
    min_unit_kw: f64,
    min_units: usize,
    max_units: usize,
}

impl SearchRules {
    fn for_regime(regime: SizeRegime, capacity_kwp: f64, max_kw: u32) -> Self {
        match regime {
            SizeRegime::Small => {
                let smallest = CATALOG_KW[0];
                Self {
                    min_unit_kw: 0.0,
                    min_units: 1,
                    max_units: (max_kw / smallest).max(1) as usize,
                }
            }
            SizeRegime::Medium => Self {
                min_unit_kw: f64::from(MIN_UNIT_KW),
                min_units: 2,
                max_units: 2,
            },
            SizeRegime::Large => Self {
                min_unit_kw: f64::from(MIN_UNIT_KW).max(LARGE_UNIT_SHARE * capacity_kwp),
                min_units: 2,
                max_units: 3,
            },
        }
    }
}

/// Picks the inverter configuration for a DC array of `capacity_kwp`.
///
/// # Errors
///
/// Returns [`SizingFailure`] when no catalog unit fits under `floor(capacity)`.
pub fn recommend_inverter(capacity_kwp: f64) -> Result<InverterPlan, SizingFailure> {
    let (min_kw, max_kw) = power_window(capacity_kwp);
    let failure = SizingFailure {
        capacity_kwp,
        max_ac_kw: max_kw,
    };
    if !(capacity_kwp.is_finite() && capacity_kwp > 0.0) {
        return Err(failure);
    }

    let regime = SizeRegime::for_capacity(capacity_kwp);
    let rules = SearchRules::for_regime(regime, capacity_kwp, max_kw);
    let ratings: Vec<u32> = CATALOG_KW
        .iter()
        .rev()
        .copied()
        .filter(|&r| r <= max_kw && f64::from(r) >= rules.min_unit_kw)
        .collect();

    let mut best: Option<Candidate> = None;
    let mut stack = Vec::with_capacity(rules.max_units);
    search(&ratings, 0, 0, max_kw, &rules, &mut stack, &mut |cand| {
        if f64::from(cand.total) < min_kw {
            return;
        }
        let better = best
            .as_ref()
            .is_none_or(|b| cand.preference(b) == Ordering::Greater);
        if better {
            best = Some(cand);
        }
    });

    if let Some(cand) = best {
        let plan = InverterPlan::from_units(&cand.units, capacity_kwp, regime, false);
        debug!(capacity_kwp, min_kw, max_kw, plan = %plan, "inverter selected");
        return Ok(plan);
    }

    let largest = CATALOG_KW.iter().rev().copied().find(|&r| r <= max_kw);
    match largest {
        Some(rating) => {
            warn!(
                capacity_kwp,
                min_kw, max_kw, rating, "no inverter combination meets the margin, using single unit"
            );
            Ok(InverterPlan::from_units(
                &[rating],
                capacity_kwp,
                regime,
                true,
            ))
        }
        None => Err(failure),
    }
}

/// Depth-first enumeration of non-increasing rating multisets.
fn search(
    ratings: &[u32],
    start: usize,
    total: u32,
    max_kw: u32,
    rules: &SearchRules,
    stack: &mut Vec<u32>,
    visit: &mut impl FnMut(Candidate),
) {
    if stack.len() >= rules.min_units {
        visit(Candidate {
            units: stack.clone(),
            total,
        });
    }
    if stack.len() == rules.max_units {
        return;
    }
    for (i, &rating) in ratings.iter().enumerate().skip(start) {
        let next = total + rating;
        if next > max_kw {
            continue;
        }
        stack.push(rating);
        search(ratings, i, next, max_kw, rules, stack, visit);
        stack.pop();
    }
}

/// Fraction of energy lost to clipping for a given DC/AC ratio.
pub fn clipping_loss(dc_ac_ratio: f64) -> f64 {
    if dc_ac_ratio <= 1.05 {
        0.0
    } else if dc_ac_ratio <= 1.15 {
        0.005
    } else if dc_ac_ratio <= 1.25 {
        0.015
    } else if dc_ac_ratio <= 1.35 {
        0.03
    } else {
        0.05
    }
}
