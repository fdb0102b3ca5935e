//! Investment metrics computed post-hoc from a cash-flow series.
//!
//! Indeterminate results (no IRR root, payback never reached, zero
//! generation) are `None`, never a silent zero.

use std::fmt;

use serde::Serialize;

/// Lowest rate the IRR search will consider.
const IRR_MIN_RATE: f64 = -0.99;
/// Highest rate the IRR search will consider.
const IRR_MAX_RATE: f64 = 10.0;
const IRR_GUESS: f64 = 0.10;
const IRR_TOLERANCE: f64 = 1e-9;
const NEWTON_MAX_ITER: usize = 100;
const BISECTION_MAX_ITER: usize = 200;
/// Grid points used to find a bracketing interval for bisection.
const BRACKET_STEPS: usize = 400;

/// Net present value with year 0 undiscounted.
pub fn npv(rate: f64, cash_flows: &[f64]) -> f64 {
    let mut discount = 1.0;
    let mut total = 0.0;
    for cf in cash_flows {
        total += cf / discount;
        discount *= 1.0 + rate;
    }
    total
}

/// NPV and its derivative with respect to the rate.
fn npv_with_derivative(rate: f64, cash_flows: &[f64]) -> (f64, f64) {
    let one_plus_r = 1.0 + rate;
    let mut value = 0.0;
    let mut derivative = 0.0;
    let mut discount = 1.0;
    for (t, cf) in cash_flows.iter().enumerate() {
        value += cf / discount;
        if t > 0 {
            derivative -= t as f64 * cf / (discount * one_plus_r);
        }
        discount *= one_plus_r;
    }
    (value, derivative)
}

/// True if the non-zero entries of `cash_flows` change sign at least once.
pub fn has_sign_change(cash_flows: &[f64]) -> bool {
    let mut signs = cash_flows
        .iter()
        .filter(|cf| **cf != 0.0)
        .map(|cf| cf.is_sign_positive());
    let Some(first) = signs.next() else {
        return false;
    };
    signs.any(|s| s != first)
}

/// Internal rate of return.
///
/// Tries Newton-Raphson from 10% first, then bisection over the first
/// bracketing interval found in `[-0.99, 10]`. Returns `None` when the series
/// never changes sign or no root is found.
pub fn irr(cash_flows: &[f64]) -> Option<f64> {
    if cash_flows.len() < 2 || !has_sign_change(cash_flows) {
        return None;
    }
    newton(cash_flows).or_else(|| bisection(cash_flows))
}

fn newton(cash_flows: &[f64]) -> Option<f64> {
    let mut rate = IRR_GUESS;
    for _ in 0..NEWTON_MAX_ITER {
        let (value, derivative) = npv_with_derivative(rate, cash_flows);
        if !value.is_finite() || !derivative.is_finite() || derivative == 0.0 {
            return None;
        }
        let next = rate - value / derivative;
        if !(IRR_MIN_RATE..=IRR_MAX_RATE).contains(&next) {
            return None;
        }
        if (next - rate).abs() < IRR_TOLERANCE {
            return Some(next);
        }
        rate = next;
    }
    None
}

fn bisection(cash_flows: &[f64]) -> Option<f64> {
    let step = (IRR_MAX_RATE - IRR_MIN_RATE) / BRACKET_STEPS as f64;
    let mut lo = IRR_MIN_RATE;
    let mut f_lo = npv(lo, cash_flows);
    let mut bracket = None;
    for k in 1..=BRACKET_STEPS {
        let hi = IRR_MIN_RATE + step * k as f64;
        let f_hi = npv(hi, cash_flows);
        if f_lo == 0.0 {
            return Some(lo);
        }
        if f_lo.signum() != f_hi.signum() {
            bracket = Some((lo, hi, f_lo));
            break;
        }
        lo = hi;
        f_lo = f_hi;
    }

    let (mut lo, mut hi, mut f_lo) = bracket?;
    for _ in 0..BISECTION_MAX_ITER {
        let mid = 0.5 * (lo + hi);
        let f_mid = npv(mid, cash_flows);
        if f_mid == 0.0 || (hi - lo) < IRR_TOLERANCE {
            return Some(mid);
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    Some(0.5 * (lo + hi))
}

/// Fractional payback year by linear interpolation of the cumulative sum.
///
/// Returns `None` if the cumulative flow never becomes non-negative.
pub fn payback_period(cash_flows: &[f64]) -> Option<f64> {
    let mut cumulative = 0.0;
    for (k, cf) in cash_flows.iter().enumerate() {
        let previous: f64 = cumulative;
        cumulative += cf;
        if cumulative >= 0.0 {
            if k == 0 {
                return Some(0.0);
            }
            let span = cumulative - previous;
            if span.abs() < f64::EPSILON {
                return Some(k as f64);
            }
            return Some((k - 1) as f64 + previous.abs() / span);
        }
    }
    None
}

/// Levelized cost of energy: `(down payment + NPV(maintenance)) / lifetime kWh`.
///
/// `maintenance` is indexed by operating year (year 1 first) and discounted
/// accordingly. Returns `None` if no energy is generated.
pub fn lcoe(
    down_payment: f64,
    maintenance: &[f64],
    lifetime_generation_kwh: f64,
    discount_rate: f64,
) -> Option<f64> {
    if lifetime_generation_kwh <= 0.0 || !lifetime_generation_kwh.is_finite() {
        return None;
    }
    let mut discount = 1.0;
    let mut maintenance_pv = 0.0;
    for cost in maintenance {
        discount *= 1.0 + discount_rate;
        maintenance_pv += cost / discount;
    }
    Some((down_payment + maintenance_pv) / lifetime_generation_kwh)
}

/// Headline investment metrics of one quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialMetrics {
    pub npv: f64,
    /// `None` when the series has no real root.
    pub irr: Option<f64>,
    /// Currency per kWh; `None` when lifetime generation is zero.
    pub lcoe: Option<f64>,
    /// Years; `None` when the investment is never recovered.
    pub payback_years: Option<f64>,
}

impl FinancialMetrics {
    /// Computes all metrics from the cash-flow series and cost components.
    pub fn compute(
        cash_flows: &[f64],
        discount_rate: f64,
        down_payment: f64,
        maintenance: &[f64],
        lifetime_generation_kwh: f64,
    ) -> Self {
        Self {
            npv: npv(discount_rate, cash_flows),
            irr: irr(cash_flows),
            lcoe: lcoe(down_payment, maintenance, lifetime_generation_kwh, discount_rate),
            payback_years: payback_period(cash_flows),
        }
    }
}

/// Formats an optional metric, printing `N/A` when undefined.
pub struct OrNa<'a>(pub &'a Option<f64>, pub usize);

impl fmt::Display for OrNa<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v:.prec$}", prec = self.1),
            None => write!(f, "N/A"),
        }
    }
}

impl fmt::Display for FinancialMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let irr_pct = self.irr.map(|r| r * 100.0);
        writeln!(f, "NPV:                   {:.0}", self.npv)?;
        writeln!(f, "IRR:                   {}%", OrNa(&irr_pct, 2))?;
        writeln!(f, "LCOE:                  {} /kWh", OrNa(&self.lcoe, 2))?;
        write!(f, "Payback:               {} years", OrNa(&self.payback_years, 2))
    }
}
