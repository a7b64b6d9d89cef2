//! Perpetuity DCF valuation, margin of safety, and the implied-growth figure.
//!
//! The implied growth published with the valuation is the same growth rate
//! selected for the forward calculation (clamped historical revenue CAGR,
//! default 5%); forward and reverse figures stay mutually consistent and
//! share the same guard rails.

use crate::stats;
use statement_series::YearSeries;

/// Fixed discount rate (weighted average cost of capital)
pub const WACC: f64 = 0.10;
/// Historical revenue CAGR is clamped into this band before use
pub const GROWTH_FLOOR: f64 = 0.02;
pub const GROWTH_CEILING: f64 = 0.08;
/// Growth assumed when no usable revenue CAGR exists
pub const DEFAULT_GROWTH: f64 = 0.05;
/// Valuations more than this multiple of market cap are treated as data
/// errors and discarded
pub const EV_MARKET_CAP_SANITY: f64 = 20.0;
/// How many of the most recent FCF years feed the perpetuity base
pub const BASE_FCF_YEARS: usize = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct DcfValuation {
    pub enterprise_value: Option<f64>,
    pub margin_of_safety: Option<f64>,
    pub implied_growth: Option<f64>,
}

/// Arithmetic mean of the most recent up-to-3 non-null FCF years.
/// `None` when no FCF exists or the mean is exactly zero.
pub fn base_fcf(fcf: &YearSeries) -> Option<f64> {
    let recent: Vec<f64> = fcf.iter().flatten().copied().take(BASE_FCF_YEARS).collect();
    let mean = stats::mean(&recent)?;
    if mean == 0.0 {
        return None;
    }
    Some(mean)
}

/// The growth rate used for both the forward valuation and the published
/// implied growth.
pub fn growth_rate(revenue_cagr: Option<f64>) -> f64 {
    revenue_cagr
        .map(|c| c.clamp(GROWTH_FLOOR, GROWTH_CEILING))
        .unwrap_or(DEFAULT_GROWTH)
}

/// Growing-perpetuity value. Undefined (`None`) when `g >= WACC`; the clamp
/// in [`growth_rate`] keeps normal inputs below the boundary, but the guard
/// holds for any caller-supplied rate.
pub fn perpetuity_value(fcf: f64, g: f64) -> Option<f64> {
    if g >= WACC {
        return None;
    }
    let ev = fcf * (1.0 + g) / (WACC - g);
    ev.is_finite().then_some(ev)
}

/// Full forward DCF for one symbol. `fcf_base` must already be in the base
/// currency (conversion is the caller's concern).
pub fn dcf_valuation(
    fcf_base: f64,
    market_cap: Option<f64>,
    revenue_cagr: Option<f64>,
) -> DcfValuation {
    let g = growth_rate(revenue_cagr);
    let Some(ev) = perpetuity_value(fcf_base, g) else {
        return DcfValuation::default();
    };

    // Implausible valuation multiples are vendor data errors, not signals;
    // the whole derived triple goes null together.
    if let Some(mcap) = market_cap {
        if mcap > 0.0 && ev / mcap > EV_MARKET_CAP_SANITY {
            return DcfValuation::default();
        }
    }

    let margin_of_safety = match market_cap {
        Some(mcap) if mcap.is_finite() && ev > 0.0 => Some((1.0 - mcap / ev).max(-1.0)),
        _ => None,
    };

    DcfValuation {
        enterprise_value: Some(ev),
        margin_of_safety,
        implied_growth: Some(g),
    }
}

/// Compound annual growth rate between the oldest and newest non-null values
/// of a newest-first series, over the span of years actually available.
pub fn series_cagr(series: &YearSeries) -> Option<f64> {
    let newest = series.iter().position(|v| v.is_some())?;
    let oldest = series.iter().rposition(|v| v.is_some())?;
    let span = oldest - newest;
    if span < 1 {
        return None;
    }
    let start = series[oldest]?;
    let end = series[newest]?;
    if start <= 0.0 || end <= 0.0 {
        return None;
    }
    let cagr = (end / start).powf(1.0 / span as f64) - 1.0;
    cagr.is_finite().then_some(cagr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn series(values: &[f64]) -> YearSeries {
        let mut s: YearSeries = [None; 10];
        for (i, v) in values.iter().enumerate() {
            s[i] = Some(*v);
        }
        s
    }

    #[test]
    fn test_base_fcf_mean_of_three_most_recent() {
        let s = series(&[100.0, 110.0, 90.0]);
        assert_relative_eq!(base_fcf(&s).unwrap(), 100.0);

        // a fourth year does not enter the base
        let s = series(&[100.0, 110.0, 90.0, 500.0]);
        assert_relative_eq!(base_fcf(&s).unwrap(), 100.0);
    }

    #[test]
    fn test_base_fcf_empty_or_zero_mean() {
        assert_eq!(base_fcf(&[None; 10]), None);
        assert_eq!(base_fcf(&series(&[100.0, -100.0])), None);
    }

    #[test]
    fn test_perpetuity_undefined_at_or_above_wacc() {
        assert_eq!(perpetuity_value(100.0, 0.10), None);
        assert_eq!(perpetuity_value(100.0, 0.12), None);
        assert!(perpetuity_value(100.0, 0.08).is_some());
    }

    #[test]
    fn test_worked_scenario() {
        // base FCF 100, growth 6% clamped to itself, EV = 100*1.06/0.04 = 2650,
        // EV/mcap = 1.325 kept, margin = 1 - 2000/2650
        let fcf = base_fcf(&series(&[100.0, 110.0, 90.0])).unwrap();
        let v = dcf_valuation(fcf, Some(2000.0), Some(0.06));
        assert_relative_eq!(v.enterprise_value.unwrap(), 2650.0, epsilon = 1e-9);
        assert_relative_eq!(v.margin_of_safety.unwrap(), 0.2453, epsilon = 1e-4);
        assert_relative_eq!(v.implied_growth.unwrap(), 0.06);
    }

    #[test]
    fn test_growth_clamp_and_default() {
        assert_relative_eq!(growth_rate(Some(0.15)), GROWTH_CEILING);
        assert_relative_eq!(growth_rate(Some(-0.04)), GROWTH_FLOOR);
        assert_relative_eq!(growth_rate(None), DEFAULT_GROWTH);
    }

    #[test]
    fn test_sanity_guard_discards_whole_triple() {
        // EV = 100*1.05/0.05 = 2100 against a 100 market cap: ratio 21 > 20
        let v = dcf_valuation(100.0, Some(100.0), None);
        assert_eq!(v.enterprise_value, None);
        assert_eq!(v.margin_of_safety, None);
        assert_eq!(v.implied_growth, None);
    }

    #[test]
    fn test_margin_of_safety_floor() {
        // tiny EV against a huge market cap pins the margin at -100%
        let v = dcf_valuation(1.0, Some(1_000_000.0), None);
        assert_relative_eq!(v.margin_of_safety.unwrap(), -1.0);
        // negative EV carries no margin of safety
        let v = dcf_valuation(-50.0, Some(2000.0), None);
        assert!(v.enterprise_value.unwrap() < 0.0);
        assert_eq!(v.margin_of_safety, None);
    }

    #[test]
    fn test_series_cagr_partial_history() {
        // three years of data: 900 -> 1000 over 2 years
        let s = series(&[1000.0, 950.0, 900.0]);
        let cagr = series_cagr(&s).unwrap();
        assert_relative_eq!(cagr, (1000.0f64 / 900.0).powf(0.5) - 1.0, epsilon = 1e-12);

        assert_eq!(series_cagr(&series(&[1000.0])), None);
        assert_eq!(series_cagr(&[None; 10]), None);
    }
}
