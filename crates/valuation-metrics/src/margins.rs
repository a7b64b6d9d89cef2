//! Free-cash-flow margin statistics over the 10-year window.

use crate::stats;
use statement_series::{clamp_ratio, YearSeries, SERIES_LEN};

/// Per-year FCF margin, clamped to ±200%. Years missing either leg or with
/// zero revenue are skipped.
pub fn fcf_margin_series(fcf: &YearSeries, revenue: &YearSeries) -> Vec<f64> {
    let mut margins = Vec::with_capacity(SERIES_LEN);
    for slot in 0..SERIES_LEN {
        if let (Some(f), Some(r)) = (fcf[slot], revenue[slot]) {
            if r != 0.0 {
                let margin = f / r;
                if margin.is_finite() {
                    margins.push(clamp_ratio(margin));
                }
            }
        }
    }
    margins
}

/// Median of the computed per-year margins
pub fn fcf_margin_median(fcf: &YearSeries, revenue: &YearSeries) -> Option<f64> {
    stats::median(&fcf_margin_series(fcf, revenue))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn series(values: &[Option<f64>]) -> YearSeries {
        let mut s: YearSeries = [None; 10];
        for (i, v) in values.iter().enumerate() {
            s[i] = *v;
        }
        s
    }

    #[test]
    fn test_median_skips_unusable_years() {
        let fcf = series(&[Some(100.0), Some(110.0), None, Some(50.0)]);
        let revenue = series(&[Some(1000.0), Some(0.0), Some(900.0), Some(500.0)]);
        // year 1 has zero revenue, year 2 has no FCF: margins are 0.10 and 0.10
        assert_relative_eq!(fcf_margin_median(&fcf, &revenue).unwrap(), 0.10);
    }

    #[test]
    fn test_margin_clamped_before_median() {
        let fcf = series(&[Some(500.0), Some(10.0)]);
        let revenue = series(&[Some(100.0), Some(100.0)]);
        // 5.0 clamps to 2.0; median of [2.0, 0.1]
        assert_relative_eq!(fcf_margin_median(&fcf, &revenue).unwrap(), 1.05);
    }

    #[test]
    fn test_no_usable_years() {
        assert_eq!(fcf_margin_median(&[None; 10], &[None; 10]), None);
    }
}
