//! ROIC yearly series, 10-year average, and stability (dispersion).
//!
//! The vendor's annual ROIC series is preferred; when it is too sparse the
//! series is re-derived from income-statement and balance-sheet data.

use crate::stats;
use statement_series::{clamp_ratio, YearSeries, SERIES_LEN};

/// Fallback effective tax rate when the statement-implied rate is unusable
pub const DEFAULT_TAX_RATE: f64 = 0.21;
/// Vendor values above this are percent-scaled (e.g. 18.0 meaning 18%)
const PERCENT_SCALE_THRESHOLD: f64 = 1.5;
/// Minimum usable vendor points before falling back to derivation
const MIN_PROVIDER_POINTS: usize = 2;

/// Statement series needed to derive ROIC when the vendor series is sparse.
#[derive(Debug, Clone, Copy)]
pub struct RoicInputs<'a> {
    pub ebit: &'a YearSeries,
    pub income_before_tax: &'a YearSeries,
    pub income_tax_expense: &'a YearSeries,
    pub total_debt: &'a YearSeries,
    pub total_equity: &'a YearSeries,
    pub cash: &'a YearSeries,
}

/// Normalize the vendor ROIC series to clamped decimal form. Values above
/// 1.5 are interpreted as percentages and divided by 100.
pub fn normalize_provider_roic(provider: &YearSeries) -> YearSeries {
    let mut out: YearSeries = [None; SERIES_LEN];
    for (slot, value) in provider.iter().enumerate() {
        out[slot] = value.map(|v| {
            let decimal = if v > PERCENT_SCALE_THRESHOLD { v / 100.0 } else { v };
            clamp_ratio(decimal)
        });
    }
    out
}

/// Derive per-year ROIC from statements: `NOPAT / investedCapital` with
/// `NOPAT = EBIT * (1 - effectiveTaxRate)` and
/// `investedCapital = totalDebt + totalEquity - cash`. Years where invested
/// capital is non-positive or inputs are missing stay `None`.
pub fn derive_roic(inputs: &RoicInputs<'_>) -> YearSeries {
    let mut out: YearSeries = [None; SERIES_LEN];
    for slot in 0..SERIES_LEN {
        let Some(ebit) = inputs.ebit[slot] else { continue };
        let (Some(debt), Some(equity), Some(cash)) = (
            inputs.total_debt[slot],
            inputs.total_equity[slot],
            inputs.cash[slot],
        ) else {
            continue;
        };

        let tax_rate = match (inputs.income_tax_expense[slot], inputs.income_before_tax[slot]) {
            (Some(tax), Some(pretax)) if pretax != 0.0 => (tax / pretax).clamp(0.0, 0.5),
            _ => DEFAULT_TAX_RATE,
        };

        let invested = debt + equity - cash;
        if invested <= 0.0 {
            continue;
        }

        let roic = ebit * (1.0 - tax_rate) / invested;
        if roic.is_finite() {
            out[slot] = Some(clamp_ratio(roic));
        }
    }
    out
}

/// Pick the vendor series when it has enough usable points, otherwise derive
/// from statements.
pub fn select_roic_series(provider: &YearSeries, inputs: &RoicInputs<'_>) -> YearSeries {
    let normalized = normalize_provider_roic(provider);
    let usable = normalized.iter().flatten().count();
    if usable >= MIN_PROVIDER_POINTS {
        normalized
    } else {
        derive_roic(inputs)
    }
}

/// Mean of the non-null yearly values
pub fn roic_average(series: &YearSeries) -> Option<f64> {
    let values: Vec<f64> = series.iter().flatten().copied().collect();
    stats::mean(&values)
}

/// Population standard deviation of the non-null yearly values; `None` with
/// fewer than two.
pub fn roic_std(series: &YearSeries) -> Option<f64> {
    let values: Vec<f64> = series.iter().flatten().copied().collect();
    stats::population_std_dev(&values)
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
    fn test_percent_scale_normalization() {
        let normalized = normalize_provider_roic(&series(&[18.0, 0.22, 250.0]));
        assert_relative_eq!(normalized[0].unwrap(), 0.18);
        assert_relative_eq!(normalized[1].unwrap(), 0.22);
        // 250% normalizes to 2.5, then clamps to the ±200% band
        assert_relative_eq!(normalized[2].unwrap(), 2.0);
    }

    #[test]
    fn test_fallback_when_provider_sparse() {
        let provider = series(&[0.15]); // one point is not enough
        let ebit = series(&[200.0]);
        let pretax = series(&[180.0]);
        let tax = series(&[36.0]);
        let debt = series(&[500.0]);
        let equity = series(&[700.0]);
        let cash = series(&[200.0]);
        let inputs = RoicInputs {
            ebit: &ebit,
            income_before_tax: &pretax,
            income_tax_expense: &tax,
            total_debt: &debt,
            total_equity: &equity,
            cash: &cash,
        };
        let selected = select_roic_series(&provider, &inputs);
        // tax rate 36/180 = 0.2, NOPAT 160, invested 1000
        assert_relative_eq!(selected[0].unwrap(), 0.16, epsilon = 1e-12);
    }

    #[test]
    fn test_derivation_guards() {
        let ebit = series(&[100.0, 100.0]);
        let pretax = series(&[0.0, 100.0]); // year 0: zero pretax -> default rate
        let tax = series(&[10.0, 90.0]); // year 1: 90% rate clamps to 50%
        let debt = series(&[100.0, 100.0]);
        let equity = series(&[100.0, 100.0]);
        let cash = series(&[300.0, 50.0]); // year 0: invested capital -100 -> skipped
        let inputs = RoicInputs {
            ebit: &ebit,
            income_before_tax: &pretax,
            income_tax_expense: &tax,
            total_debt: &debt,
            total_equity: &equity,
            cash: &cash,
        };
        let derived = derive_roic(&inputs);
        assert_eq!(derived[0], None);
        // NOPAT 100 * (1 - 0.5) = 50, invested 150
        assert_relative_eq!(derived[1].unwrap(), 50.0 / 150.0, epsilon = 1e-12);
    }

    #[test]
    fn test_average_and_population_std() {
        let s = series(&[0.10, 0.20]);
        assert_relative_eq!(roic_average(&s).unwrap(), 0.15);
        assert_relative_eq!(roic_std(&s).unwrap(), 0.05, epsilon = 1e-12);
        assert_eq!(roic_std(&series(&[0.10])), None);
    }
}
