//! Vendor-ratio passthrough with magnitude guards.
//!
//! Debt-to-equity and interest coverage come straight from the provider's
//! ratio endpoint. Negative and zero values are legitimate signals (negative
//! equity, zero coverage) and pass through; only absurd magnitudes are
//! treated as vendor glitches.

use metrics_core::VendorRatios;

pub const DEBT_TO_EQUITY_CAP: f64 = 10_000.0;
pub const INTEREST_COVERAGE_CAP: f64 = 100_000.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageRatios {
    pub debt_to_equity: Option<f64>,
    pub interest_coverage: Option<f64>,
    pub cash_flow_to_debt: Option<f64>,
}

fn guard(value: Option<f64>, cap: f64) -> Option<f64> {
    value.filter(|v| v.is_finite() && v.abs() <= cap)
}

pub fn coverage_ratios(vendor: &VendorRatios) -> CoverageRatios {
    CoverageRatios {
        debt_to_equity: guard(vendor.debt_equity_ratio, DEBT_TO_EQUITY_CAP),
        interest_coverage: guard(vendor.interest_coverage, INTEREST_COVERAGE_CAP),
        cash_flow_to_debt: vendor.cash_flow_to_debt_ratio.filter(|v| v.is_finite()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glitch_magnitudes_dropped() {
        let v = VendorRatios {
            debt_equity_ratio: Some(25_000.0),
            interest_coverage: Some(250_000.0),
            cash_flow_to_debt_ratio: Some(0.4),
        };
        let c = coverage_ratios(&v);
        assert_eq!(c.debt_to_equity, None);
        assert_eq!(c.interest_coverage, None);
        assert_eq!(c.cash_flow_to_debt, Some(0.4));
    }

    #[test]
    fn test_zero_and_negative_preserved() {
        let v = VendorRatios {
            debt_equity_ratio: Some(-3.2),
            interest_coverage: Some(0.0),
            cash_flow_to_debt_ratio: None,
        };
        let c = coverage_ratios(&v);
        assert_eq!(c.debt_to_equity, Some(-3.2));
        assert_eq!(c.interest_coverage, Some(0.0));
        assert_eq!(c.cash_flow_to_debt, None);
    }
}
