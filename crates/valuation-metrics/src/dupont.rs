//! DuPont decomposition of return on equity from the latest annual
//! statement values.

#[derive(Debug, Clone, Copy, Default)]
pub struct DupontRatios {
    pub asset_turnover: Option<f64>,
    pub financial_leverage: Option<f64>,
    pub roe: Option<f64>,
}

/// Round to 4 decimal places, the precision these ratios are stored at.
pub fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

pub fn dupont(
    revenue: Option<f64>,
    net_income: Option<f64>,
    total_assets: Option<f64>,
    total_equity: Option<f64>,
) -> DupontRatios {
    let asset_turnover = match (revenue, total_assets) {
        (Some(rev), Some(assets)) if assets > 0.0 => Some(round4(rev / assets)),
        _ => None,
    };

    let financial_leverage = match (total_assets, total_equity) {
        (Some(assets), Some(equity)) if equity > 0.0 => Some(round4(assets / equity)),
        _ => None,
    };

    let roe = match (net_income, total_equity) {
        (Some(ni), Some(equity)) if equity > 0.0 => Some(round4(ni / equity)),
        _ => None,
    };

    DupontRatios {
        asset_turnover,
        financial_leverage,
        roe,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_decomposition() {
        let d = dupont(Some(1000.0), Some(120.0), Some(800.0), Some(400.0));
        assert_relative_eq!(d.asset_turnover.unwrap(), 1.25);
        assert_relative_eq!(d.financial_leverage.unwrap(), 2.0);
        assert_relative_eq!(d.roe.unwrap(), 0.3);
    }

    #[test]
    fn test_negative_equity_yields_no_leverage_or_roe() {
        let d = dupont(Some(1000.0), Some(120.0), Some(800.0), Some(-50.0));
        assert_eq!(d.financial_leverage, None);
        assert_eq!(d.roe, None);
        assert!(d.asset_turnover.is_some());
    }

    #[test]
    fn test_rounding_to_four_places() {
        let d = dupont(Some(1.0), None, Some(3.0), None);
        assert_relative_eq!(d.asset_turnover.unwrap(), 0.3333);
    }
}
